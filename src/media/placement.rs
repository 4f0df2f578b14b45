//! Placement registry: where on the site an image lives decides its
//! default size, crop, and storage folder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::transform::{Crop, Gravity};
use crate::error::MediaError;

/// Closed set of page areas a placeholder can occupy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Hero,
    About,
    Team,
    Services,
    Gallery,
    Blog,
    Testimonials,
    Logo,
    Background,
}

impl Area {
    pub const ALL: [Area; 9] = [
        Area::Hero,
        Area::About,
        Area::Team,
        Area::Services,
        Area::Gallery,
        Area::Blog,
        Area::Testimonials,
        Area::Logo,
        Area::Background,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Hero => "hero",
            Area::About => "about",
            Area::Team => "team",
            Area::Services => "services",
            Area::Gallery => "gallery",
            Area::Blog => "blog",
            Area::Testimonials => "testimonials",
            Area::Logo => "logo",
            Area::Background => "background",
        }
    }

    pub fn placement(&self) -> Placement {
        get_placement(*self)
    }
}

impl FromStr for Area {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Area::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| MediaError::Config(format!("unknown placement area '{}'", s)))
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DefaultSize {
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DefaultTransformations {
    pub crop: Crop,
    pub gravity: Gravity,
}

/// Registry entry for one area
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub area: Area,
    pub path_prefix: &'static str,
    pub default_dimensions: DefaultSize,
    pub default_transformations: DefaultTransformations,
}

impl Placement {
    /// Canonical storage location for an asset filling `placeholder_id` in this area
    pub fn public_id_for(&self, placeholder_id: &str) -> String {
        format!("{}/{}", self.path_prefix, placeholder_id)
    }
}

const fn entry(
    area: Area,
    path_prefix: &'static str,
    width: u32,
    height: Option<u32>,
    crop: Crop,
    gravity: Gravity,
) -> Placement {
    Placement {
        area,
        path_prefix,
        default_dimensions: DefaultSize { width, height },
        default_transformations: DefaultTransformations { crop, gravity },
    }
}

/// Look up the registry entry for an area. Total over `Area`.
pub fn get_placement(area: Area) -> Placement {
    match area {
        Area::Hero => entry(area, "website/hero", 1920, Some(1080), Crop::Fill, Gravity::Auto),
        Area::About => entry(area, "website/about", 1200, Some(800), Crop::Fill, Gravity::Auto),
        Area::Team => entry(area, "team/providers", 600, Some(800), Crop::Fill, Gravity::Face),
        Area::Services => {
            entry(area, "website/services", 1200, Some(800), Crop::Fill, Gravity::Auto)
        }
        Area::Gallery => entry(area, "gallery", 1200, Some(900), Crop::Pad, Gravity::Center),
        Area::Blog => entry(area, "blog", 1200, Some(630), Crop::Fill, Gravity::Auto),
        Area::Testimonials => {
            entry(area, "website/testimonials", 400, Some(400), Crop::Thumb, Gravity::Face)
        }
        Area::Logo => entry(area, "website/brand", 400, None, Crop::Scale, Gravity::Center),
        Area::Background => {
            entry(area, "website/backgrounds", 1920, Some(1080), Crop::Fill, Gravity::Center)
        }
    }
}
