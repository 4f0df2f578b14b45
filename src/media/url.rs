//! CDN URL construction.
//!
//! URLs follow the delivery template
//! `https://{host}/{cloud}/{resource_type}/upload/{transformations}/{public_id}`.
//! Everything here is deterministic string building; nothing touches the network.

use serde::Serialize;

use super::model::{validate_id, PhysicalAsset, ResourceType};
use super::placement::get_placement;
use super::transform::{Crop, Format, Gravity, Quality, TransformOptions};
use crate::config::CdnConfig;
use crate::error::Result;

/// Breakpoint ladder used for responsive image delivery
pub const SOURCE_SET_WIDTHS: [u32; 7] = [640, 750, 828, 1080, 1200, 1920, 2048];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceSetEntry {
    pub width: u32,
    pub url: String,
}

/// What a page needs to render an asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Delivery {
    Image {
        url: String,
        src_set: Vec<SourceSetEntry>,
    },
    Video {
        url: String,
        poster_url: String,
    },
}

/// Options after placement and library defaults have been applied
#[derive(Clone, Copy, Debug)]
struct Effective {
    width: Option<u32>,
    height: Option<u32>,
    crop: Option<Crop>,
    gravity: Option<Gravity>,
    quality: Quality,
    format: Format,
}

impl Effective {
    fn from_options(options: &TransformOptions) -> Result<Self> {
        options.validate()?;
        let placement = options.area.map(get_placement);
        let base_width = placement.map(|p| p.default_dimensions.width);
        let base_height = placement.and_then(|p| p.default_dimensions.height);

        let width = options.width.or(base_width);
        let height = match (options.height, options.width) {
            (Some(h), _) => Some(h),
            (None, None) => base_height,
            // Caller picked a width: keep the placement's aspect ratio
            (None, Some(w)) => match (base_width, base_height) {
                (Some(bw), Some(bh)) => Some(scaled_height(bw, bh, w)),
                _ => None,
            },
        };

        let crop = options
            .crop
            .or(placement.map(|p| p.default_transformations.crop))
            .or_else(|| options.gravity.map(|_| Crop::Fill));
        let gravity = options
            .gravity
            .or(placement.map(|p| p.default_transformations.gravity));

        Ok(Self {
            width,
            height,
            crop,
            gravity,
            quality: options.quality.unwrap_or_default(),
            format: options.format.unwrap_or_default(),
        })
    }

    fn with_width(mut self, width: u32) -> Self {
        if let (Some(w), Some(h)) = (self.width, self.height) {
            self.height = Some(scaled_height(w, h, width));
        }
        self.width = Some(width);
        self
    }

    fn transformation(&self, with_format: bool) -> String {
        let mut parts = Vec::with_capacity(6);
        let sized = self.width.is_some() || self.height.is_some();

        if let (true, Some(crop)) = (sized, self.crop) {
            parts.push(format!("c_{}", crop.as_str()));
            if let (true, Some(gravity)) = (crop.accepts_gravity(), self.gravity) {
                parts.push(format!("g_{}", gravity.as_str()));
            }
        }
        if let Some(w) = self.width {
            parts.push(format!("w_{}", w));
        }
        if let Some(h) = self.height {
            parts.push(format!("h_{}", h));
        }
        parts.push(format!("q_{}", self.quality));
        if with_format {
            parts.push(format!("f_{}", self.format.as_str()));
        }
        parts.join(",")
    }
}

fn scaled_height(base_width: u32, base_height: u32, width: u32) -> u32 {
    let base_width = base_width.max(1) as u64;
    let scaled = (base_height as u64 * width as u64 + base_width / 2) / base_width;
    scaled.max(1) as u32
}

/// Builds delivery URLs for one CDN account
#[derive(Clone, Debug)]
pub struct UrlBuilder {
    cdn: CdnConfig,
}

impl UrlBuilder {
    pub fn new(cdn: CdnConfig) -> Self {
        Self { cdn }
    }

    /// Image delivery URL for `public_id`
    pub fn build_url(&self, public_id: &str, options: &TransformOptions) -> Result<String> {
        self.build_resource_url(public_id, ResourceType::Image, options)
    }

    pub fn build_resource_url(
        &self,
        public_id: &str,
        resource_type: ResourceType,
        options: &TransformOptions,
    ) -> Result<String> {
        validate_id("public id", public_id)?;
        let effective = Effective::from_options(options)?;
        Ok(self.compose(resource_type, &effective.transformation(true), public_id, None))
    }

    /// One image URL per ladder width, widths strictly increasing.
    pub fn build_source_set(
        &self,
        public_id: &str,
        options: &TransformOptions,
    ) -> Result<Vec<SourceSetEntry>> {
        validate_id("public id", public_id)?;
        let effective = Effective::from_options(options)?;

        Ok(SOURCE_SET_WIDTHS
            .iter()
            .map(|&width| SourceSetEntry {
                width,
                url: self.compose(
                    ResourceType::Image,
                    &effective.with_width(width).transformation(true),
                    public_id,
                    None,
                ),
            })
            .collect())
    }

    /// Still frame from the start of a video, delivered as JPEG
    pub fn poster_url(&self, public_id: &str, options: &TransformOptions) -> Result<String> {
        validate_id("public id", public_id)?;
        let effective = Effective::from_options(options)?;
        let transformation = format!("so_0,{}", effective.transformation(false));
        Ok(self.compose(ResourceType::Video, &transformation, public_id, Some("jpg")))
    }

    /// Full delivery bundle: source set for images, poster for videos.
    pub fn delivery(&self, asset: &PhysicalAsset, options: &TransformOptions) -> Result<Delivery> {
        match asset.resource_type {
            ResourceType::Image => Ok(Delivery::Image {
                url: self.build_url(&asset.public_id, options)?,
                src_set: self.build_source_set(&asset.public_id, options)?,
            }),
            ResourceType::Video => Ok(Delivery::Video {
                url: self.build_resource_url(&asset.public_id, ResourceType::Video, options)?,
                poster_url: self.poster_url(&asset.public_id, options)?,
            }),
        }
    }

    fn compose(
        &self,
        resource_type: ResourceType,
        transformation: &str,
        public_id: &str,
        extension: Option<&str>,
    ) -> String {
        let mut url = format!(
            "https://{}/{}/{}/upload/{}/{}",
            self.cdn.host,
            self.cdn.cloud_name,
            resource_type.as_str(),
            transformation,
            public_id.trim_start_matches('/')
        );
        if let Some(ext) = extension {
            url.push('.');
            url.push_str(ext);
        }
        url
    }
}
