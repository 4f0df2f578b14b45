//! Transformation vocabulary understood by the CDN.
//!
//! Every value here is parsed at the call boundary; an unknown crop, gravity,
//! format or an out-of-range number is an `InvalidReference`, never coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::placement::Area;
use crate::error::{MediaError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Fill,
    Scale,
    Crop,
    Thumb,
    Pad,
}

impl Crop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Crop::Fill => "fill",
            Crop::Scale => "scale",
            Crop::Crop => "crop",
            Crop::Thumb => "thumb",
            Crop::Pad => "pad",
        }
    }

    /// Scale keeps the whole frame, so a focal point means nothing to it.
    pub fn accepts_gravity(&self) -> bool {
        !matches!(self, Crop::Scale)
    }
}

impl FromStr for Crop {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fill" => Ok(Crop::Fill),
            "scale" => Ok(Crop::Scale),
            "crop" => Ok(Crop::Crop),
            "thumb" => Ok(Crop::Thumb),
            "pad" => Ok(Crop::Pad),
            other => Err(MediaError::InvalidReference(format!("unknown crop '{}'", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    Auto,
    Face,
    Center,
    North,
    South,
    East,
    West,
}

impl Gravity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gravity::Auto => "auto",
            Gravity::Face => "face",
            Gravity::Center => "center",
            Gravity::North => "north",
            Gravity::South => "south",
            Gravity::East => "east",
            Gravity::West => "west",
        }
    }
}

impl FromStr for Gravity {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Gravity::Auto),
            "face" => Ok(Gravity::Face),
            "center" => Ok(Gravity::Center),
            "north" => Ok(Gravity::North),
            "south" => Ok(Gravity::South),
            "east" => Ok(Gravity::East),
            "west" => Ok(Gravity::West),
            other => Err(MediaError::InvalidReference(format!("unknown gravity '{}'", other))),
        }
    }
}

/// Delivery quality: CDN-chosen or an explicit 1..=100 level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quality {
    #[default]
    Auto,
    Level(u32),
}

impl Quality {
    pub fn level(value: u32) -> Result<Self> {
        if value == 0 || value > 100 {
            return Err(MediaError::InvalidReference(format!(
                "quality must be between 1 and 100, got {}",
                value
            )));
        }
        Ok(Quality::Level(value))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Auto => f.write_str("auto"),
            Quality::Level(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for Quality {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "auto" {
            return Ok(Quality::Auto);
        }
        let value = s
            .parse::<u32>()
            .map_err(|_| MediaError::InvalidReference(format!("invalid quality '{}'", s)))?;
        Quality::level(value)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Auto,
    Jpg,
    Png,
    Webp,
    Avif,
    Gif,
    Mp4,
    Webm,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Auto => "auto",
            Format::Jpg => "jpg",
            Format::Png => "png",
            Format::Webp => "webp",
            Format::Avif => "avif",
            Format::Gif => "gif",
            Format::Mp4 => "mp4",
            Format::Webm => "webm",
        }
    }
}

impl FromStr for Format {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Format::Auto),
            "jpg" | "jpeg" => Ok(Format::Jpg),
            "png" => Ok(Format::Png),
            "webp" => Ok(Format::Webp),
            "avif" => Ok(Format::Avif),
            "gif" => Ok(Format::Gif),
            "mp4" => Ok(Format::Mp4),
            "webm" => Ok(Format::Webm),
            other => Err(MediaError::InvalidReference(format!("unknown format '{}'", other))),
        }
    }
}

/// Validated transformation request. Absent fields fall back to placement
/// defaults, then to library defaults (`q_auto`, `f_auto`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<Quality>,
    pub format: Option<Format>,
    pub crop: Option<Crop>,
    pub gravity: Option<Gravity>,
    pub area: Option<Area>,
}

impl TransformOptions {
    /// Reject values the CDN cannot honor. Every URL builder calls this
    /// before reading the fields.
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = self.width {
            positive("width", width)?;
        }
        if let Some(height) = self.height {
            positive("height", height)?;
        }
        if let Some(Quality::Level(level)) = self.quality {
            Quality::level(level)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn width(mut self, width: u32) -> Result<Self> {
        self.width = Some(positive("width", width)?);
        Ok(self)
    }

    #[cfg(test)]
    pub fn for_area(mut self, area: Area) -> Self {
        self.area = Some(area);
        self
    }
}

/// Untyped options as they arrive over HTTP (`?w=800&q=auto&c=fill`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawTransformOptions {
    #[serde(alias = "width")]
    pub w: Option<String>,
    #[serde(alias = "height")]
    pub h: Option<String>,
    #[serde(alias = "quality")]
    pub q: Option<String>,
    #[serde(alias = "format")]
    pub f: Option<String>,
    #[serde(alias = "crop")]
    pub c: Option<String>,
    #[serde(alias = "gravity")]
    pub g: Option<String>,
    pub area: Option<String>,
}

impl RawTransformOptions {
    pub fn parse(&self) -> Result<TransformOptions> {
        Ok(TransformOptions {
            width: self.w.as_deref().map(|v| parse_dimension("width", v)).transpose()?,
            height: self.h.as_deref().map(|v| parse_dimension("height", v)).transpose()?,
            quality: self.q.as_deref().map(str::parse).transpose()?,
            format: self.f.as_deref().map(str::parse).transpose()?,
            crop: self.c.as_deref().map(str::parse).transpose()?,
            gravity: self.g.as_deref().map(str::parse).transpose()?,
            area: self
                .area
                .as_deref()
                .map(|a| {
                    a.parse::<Area>()
                        .map_err(|_| MediaError::InvalidReference(format!("unknown area '{}'", a)))
                })
                .transpose()?,
        })
    }
}

fn positive(name: &str, value: u32) -> Result<u32> {
    if value == 0 {
        return Err(MediaError::InvalidReference(format!("{} must be positive", name)));
    }
    Ok(value)
}

fn parse_dimension(name: &str, value: &str) -> Result<u32> {
    let parsed = value
        .parse::<u32>()
        .map_err(|_| MediaError::InvalidReference(format!("invalid {} '{}'", name, value)))?;
    positive(name, parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parse() {
        assert_eq!("auto".parse::<Quality>().unwrap(), Quality::Auto);
        assert_eq!("80".parse::<Quality>().unwrap(), Quality::Level(80));
        assert!("0".parse::<Quality>().is_err());
        assert!("101".parse::<Quality>().is_err());
        assert!("best".parse::<Quality>().is_err());
    }

    #[test]
    fn test_enumerated_values_rejected_not_coerced() {
        assert!("stretch".parse::<Crop>().is_err());
        assert!("top".parse::<Gravity>().is_err());
        assert!("tiff".parse::<Format>().is_err());
    }

    #[test]
    fn test_raw_options_parse() {
        let raw = RawTransformOptions {
            w: Some("800".to_string()),
            q: Some("auto".to_string()),
            c: Some("thumb".to_string()),
            g: Some("face".to_string()),
            area: Some("team".to_string()),
            ..Default::default()
        };
        let opts = raw.parse().unwrap();
        assert_eq!(opts.width, Some(800));
        assert_eq!(opts.height, None);
        assert_eq!(opts.quality, Some(Quality::Auto));
        assert_eq!(opts.crop, Some(Crop::Thumb));
        assert_eq!(opts.gravity, Some(Gravity::Face));
        assert_eq!(opts.area, Some(Area::Team));
    }

    #[test]
    fn test_validate_rejects_out_of_range_fields() {
        assert!(TransformOptions::default().validate().is_ok());

        let zero_width = TransformOptions {
            width: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_width.validate(), Err(MediaError::InvalidReference(_))));

        let zero_height = TransformOptions {
            height: Some(0),
            ..Default::default()
        };
        assert!(zero_height.validate().is_err());

        for level in [0, 101] {
            let quality = TransformOptions {
                quality: Some(Quality::Level(level)),
                ..Default::default()
            };
            assert!(quality.validate().is_err(), "level {}", level);
        }

        let ok = TransformOptions {
            width: Some(1),
            height: Some(1),
            quality: Some(Quality::Level(100)),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_raw_options_reject_bad_numbers() {
        let zero = RawTransformOptions {
            w: Some("0".to_string()),
            ..Default::default()
        };
        assert!(matches!(zero.parse(), Err(MediaError::InvalidReference(_))));

        let negative = RawTransformOptions {
            h: Some("-5".to_string()),
            ..Default::default()
        };
        assert!(negative.parse().is_err());

        let area = RawTransformOptions {
            area: Some("sidebar".to_string()),
            ..Default::default()
        };
        assert!(matches!(area.parse(), Err(MediaError::InvalidReference(_))));
    }

    #[test]
    fn test_builder_rejects_zero() {
        assert!(TransformOptions::default().width(0).is_err());
        assert_eq!(TransformOptions::default().width(300).unwrap().width, Some(300));
    }
}
