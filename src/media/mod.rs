//! Media identity and resolution.
//!
//! Placeholders on the site carry stable logical IDs. This module maps those
//! IDs to physical assets on the CDN and builds delivery URLs for them.

mod dedupe;
mod fallback;
mod model;
mod placement;
mod registrar;
mod resolver;
mod transform;
mod url;

pub use dedupe::{dedupe, DedupeReport, Rename};
pub use fallback::FallbackTable;
pub use model::{
    validate_id, AssetMetadata, Dimensions, LogicalPlaceholder, PhysicalAsset,
    PlaceholderAssetLink, ResourceType,
};
pub use placement::{get_placement, Area, Placement};
pub use registrar::AssetRegistrar;
pub use resolver::{Resolution, ResolutionSource, Resolver};
pub use transform::RawTransformOptions;
pub use url::{Delivery, UrlBuilder};
