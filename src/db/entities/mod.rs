//! Database entities

pub mod logical_placeholder;
pub mod physical_asset;
pub mod placeholder_link;
