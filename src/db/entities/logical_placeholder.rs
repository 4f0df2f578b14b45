//! Discovered placeholder entity.
//!
//! `placeholder_id` is deliberately not unique here: rows are persisted as
//! discovered and the consistency pass renames duplicates in place.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "logical_placeholders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub placeholder_id: String,
    pub area: String,
    pub page: String,
    pub section: String,
    pub dimensions: Option<String>, // JSON {width,height,aspectRatio}
    pub description: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
