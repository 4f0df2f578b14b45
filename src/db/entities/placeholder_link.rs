//! Placeholder → asset link entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "placeholder_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub placeholder_id: String,
    pub public_id: String,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::physical_asset::Entity",
        from = "Column::PublicId",
        to = "super::physical_asset::Column::PublicId"
    )]
    Asset,
}

impl Related<super::physical_asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
