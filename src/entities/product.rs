use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique across the catalog; enforced by a unique index and re-checked on update.
    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 64, message = "SKU code is required"))]
    pub sku_code: String,

    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,

    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_level::Entity")]
    InventoryLevels,
    #[sea_orm(has_many = "super::customer_product::Entity")]
    CustomerProducts,
    #[sea_orm(has_many = "super::shipment::Entity")]
    Shipments,
}

impl Related<super::inventory_level::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryLevels.def()
    }
}

impl Related<super::customer_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerProducts.def()
    }
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
