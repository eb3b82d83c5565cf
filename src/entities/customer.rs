use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[validate(length(min = 1, max = 255, message = "Customer name is required"))]
    pub name: String,

    pub contact_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_level::Entity")]
    InventoryLevels,
    #[sea_orm(has_many = "super::customer_product::Entity")]
    CustomerProducts,
    #[sea_orm(has_many = "super::inbound_transaction::Entity")]
    InboundTransactions,
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

impl Related<super::inbound_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InboundTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
