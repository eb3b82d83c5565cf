use crate::{
    db::DbPool,
    entities::customer_product::{self, Entity as CustomerProductEntity},
    entities::inbound_transaction::{self, Entity as InboundEntity},
    entities::inventory_level::{self, Entity as InventoryEntity},
    entities::product::{self, Entity as ProductEntity},
    entities::shipment::{self, Entity as ShipmentEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU code is required"))]
    pub sku_code: String,
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU code is required"))]
    pub sku_code: String,
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
}

/// Service owning the product side of the catalog.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a product. The SKU code must be unique across the catalog.
    #[instrument(skip(self, request), fields(sku_code = %request.sku_code))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let duplicate = ProductEntity::find()
            .filter(product::Column::SkuCode.eq(request.sku_code.clone()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "SKU {} already exists",
                request.sku_code
            )));
        }

        let sku_code = request.sku_code.clone();
        let model = product::ActiveModel {
            id: NotSet,
            sku_code: Set(request.sku_code),
            name: Set(request.name),
            description: Set(request.description),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| duplicate_sku_conflict(e, &sku_code))?;

        info!(product_id = model.id, sku_code = %model.sku_code, "product created");
        if let Err(e) = self.event_sender.send(Event::ProductCreated(model.id)).await {
            warn!(error = %e, "failed to send product created event");
        }
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let db = &*self.db_pool;
        let products = ProductEntity::find()
            .order_by_asc(product::Column::Id)
            .all(db)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;
        ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Updates a product. A changed SKU is re-checked for uniqueness.
    #[instrument(skip(self, request), fields(product_id = product_id))]
    pub async fn update_product(
        &self,
        product_id: i32,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let existing = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if request.sku_code != existing.sku_code {
            let duplicate = ProductEntity::find()
                .filter(product::Column::SkuCode.eq(request.sku_code.clone()))
                .one(db)
                .await?;
            if duplicate.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "SKU {} already exists",
                    request.sku_code
                )));
            }
        }

        let sku_code = request.sku_code.clone();
        let mut active: product::ActiveModel = existing.into();
        active.sku_code = Set(request.sku_code);
        active.name = Set(request.name);
        active.description = Set(request.description);
        let updated = active
            .update(db)
            .await
            .map_err(|e| duplicate_sku_conflict(e, &sku_code))?;

        info!(product_id = updated.id, "product updated");
        Ok(updated)
    }

    /// Deletes a product. Rejected while inventory records, shipment lines,
    /// inbound history, or customer authorization links reference it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let prod = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let inventory_refs = InventoryEntity::find()
            .filter(inventory_level::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        let shipment_refs = ShipmentEntity::find()
            .filter(shipment::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        let inbound_refs = InboundEntity::find()
            .filter(inbound_transaction::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        let link_refs = CustomerProductEntity::find()
            .filter(customer_product::Column::ProductId.eq(product_id))
            .count(db)
            .await?;

        if inventory_refs + shipment_refs + inbound_refs + link_refs > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} is still referenced by inventory, shipments, history, or links",
                product_id
            )));
        }

        prod.delete(db).await?;

        info!(product_id = product_id, "product deleted");
        if let Err(e) = self
            .event_sender
            .send(Event::ProductDeleted(product_id))
            .await
        {
            warn!(error = %e, "failed to send product deleted event");
        }
        Ok(())
    }
}

/// The pre-insert duplicate check can lose a race with a concurrent writer;
/// the unique index on `sku_code` then fires and must surface as the same
/// `Conflict` the sequential path returns.
fn duplicate_sku_conflict(err: DbErr, sku_code: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict(format!("SKU {} already exists", sku_code))
        }
        _ => ServiceError::DatabaseError(err),
    }
}
