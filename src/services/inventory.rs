use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity},
    entities::inbound_transaction::{self, Entity as InboundEntity},
    entities::inventory_level::{self, Entity as InventoryEntity},
    entities::product::{self, Entity as ProductEntity},
    entities::shipment::{self, Entity as ShipmentEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition,
    ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Derived stock classification, recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Healthy,
    LowStock,
}

impl StockStatus {
    pub fn classify(quantity: i32, safety_stock: i32) -> Self {
        if safety_stock > 0 && quantity <= safety_stock {
            StockStatus::LowStock
        } else {
            StockStatus::Healthy
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReceiveStockRequest {
    pub customer_id: i32,
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub target_stock: Option<i32>,
    pub safety_stock: Option<i32>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInventoryRequest {
    pub quantity: Option<i32>,
    pub target_stock: Option<i32>,
    pub safety_stock: Option<i32>,
}

/// Ledger record joined with display data and the derived status.
#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryRecordResponse {
    pub id: i32,
    pub customer: customer::Model,
    pub product: product::Model,
    pub quantity: i32,
    pub target_stock: i32,
    pub safety_stock: i32,
    pub updated_at: DateTime<Utc>,
    pub status: StockStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InboundTransactionResponse {
    pub id: i32,
    pub customer: customer::Model,
    pub product: product::Model,
    pub quantity: i32,
    pub inbound_date: DateTime<Utc>,
    pub remarks: Option<String>,
}

/// Applies a signed quantity delta to the `(customer, product)` ledger record
/// in a single guarded UPDATE, so the sufficiency check and the write cannot
/// be separated by a concurrent writer. Negative deltas require the on-hand
/// quantity to cover them; the failure carries the shortfall.
pub(crate) async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    customer_id: i32,
    product_id: i32,
    delta: i32,
) -> Result<inventory_level::Model, ServiceError> {
    let find_record = || {
        InventoryEntity::find()
            .filter(inventory_level::Column::CustomerId.eq(customer_id))
            .filter(inventory_level::Column::ProductId.eq(product_id))
    };

    if delta == 0 {
        return find_record().one(conn).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No inventory record for customer {} and product {}",
                customer_id, product_id
            ))
        });
    }

    let mut update = InventoryEntity::update_many()
        .col_expr(
            inventory_level::Column::Quantity,
            Expr::col(inventory_level::Column::Quantity).add(delta),
        )
        .col_expr(inventory_level::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory_level::Column::CustomerId.eq(customer_id))
        .filter(inventory_level::Column::ProductId.eq(product_id));
    if delta < 0 {
        update = update.filter(inventory_level::Column::Quantity.gte(-delta));
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        // Distinguish a missing record from an insufficient one.
        let record = find_record().one(conn).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No inventory record for customer {} and product {}",
                customer_id, product_id
            ))
        })?;
        let sku = ProductEntity::find_by_id(product_id)
            .one(conn)
            .await?
            .map(|p| p.sku_code)
            .unwrap_or_else(|| product_id.to_string());
        return Err(ServiceError::insufficient_stock(
            customer_id,
            &sku,
            -delta,
            record.quantity,
        ));
    }

    find_record().one(conn).await?.ok_or_else(|| {
        ServiceError::InternalError(format!(
            "Inventory record for customer {} and product {} vanished mid-update",
            customer_id, product_id
        ))
    })
}

/// Adds quantity back to the ledger, recreating the record if it was deleted
/// after the stock left. Used by shipment reversal; stock is never silently
/// lost.
pub(crate) async fn restore_stock<C: ConnectionTrait>(
    conn: &C,
    customer_id: i32,
    product_id: i32,
    quantity: i32,
) -> Result<inventory_level::Model, ServiceError> {
    match apply_stock_delta(conn, customer_id, product_id, quantity).await {
        Ok(record) => Ok(record),
        Err(ServiceError::NotFound(_)) => {
            let record = inventory_level::ActiveModel {
                id: NotSet,
                customer_id: Set(customer_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                target_stock: Set(0),
                safety_stock: Set(0),
                updated_at: Set(Utc::now()),
            }
            .insert(conn)
            .await?;
            info!(
                customer_id,
                product_id, quantity, "recreated inventory record during reversal"
            );
            Ok(record)
        }
        Err(e) => Err(e),
    }
}

/// Service owning the inventory ledger and the inbound audit trail.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists ledger records with display data, optionally filtered by
    /// customer. Status is derived per read.
    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        customer_id: Option<i32>,
    ) -> Result<Vec<InventoryRecordResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = InventoryEntity::find().order_by_asc(inventory_level::Column::Id);
        if let Some(customer_id) = customer_id {
            query = query.filter(inventory_level::Column::CustomerId.eq(customer_id));
        }
        let records = query.all(db).await?;

        let (customers, products) = self
            .display_maps(
                records.iter().map(|r| r.customer_id).collect(),
                records.iter().map(|r| r.product_id).collect(),
            )
            .await?;

        records
            .into_iter()
            .map(|r| {
                let customer = customers
                    .get(&r.customer_id)
                    .cloned()
                    .ok_or_else(|| missing_display("customer", r.customer_id))?;
                let product = products
                    .get(&r.product_id)
                    .cloned()
                    .ok_or_else(|| missing_display("product", r.product_id))?;
                Ok(InventoryRecordResponse {
                    id: r.id,
                    customer,
                    product,
                    quantity: r.quantity,
                    target_stock: r.target_stock,
                    safety_stock: r.safety_stock,
                    updated_at: r.updated_at,
                    status: StockStatus::classify(r.quantity, r.safety_stock),
                })
            })
            .collect()
    }

    /// Stock-in: increments the ledger record (creating it on first receipt)
    /// and appends the immutable inbound row, in one transaction.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id, product_id = request.product_id, quantity = request.quantity))]
    pub async fn receive_stock(
        &self,
        request: ReceiveStockRequest,
    ) -> Result<InventoryRecordResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let customer = CustomerEntity::find_by_id(request.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;
        let product = ProductEntity::find_by_id(request.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let txn = db.begin().await?;

        inbound_transaction::ActiveModel {
            id: NotSet,
            customer_id: Set(request.customer_id),
            product_id: Set(request.product_id),
            quantity: Set(request.quantity),
            inbound_date: Set(Utc::now()),
            remarks: Set(Some(
                request
                    .remarks
                    .clone()
                    .unwrap_or_else(|| "Initialization".to_string()),
            )),
        }
        .insert(&txn)
        .await?;

        let existing = InventoryEntity::find()
            .filter(inventory_level::Column::CustomerId.eq(request.customer_id))
            .filter(inventory_level::Column::ProductId.eq(request.product_id))
            .one(&txn)
            .await?;

        let record = match existing {
            Some(_) => {
                let updated = apply_stock_delta(
                    &txn,
                    request.customer_id,
                    request.product_id,
                    request.quantity,
                )
                .await?;
                let mut active: inventory_level::ActiveModel = updated.into();
                if let Some(target) = request.target_stock {
                    active.target_stock = Set(target);
                }
                if let Some(safety) = request.safety_stock {
                    active.safety_stock = Set(safety);
                }
                active.update(&txn).await?
            }
            None => {
                inventory_level::ActiveModel {
                    id: NotSet,
                    customer_id: Set(request.customer_id),
                    product_id: Set(request.product_id),
                    quantity: Set(request.quantity),
                    target_stock: Set(request.target_stock.unwrap_or(0)),
                    safety_stock: Set(request.safety_stock.unwrap_or(0)),
                    updated_at: Set(Utc::now()),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;

        info!(record_id = record.id, "stock received");
        if let Err(e) = self
            .event_sender
            .send(Event::StockReceived {
                customer_id: request.customer_id,
                product_id: request.product_id,
                quantity: request.quantity,
            })
            .await
        {
            warn!(error = %e, "failed to send stock received event");
        }

        Ok(InventoryRecordResponse {
            id: record.id,
            status: StockStatus::classify(record.quantity, record.safety_stock),
            quantity: record.quantity,
            target_stock: record.target_stock,
            safety_stock: record.safety_stock,
            updated_at: record.updated_at,
            customer,
            product,
        })
    }

    /// Direct overwrite of quantity and/or thresholds. A quantity change goes
    /// through the ledger delta helper and leaves an adjustment row in the
    /// inbound history; threshold-only updates leave no history.
    #[instrument(skip(self, request), fields(record_id = record_id))]
    pub async fn update_inventory(
        &self,
        record_id: i32,
        request: UpdateInventoryRequest,
    ) -> Result<InventoryRecordResponse, ServiceError> {
        let db = &*self.db_pool;

        let record = InventoryEntity::find_by_id(record_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory record {} not found", record_id))
            })?;

        if let Some(quantity) = request.quantity {
            if quantity < 0 {
                return Err(ServiceError::ValidationError(
                    "Quantity cannot be negative".to_string(),
                ));
            }
        }

        let txn = db.begin().await?;

        let old_quantity = record.quantity;
        let mut current = record;

        if let Some(new_quantity) = request.quantity {
            let diff = new_quantity - current.quantity;
            if diff != 0 {
                inbound_transaction::ActiveModel {
                    id: NotSet,
                    customer_id: Set(current.customer_id),
                    product_id: Set(current.product_id),
                    quantity: Set(diff),
                    inbound_date: Set(Utc::now()),
                    remarks: Set(Some(format!(
                        "Manual Adjustment (Set Qty: {} -> {})",
                        current.quantity, new_quantity
                    ))),
                }
                .insert(&txn)
                .await?;

                current =
                    apply_stock_delta(&txn, current.customer_id, current.product_id, diff).await?;
            }
        }

        if request.target_stock.is_some() || request.safety_stock.is_some() {
            let mut active: inventory_level::ActiveModel = current.clone().into();
            if let Some(target) = request.target_stock {
                active.target_stock = Set(target);
            }
            if let Some(safety) = request.safety_stock {
                active.safety_stock = Set(safety);
            }
            active.updated_at = Set(Utc::now());
            current = active.update(&txn).await?;
        }

        txn.commit().await?;

        if old_quantity != current.quantity {
            info!(
                record_id,
                old_quantity,
                new_quantity = current.quantity,
                "inventory overwritten"
            );
            if let Err(e) = self
                .event_sender
                .send(Event::InventoryAdjusted {
                    customer_id: current.customer_id,
                    product_id: current.product_id,
                    old_quantity,
                    new_quantity: current.quantity,
                })
                .await
            {
                warn!(error = %e, "failed to send inventory adjusted event");
            }
        }

        let (customers, products) = self
            .display_maps(vec![current.customer_id], vec![current.product_id])
            .await?;
        let customer = customers
            .get(&current.customer_id)
            .cloned()
            .ok_or_else(|| missing_display("customer", current.customer_id))?;
        let product = products
            .get(&current.product_id)
            .cloned()
            .ok_or_else(|| missing_display("product", current.product_id))?;

        Ok(InventoryRecordResponse {
            id: current.id,
            status: StockStatus::classify(current.quantity, current.safety_stock),
            quantity: current.quantity,
            target_stock: current.target_stock,
            safety_stock: current.safety_stock,
            updated_at: current.updated_at,
            customer,
            product,
        })
    }

    /// Deletes a ledger record. Allowed only when no shipment line or inbound
    /// row references the `(customer, product)` pair.
    #[instrument(skip(self))]
    pub async fn delete_inventory(&self, record_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let record = InventoryEntity::find_by_id(record_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory record {} not found", record_id))
            })?;

        let shipment_refs = ShipmentEntity::find()
            .filter(
                Condition::all()
                    .add(shipment::Column::SourceCustomerId.eq(record.customer_id))
                    .add(shipment::Column::ProductId.eq(record.product_id)),
            )
            .count(db)
            .await?;
        let inbound_refs = InboundEntity::find()
            .filter(inbound_transaction::Column::CustomerId.eq(record.customer_id))
            .filter(inbound_transaction::Column::ProductId.eq(record.product_id))
            .count(db)
            .await?;

        if shipment_refs + inbound_refs > 0 {
            return Err(ServiceError::Conflict(format!(
                "Inventory record {} is referenced by shipments or inbound history",
                record_id
            )));
        }

        record.delete(db).await?;
        info!(record_id, "inventory record deleted");
        Ok(())
    }

    /// Inbound audit trail, newest first.
    #[instrument(skip(self))]
    pub async fn inbound_history(&self) -> Result<Vec<InboundTransactionResponse>, ServiceError> {
        let db = &*self.db_pool;

        let rows = InboundEntity::find()
            .order_by_desc(inbound_transaction::Column::InboundDate)
            .order_by_desc(inbound_transaction::Column::Id)
            .all(db)
            .await?;

        let (customers, products) = self
            .display_maps(
                rows.iter().map(|r| r.customer_id).collect(),
                rows.iter().map(|r| r.product_id).collect(),
            )
            .await?;

        rows.into_iter()
            .map(|r| {
                let customer = customers
                    .get(&r.customer_id)
                    .cloned()
                    .ok_or_else(|| missing_display("customer", r.customer_id))?;
                let product = products
                    .get(&r.product_id)
                    .cloned()
                    .ok_or_else(|| missing_display("product", r.product_id))?;
                Ok(InboundTransactionResponse {
                    id: r.id,
                    customer,
                    product,
                    quantity: r.quantity,
                    inbound_date: r.inbound_date,
                    remarks: r.remarks,
                })
            })
            .collect()
    }

    async fn display_maps(
        &self,
        customer_ids: Vec<i32>,
        product_ids: Vec<i32>,
    ) -> Result<
        (
            HashMap<i32, customer::Model>,
            HashMap<i32, product::Model>,
        ),
        ServiceError,
    > {
        let db = &*self.db_pool;
        let customers = if customer_ids.is_empty() {
            Vec::new()
        } else {
            CustomerEntity::find()
                .filter(customer::Column::Id.is_in(customer_ids))
                .all(db)
                .await?
        };
        let products = if product_ids.is_empty() {
            Vec::new()
        } else {
            ProductEntity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(db)
                .await?
        };
        Ok((
            customers.into_iter().map(|c| (c.id, c)).collect(),
            products.into_iter().map(|p| (p.id, p)).collect(),
        ))
    }
}

fn missing_display(kind: &str, id: i32) -> ServiceError {
    ServiceError::InternalError(format!("dangling {} reference: {}", kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_low_stock_at_threshold() {
        assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(4, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(6, 5), StockStatus::Healthy);
    }

    #[test]
    fn classify_without_safety_stock_is_healthy() {
        assert_eq!(StockStatus::classify(0, 0), StockStatus::Healthy);
        assert_eq!(StockStatus::classify(100, 0), StockStatus::Healthy);
    }
}
