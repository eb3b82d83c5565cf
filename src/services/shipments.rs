use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity},
    entities::customer_product::{self, Entity as CustomerProductEntity},
    entities::inventory_level::{self, Entity as InventoryEntity},
    entities::product::{self, Entity as ProductEntity},
    entities::shipment::{self, Entity as ShipmentEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::{apply_stock_delta, restore_stock},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// One requested allocation line. The source customer defaults to the
/// selling customer when omitted (single-source shipments are the special
/// case of per-line sourcing).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShipmentLineRequest {
    pub source_customer_id: Option<i32>,
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShipmentBatchRequest {
    pub customer_id: i32,
    pub shipment_date: DateTime<Utc>,
    pub rma_ticket: Option<String>,
    pub lines: Vec<ShipmentLineRequest>,
}

/// Single-line creation; sugar for a batch of one.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShipmentRequest {
    pub customer_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub shipment_date: DateTime<Utc>,
    pub rma_ticket: Option<String>,
    pub source_customer_id: Option<i32>,
}

/// Only quantity, date and RMA ticket are mutable after creation. Changing
/// the product or source customer requires delete + recreate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShipmentRequest {
    pub quantity: Option<i32>,
    pub shipment_date: Option<DateTime<Utc>>,
    pub rma_ticket: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentResponse {
    pub id: i32,
    pub customer: customer::Model,
    pub source_customer: customer::Model,
    pub product: product::Model,
    pub quantity: i32,
    pub shipment_date: DateTime<Utc>,
    pub rma_ticket: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated line ready to apply: source resolved, display data fetched.
struct ResolvedLine {
    source_customer_id: i32,
    product_id: i32,
    quantity: i32,
}

/// The outbound allocator. Batch creation validates every line before any
/// mutation, then debits the ledger and inserts the lines in one
/// transaction; edits apply quantity deltas; deletion reverses the debit.
#[derive(Clone)]
pub struct ShipmentService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ShipmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a batch of shipment lines sold under one selling customer.
    ///
    /// All lines succeed or none do. Validation runs over the whole batch
    /// before the first ledger write, naming the first failing line; the
    /// guarded ledger updates inside the transaction re-check sufficiency,
    /// so a concurrent writer between validation and apply rolls the whole
    /// batch back. Ledger debits are applied in ascending
    /// `(customer, product)` order so overlapping batches cannot deadlock.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id, lines = request.lines.len()))]
    pub async fn create_batch(
        &self,
        request: CreateShipmentBatchRequest,
    ) -> Result<Vec<ShipmentResponse>, ServiceError> {
        let db = &*self.db_pool;

        // Client-side pre-filter: drop malformed lines, reject an empty rest.
        let lines: Vec<ShipmentLineRequest> = request
            .lines
            .iter()
            .filter(|l| l.product_id > 0 && l.quantity > 0)
            .cloned()
            .collect();
        if lines.is_empty() {
            return Err(ServiceError::ValidationError("no valid items".to_string()));
        }

        let selling_customer = CustomerEntity::find_by_id(request.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let resolved = self
            .validate_batch(request.customer_id, &lines)
            .await?;

        // Aggregate demand per ledger record; BTreeMap gives the
        // deterministic ascending apply order.
        let mut demand: BTreeMap<(i32, i32), i32> = BTreeMap::new();
        for line in &resolved {
            *demand
                .entry((line.source_customer_id, line.product_id))
                .or_insert(0) += line.quantity;
        }

        let txn = db.begin().await?;

        for (&(customer_id, product_id), &total) in &demand {
            apply_stock_delta(&txn, customer_id, product_id, -total).await?;
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(resolved.len());
        for line in &resolved {
            let model = shipment::ActiveModel {
                id: NotSet,
                customer_id: Set(request.customer_id),
                source_customer_id: Set(line.source_customer_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                shipment_date: Set(request.shipment_date),
                rma_ticket: Set(request.rma_ticket.clone()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            created.push(model);
        }

        txn.commit().await?;

        let shipment_ids: Vec<i32> = created.iter().map(|s| s.id).collect();
        info!(?shipment_ids, "shipment batch created");
        if let Err(e) = self
            .event_sender
            .send(Event::ShipmentBatchCreated {
                customer_id: request.customer_id,
                shipment_ids,
            })
            .await
        {
            warn!(error = %e, "failed to send shipment batch created event");
        }

        self.to_responses(created, Some(selling_customer)).await
    }

    /// Single-line creation as a batch of one (source defaults to seller).
    #[instrument(skip(self, request), fields(customer_id = request.customer_id))]
    pub async fn create_shipment(
        &self,
        request: CreateShipmentRequest,
    ) -> Result<ShipmentResponse, ServiceError> {
        let batch = CreateShipmentBatchRequest {
            customer_id: request.customer_id,
            shipment_date: request.shipment_date,
            rma_ticket: request.rma_ticket,
            lines: vec![ShipmentLineRequest {
                source_customer_id: request.source_customer_id,
                product_id: request.product_id,
                quantity: request.quantity,
            }],
        };
        let mut responses = self.create_batch(batch).await?;
        responses.pop().ok_or_else(|| {
            ServiceError::InternalError("batch of one produced no shipment".to_string())
        })
    }

    /// Lists shipment lines with display data, newest first.
    #[instrument(skip(self))]
    pub async fn list_shipments(&self) -> Result<Vec<ShipmentResponse>, ServiceError> {
        let db = &*self.db_pool;
        let rows = ShipmentEntity::find()
            .order_by_desc(shipment::Column::CreatedAt)
            .order_by_desc(shipment::Column::Id)
            .all(db)
            .await?;
        self.to_responses(rows, None).await
    }

    #[instrument(skip(self))]
    pub async fn get_shipment(&self, shipment_id: i32) -> Result<ShipmentResponse, ServiceError> {
        let db = &*self.db_pool;
        let row = ShipmentEntity::find_by_id(shipment_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shipment {} not found", shipment_id))
            })?;
        let mut responses = self.to_responses(vec![row], None).await?;
        responses.pop().ok_or_else(|| {
            ServiceError::InternalError("shipment lookup produced no response".to_string())
        })
    }

    /// Edits a line. A quantity change applies only the delta to the source
    /// ledger record, atomically with the row update; an increase the record
    /// cannot cover fails with the shortfall and changes nothing. Repeating
    /// an identical edit is a no-op.
    #[instrument(skip(self, request), fields(shipment_id = shipment_id))]
    pub async fn update_shipment(
        &self,
        shipment_id: i32,
        request: UpdateShipmentRequest,
    ) -> Result<ShipmentResponse, ServiceError> {
        let db = &*self.db_pool;

        if let Some(quantity) = request.quantity {
            if quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Quantity must be positive".to_string(),
                ));
            }
        }

        let txn = db.begin().await?;

        let existing = ShipmentEntity::find_by_id(shipment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shipment {} not found", shipment_id))
            })?;

        let mut quantity_delta = 0;
        if let Some(new_quantity) = request.quantity {
            quantity_delta = new_quantity - existing.quantity;
            if quantity_delta != 0 {
                // The ledger loses what the shipment gains.
                apply_stock_delta(
                    &txn,
                    existing.source_customer_id,
                    existing.product_id,
                    -quantity_delta,
                )
                .await?;
            }
        }

        let mut active: shipment::ActiveModel = existing.into();
        if let Some(quantity) = request.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(date) = request.shipment_date {
            active.shipment_date = Set(date);
        }
        if let Some(rma) = request.rma_ticket {
            active.rma_ticket = Set(Some(rma));
        }
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(shipment_id, quantity_delta, "shipment updated");
        if let Err(e) = self
            .event_sender
            .send(Event::ShipmentUpdated {
                shipment_id,
                quantity_delta,
            })
            .await
        {
            warn!(error = %e, "failed to send shipment updated event");
        }

        let mut responses = self.to_responses(vec![updated], None).await?;
        responses.pop().ok_or_else(|| {
            ServiceError::InternalError("shipment update produced no response".to_string())
        })
    }

    /// Deletes a line, returning its full quantity to the source ledger
    /// record (recreating the record if it no longer exists). Once the line
    /// exists this has no business-rule rejection path.
    #[instrument(skip(self))]
    pub async fn delete_shipment(&self, shipment_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await?;

        let existing = ShipmentEntity::find_by_id(shipment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shipment {} not found", shipment_id))
            })?;

        restore_stock(
            &txn,
            existing.source_customer_id,
            existing.product_id,
            existing.quantity,
        )
        .await?;

        let restored_quantity = existing.quantity;
        existing.delete(&txn).await?;

        txn.commit().await?;

        info!(shipment_id, restored_quantity, "shipment reversed");
        if let Err(e) = self
            .event_sender
            .send(Event::ShipmentReversed {
                shipment_id,
                restored_quantity,
            })
            .await
        {
            warn!(error = %e, "failed to send shipment reversed event");
        }
        Ok(())
    }

    /// Pre-flight validation over the whole batch. Checks every line in
    /// submission order and fails on the first violation, before anything is
    /// written: source customer exists, product exists, product is linked to
    /// the source customer, and cumulative demand per ledger record is
    /// covered by on-hand stock.
    async fn validate_batch(
        &self,
        selling_customer_id: i32,
        lines: &[ShipmentLineRequest],
    ) -> Result<Vec<ResolvedLine>, ServiceError> {
        let db = &*self.db_pool;

        let resolved: Vec<ResolvedLine> = lines
            .iter()
            .map(|l| ResolvedLine {
                source_customer_id: l.source_customer_id.unwrap_or(selling_customer_id),
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect();

        let customer_ids: HashSet<i32> =
            resolved.iter().map(|l| l.source_customer_id).collect();
        let product_ids: HashSet<i32> = resolved.iter().map(|l| l.product_id).collect();

        let customers: HashMap<i32, customer::Model> = CustomerEntity::find()
            .filter(customer::Column::Id.is_in(customer_ids.iter().copied().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let products: HashMap<i32, product::Model> = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids.iter().copied().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let links: HashSet<(i32, i32)> = CustomerProductEntity::find()
            .filter(
                customer_product::Column::CustomerId
                    .is_in(customer_ids.iter().copied().collect::<Vec<_>>()),
            )
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.customer_id, l.product_id))
            .collect();
        let records: HashMap<(i32, i32), inventory_level::Model> = InventoryEntity::find()
            .filter(
                inventory_level::Column::CustomerId
                    .is_in(customer_ids.iter().copied().collect::<Vec<_>>()),
            )
            .all(db)
            .await?
            .into_iter()
            .map(|r| ((r.customer_id, r.product_id), r))
            .collect();

        // Cumulative demand per record so two lines against the same stock
        // cannot each pass alone yet overdraw together.
        let mut claimed: HashMap<(i32, i32), i32> = HashMap::new();

        for (idx, line) in resolved.iter().enumerate() {
            let line_no = idx + 1;

            let Some(_source) = customers.get(&line.source_customer_id) else {
                return Err(ServiceError::NotFound(format!(
                    "line {}: source customer {} not found",
                    line_no, line.source_customer_id
                )));
            };
            let Some(product) = products.get(&line.product_id) else {
                return Err(ServiceError::NotFound(format!(
                    "line {}: product {} not found",
                    line_no, line.product_id
                )));
            };
            if !links.contains(&(line.source_customer_id, line.product_id)) {
                return Err(ServiceError::UnauthorizedSku(format!(
                    "line {}: SKU {} is not linked to customer {}",
                    line_no, product.sku_code, line.source_customer_id
                )));
            }

            let key = (line.source_customer_id, line.product_id);
            let on_hand = records.get(&key).map(|r| r.quantity).unwrap_or(0);
            let already_claimed = claimed.get(&key).copied().unwrap_or(0);
            let available = on_hand - already_claimed;
            if available < line.quantity {
                return Err(ServiceError::insufficient_stock(
                    line.source_customer_id,
                    &product.sku_code,
                    line.quantity,
                    available.max(0),
                ));
            }
            *claimed.entry(key).or_insert(0) += line.quantity;
        }

        Ok(resolved)
    }

    /// Joins shipment rows with customer/product display data, preserving
    /// row order.
    async fn to_responses(
        &self,
        rows: Vec<shipment::Model>,
        selling_customer: Option<customer::Model>,
    ) -> Result<Vec<ShipmentResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut customer_ids: HashSet<i32> = HashSet::new();
        let mut product_ids: HashSet<i32> = HashSet::new();
        for row in &rows {
            customer_ids.insert(row.customer_id);
            customer_ids.insert(row.source_customer_id);
            product_ids.insert(row.product_id);
        }

        let mut customers: HashMap<i32, customer::Model> = CustomerEntity::find()
            .filter(customer::Column::Id.is_in(customer_ids.into_iter().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        if let Some(cust) = selling_customer {
            customers.entry(cust.id).or_insert(cust);
        }
        let products: HashMap<i32, product::Model> = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids.into_iter().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        rows.into_iter()
            .map(|row| {
                let customer = customers.get(&row.customer_id).cloned().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "dangling customer reference: {}",
                        row.customer_id
                    ))
                })?;
                let source_customer = customers
                    .get(&row.source_customer_id)
                    .cloned()
                    .ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "dangling customer reference: {}",
                            row.source_customer_id
                        ))
                    })?;
                let product = products.get(&row.product_id).cloned().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "dangling product reference: {}",
                        row.product_id
                    ))
                })?;
                Ok(ShipmentResponse {
                    id: row.id,
                    customer,
                    source_customer,
                    product,
                    quantity: row.quantity,
                    shipment_date: row.shipment_date,
                    rma_ticket: row.rma_ticket,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}
