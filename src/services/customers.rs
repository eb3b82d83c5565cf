use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity},
    entities::customer_product::{self, Entity as CustomerProductEntity},
    entities::inbound_transaction::{self, Entity as InboundEntity},
    entities::inventory_level::{self, Entity as InventoryEntity},
    entities::product::{self, Entity as ProductEntity},
    entities::shipment::{self, Entity as ShipmentEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "Customer name is required"))]
    pub name: String,
    pub contact_info: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "Customer name is required"))]
    pub name: String,
    pub contact_info: Option<String>,
}

/// Customer with its authorized products embedded.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i32,
    pub name: String,
    pub contact_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub products: Vec<product::Model>,
}

/// Service owning the customer side of the catalog, including the
/// customer-product authorization links.
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let model = customer::ActiveModel {
            id: NotSet,
            name: Set(request.name),
            contact_info: Set(request.contact_info),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(customer_id = model.id, "customer created");
        if let Err(e) = self.event_sender.send(Event::CustomerCreated(model.id)).await {
            warn!(error = %e, "failed to send customer created event");
        }

        Ok(model)
    }

    /// Lists customers, each with the products it is authorized to transact.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerResponse>, ServiceError> {
        let db = &*self.db_pool;

        let customers = CustomerEntity::find()
            .order_by_asc(customer::Column::Id)
            .all(db)
            .await?;

        let mut responses = Vec::with_capacity(customers.len());
        for cust in customers {
            let products = self.authorized_products_on(db, cust.id).await?;
            responses.push(CustomerResponse {
                id: cust.id,
                name: cust.name,
                contact_info: cust.contact_info,
                created_at: cust.created_at,
                products,
            });
        }
        Ok(responses)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: i32) -> Result<CustomerResponse, ServiceError> {
        let db = &*self.db_pool;
        let cust = CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

        let products = self.authorized_products_on(db, cust.id).await?;
        Ok(CustomerResponse {
            id: cust.id,
            name: cust.name,
            contact_info: cust.contact_info,
            created_at: cust.created_at,
            products,
        })
    }

    #[instrument(skip(self, request), fields(customer_id = customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: i32,
        request: UpdateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let existing = CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

        let mut active: customer::ActiveModel = existing.into();
        active.name = Set(request.name);
        active.contact_info = Set(request.contact_info);
        let updated = active.update(db).await?;

        info!(customer_id = updated.id, "customer updated");
        Ok(updated)
    }

    /// Deletes a customer. Rejected while the customer still holds non-zero
    /// inventory or is referenced by shipments or inbound history; empty
    /// ledger records and authorization links are cleaned up alongside.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let cust = CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

        let live_stock = InventoryEntity::find()
            .filter(inventory_level::Column::CustomerId.eq(customer_id))
            .filter(inventory_level::Column::Quantity.ne(0))
            .count(db)
            .await?;
        if live_stock > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} still holds inventory",
                customer_id
            )));
        }

        let shipment_refs = ShipmentEntity::find()
            .filter(
                Condition::any()
                    .add(shipment::Column::CustomerId.eq(customer_id))
                    .add(shipment::Column::SourceCustomerId.eq(customer_id)),
            )
            .count(db)
            .await?;
        if shipment_refs > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} is referenced by shipments",
                customer_id
            )));
        }

        let inbound_refs = InboundEntity::find()
            .filter(inbound_transaction::Column::CustomerId.eq(customer_id))
            .count(db)
            .await?;
        if inbound_refs > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} is referenced by inbound history",
                customer_id
            )));
        }

        let txn = db.begin().await?;
        InventoryEntity::delete_many()
            .filter(inventory_level::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;
        CustomerProductEntity::delete_many()
            .filter(customer_product::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;
        cust.delete(&txn).await?;
        txn.commit().await?;

        info!(customer_id = customer_id, "customer deleted");
        if let Err(e) = self
            .event_sender
            .send(Event::CustomerDeleted(customer_id))
            .await
        {
            warn!(error = %e, "failed to send customer deleted event");
        }
        Ok(())
    }

    /// Links a product to a customer. Linking an already-linked pair is a
    /// no-op.
    #[instrument(skip(self))]
    pub async fn link_product(&self, customer_id: i32, product_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;
        ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let existing = CustomerProductEntity::find_by_id((customer_id, product_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        customer_product::ActiveModel {
            customer_id: Set(customer_id),
            product_id: Set(product_id),
        }
        .insert(db)
        .await?;

        info!(customer_id, product_id, "product linked to customer");
        if let Err(e) = self
            .event_sender
            .send(Event::ProductLinked {
                customer_id,
                product_id,
            })
            .await
        {
            warn!(error = %e, "failed to send product linked event");
        }
        Ok(())
    }

    /// Unlinks a product from a customer. Unlinking an unlinked pair is a
    /// no-op.
    #[instrument(skip(self))]
    pub async fn unlink_product(
        &self,
        customer_id: i32,
        product_id: i32,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let Some(link) = CustomerProductEntity::find_by_id((customer_id, product_id))
            .one(db)
            .await?
        else {
            return Ok(());
        };

        link.delete(db).await?;

        info!(customer_id, product_id, "product unlinked from customer");
        if let Err(e) = self
            .event_sender
            .send(Event::ProductUnlinked {
                customer_id,
                product_id,
            })
            .await
        {
            warn!(error = %e, "failed to send product unlinked event");
        }
        Ok(())
    }

    /// Lists products the customer is authorized to hold and ship.
    #[instrument(skip(self))]
    pub async fn authorized_products(
        &self,
        customer_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let db = &*self.db_pool;
        CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;
        self.authorized_products_on(db, customer_id).await
    }

    async fn authorized_products_on(
        &self,
        db: &DbPool,
        customer_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let links = CustomerProductEntity::find()
            .filter(customer_product::Column::CustomerId.eq(customer_id))
            .all(db)
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }
        let product_ids: Vec<i32> = links.iter().map(|l| l.product_id).collect();
        let products = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .order_by_asc(product::Column::Id)
            .all(db)
            .await?;
        Ok(products)
    }
}
