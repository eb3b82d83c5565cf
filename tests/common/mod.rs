// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::mpsc;
use warehouse_api::{
    config::AppConfig,
    db::{self, DbPool},
    events::EventSender,
    handlers::AppServices,
    services::{
        customers::CreateCustomerRequest, inventory::ReceiveStockRequest,
        products::CreateProductRequest,
    },
};

/// Test harness over an in-memory SQLite database with migrations applied.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18_080);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let (tx, rx) = mpsc::channel(64);
        let event_sender = EventSender::new(tx);
        let event_task = tokio::spawn(warehouse_api::events::process_events(rx));

        let db = Arc::new(pool);
        let services = AppServices::new(db.clone(), event_sender);

        Self {
            db,
            services,
            _event_task: event_task,
        }
    }

    pub async fn create_customer(&self, name: &str) -> i32 {
        self.services
            .customers
            .create_customer(CreateCustomerRequest {
                name: name.to_string(),
                contact_info: None,
            })
            .await
            .expect("failed to create customer")
            .id
    }

    pub async fn create_product(&self, sku: &str, name: &str) -> i32 {
        self.services
            .products
            .create_product(CreateProductRequest {
                sku_code: sku.to_string(),
                name: name.to_string(),
                description: None,
            })
            .await
            .expect("failed to create product")
            .id
    }

    pub async fn link(&self, customer_id: i32, product_id: i32) {
        self.services
            .customers
            .link_product(customer_id, product_id)
            .await
            .expect("failed to link product");
    }

    /// Creates customer + product + link and receives `quantity` into stock.
    /// Returns `(customer_id, product_id)`.
    pub async fn seed_stock(&self, name: &str, sku: &str, quantity: i32) -> (i32, i32) {
        let customer_id = self.create_customer(name).await;
        let product_id = self.create_product(sku, sku).await;
        self.link(customer_id, product_id).await;
        self.receive(customer_id, product_id, quantity).await;
        (customer_id, product_id)
    }

    pub async fn receive(&self, customer_id: i32, product_id: i32, quantity: i32) {
        self.services
            .inventory
            .receive_stock(ReceiveStockRequest {
                customer_id,
                product_id,
                quantity,
                target_stock: None,
                safety_stock: None,
                remarks: None,
            })
            .await
            .expect("failed to receive stock");
    }

    /// On-hand quantity for the pair, or 0 when no record exists.
    pub async fn on_hand(&self, customer_id: i32, product_id: i32) -> i32 {
        self.services
            .inventory
            .list_inventory(Some(customer_id))
            .await
            .expect("failed to list inventory")
            .into_iter()
            .find(|r| r.product.id == product_id)
            .map(|r| r.quantity)
            .unwrap_or(0)
    }
}
