pub mod customers;
pub mod health;
pub mod inventory;
pub mod products;
pub mod shipments;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub products: Arc<crate::services::products::ProductService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub shipments: Arc<crate::services::shipments::ShipmentService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            customers: Arc::new(crate::services::customers::CustomerService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            products: Arc::new(crate::services::products::ProductService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            inventory: Arc::new(crate::services::inventory::InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            shipments: Arc::new(crate::services::shipments::ShipmentService::new(
                db_pool,
                event_sender,
            )),
        }
    }
}
