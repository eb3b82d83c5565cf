pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_customers_table;
mod m20250301_000002_create_products_table;
mod m20250301_000003_create_customer_products_table;
mod m20250301_000004_create_inventory_levels_table;
mod m20250301_000005_create_shipments_table;
mod m20250301_000006_create_inbound_transactions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_customers_table::Migration),
            Box::new(m20250301_000002_create_products_table::Migration),
            Box::new(m20250301_000003_create_customer_products_table::Migration),
            Box::new(m20250301_000004_create_inventory_levels_table::Migration),
            Box::new(m20250301_000005_create_shipments_table::Migration),
            Box::new(m20250301_000006_create_inbound_transactions_table::Migration),
        ]
    }
}
