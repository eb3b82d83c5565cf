pub mod customers;
pub mod inventory;
pub mod products;
pub mod shipments;
