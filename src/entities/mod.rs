pub mod customer;
pub mod customer_product;
pub mod inbound_transaction;
pub mod inventory_level;
pub mod product;
pub mod shipment;
