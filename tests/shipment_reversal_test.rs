mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestApp;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use warehouse_api::{
    entities::inventory_level::{self, Entity as InventoryLevels},
    errors::ServiceError,
    services::shipments::{
        CreateShipmentBatchRequest, CreateShipmentRequest, ShipmentLineRequest,
        UpdateShipmentRequest,
    },
};

async fn ship(app: &TestApp, customer: i32, product: i32, quantity: i32) -> i32 {
    app.services
        .shipments
        .create_shipment(CreateShipmentRequest {
            customer_id: customer,
            product_id: product,
            quantity,
            shipment_date: Utc::now(),
            rma_ticket: None,
            source_customer_id: None,
        })
        .await
        .expect("failed to create shipment")
        .id
}

#[tokio::test]
async fn delete_restores_the_full_quantity() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let shipment_id = ship(&app, customer, product, 6).await;
    assert_eq!(app.on_hand(customer, product).await, 4);

    app.services
        .shipments
        .delete_shipment(shipment_id)
        .await
        .expect("delete should succeed");

    assert_eq!(app.on_hand(customer, product).await, 10);
    let err = app
        .services
        .shipments
        .get_shipment(shipment_id)
        .await
        .expect_err("row is gone");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn delete_of_cross_account_shipment_repays_the_source() {
    let app = TestApp::new().await;
    let seller = app.create_customer("Seller").await;
    let (source, product) = app.seed_stock("Depot", "SKU-D", 8).await;

    let created = app
        .services
        .shipments
        .create_batch(CreateShipmentBatchRequest {
            customer_id: seller,
            shipment_date: Utc::now(),
            rma_ticket: None,
            lines: vec![ShipmentLineRequest {
                source_customer_id: Some(source),
                product_id: product,
                quantity: 5,
            }],
        })
        .await
        .expect("cross-account shipment");
    assert_eq!(app.on_hand(source, product).await, 3);

    app.services
        .shipments
        .delete_shipment(created[0].id)
        .await
        .expect("delete should succeed");

    // The source record is repaid, not the seller's.
    assert_eq!(app.on_hand(source, product).await, 8);
    assert_eq!(app.on_hand(seller, product).await, 0);
}

#[tokio::test]
async fn quantity_edit_applies_only_the_delta() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let shipment_id = ship(&app, customer, product, 6).await;
    assert_eq!(app.on_hand(customer, product).await, 4);

    // 6 -> 2 releases 4 back.
    let updated = app
        .services
        .shipments
        .update_shipment(
            shipment_id,
            UpdateShipmentRequest {
                quantity: Some(2),
                shipment_date: None,
                rma_ticket: None,
            },
        )
        .await
        .expect("decrease should succeed");
    assert_eq!(updated.quantity, 2);
    assert_eq!(app.on_hand(customer, product).await, 8);

    // 2 -> 5 takes 3 more.
    app.services
        .shipments
        .update_shipment(
            shipment_id,
            UpdateShipmentRequest {
                quantity: Some(5),
                shipment_date: None,
                rma_ticket: None,
            },
        )
        .await
        .expect("increase should succeed");
    assert_eq!(app.on_hand(customer, product).await, 5);
}

#[tokio::test]
async fn repeating_an_identical_edit_changes_nothing() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let shipment_id = ship(&app, customer, product, 6).await;

    for _ in 0..3 {
        let updated = app
            .services
            .shipments
            .update_shipment(
                shipment_id,
                UpdateShipmentRequest {
                    quantity: Some(6),
                    shipment_date: None,
                    rma_ticket: None,
                },
            )
            .await
            .expect("identical edit is a no-op");
        assert_eq!(updated.quantity, 6);
    }

    assert_eq!(app.on_hand(customer, product).await, 4);
}

#[tokio::test]
async fn uncovered_increase_fails_and_leaves_the_line_unchanged() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let shipment_id = ship(&app, customer, product, 6).await;

    // 6 -> 12 needs 6 more; only 4 remain.
    let err = app
        .services
        .shipments
        .update_shipment(
            shipment_id,
            UpdateShipmentRequest {
                quantity: Some(12),
                shipment_date: None,
                rma_ticket: None,
            },
        )
        .await
        .expect_err("increase exceeds stock");
    assert_matches!(err, ServiceError::InsufficientStock { shortfall: 2, .. });

    let unchanged = app.services.shipments.get_shipment(shipment_id).await.unwrap();
    assert_eq!(unchanged.quantity, 6);
    assert_eq!(app.on_hand(customer, product).await, 4);
}

#[tokio::test]
async fn reversal_recreates_a_deleted_ledger_record() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 6).await;
    let shipment_id = ship(&app, customer, product, 6).await;

    // Drop the emptied record out from under the shipment.
    InventoryLevels::delete_many()
        .filter(inventory_level::Column::CustomerId.eq(customer))
        .filter(inventory_level::Column::ProductId.eq(product))
        .exec(&*app.db)
        .await
        .expect("failed to remove the ledger record");
    assert!(app
        .services
        .inventory
        .list_inventory(Some(customer))
        .await
        .unwrap()
        .is_empty());

    app.services
        .shipments
        .delete_shipment(shipment_id)
        .await
        .expect("reversal should succeed without a record");

    // The record is recreated holding the restored quantity, thresholds reset.
    let records = app
        .services
        .inventory
        .list_inventory(Some(customer))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].quantity, 6);
    assert_eq!(records[0].target_stock, 0);
    assert_eq!(records[0].safety_stock, 0);
}

#[tokio::test]
async fn create_then_delete_is_a_round_trip() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 9).await;

    for quantity in [1, 4, 9] {
        let shipment_id = ship(&app, customer, product, quantity).await;
        app.services
            .shipments
            .delete_shipment(shipment_id)
            .await
            .expect("delete should succeed");
        assert_eq!(app.on_hand(customer, product).await, 9);
    }
}
