mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestApp;
use warehouse_api::{
    errors::ServiceError,
    services::shipments::{CreateShipmentBatchRequest, CreateShipmentRequest, ShipmentLineRequest},
};

fn line(source: Option<i32>, product_id: i32, quantity: i32) -> ShipmentLineRequest {
    ShipmentLineRequest {
        source_customer_id: source,
        product_id,
        quantity,
    }
}

fn batch(customer_id: i32, lines: Vec<ShipmentLineRequest>) -> CreateShipmentBatchRequest {
    CreateShipmentBatchRequest {
        customer_id,
        shipment_date: Utc::now(),
        rma_ticket: None,
        lines,
    }
}

#[tokio::test]
async fn batch_debits_stock_and_returns_lines_in_submission_order() {
    let app = TestApp::new().await;
    let (customer, product_a) = app.seed_stock("Acme", "SKU-A", 10).await;
    let product_b = app.create_product("SKU-B", "SKU-B").await;
    app.link(customer, product_b).await;
    app.receive(customer, product_b, 5).await;

    let created = app
        .services
        .shipments
        .create_batch(batch(
            customer,
            vec![line(None, product_b, 2), line(None, product_a, 6)],
        ))
        .await
        .expect("batch should succeed");

    assert_eq!(created.len(), 2);
    assert_eq!(created[0].product.id, product_b);
    assert_eq!(created[0].quantity, 2);
    assert_eq!(created[1].product.id, product_a);
    assert_eq!(created[1].quantity, 6);

    assert_eq!(app.on_hand(customer, product_a).await, 4);
    assert_eq!(app.on_hand(customer, product_b).await, 3);
}

#[tokio::test]
async fn failing_line_rolls_back_the_whole_batch() {
    let app = TestApp::new().await;
    let (customer, product_a) = app.seed_stock("Acme", "SKU-A", 10).await;
    let product_b = app.create_product("SKU-B", "SKU-B").await;
    app.link(customer, product_b).await;
    app.receive(customer, product_b, 3).await;

    let err = app
        .services
        .shipments
        .create_batch(batch(
            customer,
            vec![line(None, product_a, 6), line(None, product_b, 4)],
        ))
        .await
        .expect_err("second line overdraws");

    assert_matches!(err, ServiceError::InsufficientStock { shortfall: 1, .. });

    // Nothing moved and nothing was recorded.
    assert_eq!(app.on_hand(customer, product_a).await, 10);
    assert_eq!(app.on_hand(customer, product_b).await, 3);
    assert!(app
        .services
        .shipments
        .list_shipments()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cumulative_demand_across_lines_is_checked_together() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 4).await;

    // Each line alone fits in 4; together they need 6.
    let err = app
        .services
        .shipments
        .create_batch(batch(
            customer,
            vec![line(None, product, 3), line(None, product, 3)],
        ))
        .await
        .expect_err("cumulative demand exceeds stock");

    assert_matches!(err, ServiceError::InsufficientStock { .. });
    assert_eq!(app.on_hand(customer, product).await, 4);
}

#[tokio::test]
async fn unlinked_sku_is_rejected_before_any_write() {
    let app = TestApp::new().await;
    let (customer, product_a) = app.seed_stock("Acme", "SKU-A", 10).await;
    let unlinked = app.create_product("SKU-X", "SKU-X").await;

    let err = app
        .services
        .shipments
        .create_batch(batch(
            customer,
            vec![line(None, product_a, 1), line(None, unlinked, 1)],
        ))
        .await
        .expect_err("unlinked SKU must be rejected");

    assert_matches!(err, ServiceError::UnauthorizedSku(_));
    assert_eq!(app.on_hand(customer, product_a).await, 10);
}

#[tokio::test]
async fn cross_account_line_debits_the_source_customer() {
    let app = TestApp::new().await;
    let (seller, _seller_product) = app.seed_stock("Seller", "SKU-S", 5).await;
    let (source, shared_product) = app.seed_stock("Depot", "SKU-D", 8).await;

    let created = app
        .services
        .shipments
        .create_batch(batch(seller, vec![line(Some(source), shared_product, 3)]))
        .await
        .expect("cross-account allocation should succeed");

    assert_eq!(created[0].customer.id, seller);
    assert_eq!(created[0].source_customer.id, source);
    assert_eq!(app.on_hand(source, shared_product).await, 5);
    assert_eq!(app.on_hand(seller, shared_product).await, 0);
}

#[tokio::test]
async fn empty_batch_and_malformed_lines_are_rejected() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let err = app
        .services
        .shipments
        .create_batch(batch(customer, vec![]))
        .await
        .expect_err("empty batch");
    assert_matches!(err, ServiceError::ValidationError(_));

    // Malformed lines are dropped; if nothing is left the batch is rejected.
    let err = app
        .services
        .shipments
        .create_batch(batch(
            customer,
            vec![line(None, product, 0), line(None, 0, 5)],
        ))
        .await
        .expect_err("only malformed lines");
    assert_matches!(err, ServiceError::ValidationError(_));

    assert_eq!(app.on_hand(customer, product).await, 10);
}

#[tokio::test]
async fn unknown_customer_and_product_are_not_found() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let err = app
        .services
        .shipments
        .create_batch(batch(9999, vec![line(None, product, 1)]))
        .await
        .expect_err("unknown selling customer");
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .services
        .shipments
        .create_batch(batch(customer, vec![line(None, 9999, 1)]))
        .await
        .expect_err("unknown product");
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .services
        .shipments
        .create_batch(batch(customer, vec![line(Some(9999), product, 1)]))
        .await
        .expect_err("unknown source customer");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn single_shipment_is_a_batch_of_one() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let created = app
        .services
        .shipments
        .create_shipment(CreateShipmentRequest {
            customer_id: customer,
            product_id: product,
            quantity: 4,
            shipment_date: Utc::now(),
            rma_ticket: Some("RMA-1".to_string()),
            source_customer_id: None,
        })
        .await
        .expect("single shipment should succeed");

    assert_eq!(created.quantity, 4);
    assert_eq!(created.source_customer.id, customer);
    assert_eq!(created.rma_ticket.as_deref(), Some("RMA-1"));
    assert_eq!(app.on_hand(customer, product).await, 6);
}

#[tokio::test]
async fn identical_batch_submitted_twice_succeeds_exactly_once() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 4).await;

    app.services
        .shipments
        .create_batch(batch(customer, vec![line(None, product, 4)]))
        .await
        .expect("first submission takes the stock");

    let err = app
        .services
        .shipments
        .create_batch(batch(customer, vec![line(None, product, 4)]))
        .await
        .expect_err("stock covers only one batch");
    assert_matches!(err, ServiceError::InsufficientStock { shortfall: 4, .. });

    assert_eq!(app.on_hand(customer, product).await, 0);
    assert_eq!(
        app.services.shipments.list_shipments().await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn concurrent_identical_batches_succeed_exactly_once() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 4).await;

    // Interleaved submissions can both pass pre-flight validation; the
    // guarded ledger update then rejects whichever applies second.
    let submit = || {
        app.services
            .shipments
            .create_batch(batch(customer, vec![line(None, product, 4)]))
    };
    let (first, second) = tokio::join!(submit(), submit());

    let err = match (first, second) {
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
        (Ok(_), Ok(_)) => panic!("both batches succeeded against stock for one"),
        (Err(a), Err(b)) => panic!("both batches failed: {:?} / {:?}", a, b),
    };
    assert_matches!(err, ServiceError::InsufficientStock { shortfall: 4, .. });

    assert_eq!(app.on_hand(customer, product).await, 0);
    assert_eq!(
        app.services.shipments.list_shipments().await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn exact_stock_can_be_shipped_to_zero() {
    let app = TestApp::new().await;
    let (customer, product) = app.seed_stock("Acme", "SKU-A", 7).await;

    app.services
        .shipments
        .create_batch(batch(customer, vec![line(None, product, 7)]))
        .await
        .expect("shipping the full quantity is allowed");

    assert_eq!(app.on_hand(customer, product).await, 0);

    let err = app
        .services
        .shipments
        .create_batch(batch(customer, vec![line(None, product, 1)]))
        .await
        .expect_err("nothing left");
    assert_matches!(err, ServiceError::InsufficientStock { shortfall: 1, .. });
}
