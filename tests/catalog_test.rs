mod common;

use assert_matches::assert_matches;
use common::TestApp;
use warehouse_api::{
    errors::ServiceError,
    services::customers::UpdateCustomerRequest,
    services::products::{CreateProductRequest, UpdateProductRequest},
};

#[tokio::test]
async fn linking_twice_is_a_no_op() {
    let app = TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let product = app.create_product("SKU-A", "A").await;

    app.link(customer, product).await;
    app.link(customer, product).await;

    let products = app
        .services
        .customers
        .authorized_products(customer)
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn unlinking_an_unlinked_pair_is_a_no_op() {
    let app = TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let product = app.create_product("SKU-A", "A").await;

    app.services
        .customers
        .unlink_product(customer, product)
        .await
        .expect("unlinking an absent link succeeds");

    app.link(customer, product).await;
    app.services
        .customers
        .unlink_product(customer, product)
        .await
        .expect("unlink succeeds");

    let products = app
        .services
        .customers
        .authorized_products(customer)
        .await
        .unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let app = TestApp::new().await;
    app.create_product("SKU-A", "First").await;

    let err = app
        .services
        .products
        .create_product(CreateProductRequest {
            sku_code: "SKU-A".to_string(),
            name: "Second".to_string(),
            description: None,
        })
        .await
        .expect_err("duplicate SKU");
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn concurrent_duplicate_sku_creates_conflict_not_internal_error() {
    let app = TestApp::new().await;

    // Interleaved creates can both pass the duplicate pre-check; the unique
    // index then fires and must map to the same Conflict.
    let submit = || {
        app.services.products.create_product(CreateProductRequest {
            sku_code: "SKU-A".to_string(),
            name: "Widget".to_string(),
            description: None,
        })
    };
    let (first, second) = tokio::join!(submit(), submit());

    let err = match (first, second) {
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
        (Ok(_), Ok(_)) => panic!("duplicate SKU was created twice"),
        (Err(a), Err(b)) => panic!("both creates failed: {:?} / {:?}", a, b),
    };
    assert_matches!(err, ServiceError::Conflict(_));

    let products = app.services.products.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn sku_change_is_rechecked_for_uniqueness() {
    let app = TestApp::new().await;
    app.create_product("SKU-A", "A").await;
    let other = app.create_product("SKU-B", "B").await;

    let err = app
        .services
        .products
        .update_product(
            other,
            UpdateProductRequest {
                sku_code: "SKU-A".to_string(),
                name: "B".to_string(),
                description: None,
            },
        )
        .await
        .expect_err("SKU collision on update");
    assert_matches!(err, ServiceError::Conflict(_));

    // Keeping its own SKU is fine.
    app.services
        .products
        .update_product(
            other,
            UpdateProductRequest {
                sku_code: "SKU-B".to_string(),
                name: "B renamed".to_string(),
                description: Some("desc".to_string()),
            },
        )
        .await
        .expect("self-update succeeds");
}

#[tokio::test]
async fn customer_with_stock_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (customer, _product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let err = app
        .services
        .customers
        .delete_customer(customer)
        .await
        .expect_err("customer holds stock");
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn unreferenced_customer_delete_cleans_up_links() {
    let app = TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let product = app.create_product("SKU-A", "A").await;
    app.link(customer, product).await;

    app.services
        .customers
        .delete_customer(customer)
        .await
        .expect("delete succeeds");

    let err = app
        .services
        .customers
        .get_customer(customer)
        .await
        .expect_err("customer is gone");
    assert_matches!(err, ServiceError::NotFound(_));

    // The product survives the link cleanup.
    app.services
        .products
        .get_product(product)
        .await
        .expect("product still exists");
}

#[tokio::test]
async fn product_with_inventory_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (_customer, product) = app.seed_stock("Acme", "SKU-A", 10).await;

    let err = app
        .services
        .products
        .delete_product(product)
        .await
        .expect_err("product has inventory");
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn customer_listing_embeds_authorized_products() {
    let app = TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let a = app.create_product("SKU-A", "A").await;
    let b = app.create_product("SKU-B", "B").await;
    app.link(customer, a).await;
    app.link(customer, b).await;

    let listed = app.services.customers.list_customers().await.unwrap();
    let acme = listed.iter().find(|c| c.id == customer).unwrap();
    let skus: Vec<&str> = acme.products.iter().map(|p| p.sku_code.as_str()).collect();
    assert_eq!(skus, vec!["SKU-A", "SKU-B"]);
}

#[tokio::test]
async fn customer_update_replaces_name_and_contact() {
    let app = TestApp::new().await;
    let customer = app.create_customer("Acme").await;

    let updated = app
        .services
        .customers
        .update_customer(
            customer,
            UpdateCustomerRequest {
                name: "Acme Corp".to_string(),
                contact_info: Some("ops@acme.example".to_string()),
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.name, "Acme Corp");
    assert_eq!(updated.contact_info.as_deref(), Some("ops@acme.example"));
}
