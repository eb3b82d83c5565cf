use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse API",
        version = "0.1.0",
        description = r#"
Warehouse inventory tracking backend.

Customers hold per-SKU stock; inbound receipts append an immutable audit
trail; outbound shipments are allocated in atomic batches that debit one or
more source customers' ledgers and are reversed in full on delete.
"#
    ),
    paths(
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::receive_stock,
        crate::handlers::inventory::update_inventory,
        crate::handlers::inventory::delete_inventory,
        crate::handlers::inventory::inbound_history,
        crate::handlers::shipments::list_shipments,
        crate::handlers::shipments::get_shipment,
        crate::handlers::shipments::create_shipment,
        crate::handlers::shipments::create_batch,
        crate::handlers::shipments::update_shipment,
        crate::handlers::shipments::delete_shipment,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::inventory::ReceiveStockRequest,
        crate::services::inventory::UpdateInventoryRequest,
        crate::services::inventory::InventoryRecordResponse,
        crate::services::inventory::InboundTransactionResponse,
        crate::services::inventory::StockStatus,
        crate::services::shipments::ShipmentLineRequest,
        crate::services::shipments::CreateShipmentBatchRequest,
        crate::services::shipments::CreateShipmentRequest,
        crate::services::shipments::UpdateShipmentRequest,
        crate::services::shipments::ShipmentResponse,
    )),
    tags(
        (name = "inventory", description = "Stock ledger and inbound history"),
        (name = "shipments", description = "Outbound allocation batches")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
