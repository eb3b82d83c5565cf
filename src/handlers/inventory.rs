use crate::errors::ServiceError;
use crate::services::inventory::{ReceiveStockRequest, UpdateInventoryRequest};
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct InventoryFilters {
    /// Restrict the listing to one customer's records
    pub customer_id: Option<i32>,
}

/// List inventory ledger records with derived stock status
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryFilters),
    responses(
        (status = 200, description = "Inventory records returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filters): Query<InventoryFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state
        .services
        .inventory
        .list_inventory(filters.customer_id)
        .await?;
    Ok(Json(records))
}

/// Record inbound stock, creating the ledger record on first receipt
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = ReceiveStockRequest,
    responses(
        (status = 201, description = "Stock received"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown customer or product", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn receive_stock(
    State(state): State<AppState>,
    Json(request): Json<ReceiveStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state.services.inventory.receive_stock(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Overwrite a ledger record's quantity and/or thresholds
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Record updated"),
        (status = 404, description = "Record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .services
        .inventory
        .update_inventory(id, request)
        .await?;
    Ok(Json(record))
}

/// Delete an unreferenced ledger record
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Record still referenced", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.inventory.delete_inventory(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the inbound audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inbound-history",
    responses(
        (status = 200, description = "Inbound history returned")
    ),
    tag = "inventory"
)]
pub async fn inbound_history(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.inventory.inbound_history().await?;
    Ok(Json(rows))
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/", post(receive_stock))
        .route("/:id", put(update_inventory))
        .route("/:id", delete(delete_inventory))
}
