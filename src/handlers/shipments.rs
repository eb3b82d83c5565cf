use crate::errors::ServiceError;
use crate::services::shipments::{
    CreateShipmentBatchRequest, CreateShipmentRequest, UpdateShipmentRequest,
};
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};

/// List shipment lines, newest first
#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    responses(
        (status = 200, description = "Shipment lines returned")
    ),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let shipments = state.services.shipments.list_shipments().await?;
    Ok(Json(shipments))
}

/// Fetch one shipment line
#[utoipa::path(
    get,
    path = "/api/v1/shipments/{id}",
    responses(
        (status = 200, description = "Shipment line returned"),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let shipment = state.services.shipments.get_shipment(id).await?;
    Ok(Json(shipment))
}

/// Create a single shipment line (a batch of one)
#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created"),
        (status = 404, description = "Unknown customer or product", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unauthorized SKU or insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    Json(request): Json<CreateShipmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.shipments.create_shipment(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Create a batch of shipment lines; all lines succeed or none do
#[utoipa::path(
    post,
    path = "/api/v1/shipments/batch",
    request_body = CreateShipmentBatchRequest,
    responses(
        (status = 201, description = "Batch created; lines returned in submission order"),
        (status = 400, description = "Empty or malformed batch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown customer or product", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unauthorized SKU or insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    Json(request): Json<CreateShipmentBatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.shipments.create_batch(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edit a shipment line's quantity, date, or RMA ticket
#[utoipa::path(
    put,
    path = "/api/v1/shipments/{id}",
    request_body = UpdateShipmentRequest,
    responses(
        (status = 200, description = "Shipment updated"),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock for the increase", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateShipmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.shipments.update_shipment(id, request).await?;
    Ok(Json(updated))
}

/// Delete a shipment line, restoring its quantity to the source ledger record
#[utoipa::path(
    delete,
    path = "/api/v1/shipments/{id}",
    responses(
        (status = 204, description = "Shipment reversed and deleted"),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn delete_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.shipments.delete_shipment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shipments))
        .route("/", post(create_shipment))
        .route("/batch", post(create_batch))
        .route("/:id", get(get_shipment))
        .route("/:id", put(update_shipment))
        .route("/:id", delete(delete_shipment))
}
