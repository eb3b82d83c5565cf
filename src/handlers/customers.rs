use crate::errors::ServiceError;
use crate::services::customers::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};

async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.customers.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_customers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let customers = state.services.customers.list_customers().await?;
    Ok(Json(customers))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .customers
        .update_customer(id, request)
        .await?;
    Ok(Json(updated))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn link_product(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .customers
        .link_product(customer_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlink_product(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .customers
        .unlink_product(customer_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_authorized_products(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state
        .services
        .customers
        .authorized_products(customer_id)
        .await?;
    Ok(Json(products))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer))
        .route("/", get(list_customers))
        .route("/:id", get(get_customer))
        .route("/:id", put(update_customer))
        .route("/:id", delete(delete_customer))
        .route("/:id/products", get(list_authorized_products))
        .route("/:id/products/:product_id", post(link_product))
        .route("/:id/products/:product_id", delete(unlink_product))
}
