//! HTTP route definitions.
//!
//! # Health
//! GET  /health                                          - Liveness
//! GET  /health/ready                                    - Readiness (database, migrations)
//!
//! # Checkout
//! POST /api/storefronts/{storefront_id}/checkout        - Place a COD order (201)
//! POST /api/storefronts/{storefront_id}/quote           - Server-side cart price
//! GET  /api/storefronts/{storefront_id}/orders/{id}     - Order confirmation

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::client_ip::ClientIp;
use crate::dto::{
    line_items, parse_area, CheckoutRequest, CheckoutResponse, OrderResponse, QuoteRequest,
    QuoteResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::services::checkout_service::CheckoutService;
use crate::services::health_service;
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_service::health))
        .route("/health/ready", get(health_service::readiness))
        .merge(storefront_routes())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/api/storefronts/{storefront_id}/checkout", post(checkout))
        .route("/api/storefronts/{storefront_id}/quote", post(quote))
        .route("/api/storefronts/{storefront_id}/orders/{order_id}", get(get_order))
}

/// Malformed JSON is a 400 with axum's own explanation.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

async fn checkout(
    State(state): State<AppState>,
    Path(storefront_id): Path<String>,
    client_ip: ClientIp,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    let input = body(payload)?.into_input();

    let order_id = CheckoutService::new(state)
        .place_order(&storefront_id, client_ip.as_str(), input)
        .await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse { order_id })))
}

async fn quote(
    State(state): State<AppState>,
    Path(storefront_id): Path<String>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> ApiResult<Json<QuoteResponse>> {
    let request = body(payload)?;
    let area = parse_area(request.area.as_deref())?;
    let items = line_items(request.items);

    let pricing = CheckoutService::new(state)
        .quote(&storefront_id, &items, area)
        .await?;

    Ok(Json(pricing.into()))
}

async fn get_order(
    State(state): State<AppState>,
    Path((storefront_id, order_id)): Path<(String, String)>,
) -> ApiResult<Json<OrderResponse>> {
    let (order, items) = CheckoutService::new(state)
        .get_order(&storefront_id, &order_id)
        .await?;

    Ok(Json(OrderResponse::new(order, items)))
}
