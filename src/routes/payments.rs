use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{
    dto::payments::{PaymentPreferenceRequest, PaymentPreferenceResponse},
    error::AppResult,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/preference", post(create_preference))
}

#[utoipa::path(
    post,
    path = "/api/payments/preference",
    request_body = PaymentPreferenceRequest,
    responses(
        (status = 201, description = "Checkout preference", body = ApiResponse<PaymentPreferenceResponse>),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Gateway rejected the preference")
    ),
    tag = "Payments"
)]
pub async fn create_preference(
    State(state): State<AppState>,
    Json(payload): Json<PaymentPreferenceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PaymentPreferenceResponse>>)> {
    let resp = payment_service::create_preference(&state, payload).await?;
    Ok(resp.created())
}
