use crate::{
    dto::payments::{PaymentPreferenceRequest, PaymentPreferenceResponse},
    error::{AppError, AppResult},
    models::PaymentStatus,
    payment::PreferenceRequest,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Open a gateway checkout for an already placed order.
///
/// Amounts come from the stored lines; the client only names the order.
pub async fn create_preference(
    state: &AppState,
    payload: PaymentPreferenceRequest,
) -> AppResult<ApiResponse<PaymentPreferenceResponse>> {
    let order_id = payload.order_id.trim();
    if order_id.is_empty() {
        return Err(AppError::BadRequest("orderId is required".into()));
    }

    let placed = state
        .orders
        .order_with_items(order_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if placed.order.payment_status == PaymentStatus::Paid {
        return Err(AppError::BadRequest("Order already paid".into()));
    }

    let request = PreferenceRequest::for_order(&placed, &state.config.payment);
    let preference = state.payments.create_preference(&request).await?;

    Ok(ApiResponse::success(
        "Preference created",
        PaymentPreferenceResponse {
            preference_id: preference.id,
            redirect_url: preference.redirect_url,
        },
        Some(Meta::empty()),
    ))
}
