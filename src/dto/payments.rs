use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /api/payments/preference`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPreferenceRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPreferenceResponse {
    pub preference_id: String,
    pub redirect_url: String,
}
