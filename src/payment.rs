//! Checkout preferences on a hosted payment gateway.
//!
//! Only the preference call lives here. Payment status changes come back
//! through the admin `PATCH /api/orders/{id}/payment-status` route.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::PaymentConfig, dto::orders::OrderWithItems};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment gateway is not configured")]
    NotConfigured,

    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment gateway rejected preference with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected payment gateway response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub currency_id: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferencePayer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Body of `POST /checkout/preferences`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub external_reference: String,
    pub back_urls: BackUrls,
}

impl PreferenceRequest {
    /// Prices come from the persisted lines, never from the client.
    pub fn for_order(placed: &OrderWithItems, config: &PaymentConfig) -> Self {
        let items = placed
            .items
            .iter()
            .map(|line| PreferenceItem {
                id: line.product_id.clone(),
                title: match &line.product_name {
                    Some(name) => format!("{name} ({})", line.size),
                    None => format!("{} ({})", line.product_id, line.size),
                },
                quantity: line.quantity,
                unit_price: line.price_at_purchase,
                currency_id: "MXN",
            })
            .collect();

        Self {
            items,
            payer: PreferencePayer {
                name: placed.order.customer_name.clone(),
                email: placed.order.customer_email.clone(),
            },
            external_reference: placed.order.id.clone(),
            back_urls: BackUrls {
                success: config.success_url.clone(),
                failure: config.failure_url.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    pub id: String,
    pub redirect_url: String,
}

#[derive(Deserialize)]
struct PreferenceResponse {
    id: Option<String>,
    init_point: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_preference(&self, request: &PreferenceRequest)
    -> Result<Preference, PaymentError>;
}

#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    config: PaymentConfig,
}

impl HttpPaymentGateway {
    pub fn new(config: PaymentConfig) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, PaymentError> {
        let token = self
            .config
            .access_token
            .as_deref()
            .ok_or(PaymentError::NotConfigured)?;

        let url = format!(
            "{}/checkout/preferences",
            self.config.api_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: PreferenceResponse = response
            .json()
            .await
            .map_err(|err| PaymentError::Decode(err.to_string()))?;
        match (body.id, body.init_point) {
            (Some(id), Some(redirect_url)) => {
                tracing::info!(
                    order_id = %request.external_reference,
                    preference_id = %id,
                    "payment preference created"
                );
                Ok(Preference { id, redirect_url })
            }
            _ => Err(PaymentError::Decode(
                "missing id or init_point".to_string(),
            )),
        }
    }
}
