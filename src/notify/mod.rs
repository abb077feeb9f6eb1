//! Post-commit order notifications.
//!
//! Placing an order produces a list of [`OutboundEvent`]s which are handed to
//! an [`OutboundSink`]. The production sink delivers each event on its own
//! task and only logs failures; nothing here can affect the order response.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::dto::orders::OrderWithItems;

pub mod dispatch;
pub mod email;
pub mod templates;
pub mod whatsapp;

pub use dispatch::TaskDispatcher;
pub use email::{Email, HttpMailer, Mailer};
pub use whatsapp::{Messenger, TwilioMessenger};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("no recipient configured ({0})")]
    MissingRecipient(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub name: String,
    pub size: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// The slice of a placed order that notification templates need.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub total: Decimal,
    pub lines: Vec<SummaryLine>,
}

impl From<&OrderWithItems> for OrderSummary {
    fn from(placed: &OrderWithItems) -> Self {
        Self {
            order_id: placed.order.id.clone(),
            customer_name: placed.order.customer_name.clone(),
            customer_email: placed.order.customer_email.clone(),
            customer_phone: placed.order.customer_phone.clone(),
            total: placed.order.total,
            lines: placed
                .items
                .iter()
                .map(|line| SummaryLine {
                    name: line
                        .product_name
                        .clone()
                        .unwrap_or_else(|| line.product_id.clone()),
                    size: line.size.clone(),
                    quantity: line.quantity,
                    price: line.price_at_purchase,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    CustomerEmail(OrderSummary),
    CustomerWhatsApp(OrderSummary),
    AdminEmail(OrderSummary),
    AdminWhatsApp(OrderSummary),
}

impl OutboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::CustomerEmail(_) => "customer_email",
            OutboundEvent::CustomerWhatsApp(_) => "customer_whatsapp",
            OutboundEvent::AdminEmail(_) => "admin_email",
            OutboundEvent::AdminWhatsApp(_) => "admin_whatsapp",
        }
    }

    pub fn summary(&self) -> &OrderSummary {
        match self {
            OutboundEvent::CustomerEmail(s)
            | OutboundEvent::CustomerWhatsApp(s)
            | OutboundEvent::AdminEmail(s)
            | OutboundEvent::AdminWhatsApp(s) => s,
        }
    }
}

/// Customer messages go out only when the customer gave the matching contact;
/// the admin always gets both.
pub fn plan_notifications(placed: &OrderWithItems) -> Vec<OutboundEvent> {
    let summary = OrderSummary::from(placed);
    let mut events = Vec::with_capacity(4);
    if !summary.customer_email.is_empty() {
        events.push(OutboundEvent::CustomerEmail(summary.clone()));
    }
    if summary.customer_phone.is_some() {
        events.push(OutboundEvent::CustomerWhatsApp(summary.clone()));
    }
    events.push(OutboundEvent::AdminEmail(summary.clone()));
    events.push(OutboundEvent::AdminWhatsApp(summary));
    events
}

/// Receives notification requests. Implementations must not block or fail
/// the caller.
pub trait OutboundSink: Send + Sync + 'static {
    fn submit(&self, event: OutboundEvent);
}

/// Sink that only remembers what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<OutboundEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(OutboundEvent::kind).collect()
    }
}

impl OutboundSink for RecordingSink {
    fn submit(&self, event: OutboundEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::{Order, OrderLine, PaymentMethod, PaymentStatus};

    fn placed(phone: Option<&str>) -> OrderWithItems {
        let now = Utc::now();
        OrderWithItems {
            order: Order {
                id: "order-7".into(),
                customer_id: None,
                customer_name: "Ana".into(),
                customer_email: "ana@example.com".into(),
                customer_phone: phone.map(str::to_string),
                delivery_line: None,
                delivery_station: None,
                delivery_address: None,
                total: Decimal::from(120),
                payment_method: PaymentMethod::Cash,
                payment_status: PaymentStatus::Pending,
                notes: None,
                created_at: now,
            },
            items: vec![OrderLine {
                id: Uuid::new_v4(),
                order_id: "order-7".into(),
                product_id: "prod-9".into(),
                quantity: 1,
                size: "38".into(),
                price_at_purchase: Decimal::from(120),
                product_name: None,
                product_brand: None,
                created_at: now,
            }],
        }
    }

    #[test]
    fn phone_adds_customer_whatsapp() {
        let kinds: Vec<_> = plan_notifications(&placed(Some("5512345678")))
            .iter()
            .map(OutboundEvent::kind)
            .collect();
        assert_eq!(
            kinds,
            ["customer_email", "customer_whatsapp", "admin_email", "admin_whatsapp"]
        );
    }

    #[test]
    fn admin_is_always_notified() {
        let kinds: Vec<_> = plan_notifications(&placed(None))
            .iter()
            .map(OutboundEvent::kind)
            .collect();
        assert_eq!(kinds, ["customer_email", "admin_email", "admin_whatsapp"]);
    }

    #[test]
    fn summary_falls_back_to_product_id() {
        let summary = OrderSummary::from(&placed(None));
        assert_eq!(summary.lines[0].name, "prod-9");
    }
}
