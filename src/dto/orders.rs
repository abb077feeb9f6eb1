use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{Order, OrderLine, PaymentMethod, PaymentStatus},
    routes::params::{Pagination, SortOrder},
    store::{CustomerSnapshot, Delivery, NewOrder, NewOrderLine},
    validation::{
        MAX_TEXT_LEN, require_text, validate_email, validate_name, validate_optional_text,
        validate_phone, validate_quantity, validate_total,
    },
};

const MAX_ORDER_ID_LEN: usize = 50;
const MAX_CUSTOMER_ID_LEN: usize = 100;
const MAX_DELIVERY_FIELD_LEN: usize = 100;

/// Incoming order document. Every field is optional at the serde level so
/// that a missing field is reported by `validate` with a message naming it.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub id: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
    pub customer: Option<CustomerRequest>,
    pub delivery: Option<DeliveryRequest>,
    #[schema(value_type = Option<String>, example = "240.00")]
    pub total: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub size: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub id: Option<String>,
    #[serde(alias = "fullName")]
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub line: Option<String>,
    pub station: Option<String>,
    pub address: Option<String>,
}

impl PlaceOrderRequest {
    /// Check every constraint in request order and stop at the first violation.
    pub fn validate(self) -> AppResult<NewOrder> {
        let id = require_text("id", self.id.as_deref())?;
        if id.chars().count() > MAX_ORDER_ID_LEN {
            return Err(AppError::BadRequest(format!(
                "id is too long (max {MAX_ORDER_ID_LEN} characters)"
            )));
        }

        let raw_items = self
            .items
            .filter(|items| !items.is_empty())
            .ok_or_else(|| AppError::BadRequest("items must contain at least one item".into()))?;
        let mut items = Vec::with_capacity(raw_items.len());
        for (i, item) in raw_items.into_iter().enumerate() {
            let product_id =
                require_text(&format!("items[{i}].productId"), item.product_id.as_deref())?;
            let quantity = validate_quantity(&format!("items[{i}].quantity"), item.quantity)?;
            let size = require_text(&format!("items[{i}].size"), item.size.as_deref())?;
            items.push(NewOrderLine {
                product_id,
                quantity,
                size,
            });
        }

        let customer = self
            .customer
            .ok_or_else(|| AppError::BadRequest("customer is required".into()))?;
        let customer = CustomerSnapshot {
            id: validate_optional_text(
                "customer.id",
                customer.id.as_deref(),
                MAX_CUSTOMER_ID_LEN,
            )?,
            name: validate_name("customer.name", customer.name.as_deref())?,
            email: validate_email("customer.email", customer.email.as_deref())?,
            phone: validate_phone("customer.phone", customer.phone.as_deref())?,
        };

        let total = validate_total("total", self.total)?;

        let payment_method: PaymentMethod = self
            .payment_method
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("paymentMethod is required".into()))?
            .parse()
            .map_err(AppError::BadRequest)?;

        let payment_status = match self.payment_status.as_deref() {
            Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
            None => PaymentStatus::Pending,
        };

        let delivery = match self.delivery {
            Some(d) => Delivery {
                line: validate_optional_text(
                    "delivery.line",
                    d.line.as_deref(),
                    MAX_DELIVERY_FIELD_LEN,
                )?,
                station: validate_optional_text(
                    "delivery.station",
                    d.station.as_deref(),
                    MAX_DELIVERY_FIELD_LEN,
                )?,
                address: validate_optional_text(
                    "delivery.address",
                    d.address.as_deref(),
                    MAX_TEXT_LEN,
                )?,
            },
            None => Delivery::default(),
        };

        Ok(NewOrder {
            id,
            customer,
            delivery,
            items,
            total,
            payment_method,
            payment_status,
            notes: validate_optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// `pending`, `paid` or `failed`.
    pub payment_status: Option<String>,
    #[param(inline)]
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
