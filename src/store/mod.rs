//! Order persistence port.
//!
//! `OrderStore` is the seam between order placement and the database. The
//! SeaORM implementation runs each placement in one Postgres transaction; the
//! in-memory implementation gives tests the same all-or-nothing behavior.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

use crate::{
    dto::orders::OrderWithItems,
    models::{Order, PaymentMethod, PaymentStatus},
};

pub mod memory;
pub mod sea;

pub use memory::MemoryOrderStore;
pub use sea::SeaOrmOrderStore;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Size {size} not available for product {product_id}")]
    SizeUnavailable { product_id: String, size: String },

    #[error(
        "Insufficient stock for product {product_id} size {size}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: String,
        size: String,
        requested: i32,
        available: i32,
    },

    #[error("Order {0} not found")]
    OrderNotFound(String),

    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("{0}")]
    Storage(String),
}

/// What happens when a line asks for more units than the size has in stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StockPolicy {
    /// Accept the line and floor the remaining stock at zero.
    #[default]
    Clamp,
    /// Fail the whole order.
    Reject,
}

impl StockPolicy {
    /// Stock left after taking `requested` units, or `None` when the policy refuses.
    pub fn next_stock(self, available: i32, requested: i32) -> Option<i32> {
        match self {
            StockPolicy::Clamp => Some((available - requested).max(0)),
            StockPolicy::Reject if requested > available => None,
            StockPolicy::Reject => Some(available - requested),
        }
    }
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(StockPolicy::Clamp),
            "reject" => Ok(StockPolicy::Reject),
            other => Err(format!("expected 'clamp' or 'reject', got '{other}'")),
        }
    }
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockPolicy::Clamp => f.write_str("clamp"),
            StockPolicy::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSnapshot {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delivery {
    pub line: Option<String>,
    pub station: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: i32,
    pub size: String,
}

/// A validated order ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub id: String,
    pub customer: CustomerSnapshot,
    pub delivery: Delivery,
    pub items: Vec<NewOrderLine>,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub limit: i64,
    pub offset: i64,
    pub payment_status: Option<PaymentStatus>,
    pub newest_first: bool,
}

#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Write the header, every line and the stock decrements atomically.
    async fn place_order(&self, order: &NewOrder, policy: StockPolicy) -> Result<(), OrderError>;

    /// Read an order back with its lines joined to product name and brand.
    async fn order_with_items(&self, id: &str) -> Result<Option<OrderWithItems>, OrderError>;

    /// A page of orders plus the total count matching the filter.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<(Vec<Order>, i64), OrderError>;

    async fn set_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<Order, OrderError>;
}
