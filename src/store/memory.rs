use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    dto::orders::OrderWithItems,
    models::{Order, OrderLine, PaymentStatus, Product},
};

use super::{NewOrder, OrderError, OrderFilter, OrderStore, StockPolicy};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<String, Product>,
    orders: Vec<Order>,
    lines: Vec<OrderLine>,
}

/// Process-local `OrderStore`.
///
/// A placement works on a copy of the tables and swaps it in only when every
/// line succeeded, so a failed order leaves no trace. The mutex serialises
/// placements, which makes stock decrements immune to lost updates.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    tables: Mutex<Tables>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for product in products {
            store.upsert_product(product);
        }
        store
    }

    pub fn upsert_product(&self, product: Product) {
        self.tables
            .lock()
            .products
            .insert(product.id.clone(), product);
    }

    pub fn remove_product(&self, id: &str) -> Option<Product> {
        self.tables.lock().products.remove(id)
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.tables.lock().products.get(id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }

    pub fn line_count(&self) -> usize {
        self.tables.lock().lines.len()
    }
}

fn write_order(tables: &mut Tables, order: &NewOrder, policy: StockPolicy) -> Result<(), OrderError> {
    if tables.orders.iter().any(|o| o.id == order.id) {
        return Err(OrderError::Storage(format!(
            "duplicate key value violates unique constraint \"orders_pkey\" ({})",
            order.id
        )));
    }

    let now = Utc::now();
    tables.orders.push(Order {
        id: order.id.clone(),
        customer_id: order.customer.id.clone(),
        customer_name: order.customer.name.clone(),
        customer_email: order.customer.email.clone(),
        customer_phone: order.customer.phone.clone(),
        delivery_line: order.delivery.line.clone(),
        delivery_station: order.delivery.station.clone(),
        delivery_address: order.delivery.address.clone(),
        total: order.total,
        payment_method: order.payment_method,
        payment_status: order.payment_status,
        notes: order.notes.clone(),
        created_at: now,
    });

    for line in &order.items {
        let product = tables
            .products
            .get_mut(&line.product_id)
            .ok_or_else(|| OrderError::ProductNotFound(line.product_id.clone()))?;
        let slot = product
            .sizes
            .iter_mut()
            .find(|s| s.value == line.size)
            .ok_or_else(|| OrderError::SizeUnavailable {
                product_id: line.product_id.clone(),
                size: line.size.clone(),
            })?;
        let available = slot.stock;
        slot.stock = policy.next_stock(available, line.quantity).ok_or_else(|| {
            OrderError::InsufficientStock {
                product_id: line.product_id.clone(),
                size: line.size.clone(),
                requested: line.quantity,
                available,
            }
        })?;
        product.updated_at = now;

        tables.lines.push(OrderLine {
            id: Uuid::new_v4(),
            order_id: order.id.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            size: line.size.clone(),
            price_at_purchase: product.price,
            product_name: None,
            product_brand: None,
            created_at: now,
        });
    }

    Ok(())
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn place_order(&self, order: &NewOrder, policy: StockPolicy) -> Result<(), OrderError> {
        let mut tables = self.tables.lock();
        let mut draft = tables.clone();
        write_order(&mut draft, order, policy)?;
        *tables = draft;
        Ok(())
    }

    async fn order_with_items(&self, id: &str) -> Result<Option<OrderWithItems>, OrderError> {
        let tables = self.tables.lock();
        let Some(order) = tables.orders.iter().find(|o| o.id == id).cloned() else {
            return Ok(None);
        };
        let items = tables
            .lines
            .iter()
            .filter(|l| l.order_id == id)
            .map(|l| {
                let product = tables.products.get(&l.product_id);
                OrderLine {
                    product_name: product.map(|p| p.name.clone()),
                    product_brand: product.map(|p| p.brand.clone()),
                    ..l.clone()
                }
            })
            .collect();
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<(Vec<Order>, i64), OrderError> {
        let tables = self.tables.lock();
        let mut matching: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| filter.payment_status.is_none_or(|s| o.payment_status == s))
            .cloned()
            .collect();
        if filter.newest_first {
            matching.reverse();
        }
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn set_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<Order, OrderError> {
        let mut tables = self.tables.lock();
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))?;
        order.payment_status = status;
        Ok(order.clone())
    }
}
