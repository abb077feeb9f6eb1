use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::orders::OrderWithItems,
    entity::{
        audit_logs::ActiveModel as AuditActive,
        order_from_entity, order_line_from_entity,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    models::{Order, PaymentStatus, SizeStock},
};

use super::{NewOrder, OrderError, OrderFilter, OrderStore, StockPolicy};

/// Postgres-backed `OrderStore`.
#[derive(Clone)]
pub struct SeaOrmOrderStore {
    orm: OrmConn,
}

impl SeaOrmOrderStore {
    pub fn new(orm: OrmConn) -> Self {
        Self { orm }
    }
}

async fn write_order(
    txn: &DatabaseTransaction,
    order: &NewOrder,
    policy: StockPolicy,
) -> Result<(), OrderError> {
    OrderActive {
        id: Set(order.id.clone()),
        customer_id: Set(order.customer.id.clone()),
        customer_name: Set(order.customer.name.clone()),
        customer_email: Set(order.customer.email.clone()),
        customer_phone: Set(order.customer.phone.clone()),
        delivery_line: Set(order.delivery.line.clone()),
        delivery_station: Set(order.delivery.station.clone()),
        delivery_address: Set(order.delivery.address.clone()),
        total: Set(order.total),
        payment_method: Set(order.payment_method.as_str().to_string()),
        payment_status: Set(order.payment_status.as_str().to_string()),
        notes: Set(order.notes.clone()),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;

    for (position, line) in order.items.iter().enumerate() {
        // Row lock: concurrent placements for the same product queue here
        // instead of overwriting each other's decrement.
        let product = Products::find_by_id(line.product_id.clone())
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or_else(|| OrderError::ProductNotFound(line.product_id.clone()))?;

        let mut sizes: Vec<SizeStock> = serde_json::from_value(product.sizes.clone())
            .map_err(|e| DbErr::Json(format!("products.sizes: {e}")))?;
        let slot = sizes
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

        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id.clone()),
            position: Set(position as i32),
            product_id: Set(line.product_id.clone()),
            quantity: Set(line.quantity),
            size: Set(line.size.clone()),
            price_at_purchase: Set(product.price),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;

        let sizes = serde_json::to_value(&sizes)
            .map_err(|e| DbErr::Json(format!("products.sizes: {e}")))?;
        let mut active: ProductActive = product.into();
        active.sizes = Set(sizes);
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;
    }

    AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(None),
        action: Set("order_placed".into()),
        resource: Set(Some("orders".into())),
        metadata: Set(Some(serde_json::json!({
            "order_id": order.id,
            "lines": order.items.len(),
            "total": order.total,
        }))),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;

    Ok(())
}

#[async_trait]
impl OrderStore for SeaOrmOrderStore {
    async fn place_order(&self, order: &NewOrder, policy: StockPolicy) -> Result<(), OrderError> {
        let txn = self.orm.begin().await?;

        match write_order(&txn, order, policy).await {
            Ok(()) => {
                txn.commit().await?;
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(
                        order_id = %order.id,
                        error = %rollback_err,
                        "rollback failed"
                    );
                }
                Err(err)
            }
        }
    }

    async fn order_with_items(&self, id: &str) -> Result<Option<OrderWithItems>, OrderError> {
        let Some(order) = Orders::find_by_id(id.to_string()).one(&self.orm).await? else {
            return Ok(None);
        };

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(id))
            .order_by_asc(OrderItemCol::Position)
            .find_also_related(Products)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(|(line, product)| order_line_from_entity(line, product))
            .collect();

        Ok(Some(OrderWithItems {
            order: order_from_entity(order)?,
            items,
        }))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<(Vec<Order>, i64), OrderError> {
        let mut finder = Orders::find();
        if let Some(status) = filter.payment_status {
            finder = finder.filter(OrderCol::PaymentStatus.eq(status.as_str()));
        }
        finder = if filter.newest_first {
            finder.order_by_desc(OrderCol::CreatedAt)
        } else {
            finder.order_by_asc(OrderCol::CreatedAt)
        };

        let total = finder.clone().count(&self.orm).await? as i64;

        let orders = finder
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((orders, total))
    }

    async fn set_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<Order, OrderError> {
        let existing = Orders::find_by_id(id.to_string())
            .one(&self.orm)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))?;

        let mut active: OrderActive = existing.into();
        active.payment_status = Set(status.as_str().to_string());
        let order = active.update(&self.orm).await?;

        Ok(order_from_entity(order)?)
    }
}
