use crate::{
    audit::log_audit,
    dto::orders::{OrderList, OrderListQuery, OrderWithItems, PlaceOrderRequest, UpdatePaymentStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, PaymentStatus},
    notify::plan_notifications,
    response::{ApiResponse, Meta},
    routes::params::SortOrder,
    state::AppState,
    store::OrderFilter,
};

/// Validate, write atomically, read back, then hand notifications to the sink.
///
/// Nothing after the commit can turn a placed order into an error response
/// except the read-back itself.
pub async fn place_order(
    state: &AppState,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = payload.validate()?;

    state
        .orders
        .place_order(&order, state.config.stock_policy)
        .await
        .inspect_err(|err| {
            tracing::info!(order_id = %order.id, error = %err, "order rejected");
        })?;

    let placed = state
        .orders
        .order_with_items(&order.id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order {} vanished after commit", order.id)))?;

    tracing::info!(
        order_id = %placed.order.id,
        lines = placed.items.len(),
        total = %placed.order.total,
        "order placed"
    );

    for event in plan_notifications(&placed) {
        state.outbound.submit(event);
    }

    Ok(ApiResponse::success("Order placed", placed, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let payment_status = match query.payment_status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<PaymentStatus>().map_err(AppError::BadRequest)?),
        None => None,
    };

    let filter = OrderFilter {
        limit,
        offset,
        payment_status,
        newest_first: !matches!(query.sort_order, Some(SortOrder::Asc)),
    };
    let (items, total) = state.orders.list_orders(&filter).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = state
        .orders
        .order_with_items(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status: PaymentStatus = payload
        .payment_status
        .parse()
        .map_err(AppError::BadRequest)?;

    let order = state.orders.set_payment_status(id, status).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_payment_status",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "payment_status": status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment status updated",
        order,
        Some(Meta::empty()),
    ))
}
