use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{
        CreateProductRequest, ProductList, UpdateProductRequest, UpdateStockRequest,
    },
    entity::{
        product_from_entity,
        products::{ActiveModel, Column, Entity as Products, Model},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, SizeStock},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

async fn audit(state: &AppState, user: &AuthUser, action: &str, product_id: &str) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some("products"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}

/// `%term%` for ILIKE with the pattern metacharacters in `term` escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(category.to_lowercase()));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(Column::Featured.eq(featured));
    }

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Brand).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect::<Result<Vec<_>, _>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: &str) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id.to_string())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Product",
        product_from_entity(product)?,
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let new = payload.validate()?;
    let id = new
        .id
        .unwrap_or_else(|| format!("prod-{}", &Uuid::new_v4().simple().to_string()[..8]));

    if Products::find_by_id(id.clone())
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!("Product {id} already exists")));
    }

    let now = Utc::now();
    let product = ActiveModel {
        id: Set(id),
        name: Set(new.name),
        brand: Set(new.brand),
        price: Set(new.price),
        original_price: Set(new.original_price),
        images: Set(to_json(&new.images)?),
        description: Set(new.description),
        sizes: Set(to_json(&new.sizes)?),
        category: Set(new.category),
        featured: Set(new.featured),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit(state, user, "product_create", &product.id).await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let changes = payload.validate()?;
    let existing = Products::find_by_id(id.to_string())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(brand) = changes.brand {
        active.brand = Set(brand);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(original_price) = changes.original_price {
        active.original_price = Set(Some(original_price));
    }
    if let Some(images) = changes.images {
        active.images = Set(to_json(&images)?);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(sizes) = changes.sizes {
        active.sizes = Set(to_json(&sizes)?);
    }
    if let Some(category) = changes.category {
        active.category = Set(category);
    }
    if let Some(featured) = changes.featured {
        active.featured = Set(featured);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit(state, user, "product_update", &product.id).await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product)?,
        Some(Meta::empty()),
    ))
}

/// Overwrite the stock count of one size. The size must already exist.
///
/// The product row is locked for the read-modify-write so a concurrent order
/// decrementing another size is not overwritten.
pub async fn set_size_stock(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    payload: UpdateStockRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must be non-negative".into()));
    }
    let size = payload.size.trim();

    let txn = state.orm.begin().await?;
    let updated = match write_size_stock(&txn, id, size, payload.stock).await {
        Ok(updated) => {
            txn.commit().await?;
            updated
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(product_id = %id, error = %rollback_err, "rollback failed");
            }
            return Err(err);
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_stock_set",
        Some("products"),
        Some(serde_json::json!({ "product_id": id, "size": size, "stock": payload.stock })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Stock updated",
        product_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

async fn write_size_stock(
    txn: &DatabaseTransaction,
    id: &str,
    size: &str,
    stock: i32,
) -> AppResult<Model> {
    let existing = Products::find_by_id(id.to_string())
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut product = product_from_entity(existing.clone())?;

    let slot: &mut SizeStock = product
        .sizes
        .iter_mut()
        .find(|s| s.value == size)
        .ok_or_else(|| {
            AppError::BadRequest(format!("Size {size} not available for product {id}"))
        })?;
    slot.stock = stock;

    let mut active: ActiveModel = existing.into();
    active.sizes = Set(to_json(&product.sizes)?);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id.to_string())
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit(state, user, "product_delete", id).await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_term_wildcards_are_literal() {
        assert_eq!(contains_pattern("jordan"), "%jordan%");
        assert_eq!(contains_pattern("_"), "%\\_%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
