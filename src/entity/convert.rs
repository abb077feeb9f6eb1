use chrono::Utc;
use sea_orm::DbErr;

use crate::models::{Category, Order, OrderLine, Product, SizeStock, User};

use super::{categories, order_items, orders, products, users};

pub fn product_from_entity(model: products::Model) -> Result<Product, DbErr> {
    let images: Vec<String> = serde_json::from_value(model.images)
        .map_err(|e| DbErr::Json(format!("products.images: {e}")))?;
    let sizes: Vec<SizeStock> = serde_json::from_value(model.sizes)
        .map_err(|e| DbErr::Json(format!("products.sizes: {e}")))?;
    Ok(Product {
        id: model.id,
        name: model.name,
        brand: model.brand,
        price: model.price,
        original_price: model.original_price,
        images,
        description: model.description,
        sizes,
        category: model.category,
        featured: model.featured,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn order_from_entity(model: orders::Model) -> Result<Order, DbErr> {
    let payment_method = model
        .payment_method
        .parse()
        .map_err(|e: String| DbErr::Type(format!("orders.payment_method: {e}")))?;
    let payment_status = model
        .payment_status
        .parse()
        .map_err(|e: String| DbErr::Type(format!("orders.payment_status: {e}")))?;
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        delivery_line: model.delivery_line,
        delivery_station: model.delivery_station,
        delivery_address: model.delivery_address,
        total: model.total,
        payment_method,
        payment_status,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub fn order_line_from_entity(
    model: order_items::Model,
    product: Option<products::Model>,
) -> OrderLine {
    let (product_name, product_brand) = match product {
        Some(p) => (Some(p.name), Some(p.brand)),
        None => (None, None),
    };
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        size: model.size,
        price_at_purchase: model.price_at_purchase,
        product_name,
        product_brand,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn category_from_entity(model: categories::Model) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn user_from_entity(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        name: model.name,
        password_hash: model.password_hash,
        created_at: model.created_at.with_timezone(&Utc),
        role: model.role,
    }
}
