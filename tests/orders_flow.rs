mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use serde_json::json;

use common::{auth_user, catalog, config, order_request, order_trail};
use urbangoal_api::{
    db::{DbPool, create_pool, orm_from_pool, run_migrations},
    dto::{
        orders::UpdatePaymentStatusRequest,
        products::{CreateProductRequest, UpdateStockRequest},
    },
    entity::products::ActiveModel as ProductActive,
    error::AppError,
    models::PaymentStatus,
    notify::RecordingSink,
    services::{order_service, product_service},
    state::AppState,
    store::{OrderStore, SeaOrmOrderStore, StockPolicy},
};

// Every test here truncates the same tables.
static DB_LOCK: Mutex<()> = Mutex::new(());

// Postgres flow: place orders through the SeaORM store and check rows, stock and audit.
#[tokio::test]
async fn place_order_against_postgres() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _db = DB_LOCK.lock();
    let (state, sink, pool) = setup_state(&database_url, StockPolicy::Clamp).await?;

    let placed = order_service::place_order(
        &state,
        order_request(
            "order-1",
            json!([{ "productId": "prod-1", "quantity": 2, "size": "38", "price": 1 }]),
        ),
    )
    .await?
    .data
    .unwrap();

    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price_at_purchase, Decimal::from(120));
    assert_eq!(placed.items[0].product_name.as_deref(), Some("Air Jordan 1 Retro"));
    assert_eq!(stock(&state, "prod-1", "38").await?, 6);
    assert_eq!(sink.kinds().len(), 4);

    let trail = order_trail(&pool, "order-1").await?;
    assert_eq!(trail, vec!["order_placed".to_string()]);

    // Second line references a missing product: the first decrement must roll back.
    let err = order_service::place_order(
        &state,
        order_request(
            "order-2",
            json!([
                { "productId": "prod-2", "quantity": 1, "size": "36" },
                { "productId": "prod-404", "quantity": 1, "size": "36" }
            ]),
        ),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock(&state, "prod-2", "36").await?, 4);
    assert!(state.orders.order_with_items("order-2").await?.is_none());
    assert!(order_trail(&pool, "order-2").await?.is_empty());

    // Duplicate id fails in storage and leaves stock as it was.
    let err = order_service::place_order(
        &state,
        order_request(
            "order-1",
            json!([{ "productId": "prod-1", "quantity": 2, "size": "38" }]),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stock(&state, "prod-1", "38").await?, 6);

    let admin = auth_user("admin");
    let order = order_service::update_payment_status(
        &state,
        &admin,
        "order-1",
        UpdatePaymentStatusRequest {
            payment_status: "paid".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn concurrent_orders_serialise_on_product_rows() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _db = DB_LOCK.lock();
    let (state, _, _) = setup_state(&database_url, StockPolicy::Reject).await?;

    let mut tasks = Vec::new();
    for i in 0..6 {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            order_service::place_order(
                &state,
                order_request(
                    &format!("order-race-{i}"),
                    json!([{ "productId": "prod-1", "quantity": 1, "size": "39" }]),
                ),
            )
            .await
        }));
    }

    let mut placed = 0;
    for task in tasks {
        if task.await?.is_ok() {
            placed += 1;
        }
    }

    // size 39 starts with 2 units
    assert_eq!(placed, 2);
    assert_eq!(stock(&state, "prod-1", "39").await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stock_set_does_not_drop_concurrent_order_decrements() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _db = DB_LOCK.lock();
    let (state, _, _) = setup_state(&database_url, StockPolicy::Reject).await?;
    let admin = auth_user("admin");

    product_service::set_size_stock(
        &state,
        &admin,
        "prod-1",
        UpdateStockRequest {
            size: "36".into(),
            stock: 50,
        },
    )
    .await?;

    let rounds = 20;
    for round in 0..rounds {
        let order_state = state.clone();
        let order = tokio::spawn(async move {
            order_service::place_order(
                &order_state,
                order_request(
                    &format!("order-restock-{round}"),
                    json!([{ "productId": "prod-1", "quantity": 1, "size": "36" }]),
                ),
            )
            .await
        });
        let stock_state = state.clone();
        let admin = admin.clone();
        let restock = tokio::spawn(async move {
            product_service::set_size_stock(
                &stock_state,
                &admin,
                "prod-1",
                UpdateStockRequest {
                    size: "38".into(),
                    stock: 20,
                },
            )
            .await
        });
        order.await??;
        restock.await??;
    }

    assert_eq!(stock(&state, "prod-1", "36").await?, 50 - rounds);
    assert_eq!(stock(&state, "prod-1", "38").await?, 20);
    Ok(())
}

#[tokio::test]
async fn admin_manages_catalog() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _db = DB_LOCK.lock();
    let (state, _, _) = setup_state(&database_url, StockPolicy::Clamp).await?;
    let admin = auth_user("admin");

    let created = product_service::create_product(
        &state,
        &admin,
        serde_json::from_value::<CreateProductRequest>(json!({
            "name": "New Balance 550",
            "brand": "New Balance",
            "price": 110,
            "description": "Silueta retro de basketball en piel",
            "sizes": [{ "value": "40", "stock": 2 }],
            "category": "tenis"
        }))?,
    )
    .await?
    .data
    .unwrap();
    assert!(created.id.starts_with("prod-"));

    let updated = product_service::set_size_stock(
        &state,
        &admin,
        &created.id,
        UpdateStockRequest {
            size: "40".into(),
            stock: 9,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.stock_for("40"), Some(9));

    let duplicate = product_service::create_product(
        &state,
        &admin,
        serde_json::from_value::<CreateProductRequest>(json!({
            "id": "prod-1",
            "name": "Clash",
            "brand": "Nike",
            "price": 1,
            "description": "Producto con id repetido",
            "sizes": [{ "value": "38", "stock": 1 }],
            "category": "tenis"
        }))?,
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, AppError::Conflict(_)));

    let forbidden = product_service::delete_product(&state, &auth_user("user"), &created.id)
        .await
        .unwrap_err();
    assert!(matches!(forbidden, AppError::Forbidden));
    Ok(())
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run Postgres tests.");
            None
        }
    }
}

async fn stock(state: &AppState, product_id: &str, size: &str) -> anyhow::Result<i32> {
    let product = product_service::get_product(state, product_id)
        .await?
        .data
        .unwrap();
    product
        .stock_for(size)
        .ok_or_else(|| anyhow::anyhow!("size {size} missing on {product_id}"))
}

async fn setup_state(
    database_url: &str,
    policy: StockPolicy,
) -> anyhow::Result<(AppState, Arc<RecordingSink>, DbPool)> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(&pool);

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, audit_logs, products, categories, users CASCADE",
    ))
    .await?;

    for product in catalog() {
        ProductActive {
            id: Set(product.id),
            name: Set(product.name),
            brand: Set(product.brand),
            price: Set(product.price),
            original_price: Set(product.original_price),
            images: Set(json!(product.images)),
            description: Set(product.description),
            sizes: Set(serde_json::to_value(&product.sizes)?),
            category: Set(product.category),
            featured: Set(product.featured),
            created_at: Set(product.created_at.into()),
            updated_at: Set(product.updated_at.into()),
        }
        .insert(&orm)
        .await?;
    }

    let sink = Arc::new(RecordingSink::new());
    let mut cfg = config(policy);
    cfg.database_url = database_url.to_string();
    let state = AppState {
        pool: pool.clone(),
        orders: Arc::new(SeaOrmOrderStore::new(orm.clone())),
        orm,
        config: Arc::new(cfg),
        outbound: sink.clone(),
        payments: Arc::new(common::FakeGateway::default()),
    };
    Ok((state, sink, pool))
}
