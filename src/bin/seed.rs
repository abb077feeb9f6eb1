use rust_decimal::Decimal;
use serde_json::json;
use urbangoal_api::{
    db::{DbPool, create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

struct SampleProduct {
    id: &'static str,
    name: &'static str,
    brand: &'static str,
    price: i64,
    original_price: i64,
    image: &'static str,
    description: &'static str,
    sizes: &'static [(&'static str, i32)],
    featured: bool,
}

const SAMPLE_PRODUCTS: [SampleProduct; 3] = [
    SampleProduct {
        id: "prod-1",
        name: "Air Jordan 1 Retro",
        brand: "Nike",
        price: 120,
        original_price: 180,
        image: "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=800&q=80",
        description: "Zapatillas clásicas de baloncesto con estilo retro",
        sizes: &[("36", 5), ("37", 3), ("38", 8), ("39", 2)],
        featured: true,
    },
    SampleProduct {
        id: "prod-2",
        name: "Adidas Superstar",
        brand: "Adidas",
        price: 90,
        original_price: 110,
        image: "https://images.unsplash.com/photo-1587563871167-1ee9c731aefb?w=800&q=80",
        description: "Las icónicas Superstar con la clásica banda de tres rayas",
        sizes: &[("36", 4), ("37", 6), ("38", 5)],
        featured: true,
    },
    SampleProduct {
        id: "prod-3",
        name: "Puma RS-X",
        brand: "Puma",
        price: 85,
        original_price: 120,
        image: "https://images.unsplash.com/photo-1560769629-975ec94e6a86?w=800&q=80",
        description: "Zapatillas deportivas modernas y cómodas",
        sizes: &[("36", 3), ("37", 5), ("38", 7), ("39", 4)],
        featured: false,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;
    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@urbangoal.mx".to_string());
    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_admin(&pool, &admin_email, &admin_password).await?;
    ensure_category(&pool, "Tenis", "tenis").await?;
    let inserted = seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, new products: {inserted}");
    Ok(())
}

async fn ensure_admin(pool: &DbPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role)
        VALUES ($1, $2, 'Administrador', $3, 'admin')
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {email}");
    Ok(id)
}

async fn ensure_category(pool: &DbPool, name: &str, slug: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .execute(pool)
    .await?;
    Ok(())
}

// Existing rows are left alone so re-seeding never resets live stock.
async fn seed_products(pool: &DbPool) -> anyhow::Result<u64> {
    let mut inserted = 0;
    for product in &SAMPLE_PRODUCTS {
        let sizes: Vec<_> = product
            .sizes
            .iter()
            .map(|(value, stock)| json!({ "value": value, "stock": stock }))
            .collect();

        let result = sqlx::query(
            r#"
            INSERT INTO products
                (id, name, brand, price, original_price, images, description, sizes, category, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'tenis', $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(product.id)
        .bind(product.name)
        .bind(product.brand)
        .bind(Decimal::from(product.price))
        .bind(Decimal::from(product.original_price))
        .bind(json!([product.image]))
        .bind(product.description)
        .bind(json!(sizes))
        .bind(product.featured)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    println!("Seeded products");
    Ok(inserted)
}
