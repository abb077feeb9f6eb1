use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use urbangoal_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    notify::{HttpMailer, TaskDispatcher, TwilioMessenger},
    payment::HttpPaymentGateway,
    routes::app,
    state::AppState,
    store::SeaOrmOrderStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,urbangoal_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(&pool);

    if !config.twilio.is_configured() {
        tracing::warn!("TWILIO_ACCOUNT_SID/TWILIO_AUTH_TOKEN not set, whatsapp messages disabled");
    }
    if config.notify.admin_email.is_none() {
        tracing::warn!("ADMIN_EMAIL not set, admin order emails will fail");
    }
    tracing::info!(stock_policy = %config.stock_policy, "order placement configured");

    let dispatcher = TaskDispatcher::new(
        Arc::new(HttpMailer::new(config.mail.clone())?),
        Arc::new(TwilioMessenger::new(config.twilio.clone())?),
        config.notify.clone(),
    );

    let state = AppState {
        pool,
        orders: Arc::new(SeaOrmOrderStore::new(orm.clone())),
        orm,
        outbound: Arc::new(dispatcher),
        payments: Arc::new(HttpPaymentGateway::new(config.payment.clone())?),
        config: Arc::new(config),
    };

    let addr = SocketAddr::from((
        state.config.host.parse::<std::net::IpAddr>()?,
        state.config.port,
    ));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app(state)).await?;

    Ok(())
}
