use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    notify::OutboundSink,
    payment::PaymentGateway,
    store::OrderStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub orders: Arc<dyn OrderStore>,
    pub outbound: Arc<dyn OutboundSink>,
    pub payments: Arc<dyn PaymentGateway>,
}
