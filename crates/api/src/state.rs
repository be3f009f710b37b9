//! Shared application state for the Axum API server.

use std::sync::Arc;

use sqlx::PgPool;

use courier_common::config::AppConfig;
use courier_dispatch::gateway::GatewayClient;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub gateway: Arc<GatewayClient>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let gateway = Arc::new(GatewayClient::new(&config));
        Self {
            pool,
            gateway,
            config,
        }
    }
}
