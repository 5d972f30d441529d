//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::gateway::PaymentGateway;

/// Shared state injected into every handler. Cheaply cloneable via `Arc`;
/// constructed once in main, never captured from enclosing scope.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                gateway,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }
}
