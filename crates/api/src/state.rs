use std::sync::Arc;

use casting_reconcile::ReconciliationEngine;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: the pool and engine are reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    pub pool: casting_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub engine: ReconciliationEngine,
}

impl AppState {
    pub fn new(pool: casting_db::DbPool, config: ServerConfig) -> Self {
        Self {
            engine: ReconciliationEngine::new(pool.clone()),
            pool,
            config: Arc::new(config),
        }
    }
}
