use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: FileStore,
    pub config: Arc<AppConfig>,
}
