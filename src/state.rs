use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::auth::session::SessionStore;
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(
            config.session_ttl_minutes * 60,
        )));
        Ok(Self {
            db,
            config,
            sessions,
        })
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, sessions: Arc<SessionStore>) -> Self {
        Self {
            db,
            config,
            sessions,
        }
    }
}

/// State over an in-memory database, for handler tests.
#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let db = db::test_pool().await;
    let config = Arc::new(AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        session_ttl_minutes: 60,
    });
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(3600)));
    AppState::from_parts(db, config, sessions)
}
