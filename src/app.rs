//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::db::repository::{PgQueueProvider, PgScanStore};
use crate::model::Config;
use crate::service::scan::QueueStatusProvider;
use crate::service::{OpenAiInvoker, ScanOrchestrator, ScanStore};

/// Application state containing all services and shared resources
///
/// This struct centralizes service initialization and makes it easy to inject
/// dependencies into Actix-web handlers.
pub struct AppState {
    /// Database connection pool
    pub db_pool: Arc<PgPool>,
    /// Scan and turn persistence
    pub store: Arc<dyn ScanStore>,
    /// Queue status and progress records
    pub queue: Arc<dyn QueueStatusProvider>,
    /// Scan executor
    pub orchestrator: Arc<ScanOrchestrator>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. Service dependency graph construction
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        let store: Arc<dyn ScanStore> = Arc::new(PgScanStore::new(db_pool.clone()));
        let queue: Arc<dyn QueueStatusProvider> = Arc::new(PgQueueProvider::new(db_pool.clone()));

        let orchestrator = Arc::new(
            ScanOrchestrator::new(
                Arc::clone(&store),
                Arc::clone(&queue),
                Arc::new(OpenAiInvoker::new()),
            )
            .with_pause_poll_interval(Duration::from_secs(config.scan.pause_poll_seconds)),
        );

        Ok(Self {
            db_pool: Arc::new(db_pool),
            store,
            queue,
            orchestrator,
        })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),
}
