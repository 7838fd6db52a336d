//! Database module for PostgreSQL persistence

pub mod models;
pub mod repository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;

// Environment variable names
const ENV_POSTGRES_HOST: &str = "GEOPULSE_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "GEOPULSE_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "GEOPULSE_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "GEOPULSE_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "GEOPULSE_POSTGRES_DB";

// Default values
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "geopulse";
const DEFAULT_POSTGRES_PASSWORD: &str = "geopulse";
const DEFAULT_POSTGRES_DB: &str = "geopulse";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

/// Initialize database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scans (
            id UUID PRIMARY KEY,
            project_id UUID NOT NULL,
            status VARCHAR(20) NOT NULL,
            total_queries INTEGER NOT NULL DEFAULT 0,
            total_results INTEGER NOT NULL DEFAULT 0,
            error_turns INTEGER NOT NULL DEFAULT 0,
            input_tokens BIGINT NOT NULL DEFAULT 0,
            output_tokens BIGINT NOT NULL DEFAULT 0,
            query_cost_usd DOUBLE PRECISION NOT NULL DEFAULT 0,
            evaluation_cost_usd DOUBLE PRECISION NOT NULL DEFAULT 0,
            avg_visibility DOUBLE PRECISION,
            avg_sentiment DOUBLE PRECISION,
            avg_ranking DOUBLE PRECISION,
            avg_recommendation DOUBLE PRECISION,
            resilience_final DOUBLE PRECISION,
            resilience_initial DOUBLE PRECISION,
            resilience_bonus DOUBLE PRECISION,
            brand_persistence DOUBLE PRECISION,
            sentiment_stability DOUBLE PRECISION,
            follow_up_active BOOLEAN,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            completed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scan_turns (
            id UUID PRIMARY KEY,
            scan_id UUID NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
            query_text TEXT NOT NULL,
            model VARCHAR(100) NOT NULL,
            level SMALLINT NOT NULL DEFAULT 0,
            follow_up_question TEXT,
            response_text TEXT NOT NULL DEFAULT '',
            input_tokens BIGINT NOT NULL DEFAULT 0,
            output_tokens BIGINT NOT NULL DEFAULT 0,
            cost_usd DOUBLE PRECISION NOT NULL DEFAULT 0,
            visibility DOUBLE PRECISION,
            sentiment DOUBLE PRECISION,
            ranking DOUBLE PRECISION,
            recommendation DOUBLE PRECISION,
            error TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scan_queue (
            scan_id UUID PRIMARY KEY,
            status VARCHAR(20) NOT NULL,
            progress_current INTEGER NOT NULL DEFAULT 0,
            progress_total INTEGER NOT NULL DEFAULT 0,
            progress_message TEXT NOT NULL DEFAULT '',
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes separately
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scans_project_id ON scans(project_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scans_created_at ON scans(created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scan_turns_scan_id ON scan_turns(scan_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database schema initialized");

    Ok(())
}
