//! Persistence layer. One store type per collection, each borrowing the
//! shared connection pool injected through AppState.

pub mod documents;
pub mod orders;
pub mod payments;
pub mod users;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

pub use documents::DocumentStore;
pub use orders::{Order, OrderStore};
pub use payments::PaymentStore;
pub use users::{UpsertOutcome, UserStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unreachable: {0}")]
    Unavailable(sqlx::Error),

    #[error("query error: {0}")]
    Query(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err)
            }
            other => StoreError::Query(other),
        }
    }
}

/// Open the connection pool. Called once at process start; the pool is
/// closed when the process exits.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(StoreError::Unavailable)?;
    Ok(pool)
}

/// Create the collection tables if they do not exist yet. Idempotent.
pub async fn init_schema(pool: &PgPool) -> Result<(), StoreError> {
    // Role lives outside the merged doc so a login upsert can never
    // overwrite an admin grant.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            email       TEXT PRIMARY KEY,
            role        TEXT,
            doc         JSONB NOT NULL DEFAULT '{}'::jsonb
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id              UUID PRIMARY KEY,
            email           TEXT,
            paid            BOOLEAN NOT NULL DEFAULT FALSE,
            transaction_id  TEXT,
            doc             JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only payment log; never read back by the API.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id          UUID PRIMARY KEY,
            order_id    UUID,
            doc         JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    for collection in documents::COLLECTIONS {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id          UUID PRIMARY KEY,
                doc         JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
            collection
        ))
        .execute(pool)
        .await?;
    }

    info!("store schema ready");
    Ok(())
}
