pub mod schema;

pub use schema::*;

use crate::error::AppError;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

/// Applies the declarative schema. Every statement is `IF NOT EXISTS`,
/// so re-running against an existing database is a no-op.
#[instrument(skip(pool))]
pub async fn initialize_database(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    info!("Applying database schema");
    sqlx::raw_sql(CURRENT_SCHEMA).execute(pool).await?;
    Ok(())
}
