use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::AppConfig;
use crate::sequencer::RequestSequencer;

pub type DbPool = SqlitePool;

/// Application state shared by the command layer
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
  /// Orders overlapping statistics recomputations
  pub statistics_requests: RequestSequencer,
}

impl AppState {
  pub fn new(db: DbPool, config: AppConfig) -> Self {
    Self {
      db,
      config,
      statistics_requests: RequestSequencer::new(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("{kind} not found: {name}")]
  NotFound { kind: &'static str, name: String },

  #[error("{kind} already exists: {name}")]
  Duplicate { kind: &'static str, name: String },

  #[error("Invalid input: {0}")]
  InvalidInput(String),
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// True when `err` is a UNIQUE/PRIMARY KEY constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
  match err {
    sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
    _ => false,
  }
}

/// Open the connection pool and run migrations
pub async fn initialize_db(config: &AppConfig) -> Result<DbPool, StoreError> {
  tracing::info!(url = %config.database_url, "Initializing database");

  // An in-memory database exists per connection, so it gets exactly one
  let max_connections = if config.database_url.contains(":memory:") { 1 } else { 5 };

  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections)
    .connect(&config.database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}
