pub mod catalog;
pub mod chart_window;
pub mod commands;
pub mod config;
pub mod db;
pub mod export;
pub mod history;
pub mod models;
pub mod personal_records;
pub mod sequencer;
pub mod session;
pub mod statistics;

#[cfg(test)]
mod test_utils;

use config::AppConfig;
use db::AppState;
use statistics::DateRange;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info` level
pub fn init_tracing() {
  // A second call (e.g. from a host that already set one up) is a no-op
  let _ = tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(tracing_subscriber::fmt::layer())
    .try_init();
}

/// Open the store, seed it on first run and return the shared state
pub async fn setup(config: AppConfig) -> Result<AppState, db::StoreError> {
  let pool = db::initialize_db(&config).await?;

  if config.seed_defaults {
    let report = catalog::seed_defaults(&pool).await?;
    tracing::info!(?report, "Default data checked");
  }

  Ok(AppState::new(pool, config))
}

pub async fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  init_tracing();

  let config = match AppConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      tracing::error!(error = %e, "Invalid configuration");
      return;
    }
  };

  let state = match setup(config).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialize database");
      return;
    }
  };

  let (exercises, templates, workout_days) = tokio::join!(
    commands::exercises::list_exercises(&state),
    commands::exercises::list_templates(&state),
    history::count_workout_days(&state.db),
  );
  match (exercises, templates, workout_days) {
    (Ok(exercises), Ok(templates), Ok(workout_days)) => tracing::info!(
      exercises = exercises.len(),
      templates = templates.len(),
      workout_days,
      "Database ready"
    ),
    _ => tracing::warn!("Database ready, but the store summary could not be read"),
  }

  if let Ok(Some(summary)) = commands::statistics::compute_statistics(&state, DateRange::Last30Days).await {
    tracing::info!(
      sessions = summary.hypertrophy_sessions + summary.cardio_sessions,
      weight_lifted = summary.weight_lifted,
      distance_km = summary.distance_km,
      "{}",
      summary.range
    );
  }

  state.db.close().await;
}
