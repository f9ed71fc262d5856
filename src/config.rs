use std::env;

use serde::Serialize;

use crate::session::DEFAULT_REST_SECONDS;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const DEFAULT_DATABASE_URL: &str = "sqlite://fitlog.db?mode=rwc";

const DATABASE_URL_VAR: &str = "FITLOG_DATABASE_URL";
const REST_SECONDS_VAR: &str = "FITLOG_REST_SECONDS";
const SEED_DEFAULTS_VAR: &str = "FITLOG_SEED_DEFAULTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
  pub database_url: String,
  /// Rest length a new session starts with
  pub rest_seconds: u32,
  /// Insert the default catalog, templates and sample history into an empty store
  pub seed_defaults: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      rest_seconds: DEFAULT_REST_SECONDS,
      seed_defaults: true,
    }
  }
}

impl AppConfig {
  /// Read settings from the environment. Unset variables take defaults;
  /// set but unparseable ones are errors.
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let database_url = match env::var(DATABASE_URL_VAR) {
      Ok(url) if !url.trim().is_empty() => url,
      _ => defaults.database_url,
    };

    let rest_seconds = match env::var(REST_SECONDS_VAR) {
      Ok(raw) => raw.trim().parse::<u32>().map_err(|_| ConfigError::Invalid {
        var: REST_SECONDS_VAR,
        value: raw.clone(),
      })?,
      Err(_) => defaults.rest_seconds,
    };

    let seed_defaults = match env::var(SEED_DEFAULTS_VAR) {
      Ok(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
        var: SEED_DEFAULTS_VAR,
        value: raw.clone(),
      })?,
      Err(_) => defaults.seed_defaults,
    };

    Ok(Self {
      database_url,
      rest_seconds,
      seed_defaults,
    })
  }
}

fn parse_flag(raw: &str) -> Option<bool> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {var}: {value:?}")]
  Invalid { var: &'static str, value: String },
}

impl Serialize for ConfigError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}
