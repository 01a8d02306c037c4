use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::store::supabase::SupabaseConfig;
use crate::youtube::DEFAULT_MAX_RESULTS;

const DEFAULT_LOCAL_USER: &str = "local";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_LOG_FILTER: &str = "info";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Invalid value for {name}: {value:?}")]
  Invalid { name: String, value: String },
}

impl Serialize for ConfigError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Application Configuration
/// ---------------------------------------------------------------------------

/// Everything read from the environment at startup. Call `dotenvy::dotenv()`
/// first to pick up a `.env` file.
#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Hosted store and auth service; takes precedence over SQLite
  pub supabase: Option<SupabaseConfig>,
  /// SQLite URL or file path for a self-hosted store
  pub database_url: Option<String>,
  /// User id that owns records in the SQLite store
  pub local_user: String,
  pub youtube_api_key: Option<String>,
  pub video_results: u32,
  pub http_timeout: Duration,
  pub log_filter: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let supabase = match (non_empty("url", "SUPABASE_URL"), non_empty("key", "SUPABASE_KEY")) {
      (None, None) => None,
      _ => Some(SupabaseConfig::from_env()?),
    };

    Ok(Self {
      supabase,
      database_url: non_empty("LIFT_REVIEW_DATABASE_URL", "LIFT_REVIEW_DATABASE_URL"),
      local_user: env::var("LIFT_REVIEW_LOCAL_USER")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOCAL_USER.into()),
      youtube_api_key: non_empty("YOUTUBE_API_KEY", "YOUTUBE_API_KEY"),
      video_results: parse_var("LIFT_REVIEW_VIDEO_RESULTS", DEFAULT_MAX_RESULTS)?,
      http_timeout: Duration::from_secs(parse_var(
        "LIFT_REVIEW_HTTP_TIMEOUT_SECS",
        DEFAULT_HTTP_TIMEOUT_SECS,
      )?),
      log_filter: env::var("LIFT_REVIEW_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    })
  }

  /// Whether any persistent store is configured. Without one only guest
  /// mode is available.
  pub fn has_store(&self) -> bool {
    self.supabase.is_some() || self.database_url.is_some()
  }
}

/// First non-blank value of `name`, then `fallback`.
fn non_empty(name: &str, fallback: &str) -> Option<String> {
  env::var(name)
    .or_else(|_| env::var(fallback))
    .ok()
    .filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
  match env::var(name) {
    Ok(value) if !value.trim().is_empty() => value.trim().parse().map_err(|_| ConfigError::Invalid {
      name: name.to_string(),
      value,
    }),
    _ => Ok(default),
  }
}
