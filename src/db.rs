use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

use crate::auth::AuthClient;
use crate::config::AppConfig;
use crate::models::{SessionContext, UserId};
use crate::store::{RecordStore, SampleStore, SqliteStore, StoreError, SupabaseStore};
use crate::youtube::YouTubeClient;

pub type DbPool = SqlitePool;

/// Application state: the configured record store plus the collaborators
/// every command may need.
pub struct AppState {
  /// Persistent store for signed-in users; `None` means guest mode only
  pub store: Option<Arc<dyn RecordStore>>,
  /// Guest data source
  pub sample: SampleStore,
  /// Hosted auth, present when the hosted store is configured
  pub auth: Option<AuthClient>,
  pub videos: Option<YouTubeClient>,
  pub config: AppConfig,
}

impl AppState {
  /// Build state from configuration. Supabase wins over SQLite when both
  /// are configured.
  pub async fn from_config(config: AppConfig) -> Result<Self, StoreError> {
    let (store, auth): (Option<Arc<dyn RecordStore>>, Option<AuthClient>) =
      match (&config.supabase, &config.database_url) {
        (Some(supabase), _) => {
          let store = SupabaseStore::new(supabase.clone(), config.http_timeout)?;
          let auth = AuthClient::new(supabase.clone(), config.http_timeout)
            .map_err(|e| StoreError::Connectivity(e.to_string()))?;
          tracing::info!(url = %supabase.url, "using hosted record store");
          let store: Arc<dyn RecordStore> = Arc::new(store);
          (Some(store), Some(auth))
        }
        (None, Some(database_url)) => {
          let pool = initialize_db(database_url).await?;
          let store: Arc<dyn RecordStore> = Arc::new(SqliteStore::new(pool));
          (Some(store), None)
        }
        (None, None) => {
          tracing::warn!("no record store configured, only guest mode is available");
          (None, None)
        }
      };

    let videos = match &config.youtube_api_key {
      Some(key) => match YouTubeClient::new(key.clone(), config.video_results, config.http_timeout) {
        Ok(client) => Some(client),
        Err(e) => {
          tracing::warn!(error = %e, "video search disabled");
          None
        }
      },
      None => None,
    };

    Ok(Self {
      store,
      sample: SampleStore::new(),
      auth,
      videos,
      config,
    })
  }

  /// State around an explicit store, no auth service or video search.
  pub fn with_store(store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
    Self {
      store: Some(store),
      sample: SampleStore::new(),
      auth: None,
      videos: None,
      config,
    }
  }

  /// Pick the store a session reads and writes. Guests always get sample
  /// data and never reach the configured store.
  pub fn store_for(&self, session: &SessionContext) -> Option<&dyn RecordStore> {
    if session.is_guest {
      return Some(&self.sample);
    }
    session.owner()?;
    self.store.as_deref()
  }

  /// Session for the single local user of a SQLite store, which has no
  /// auth service of its own.
  pub fn local_session(&self, today: chrono::NaiveDate) -> Option<SessionContext> {
    if self.auth.is_some() || self.store.is_none() {
      return None;
    }
    Some(SessionContext::signed_in(
      UserId::new(self.config.local_user.clone()),
      None,
      None,
      today,
    ))
  }
}

/// Accepts a full `sqlite:` URL or a bare file path.
fn database_url(target: &str) -> String {
  if target.starts_with("sqlite:") {
    target.to_string()
  } else {
    format!("sqlite://{}?mode=rwc", target)
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(target: &str) -> Result<DbPool, StoreError> {
  let db_url = database_url(target);

  tracing::info!(database = %target, "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .map_err(|e| StoreError::Database(format!("migration failed: {}", e)))?;

  tracing::info!("database initialized successfully");

  Ok(pool)
}
