pub mod auth;
pub mod feedback;
pub mod progress;
pub mod records;
pub mod videos;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::db::AppState;
use crate::models::{RecordIssue, SessionContext, TrainingRecord, ValidationError};
use crate::store::sample::EXERCISES;
use crate::store::{Direction, RecordQuery, RecordStore, SortField, StoreError};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

/// What a user action reports when it cannot complete.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
  /// Input rejected before any store call
  #[error("{0}")]
  Validation(#[from] ValidationError),

  /// Store unreachable or credentials refused; retry is manual
  #[error("{0}")]
  Connectivity(String),

  #[error("Please sign in or continue as a guest")]
  NotSignedIn,

  #[error("{0}")]
  Auth(String),

  /// The store answered but refused the request
  #[error("{0}")]
  Store(String),
}

impl Serialize for CommandError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl From<StoreError> for CommandError {
  fn from(e: StoreError) -> Self {
    if e.is_connectivity() {
      CommandError::Connectivity(e.to_string())
    } else {
      CommandError::Store(e.to_string())
    }
  }
}

impl From<AuthError> for CommandError {
  fn from(e: AuthError) -> Self {
    if e.is_connectivity() {
      CommandError::Connectivity(e.to_string())
    } else {
      CommandError::Auth(e.to_string())
    }
  }
}

/// Store for the session, or why there is none.
pub(crate) fn require_store<'a>(
  state: &'a AppState,
  session: &SessionContext,
) -> Result<&'a dyn RecordStore, CommandError> {
  if !session.is_guest && session.owner().is_none() {
    return Err(CommandError::NotSignedIn);
  }
  state
    .store_for(session)
    .ok_or_else(|| CommandError::Connectivity("No record store is configured".into()))
}

/// ---------------------------------------------------------------------------
/// History
/// ---------------------------------------------------------------------------

/// History filters; every field is optional and they combine as AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFilter {
  pub start: Option<NaiveDate>,
  pub end: Option<NaiveDate>,
  pub exercise: Option<String>,
}

impl HistoryFilter {
  /// The history screen's default window: the last 30 days.
  pub fn last_days(today: NaiveDate, days: u64) -> Self {
    Self {
      start: today.checked_sub_days(chrono::Days::new(days)),
      end: Some(today),
      exercise: None,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
  /// Newest first
  pub records: Vec<TrainingRecord>,
  pub rejected: Vec<RecordIssue>,
  pub is_sample: bool,
}

pub async fn get_history(
  state: &AppState,
  session: &SessionContext,
  filter: &HistoryFilter,
) -> Result<HistoryView, CommandError> {
  let store = require_store(state, session)?;

  let mut query = RecordQuery::owned_by(session.owner())
    .order(SortField::TrainingDate, Direction::Descending);
  if filter.start.is_some() || filter.end.is_some() {
    query = query.between(filter.start, filter.end);
  }
  if let Some(exercise) = filter.exercise.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
    query = query.exercise(exercise);
  }

  let set = store.query(session, &query).await?;
  Ok(HistoryView {
    records: set.records,
    rejected: set.rejected,
    is_sample: session.is_guest,
  })
}

/// ---------------------------------------------------------------------------
/// Exercise List
/// ---------------------------------------------------------------------------

/// Distinct exercise names for the session, sorted. Guests get the sample
/// list. A failing lookup other than connectivity yields an empty list.
pub async fn list_exercises(
  state: &AppState,
  session: &SessionContext,
) -> Result<Vec<String>, CommandError> {
  if session.is_guest {
    let mut names: Vec<String> = EXERCISES.iter().map(|(name, _, _)| name.to_string()).collect();
    names.sort();
    return Ok(names);
  }

  let store = require_store(state, session)?;
  let set = match store.query(session, &RecordQuery::owned_by(session.owner())).await {
    Ok(set) => set,
    Err(e) if e.is_connectivity() => return Err(e.into()),
    Err(e) => {
      tracing::warn!(error = %e, "failed to load exercise list");
      return Ok(Vec::new());
    }
  };

  let mut names: Vec<String> = set.records.into_iter().map(|r| r.exercise_name).collect();
  names.sort();
  names.dedup();
  Ok(names)
}

/// ---------------------------------------------------------------------------
/// Connection Status
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
  pub backend: String,
  pub connected: bool,
  pub message: Option<String>,
  pub signed_in_as: String,
  pub is_guest: bool,
  pub video_search: bool,
}

/// Probe the session's store. Never fails; problems land in `message`.
pub async fn connection_status(state: &AppState, session: &SessionContext) -> ConnectionStatus {
  let (backend, connected, message) = match state.store_for(session) {
    Some(store) => match store.ping(session).await {
      Ok(()) => (store.name().to_string(), true, None),
      Err(e) => {
        tracing::warn!(error = %e, backend = store.name(), "connection check failed");
        (store.name().to_string(), false, Some(e.to_string()))
      }
    },
    None => match &state.store {
      Some(store) => (store.name().to_string(), false, Some(CommandError::NotSignedIn.to_string())),
      None => ("none".to_string(), false, Some("No record store is configured".into())),
    },
  };

  ConnectionStatus {
    backend,
    connected,
    message,
    signed_in_as: session.display_name(),
    is_guest: session.is_guest,
    video_search: state.videos.is_some() && !session.is_guest,
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::test_utils::{date, mock_owned_record, signed_in_session, MemoryStore};
  use std::sync::Arc;
  use std::time::Duration;

  pub(crate) fn test_config() -> AppConfig {
    AppConfig {
      supabase: None,
      database_url: None,
      local_user: "local".into(),
      youtube_api_key: None,
      video_results: 3,
      http_timeout: Duration::from_secs(5),
      log_filter: "info".into(),
    }
  }

  pub(crate) fn state_with(store: Arc<MemoryStore>) -> AppState {
    AppState::with_store(store, test_config())
  }

  fn records() -> Vec<TrainingRecord> {
    vec![
      mock_owned_record("1", "u1", "2024-04-01", "Squat", 100.0, 5, 5),
      mock_owned_record("2", "u1", "2024-05-01", "Bench Press", 60.0, 8, 3),
      mock_owned_record("3", "u2", "2024-05-02", "Deadlift", 180.0, 3, 3),
      mock_owned_record("4", "u1", "2024-05-03", "Bench Press", 62.5, 8, 3),
    ]
  }

  #[tokio::test]
  async fn test_history_is_scoped_and_newest_first() {
    let store = Arc::new(MemoryStore::new(records()));
    let state = state_with(store.clone());
    let session = signed_in_session("u1", "2024-05-03");

    let view = get_history(&state, &session, &HistoryFilter::default()).await.unwrap();
    let ids: Vec<&str> = view.records.iter().map(|r| r.id.0.as_str()).collect();
    assert_eq!(ids, vec!["4", "2", "1"]);
    assert!(!view.is_sample);
  }

  #[tokio::test]
  async fn test_history_filters() {
    let state = state_with(Arc::new(MemoryStore::new(records())));
    let session = signed_in_session("u1", "2024-05-03");

    let filter = HistoryFilter {
      exercise: Some("Bench Press".into()),
      ..HistoryFilter::last_days(date("2024-05-03"), 30)
    };
    let view = get_history(&state, &session, &filter).await.unwrap();
    assert_eq!(view.records.len(), 2);
    assert!(view.records.iter().all(|r| r.exercise_name == "Bench Press"));
  }

  #[tokio::test]
  async fn test_history_requires_sign_in() {
    let state = state_with(Arc::new(MemoryStore::new(records())));
    let session = SessionContext::anonymous(date("2024-05-03"));

    let err = get_history(&state, &session, &HistoryFilter::default()).await.unwrap_err();
    assert!(matches!(err, CommandError::NotSignedIn));
  }

  #[tokio::test]
  async fn test_guest_reads_never_reach_store() {
    let store = Arc::new(MemoryStore::new(records()));
    let state = state_with(store.clone());
    let guest = SessionContext::guest(date("2024-05-30"));

    let view = get_history(&state, &guest, &HistoryFilter::default()).await.unwrap();
    assert!(view.is_sample);
    assert!(!view.records.is_empty());
    assert!(view.records.iter().all(|r| r.user_id.is_none()));

    let names = list_exercises(&state, &guest).await.unwrap();
    assert_eq!(names.len(), 5);

    let status = connection_status(&state, &guest).await;
    assert!(status.connected);
    assert_eq!(status.backend, "sample");

    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn test_exercise_list_is_distinct_and_sorted() {
    let state = state_with(Arc::new(MemoryStore::new(records())));
    let session = signed_in_session("u1", "2024-05-03");

    let names = list_exercises(&state, &session).await.unwrap();
    assert_eq!(names, vec!["Bench Press".to_string(), "Squat".to_string()]);
  }

  #[tokio::test]
  async fn test_exercise_list_degrades_on_store_error() {
    let state = state_with(Arc::new(MemoryStore::failing(|| StoreError::Database(
      "no such column".into(),
    ))));
    let session = signed_in_session("u1", "2024-05-03");
    assert!(list_exercises(&state, &session).await.unwrap().is_empty());

    let state = state_with(Arc::new(MemoryStore::failing(|| {
      StoreError::Connectivity("refused".into())
    })));
    let err = list_exercises(&state, &session).await.unwrap_err();
    assert!(matches!(err, CommandError::Connectivity(_)));
  }

  #[tokio::test]
  async fn test_connection_status_reports_failure() {
    let state = state_with(Arc::new(MemoryStore::failing(|| {
      StoreError::Unauthorized("invalid api key".into())
    })));
    let session = signed_in_session("u1", "2024-05-03");

    let status = connection_status(&state, &session).await;
    assert!(!status.connected);
    assert_eq!(status.backend, "memory");
    assert!(status.message.unwrap().contains("invalid api key"));
    assert_eq!(status.signed_in_as, "u1@example.com");
  }

  #[test]
  fn test_error_classification() {
    let err: CommandError = StoreError::Connectivity("timeout".into()).into();
    assert!(matches!(err, CommandError::Connectivity(_)));

    let err: CommandError = StoreError::Api {
      status: 400,
      message: "bad".into(),
    }
    .into();
    assert!(matches!(err, CommandError::Store(_)));

    let err: CommandError = AuthError::Rejected("Invalid login credentials".into()).into();
    assert_eq!(err.to_string(), "Authentication failed: Invalid login credentials");
  }
}
