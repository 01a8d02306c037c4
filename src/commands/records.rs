use serde::Serialize;

use super::{require_store, CommandError};
use crate::db::AppState;
use crate::models::{RecordForm, SessionContext, TrainingRecord};

/// ---------------------------------------------------------------------------
/// Submit Record
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum SubmitOutcome {
  /// Persisted with a store-assigned id
  Saved(TrainingRecord),
  /// Guest submission: validated and acknowledged, nothing stored
  Simulated(TrainingRecord),
}

impl SubmitOutcome {
  pub fn record(&self) -> &TrainingRecord {
    match self {
      Self::Saved(record) | Self::Simulated(record) => record,
    }
  }

  pub fn message(&self) -> &'static str {
    match self {
      Self::Saved(_) => "Training record saved",
      Self::Simulated(_) => {
        "Guest mode: submission simulated, nothing was saved. Sign up to keep your records."
      }
    }
  }
}

/// Validate the form, then persist it for the session's user.
pub async fn submit_record(
  state: &AppState,
  session: &SessionContext,
  form: &RecordForm,
) -> Result<SubmitOutcome, CommandError> {
  let record = form.parse(session.today)?;
  let store = require_store(state, session)?;

  let saved = store.insert(session, record).await?;
  if session.is_guest {
    return Ok(SubmitOutcome::Simulated(saved));
  }

  tracing::info!(id = %saved.id, exercise = %saved.exercise_name, "training record saved");
  Ok(SubmitOutcome::Saved(saved))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::tests::{state_with, test_config};
  use crate::commands::{get_history, HistoryFilter};
  use crate::db::AppState;
  use crate::models::UserId;
  use crate::store::{SqliteStore, StoreError};
  use crate::test_utils::{date, setup_test_db, signed_in_session, teardown_test_db, MemoryStore};
  use std::sync::Arc;

  fn bench_form() -> RecordForm {
    RecordForm {
      training_date: Some(date("2024-05-01")),
      exercise_name: "Bench Press".into(),
      weight: "60.0".into(),
      reps: "8".into(),
      sets: "3".into(),
      notes: String::new(),
    }
  }

  #[tokio::test]
  async fn test_submit_then_history_returns_record() {
    let pool = setup_test_db().await;
    let state = AppState::with_store(Arc::new(SqliteStore::new(pool.clone())), test_config());
    let session = signed_in_session("U", "2024-05-01");

    let outcome = submit_record(&state, &session, &bench_form()).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Saved(_)));

    let view = get_history(&state, &session, &HistoryFilter::default()).await.unwrap();
    assert_eq!(view.records.len(), 1);
    let record = &view.records[0];
    assert_eq!(record.user_id, Some(UserId::new("U")));
    assert_eq!(record.training_date, date("2024-05-01"));
    assert_eq!(record.exercise_name, "Bench Press");
    assert_eq!(record.weight, 60.0);
    assert_eq!((record.reps, record.sets), (8, 3));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_invalid_form_never_reaches_store() {
    let store = Arc::new(MemoryStore::new(Vec::new()));
    let state = state_with(store.clone());
    let session = signed_in_session("u1", "2024-05-01");

    let mut form = bench_form();
    form.reps = "0".into();
    let err = submit_record(&state, &session, &form).await.unwrap_err();
    assert!(matches!(err, CommandError::Validation(_)));

    let mut form = bench_form();
    form.training_date = Some(date("2024-05-02"));
    let err = submit_record(&state, &session, &form).await.unwrap_err();
    assert!(matches!(err, CommandError::Validation(_)));

    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn test_guest_submission_is_simulated() {
    let store = Arc::new(MemoryStore::new(Vec::new()));
    let state = state_with(store.clone());
    let guest = SessionContext::guest(date("2024-05-01"));

    let outcome = submit_record(&state, &guest, &bench_form()).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Simulated(_)));
    assert_eq!(outcome.record().exercise_name, "Bench Press");
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn test_anonymous_submission_requires_sign_in() {
    let state = state_with(Arc::new(MemoryStore::new(Vec::new())));
    let session = SessionContext::anonymous(date("2024-05-01"));

    let err = submit_record(&state, &session, &bench_form()).await.unwrap_err();
    assert!(matches!(err, CommandError::NotSignedIn));
  }

  #[tokio::test]
  async fn test_store_outage_is_connectivity_error() {
    let state = state_with(Arc::new(MemoryStore::failing(|| {
      StoreError::Connectivity("connection refused".into())
    })));
    let session = signed_in_session("u1", "2024-05-01");

    let err = submit_record(&state, &session, &bench_form()).await.unwrap_err();
    assert!(matches!(err, CommandError::Connectivity(_)));
  }
}
