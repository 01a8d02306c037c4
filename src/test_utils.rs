//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock record factories
//! - Session fixtures

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use crate::models::{
  NewTrainingRecord, RecordId, RecordSet, SessionContext, TrainingRecord, UserId,
};
use crate::store::{RecordQuery, RecordStore, StoreError};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed a small history: three Bench Press sessions for `u1`, one Squat
/// for `u1`, and rows belonging to `u2` that must never leak into `u1`.
/// Returns the row ids in insertion order.
pub async fn seed_test_records(pool: &SqlitePool) -> Vec<i64> {
  let rows = [
    ("u1", "2024-05-01", "Bench Press", 60.0, 8, 3),
    ("u2", "2024-05-02", "Bench Press", 120.0, 5, 5),
    ("u1", "2024-05-03", "Bench Press", 62.5, 8, 3),
    ("u1", "2024-05-04", "Squat", 100.0, 5, 5),
    ("u1", "2024-05-10", "Bench Press", 65.0, 6, 3),
    ("u2", "2024-05-10", "Squat", 140.0, 3, 3),
  ];

  let mut ids = Vec::new();
  for (user, day, name, weight, reps, sets) in rows {
    let result = sqlx::query(
      r#"
      INSERT INTO training_records (
        user_id, training_date, exercise_name, weight, reps, sets, notes
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, '')
      "#,
    )
    .bind(user)
    .bind(date(day))
    .bind(name)
    .bind(weight)
    .bind(reps)
    .bind(sets)
    .execute(pool)
    .await
    .expect("Failed to insert test record");

    ids.push(result.last_insert_rowid());
  }

  ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` literal
pub fn date(s: &str) -> NaiveDate {
  s.parse().expect("test dates are ISO formatted")
}

/// A stored record without an owner
pub fn mock_record(
  id: &str,
  day: &str,
  exercise: &str,
  weight: f64,
  reps: u32,
  sets: u32,
) -> TrainingRecord {
  TrainingRecord {
    id: RecordId(id.to_string()),
    user_id: None,
    training_date: date(day),
    exercise_name: exercise.to_string(),
    weight,
    reps,
    sets,
    notes: String::new(),
  }
}

pub fn mock_owned_record(
  id: &str,
  user: &str,
  day: &str,
  exercise: &str,
  weight: f64,
  reps: u32,
  sets: u32,
) -> TrainingRecord {
  TrainingRecord {
    user_id: Some(UserId::new(user)),
    ..mock_record(id, day, exercise, weight, reps, sets)
  }
}

pub fn mock_new_record(day: &str, exercise: &str, weight: f64, reps: u32, sets: u32) -> NewTrainingRecord {
  NewTrainingRecord {
    training_date: date(day),
    exercise_name: exercise.to_string(),
    weight,
    reps,
    sets,
    notes: String::new(),
  }
}

/// A signed-in session for `user` on `today`, no bearer token
pub fn signed_in_session(user: &str, today: &str) -> SessionContext {
  SessionContext::signed_in(
    UserId::new(user),
    Some(format!("{}@example.com", user)),
    None,
    date(today),
  )
}

/// ---------------------------------------------------------------------------
/// Store Doubles
/// ---------------------------------------------------------------------------

/// In-memory record store that counts every call it receives. Can be set up
/// to fail every call with a given error.
pub struct MemoryStore {
  records: Mutex<Vec<TrainingRecord>>,
  calls: AtomicUsize,
  failure: Option<fn() -> StoreError>,
}

impl MemoryStore {
  pub fn new(records: Vec<TrainingRecord>) -> Self {
    Self {
      records: Mutex::new(records),
      calls: AtomicUsize::new(0),
      failure: None,
    }
  }

  pub fn failing(failure: fn() -> StoreError) -> Self {
    Self {
      failure: Some(failure),
      ..Self::new(Vec::new())
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(AtomicOrdering::SeqCst)
  }

  fn enter(&self) -> Result<(), StoreError> {
    self.calls.fetch_add(1, AtomicOrdering::SeqCst);
    match self.failure {
      Some(failure) => Err(failure()),
      None => Ok(()),
    }
  }
}

#[async_trait]
impl RecordStore for MemoryStore {
  async fn insert(
    &self,
    session: &SessionContext,
    record: NewTrainingRecord,
  ) -> Result<TrainingRecord, StoreError> {
    self.enter()?;
    let mut records = self.records.lock().expect("store lock poisoned");
    let saved = record.into_record(
      RecordId((records.len() + 1).to_string()),
      session.owner().cloned(),
    );
    records.push(saved.clone());
    Ok(saved)
  }

  async fn query(
    &self,
    _session: &SessionContext,
    query: &RecordQuery,
  ) -> Result<RecordSet, StoreError> {
    self.enter()?;
    let records = self.records.lock().expect("store lock poisoned");
    Ok(RecordSet::from_records(query.apply(&records)))
  }

  async fn ping(&self, _session: &SessionContext) -> Result<(), StoreError> {
    self.enter()
  }

  fn name(&self) -> &'static str {
    "memory"
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name = 'training_records'",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_records_returns_correct_count() {
    let pool = setup_test_db().await;

    let ids = seed_test_records(&pool).await;
    assert_eq!(ids.len(), 6);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM training_records WHERE user_id = 'u1'")
      .fetch_one(&pool)
      .await
      .expect("Failed to count records");
    assert_eq!(count, 4);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_schema_rejects_invalid_rows() {
    let pool = setup_test_db().await;

    let result = sqlx::query(
      "INSERT INTO training_records (user_id, training_date, exercise_name, weight, reps, sets)
       VALUES ('u1', '2024-05-01', 'Squat', -1.0, 5, 5)",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "negative weight should violate the CHECK constraint");

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let record = mock_owned_record("1", "u1", "2024-05-01", "Squat", 100.0, 5, 5);
    assert_eq!(record.user_id, Some(UserId::new("u1")));
    assert_eq!(record.training_date, date("2024-05-01"));

    let new = mock_new_record("2024-05-01", "Squat", 100.0, 5, 5);
    assert!(new.validate(date("2024-05-01")).is_ok());

    let session = signed_in_session("u1", "2024-05-01");
    assert_eq!(session.owner(), Some(&UserId::new("u1")));
  }

  #[test]
  fn test_assert_approx_eq_macro() {
    assert_approx_eq!(62.5_f64, 62.500001_f64, 0.001);
  }
}
