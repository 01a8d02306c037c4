//! Guest-mode data source
//!
//! Generates a month of plausible training history ending at the session's
//! `today`. The generator is seeded from that date, so one simulated day
//! always yields the same history and tests can pin exact values.

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{RecordQuery, RecordStore, StoreError};
use crate::models::{NewTrainingRecord, RecordId, RecordSet, SessionContext, TrainingRecord};

/// Days of history, today included
pub const SAMPLE_DAYS: u64 = 30;

/// (name, base weight kg, base reps)
pub const EXERCISES: [(&str, f64, i32); 5] = [
  ("Bench Press", 60.0, 8),
  ("Squat", 80.0, 8),
  ("Deadlift", 100.0, 6),
  ("Pull-up", 0.0, 10),
  ("Push-up", 0.0, 15),
];

const KEEP_PROBABILITY: f64 = 0.7;
const SAMPLE_NOTE: &str = "sample data";

/// Build the sample history for `today`, newest day first.
pub fn generate_sample_records(today: NaiveDate) -> Vec<TrainingRecord> {
  let mut rng = StdRng::seed_from_u64(u64::from(today.num_days_from_ce().unsigned_abs()));
  let mut records = Vec::new();

  for days_ago in 0..SAMPLE_DAYS {
    let Some(day) = today.checked_sub_days(Days::new(days_ago)) else {
      break;
    };

    let exercise_count = rng.gen_range(1..=3);
    for &(name, base_weight, base_reps) in EXERCISES.iter().take(exercise_count) {
      if !rng.gen_bool(KEEP_PROBABILITY) {
        continue;
      }

      // Up to +20% over the month, oldest day lightest
      let progress = (SAMPLE_DAYS - days_ago) as f64 / SAMPLE_DAYS as f64 * 0.2;
      let jitter: f64 = rng.gen_range(-2.0..=2.0);
      let weight = ((base_weight * (1.0 + progress) + jitter) * 10.0).round() / 10.0;
      let reps = base_reps + rng.gen_range(-2..=2);
      let sets = rng.gen_range(3..=5);

      records.push(TrainingRecord {
        id: RecordId(format!("sample-{}-{}", days_ago, name)),
        user_id: None,
        training_date: day,
        exercise_name: name.to_string(),
        weight: weight.max(0.0),
        reps: u32::try_from(reps.max(1)).unwrap_or(1),
        sets,
        notes: SAMPLE_NOTE.to_string(),
      });
    }
  }

  records
}

/// Record store for guest sessions. Reads run against generated data; writes
/// are acknowledged and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleStore;

impl SampleStore {
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl RecordStore for SampleStore {
  async fn insert(
    &self,
    _session: &SessionContext,
    record: NewTrainingRecord,
  ) -> Result<TrainingRecord, StoreError> {
    tracing::info!(
      exercise = %record.exercise_name,
      "guest submission acknowledged, not persisted"
    );
    Ok(record.into_record(RecordId("unsaved".into()), None))
  }

  async fn query(
    &self,
    session: &SessionContext,
    query: &RecordQuery,
  ) -> Result<RecordSet, StoreError> {
    let records = generate_sample_records(session.today);
    // Sample rows carry no owner, so the user scope is dropped
    let query = RecordQuery {
      user_id: None,
      ..query.clone()
    };
    Ok(RecordSet::from_records(query.apply(&records)))
  }

  async fn ping(&self, _session: &SessionContext) -> Result<(), StoreError> {
    Ok(())
  }

  fn name(&self) -> &'static str {
    "sample"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::{Direction, SortField};
  use crate::test_utils::date;

  #[test]
  fn test_same_day_same_history() {
    let a = generate_sample_records(date("2024-05-30"));
    let b = generate_sample_records(date("2024-05-30"));
    assert_eq!(a, b);
    assert!(!a.is_empty());
  }

  #[test]
  fn test_history_spans_thirty_days_ending_today() {
    let today = date("2024-05-30");
    let records = generate_sample_records(today);
    let earliest = date("2024-05-01");

    assert!(records
      .iter()
      .all(|r| r.training_date <= today && r.training_date >= earliest));
    assert!(records.iter().all(|r| r.user_id.is_none()));
    assert!(records.iter().all(|r| r.notes == "sample data"));
  }

  #[test]
  fn test_values_respect_record_invariants() {
    for day in ["2024-01-15", "2024-05-30", "2025-02-28"] {
      for record in generate_sample_records(date(day)) {
        assert!(record.weight >= 0.0);
        assert!(record.reps >= 1);
        assert!((3..=5).contains(&record.sets));
        assert!(EXERCISES.iter().any(|(name, _, _)| *name == record.exercise_name));
        // one decimal place
        assert_eq!((record.weight * 10.0).round() / 10.0, record.weight);
      }
    }
  }

  #[test]
  fn test_ids_encode_day_and_exercise() {
    let records = generate_sample_records(date("2024-05-30"));
    let first = &records[0];
    assert!(first.id.0.starts_with("sample-"));
    assert!(first.id.0.ends_with(&first.exercise_name));
  }

  #[test]
  fn test_bench_press_trends_upward() {
    let records = generate_sample_records(date("2024-05-30"));
    let bench: Vec<&TrainingRecord> = records
      .iter()
      .filter(|r| r.exercise_name == "Bench Press")
      .collect();

    // Bench Press is always the first candidate, so it appears on most days
    assert!(bench.len() >= 10);
    // Base 60kg: day 29 sits near 60.4, today near 72, jitter is +/-2
    assert!(bench.iter().all(|r| r.weight >= 58.0 && r.weight <= 74.0));
  }

  #[test]
  fn test_bodyweight_exercises_clamp_at_zero() {
    let records = generate_sample_records(date("2024-05-30"));
    let pull_ups = records.iter().filter(|r| r.exercise_name == "Pull-up");
    for record in pull_ups {
      assert!(record.weight >= 0.0 && record.weight <= 2.0);
    }
  }

  #[tokio::test]
  async fn test_query_ignores_user_scope_and_applies_filters() {
    let store = SampleStore::new();
    let session = crate::test_utils::signed_in_session("u1", "2024-05-30");

    let query = RecordQuery::owned_by(session.owner())
      .exercise("Bench Press")
      .order(SortField::TrainingDate, Direction::Ascending);
    let set = store.query(&session, &query).await.unwrap();

    assert!(!set.is_empty());
    assert!(set.records.iter().all(|r| r.exercise_name == "Bench Press"));
    assert!(set
      .records
      .windows(2)
      .all(|w| w[0].training_date <= w[1].training_date));
  }

  #[tokio::test]
  async fn test_insert_is_not_persisted() {
    let store = SampleStore::new();
    let session = SessionContext::guest(date("2024-05-30"));
    let before = store.query(&session, &RecordQuery::default()).await.unwrap();

    let record = crate::test_utils::mock_new_record("2024-05-30", "Lunge", 40.0, 10, 3);
    let saved = store.insert(&session, record).await.unwrap();
    assert_eq!(saved.id, RecordId("unsaved".into()));

    let after = store.query(&session, &RecordQuery::default()).await.unwrap();
    assert_eq!(before, after);
    assert!(after.records.iter().all(|r| r.exercise_name != "Lunge"));
  }
}
