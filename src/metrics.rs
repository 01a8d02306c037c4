//! Deterministic metrics over training records
//!
//! Volume and per-exercise bests. Every value here is recomputed from the
//! records on each read; nothing is stored.

use serde::{Deserialize, Serialize};

use crate::models::TrainingRecord;

/// weight × reps × sets
pub fn volume(record: &TrainingRecord) -> f64 {
  record.weight * f64::from(record.reps) * f64::from(record.sets)
}

/// ---------------------------------------------------------------------------
/// Per-Exercise Bests
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseBests {
  /// Heaviest weight lifted, kg
  pub max_weight: Option<f64>,
  /// Most reps in one record
  pub max_reps: Option<u32>,
  /// Largest single-record volume
  pub max_volume: Option<f64>,
  /// Number of records the maxima were taken over
  pub record_count: usize,
}

impl ExerciseBests {
  /// Compute maxima over a record sequence. Empty input yields `None` for
  /// every maximum.
  pub fn compute(records: &[TrainingRecord]) -> Self {
    records.iter().fold(Self::default(), |acc, record| {
      let v = volume(record);
      Self {
        max_weight: Some(acc.max_weight.map_or(record.weight, |w| w.max(record.weight))),
        max_reps: Some(acc.max_reps.map_or(record.reps, |r| r.max(record.reps))),
        max_volume: Some(acc.max_volume.map_or(v, |m| m.max(v))),
        record_count: acc.record_count + 1,
      }
    })
  }

  pub fn is_available(&self) -> bool {
    self.record_count > 0
  }

  pub fn max_weight_label(&self) -> String {
    self
      .max_weight
      .map(|w| format!("{:.1} kg", w))
      .unwrap_or_else(not_available)
  }

  pub fn max_reps_label(&self) -> String {
    self
      .max_reps
      .map(|r| format!("{} reps", r))
      .unwrap_or_else(not_available)
  }

  pub fn max_volume_label(&self) -> String {
    self
      .max_volume
      .map(|v| format!("{:.1}", v))
      .unwrap_or_else(not_available)
  }
}

fn not_available() -> String {
  "N/A".to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::mock_record;

  #[test]
  fn test_volume_multiplies_fields() {
    let record = mock_record("1", "2024-05-01", "Bench Press", 60.0, 8, 3);
    assert_eq!(volume(&record), 1440.0);
    assert_eq!(record.volume(), 1440.0);
  }

  #[test]
  fn test_bodyweight_volume_is_zero() {
    let record = mock_record("1", "2024-05-01", "Pull-up", 0.0, 10, 3);
    assert_eq!(volume(&record), 0.0);
  }

  #[test]
  fn test_bests_over_records() {
    let records = vec![
      mock_record("1", "2024-05-01", "Squat", 100.0, 5, 5),
      mock_record("2", "2024-05-02", "Squat", 110.0, 3, 3),
      mock_record("3", "2024-05-03", "Squat", 90.0, 10, 3),
    ];

    let bests = ExerciseBests::compute(&records);
    assert_eq!(bests.max_weight, Some(110.0));
    assert_eq!(bests.max_reps, Some(10));
    // 90 * 10 * 3 = 2700 outranks 100 * 5 * 5 = 2500
    assert_eq!(bests.max_volume, Some(2700.0));
    assert_eq!(bests.record_count, 3);
  }

  #[test]
  fn test_bests_empty_is_not_available() {
    let bests = ExerciseBests::compute(&[]);
    assert_eq!(bests.max_weight, None);
    assert_eq!(bests.max_reps, None);
    assert_eq!(bests.max_volume, None);
    assert!(!bests.is_available());
    assert_eq!(bests.max_weight_label(), "N/A");
    assert_eq!(bests.max_reps_label(), "N/A");
    assert_eq!(bests.max_volume_label(), "N/A");
  }

  #[test]
  fn test_labels_format_values() {
    let records = vec![mock_record("1", "2024-05-01", "Squat", 102.5, 5, 3)];
    let bests = ExerciseBests::compute(&records);
    assert_eq!(bests.max_weight_label(), "102.5 kg");
    assert_eq!(bests.max_reps_label(), "5 reps");
    assert_eq!(bests.max_volume_label(), "1537.5");
  }
}
