use serde::Serialize;

use super::{require_store, CommandError};
use crate::db::AppState;
use crate::metrics::ExerciseBests;
use crate::models::{SessionContext, TrainingRecord};
use crate::store::{Direction, RecordQuery, SortField};
use crate::trend::{build_trend, TrendMetric, TrendPoint};

/// ---------------------------------------------------------------------------
/// Progress Chart
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
  pub exercise: String,
  pub metric: TrendMetric,
  pub title: String,
  pub axis_label: String,
  /// Oldest first
  pub points: Vec<TrendPoint>,
  pub bests: ExerciseBests,
  /// Newest first, for the detail table
  pub details: Vec<TrainingRecord>,
  /// Rows excluded as malformed
  pub rejected: usize,
}

impl ProgressView {
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }
}

/// Chart series, bests and detail rows for one exercise.
pub async fn get_progress(
  state: &AppState,
  session: &SessionContext,
  exercise: &str,
  metric: TrendMetric,
) -> Result<ProgressView, CommandError> {
  let exercise = exercise.trim();
  let store = require_store(state, session)?;

  let query = RecordQuery::owned_by(session.owner())
    .exercise(exercise)
    .order(SortField::TrainingDate, Direction::Ascending);
  let set = store.query(session, &query).await?;

  let points = build_trend(&set.records, metric);
  let bests = ExerciseBests::compute(&set.records);
  let mut details = set.records;
  details.reverse();

  tracing::debug!(exercise, %metric, points = points.len(), "built progress view");

  Ok(ProgressView {
    exercise: exercise.to_string(),
    metric,
    title: metric.title(exercise),
    axis_label: metric.axis_label().to_string(),
    points,
    bests,
    details,
    rejected: set.rejected.len(),
  })
}
