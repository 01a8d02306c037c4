//! Day-over-day feedback for today's training
//!
//! For each exercise logged today, compare against the most recent earlier
//! session and against the best values from every other day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{volume, ExerciseBests};
use crate::models::{RecordSet, SessionContext, TrainingRecord};
use crate::store::{Direction, RecordQuery, RecordStore, SortField, StoreError};

/// ---------------------------------------------------------------------------
/// Deltas
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaStatus {
  Improved,
  Regressed,
  Maintained,
  /// No earlier record to compare against
  FirstRecord,
}

/// Change of one metric against the previous session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
  pub status: DeltaStatus,
  pub previous: Option<f64>,
  pub current: f64,
}

impl Delta {
  pub fn compare(previous: Option<f64>, current: f64) -> Self {
    let status = match previous {
      None => DeltaStatus::FirstRecord,
      Some(prev) if current > prev => DeltaStatus::Improved,
      Some(prev) if current < prev => DeltaStatus::Regressed,
      Some(_) => DeltaStatus::Maintained,
    };
    Self {
      status,
      previous,
      current,
    }
  }

  /// Signed difference, `None` without a previous value
  pub fn change(&self) -> Option<f64> {
    self.previous.map(|prev| self.current - prev)
  }

  /// Absolute difference; zero for a first record
  pub fn magnitude(&self) -> f64 {
    self.change().map_or(0.0, f64::abs)
  }
}

/// ---------------------------------------------------------------------------
/// Per-Exercise Feedback
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseFeedback {
  pub exercise: String,
  pub weight_delta: Delta,
  pub reps_delta: Delta,
  pub weight_personal_best: bool,
  pub reps_personal_best: bool,
  pub first_record: bool,
  /// Today's volume for the compared record
  pub volume: f64,
  /// Best weight on any other day
  pub best_weight: Option<f64>,
  /// Best reps on any other day
  pub best_reps: Option<u32>,
}

/// Compare one of today's records with its history.
///
/// A personal best needs a strictly greater value than every other day's
/// best, so it can never be raised without prior records.
pub fn assess(
  today: &TrainingRecord,
  previous: Option<&TrainingRecord>,
  best_weight: Option<f64>,
  best_reps: Option<u32>,
) -> ExerciseFeedback {
  let reps = f64::from(today.reps);

  ExerciseFeedback {
    exercise: today.exercise_name.clone(),
    weight_delta: Delta::compare(previous.map(|p| p.weight), today.weight),
    reps_delta: Delta::compare(previous.map(|p| f64::from(p.reps)), reps),
    weight_personal_best: best_weight.is_some_and(|best| today.weight > best),
    reps_personal_best: best_reps.is_some_and(|best| today.reps > best),
    first_record: previous.is_none(),
    volume: volume(today),
    best_weight,
    best_reps,
  }
}

impl ExerciseFeedback {
  /// Weight line first, then reps.
  pub fn messages(&self) -> Vec<String> {
    let mut lines = Vec::new();

    let weight = &self.weight_delta;
    match (weight.status, weight.previous) {
      (DeltaStatus::Improved, Some(prev)) => lines.push(format!(
        "Weight +{:.1}kg ({:.1}→{:.1}kg)",
        weight.magnitude(),
        prev,
        weight.current
      )),
      (DeltaStatus::Regressed, Some(prev)) => lines.push(format!(
        "Weight -{:.1}kg ({:.1}→{:.1}kg)",
        weight.magnitude(),
        prev,
        weight.current
      )),
      (DeltaStatus::Maintained, _) => {
        lines.push(format!("Weight maintained {:.1}kg", weight.current))
      }
      _ => {}
    }
    match self.best_weight {
      Some(best) if self.weight_personal_best => lines.push(format!(
        "Weight personal best! ({:.1}→{:.1}kg)",
        best, weight.current
      )),
      None if self.first_record => {
        lines.push(format!("Weight first record: {:.1}kg", weight.current))
      }
      _ => {}
    }

    let reps = &self.reps_delta;
    match (reps.status, reps.previous) {
      (DeltaStatus::Improved, Some(prev)) => lines.push(format!(
        "Reps +{} ({}→{} reps)",
        reps.magnitude(),
        prev,
        reps.current
      )),
      (DeltaStatus::Regressed, Some(prev)) => lines.push(format!(
        "Reps -{} ({}→{} reps)",
        reps.magnitude(),
        prev,
        reps.current
      )),
      (DeltaStatus::Maintained, _) => lines.push(format!("Reps maintained {} reps", reps.current)),
      _ => {}
    }
    match self.best_reps {
      Some(best) if self.reps_personal_best => lines.push(format!(
        "Reps personal best! ({}→{} reps)",
        best, reps.current
      )),
      None if self.first_record => lines.push(format!("Reps first record: {} reps", reps.current)),
      _ => {}
    }

    lines
  }
}

/// ---------------------------------------------------------------------------
/// Report
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
  pub date: NaiveDate,
  /// Valid records found for today
  pub records_logged: usize,
  /// Today's rows excluded as malformed
  pub skipped: usize,
  pub entries: Vec<ExerciseFeedback>,
}

impl FeedbackReport {
  pub fn is_empty(&self) -> bool {
    self.records_logged == 0
  }
}

/// Run a lookup; connectivity failures abort, anything else reads as empty.
async fn lookup(
  store: &dyn RecordStore,
  session: &SessionContext,
  query: &RecordQuery,
  what: &'static str,
) -> Result<RecordSet, StoreError> {
  match store.query(session, query).await {
    Ok(set) => Ok(set),
    Err(e) if e.is_connectivity() => Err(e),
    Err(e) => {
      tracing::warn!(error = %e, lookup = what, "feedback lookup failed, treating as no data");
      Ok(RecordSet::default())
    }
  }
}

/// Build today's feedback for the session's user.
///
/// One entry per exercise trained today, compared using the first of that
/// exercise's records in store order.
pub async fn generate_feedback(
  store: &dyn RecordStore,
  session: &SessionContext,
) -> Result<FeedbackReport, StoreError> {
  let today = session.today;
  let owner = session.owner();

  let todays = lookup(store, session, &RecordQuery::owned_by(owner).on(today), "today").await?;

  let mut seen: Vec<&str> = Vec::new();
  let mut entries = Vec::new();
  for record in &todays.records {
    if seen.contains(&record.exercise_name.as_str()) {
      continue;
    }
    seen.push(&record.exercise_name);

    // Every other day for this exercise, newest first
    let history = lookup(
      store,
      session,
      &RecordQuery::owned_by(owner)
        .exercise(record.exercise_name.clone())
        .not_on(today)
        .order(SortField::TrainingDate, Direction::Descending),
      "history",
    )
    .await?;
    if !history.rejected.is_empty() {
      tracing::debug!(
        exercise = %record.exercise_name,
        rejected = history.rejected.len(),
        "skipped malformed history rows"
      );
    }

    let previous = history.records.iter().find(|r| r.training_date < today);
    let bests = ExerciseBests::compute(&history.records);

    entries.push(assess(record, previous, bests.max_weight, bests.max_reps));
  }

  tracing::debug!(
    date = %today,
    records = todays.len(),
    exercises = entries.len(),
    "generated feedback"
  );

  Ok(FeedbackReport {
    date: today,
    records_logged: todays.len(),
    skipped: todays.rejected.len(),
    entries,
  })
}
