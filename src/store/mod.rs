//! Record store port and its adapters
//!
//! Every backend (hosted PostgREST table, local SQLite, guest sample data)
//! sits behind [`RecordStore`] and answers with the same [`RecordSet`].

pub mod sample;
pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{NewTrainingRecord, RecordSet, SessionContext, TrainingRecord, UserId};

pub use sample::SampleStore;
pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// Store unreachable (network, pool, timeout)
  #[error("Could not reach the record store: {0}")]
  Connectivity(String),

  #[error("Record store rejected the credentials: {0}")]
  Unauthorized(String),

  #[error("Record store error ({status}): {message}")]
  Api { status: u16, message: String },

  #[error("Database error: {0}")]
  Database(String),

  #[error("Unexpected response from record store: {0}")]
  Decode(String),
}

impl StoreError {
  /// Connectivity and auth failures abort an action; anything else is
  /// treated as "no data" by lookups that can tolerate it.
  pub fn is_connectivity(&self) -> bool {
    matches!(self, Self::Connectivity(_) | Self::Unauthorized(_))
  }
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl From<reqwest::Error> for StoreError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      StoreError::Decode(e.to_string())
    } else {
      StoreError::Connectivity(e.to_string())
    }
  }
}

impl From<sqlx::Error> for StoreError {
  fn from(e: sqlx::Error) -> Self {
    match e {
      sqlx::Error::Io(_)
      | sqlx::Error::PoolTimedOut
      | sqlx::Error::PoolClosed
      | sqlx::Error::WorkerCrashed => StoreError::Connectivity(e.to_string()),
      other => StoreError::Database(other.to_string()),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Query Description
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
  TrainingDate,
  Weight,
  Reps,
}

impl SortField {
  pub fn column(&self) -> &'static str {
    match self {
      Self::TrainingDate => "training_date",
      Self::Weight => "weight",
      Self::Reps => "reps",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  Ascending,
  Descending,
}

/// Sort order. Rows that tie on `field` are ordered by insertion (record
/// id) in the same direction, so "latest first" picks the last-inserted
/// record of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
  pub field: SortField,
  pub direction: Direction,
}

/// Inclusive on both ends; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: Option<NaiveDate>,
  pub end: Option<NaiveDate>,
}

impl DateRange {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
  }
}

/// Filters compose as logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
  pub user_id: Option<UserId>,
  pub exercise_name: Option<String>,
  pub date_range: Option<DateRange>,
  pub date_eq: Option<NaiveDate>,
  pub date_ne: Option<NaiveDate>,
  pub order_by: Option<OrderBy>,
  pub limit: Option<u32>,
}

impl RecordQuery {
  /// Start a query scoped to `owner`; `None` leaves it unscoped (guest data).
  pub fn owned_by(owner: Option<&UserId>) -> Self {
    Self {
      user_id: owner.cloned(),
      ..Self::default()
    }
  }

  pub fn exercise(mut self, name: impl Into<String>) -> Self {
    self.exercise_name = Some(name.into());
    self
  }

  pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
    self.date_range = Some(DateRange { start, end });
    self
  }

  /// Strictly before `date`.
  pub fn before(self, date: NaiveDate) -> Self {
    match date.pred_opt() {
      Some(day_before) => self.between(None, Some(day_before)),
      // Nothing precedes the first representable day: an empty range
      None => self.between(Some(NaiveDate::MAX), Some(NaiveDate::MIN)),
    }
  }

  pub fn on(mut self, date: NaiveDate) -> Self {
    self.date_eq = Some(date);
    self
  }

  pub fn not_on(mut self, date: NaiveDate) -> Self {
    self.date_ne = Some(date);
    self
  }

  pub fn order(mut self, field: SortField, direction: Direction) -> Self {
    self.order_by = Some(OrderBy { field, direction });
    self
  }

  pub fn limit(mut self, limit: u32) -> Self {
    self.limit = Some(limit);
    self
  }

  /// Whether `record` passes every filter.
  pub fn matches(&self, record: &TrainingRecord) -> bool {
    if let Some(user_id) = &self.user_id {
      if record.user_id.as_ref() != Some(user_id) {
        return false;
      }
    }
    if let Some(name) = &self.exercise_name {
      if &record.exercise_name != name {
        return false;
      }
    }
    if let Some(range) = &self.date_range {
      if !range.contains(record.training_date) {
        return false;
      }
    }
    if let Some(date) = self.date_eq {
      if record.training_date != date {
        return false;
      }
    }
    if let Some(date) = self.date_ne {
      if record.training_date == date {
        return false;
      }
    }
    true
  }

  /// Evaluate this query over records held in memory, in their given
  /// (insertion) order.
  pub fn apply(&self, records: &[TrainingRecord]) -> Vec<TrainingRecord> {
    let mut selected: Vec<(usize, &TrainingRecord)> = records
      .iter()
      .enumerate()
      .filter(|(_, r)| self.matches(r))
      .collect();

    if let Some(order) = self.order_by {
      selected.sort_by(|(ia, a), (ib, b)| {
        let by_field = match order.field {
          SortField::TrainingDate => a.training_date.cmp(&b.training_date),
          SortField::Weight => a.weight.partial_cmp(&b.weight).unwrap_or(Ordering::Equal),
          SortField::Reps => a.reps.cmp(&b.reps),
        };
        let ordering = by_field.then(ia.cmp(ib));
        match order.direction {
          Direction::Ascending => ordering,
          Direction::Descending => ordering.reverse(),
        }
      });
    }

    let limit = self.limit.map_or(usize::MAX, |l| l as usize);
    selected.into_iter().take(limit).map(|(_, r)| r.clone()).collect()
  }
}

/// ---------------------------------------------------------------------------
/// Store Port
/// ---------------------------------------------------------------------------

/// Persistence for training records. Inserts and queries only; records are
/// never updated or deleted.
#[async_trait]
pub trait RecordStore: Send + Sync {
  /// Persist a validated record for the session's user.
  async fn insert(
    &self,
    session: &SessionContext,
    record: NewTrainingRecord,
  ) -> Result<TrainingRecord, StoreError>;

  /// Run a query. Malformed rows land in `RecordSet::rejected`.
  async fn query(
    &self,
    session: &SessionContext,
    query: &RecordQuery,
  ) -> Result<RecordSet, StoreError>;

  /// Cheap round trip to confirm the store is reachable.
  async fn ping(&self, session: &SessionContext) -> Result<(), StoreError>;

  /// Short label for status displays
  fn name(&self) -> &'static str;
}
