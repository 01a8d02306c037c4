use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// ---------------------------------------------------------------------------
/// Identifiers
/// ---------------------------------------------------------------------------

/// Store-assigned record identifier. Opaque: an integer rowid for SQLite,
/// whatever the hosted table uses otherwise, `sample-*` for guest data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Owner of a record, as issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// ---------------------------------------------------------------------------
/// Training Record
/// ---------------------------------------------------------------------------

/// One logged training entry. Immutable once the store has assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
  pub id: RecordId,
  /// `None` for guest/sample records
  pub user_id: Option<UserId>,
  pub training_date: NaiveDate,
  pub exercise_name: String,
  /// kg
  pub weight: f64,
  pub reps: u32,
  pub sets: u32,
  #[serde(default)]
  pub notes: String,
}

impl TrainingRecord {
  /// weight × reps × sets, never stored
  pub fn volume(&self) -> f64 {
    crate::metrics::volume(self)
  }
}

/// For inserting new records (without id, user_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrainingRecord {
  pub training_date: NaiveDate,
  pub exercise_name: String,
  pub weight: f64,
  pub reps: u32,
  pub sets: u32,
  #[serde(default)]
  pub notes: String,
}

impl NewTrainingRecord {
  /// Check the record invariants against the submitting day.
  pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
    if self.exercise_name.trim().is_empty() {
      return Err(ValidationError::EmptyExerciseName);
    }
    if !self.weight.is_finite() || self.weight < 0.0 {
      return Err(ValidationError::OutOfRange {
        field: "weight",
        reason: "must be a non-negative number".into(),
      });
    }
    if self.reps < 1 {
      return Err(ValidationError::OutOfRange {
        field: "reps",
        reason: "must be at least 1".into(),
      });
    }
    if self.sets < 1 {
      return Err(ValidationError::OutOfRange {
        field: "sets",
        reason: "must be at least 1".into(),
      });
    }
    if self.training_date > today {
      return Err(ValidationError::FutureDate {
        date: self.training_date,
        today,
      });
    }
    Ok(())
  }

  /// Attach the store-assigned id and owner.
  pub fn into_record(self, id: RecordId, user_id: Option<UserId>) -> TrainingRecord {
    TrainingRecord {
      id,
      user_id,
      training_date: self.training_date,
      exercise_name: self.exercise_name,
      weight: self.weight,
      reps: self.reps,
      sets: self.sets,
      notes: self.notes,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Form Submission
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
  #[error("Please enter an exercise name")]
  EmptyExerciseName,

  #[error("{field} must be a number, got {value:?}")]
  NotANumber { field: &'static str, value: String },

  #[error("{field} {reason}")]
  OutOfRange { field: &'static str, reason: String },

  #[error("Training date {date} is after today ({today})")]
  FutureDate { date: NaiveDate, today: NaiveDate },
}

impl Serialize for ValidationError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Raw input-form values, numbers still as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordForm {
  pub training_date: Option<NaiveDate>,
  pub exercise_name: String,
  pub weight: String,
  pub reps: String,
  pub sets: String,
  #[serde(default)]
  pub notes: String,
}

impl RecordForm {
  /// Parse and validate. The date defaults to `today` like the input form.
  pub fn parse(&self, today: NaiveDate) -> Result<NewTrainingRecord, ValidationError> {
    let exercise_name = self.exercise_name.trim();
    if exercise_name.is_empty() {
      return Err(ValidationError::EmptyExerciseName);
    }

    let weight: f64 = self.weight.trim().parse().map_err(|_| ValidationError::NotANumber {
      field: "weight",
      value: self.weight.clone(),
    })?;
    let reps = parse_form_count("reps", &self.reps)?;
    let sets = parse_form_count("sets", &self.sets)?;

    let record = NewTrainingRecord {
      training_date: self.training_date.unwrap_or(today),
      exercise_name: exercise_name.to_string(),
      weight,
      reps,
      sets,
      notes: self.notes.trim().to_string(),
    };
    record.validate(today)?;
    Ok(record)
  }
}

fn parse_form_count(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
  let value: i64 = raw.trim().parse().map_err(|_| ValidationError::NotANumber {
    field,
    value: raw.to_string(),
  })?;
  if value < 1 {
    return Err(ValidationError::OutOfRange {
      field,
      reason: "must be at least 1".into(),
    });
  }
  u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
    field,
    reason: "is too large".into(),
  })
}

/// ---------------------------------------------------------------------------
/// Store Rows (untyped)
/// ---------------------------------------------------------------------------

/// A row as it arrives from a store, before any type is trusted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrainingRecord {
  #[serde(default)]
  pub id: Option<Value>,
  #[serde(default)]
  pub user_id: Option<Value>,
  #[serde(default)]
  pub training_date: Option<Value>,
  #[serde(default)]
  pub exercise_name: Option<Value>,
  #[serde(default)]
  pub weight: Option<Value>,
  #[serde(default)]
  pub reps: Option<Value>,
  #[serde(default)]
  pub sets: Option<Value>,
  #[serde(default)]
  pub notes: Option<Value>,
}

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProblem {
  pub field: String,
  pub reason: String,
}

/// A row excluded from a record set, with every reason it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordIssue {
  pub id: Option<String>,
  pub problems: Vec<FieldProblem>,
}

impl fmt::Display for RecordIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let problems: Vec<String> = self
      .problems
      .iter()
      .map(|p| format!("{}: {}", p.field, p.reason))
      .collect();
    write!(
      f,
      "record {}: {}",
      self.id.as_deref().unwrap_or("<no id>"),
      problems.join(", ")
    )
  }
}

impl RawTrainingRecord {
  /// Convert into a typed record, collecting a problem per bad field.
  pub fn parse(&self) -> Result<TrainingRecord, RecordIssue> {
    let mut problems = Vec::new();
    let mut note = |field: &str, reason: String| {
      problems.push(FieldProblem {
        field: field.to_string(),
        reason,
      })
    };

    let id = match parse_id(self.id.as_ref()) {
      Ok(id) => Some(id),
      Err(reason) => {
        note("id", reason);
        None
      }
    };
    let user_id = match self.user_id.as_ref() {
      None | Some(Value::Null) => None,
      Some(Value::String(s)) => Some(UserId(s.clone())),
      Some(other) => {
        note("user_id", format!("expected text, got {}", other));
        None
      }
    };
    let training_date = parse_date(self.training_date.as_ref())
      .map_err(|reason| note("training_date", reason))
      .ok();
    let exercise_name = match self.exercise_name.as_ref() {
      Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
      Some(Value::String(_)) => {
        note("exercise_name", "is empty".into());
        None
      }
      None | Some(Value::Null) => {
        note("exercise_name", "is missing".into());
        None
      }
      Some(other) => {
        note("exercise_name", format!("expected text, got {}", other));
        None
      }
    };
    let weight = parse_weight(self.weight.as_ref())
      .map_err(|reason| note("weight", reason))
      .ok();
    let reps = parse_count(self.reps.as_ref())
      .map_err(|reason| note("reps", reason))
      .ok();
    let sets = parse_count(self.sets.as_ref())
      .map_err(|reason| note("sets", reason))
      .ok();
    let notes = match self.notes.as_ref() {
      None | Some(Value::Null) => String::new(),
      Some(Value::String(s)) => s.clone(),
      Some(other) => other.to_string(),
    };

    match (id, training_date, exercise_name, weight, reps, sets) {
      (Some(id), Some(training_date), Some(exercise_name), Some(weight), Some(reps), Some(sets))
        if problems.is_empty() =>
      {
        Ok(TrainingRecord {
          id,
          user_id,
          training_date,
          exercise_name,
          weight,
          reps,
          sets,
          notes,
        })
      }
      _ => Err(RecordIssue {
        id: self.id.as_ref().and_then(|v| parse_id(Some(v)).ok()).map(|id| id.0),
        problems,
      }),
    }
  }
}

fn parse_id(value: Option<&Value>) -> Result<RecordId, String> {
  match value {
    Some(Value::String(s)) if !s.is_empty() => Ok(RecordId(s.clone())),
    Some(Value::Number(n)) => Ok(RecordId(n.to_string())),
    None | Some(Value::Null) => Err("is missing".into()),
    Some(other) => Err(format!("unexpected value {}", other)),
  }
}

fn parse_date(value: Option<&Value>) -> Result<NaiveDate, String> {
  let text = match value {
    Some(Value::String(s)) => s.trim(),
    None | Some(Value::Null) => return Err("is missing".into()),
    Some(other) => return Err(format!("expected a date, got {}", other)),
  };

  if let Ok(date) = text.parse::<NaiveDate>() {
    return Ok(date);
  }
  if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
    return Ok(datetime.date_naive());
  }
  NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
    .map(|dt| dt.date())
    .map_err(|_| format!("not a date: {:?}", text))
}

fn parse_weight(value: Option<&Value>) -> Result<f64, String> {
  let weight = match value {
    Some(Value::Number(n)) => n.as_f64().ok_or_else(|| format!("not a number: {}", n))?,
    Some(Value::String(s)) => s
      .trim()
      .parse::<f64>()
      .map_err(|_| format!("not a number: {:?}", s))?,
    None | Some(Value::Null) => return Err("is missing".into()),
    Some(other) => return Err(format!("not a number: {}", other)),
  };
  if !weight.is_finite() || weight < 0.0 {
    return Err(format!("must be a non-negative number, got {}", weight));
  }
  Ok(weight)
}

fn parse_count(value: Option<&Value>) -> Result<u32, String> {
  let count = match value {
    Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
      (Some(i), _) => i,
      (None, Some(f)) if f.fract() == 0.0 && f.is_finite() => f as i64,
      _ => return Err(format!("not a whole number: {}", n)),
    },
    Some(Value::String(s)) => s
      .trim()
      .parse::<i64>()
      .map_err(|_| format!("not a whole number: {:?}", s))?,
    None | Some(Value::Null) => return Err("is missing".into()),
    Some(other) => return Err(format!("not a number: {}", other)),
  };
  if count < 1 {
    return Err(format!("must be at least 1, got {}", count));
  }
  u32::try_from(count).map_err(|_| format!("too large: {}", count))
}

/// ---------------------------------------------------------------------------
/// Record Set
/// ---------------------------------------------------------------------------

/// Canonical result of a store query: typed records in store order, plus
/// the rows that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
  pub records: Vec<TrainingRecord>,
  #[serde(default)]
  pub rejected: Vec<RecordIssue>,
}

impl RecordSet {
  pub fn from_records(records: Vec<TrainingRecord>) -> Self {
    Self {
      records,
      rejected: Vec::new(),
    }
  }

  /// Parse raw rows, keeping the valid ones in their original order.
  pub fn from_raw(rows: impl IntoIterator<Item = RawTrainingRecord>) -> Self {
    let mut set = Self::default();
    for row in rows {
      match row.parse() {
        Ok(record) => set.records.push(record),
        Err(issue) => {
          tracing::warn!(%issue, "excluding malformed training record");
          set.rejected.push(issue);
        }
      }
    }
    set
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn first(&self) -> Option<&TrainingRecord> {
    self.records.first()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }
}
