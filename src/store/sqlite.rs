//! Self-hosted record store on a local SQLite database

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{Direction, RecordQuery, RecordStore, StoreError};
use crate::models::{
  NewTrainingRecord, RawTrainingRecord, RecordId, RecordSet, SessionContext, TrainingRecord,
};

const SELECT_COLUMNS: &str =
  "SELECT id, user_id, training_date, exercise_name, weight, reps, sets, notes FROM training_records";

#[derive(Debug, sqlx::FromRow)]
struct TrainingRecordRow {
  id: i64,
  user_id: Option<String>,
  training_date: Option<String>,
  exercise_name: Option<String>,
  weight: Option<f64>,
  reps: Option<i64>,
  sets: Option<i64>,
  notes: Option<String>,
}

impl From<TrainingRecordRow> for RawTrainingRecord {
  fn from(row: TrainingRecordRow) -> Self {
    RawTrainingRecord {
      id: Some(Value::from(row.id)),
      user_id: row.user_id.map(Value::String),
      training_date: row.training_date.map(Value::String),
      exercise_name: row.exercise_name.map(Value::String),
      weight: row.weight.map(Value::from),
      reps: row.reps.map(Value::from),
      sets: row.sets.map(Value::from),
      notes: row.notes.map(Value::String),
    }
  }
}

/// Record store backed by the `training_records` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &RecordQuery) {
  builder.push(" WHERE 1 = 1");

  if let Some(user_id) = &query.user_id {
    builder.push(" AND user_id = ").push_bind(user_id.0.clone());
  }
  if let Some(name) = &query.exercise_name {
    builder.push(" AND exercise_name = ").push_bind(name.clone());
  }
  if let Some(range) = &query.date_range {
    if let Some(start) = range.start {
      builder.push(" AND training_date >= ").push_bind(start);
    }
    if let Some(end) = range.end {
      builder.push(" AND training_date <= ").push_bind(end);
    }
  }
  if let Some(date) = query.date_eq {
    builder.push(" AND training_date = ").push_bind(date);
  }
  if let Some(date) = query.date_ne {
    builder.push(" AND training_date <> ").push_bind(date);
  }

  // Ties fall back to insertion order in the same direction
  match query.order_by {
    Some(order) => {
      let direction = match order.direction {
        Direction::Ascending => "ASC",
        Direction::Descending => "DESC",
      };
      builder.push(format!(
        " ORDER BY {} {} NULLS LAST, id {}",
        order.field.column(),
        direction,
        direction
      ));
    }
    None => {
      builder.push(" ORDER BY id ASC");
    }
  }

  if let Some(limit) = query.limit {
    builder.push(" LIMIT ").push_bind(i64::from(limit));
  }
}

#[async_trait]
impl RecordStore for SqliteStore {
  async fn insert(
    &self,
    session: &SessionContext,
    record: NewTrainingRecord,
  ) -> Result<TrainingRecord, StoreError> {
    let user_id = session
      .owner()
      .cloned()
      .ok_or_else(|| StoreError::Unauthorized("no signed-in user for insert".into()))?;

    let result = sqlx::query(
      r#"
      INSERT INTO training_records (
        user_id, training_date, exercise_name, weight, reps, sets, notes
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      "#,
    )
    .bind(user_id.as_str())
    .bind(record.training_date)
    .bind(&record.exercise_name)
    .bind(record.weight)
    .bind(i64::from(record.reps))
    .bind(i64::from(record.sets))
    .bind(&record.notes)
    .execute(&self.pool)
    .await?;

    let id = RecordId(result.last_insert_rowid().to_string());
    tracing::debug!(%id, user = %user_id, "inserted training record");
    Ok(record.into_record(id, Some(user_id)))
  }

  async fn query(
    &self,
    _session: &SessionContext,
    query: &RecordQuery,
  ) -> Result<RecordSet, StoreError> {
    let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
    push_filters(&mut builder, query);

    let rows: Vec<TrainingRecordRow> = builder.build_query_as().fetch_all(&self.pool).await?;
    Ok(RecordSet::from_raw(rows.into_iter().map(RawTrainingRecord::from)))
  }

  async fn ping(&self, _session: &SessionContext) -> Result<(), StoreError> {
    sqlx::query("SELECT id FROM training_records LIMIT 1")
      .fetch_optional(&self.pool)
      .await?;
    Ok(())
  }

  fn name(&self) -> &'static str {
    "sqlite"
  }
}
