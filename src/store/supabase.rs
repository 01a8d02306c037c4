//! Hosted record store: the `training_records` table behind Supabase's
//! PostgREST endpoint.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;
use url::Url;

use super::{Direction, RecordQuery, RecordStore, StoreError};
use crate::config::ConfigError;
use crate::models::{NewTrainingRecord, RawTrainingRecord, RecordSet, SessionContext, TrainingRecord};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const TABLE: &str = "training_records";

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
  /// Project URL, e.g. `https://xyz.supabase.co`
  pub url: String,
  /// Anon (public) API key
  pub key: String,
}

impl SupabaseConfig {
  /// Reads `url`/`key`, falling back to `SUPABASE_URL`/`SUPABASE_KEY`.
  pub fn from_env() -> Result<Self, ConfigError> {
    let url = env::var("url")
      .or_else(|_| env::var("SUPABASE_URL"))
      .map_err(|_| ConfigError::MissingConfig("SUPABASE_URL".into()))?;
    let key = env::var("key")
      .or_else(|_| env::var("SUPABASE_KEY"))
      .map_err(|_| ConfigError::MissingConfig("SUPABASE_KEY".into()))?;

    if url.trim().is_empty() || key.trim().is_empty() {
      return Err(ConfigError::MissingConfig("SUPABASE_URL/SUPABASE_KEY".into()));
    }

    Ok(Self {
      url: url.trim().trim_end_matches('/').to_string(),
      key: key.trim().to_string(),
    })
  }

  /// `<project>/<path>` with exactly one slash between.
  pub fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
    let joined = format!("{}/{}", self.url.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| StoreError::Connectivity(format!("invalid Supabase URL: {}", e)))
  }
}

/// ---------------------------------------------------------------------------
/// Wire Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
  user_id: &'a str,
  training_date: NaiveDate,
  exercise_name: &'a str,
  weight: f64,
  reps: u32,
  sets: u32,
  notes: &'a str,
}

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestError {
  message: Option<String>,
  details: Option<String>,
  hint: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Store
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SupabaseStore {
  client: Client,
  config: SupabaseConfig,
}

impl SupabaseStore {
  pub fn new(config: SupabaseConfig, timeout: Duration) -> Result<Self, StoreError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, config })
  }

  /// Attach the API key and the caller's bearer token (falls back to the
  /// anon key when the session has none).
  fn authorize(&self, request: RequestBuilder, session: &SessionContext) -> RequestBuilder {
    let bearer = session.access_token.as_deref().unwrap_or(&self.config.key);
    request
      .header("apikey", &self.config.key)
      .header("Authorization", format!("Bearer {}", bearer))
  }

  fn table_url(&self) -> Result<Url, StoreError> {
    self.config.endpoint(&format!("rest/v1/{}", TABLE))
  }
}

/// PostgREST query-string pairs for a record query.
pub(crate) fn query_pairs(query: &RecordQuery) -> Vec<(String, String)> {
  let mut pairs = vec![("select".to_string(), "*".to_string())];

  if let Some(user_id) = &query.user_id {
    pairs.push(("user_id".into(), format!("eq.{}", user_id)));
  }
  if let Some(name) = &query.exercise_name {
    pairs.push(("exercise_name".into(), format!("eq.{}", name)));
  }
  if let Some(range) = &query.date_range {
    if let Some(start) = range.start {
      pairs.push(("training_date".into(), format!("gte.{}", start)));
    }
    if let Some(end) = range.end {
      pairs.push(("training_date".into(), format!("lte.{}", end)));
    }
  }
  if let Some(date) = query.date_eq {
    pairs.push(("training_date".into(), format!("eq.{}", date)));
  }
  if let Some(date) = query.date_ne {
    pairs.push(("training_date".into(), format!("neq.{}", date)));
  }

  let order = match query.order_by {
    Some(order) => {
      let direction = match order.direction {
        Direction::Ascending => "asc",
        Direction::Descending => "desc",
      };
      format!("{}.{}.nullslast,id.{}", order.field.column(), direction, direction)
    }
    None => "id.asc".to_string(),
  };
  pairs.push(("order".into(), order));

  if let Some(limit) = query.limit {
    pairs.push(("limit".into(), limit.to_string()));
  }
  pairs
}

/// Map a non-success PostgREST response to a store error.
async fn error_from_response(response: Response) -> StoreError {
  let status = response.status();
  let text = response.text().await.unwrap_or_default();
  let message = match serde_json::from_str::<PostgrestError>(&text) {
    Ok(body) => [body.message, body.details, body.hint]
      .into_iter()
      .flatten()
      .collect::<Vec<_>>()
      .join(" - "),
    Err(_) => text,
  };

  if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
    StoreError::Unauthorized(message)
  } else {
    StoreError::Api {
      status: status.as_u16(),
      message,
    }
  }
}

/// Decode a JSON array body into untyped rows. Non-object entries become
/// empty rows so validation reports them instead of failing the batch.
async fn read_rows(response: Response) -> Result<Vec<RawTrainingRecord>, StoreError> {
  let text = response.text().await?;
  let values: Vec<Value> = serde_json::from_str(&text).map_err(|e| {
    tracing::error!(
      error = %e,
      body = %text.chars().take(500).collect::<String>(),
      "failed to parse record store response"
    );
    StoreError::Decode(e.to_string())
  })?;

  Ok(
    values
      .into_iter()
      .map(|value| serde_json::from_value::<RawTrainingRecord>(value).unwrap_or_default())
      .collect(),
  )
}

#[async_trait]
impl RecordStore for SupabaseStore {
  async fn insert(
    &self,
    session: &SessionContext,
    record: NewTrainingRecord,
  ) -> Result<TrainingRecord, StoreError> {
    let user_id = session
      .owner()
      .ok_or_else(|| StoreError::Unauthorized("no signed-in user for insert".into()))?;

    let body = InsertRow {
      user_id: user_id.as_str(),
      training_date: record.training_date,
      exercise_name: &record.exercise_name,
      weight: record.weight,
      reps: record.reps,
      sets: record.sets,
      notes: &record.notes,
    };

    let response = self
      .authorize(self.client.post(self.table_url()?), session)
      .header("Prefer", "return=representation")
      .json(&body)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(error_from_response(response).await);
    }

    let rows = read_rows(response).await?;
    let row = rows
      .into_iter()
      .next()
      .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))?;
    let saved = row
      .parse()
      .map_err(|issue| StoreError::Decode(issue.to_string()))?;

    tracing::debug!(id = %saved.id, user = %user_id, "inserted training record");
    Ok(saved)
  }

  async fn query(
    &self,
    session: &SessionContext,
    query: &RecordQuery,
  ) -> Result<RecordSet, StoreError> {
    let mut url = self.table_url()?;
    url.query_pairs_mut().extend_pairs(query_pairs(query));

    let response = self.authorize(self.client.get(url), session).send().await?;
    if !response.status().is_success() {
      return Err(error_from_response(response).await);
    }

    let rows = read_rows(response).await?;
    Ok(RecordSet::from_raw(rows))
  }

  async fn ping(&self, session: &SessionContext) -> Result<(), StoreError> {
    let mut url = self.table_url()?;
    url
      .query_pairs_mut()
      .append_pair("select", "id")
      .append_pair("limit", "1");

    let response = self.authorize(self.client.get(url), session).send().await?;
    if !response.status().is_success() {
      return Err(error_from_response(response).await);
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    "supabase"
  }
}
