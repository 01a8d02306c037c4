use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{SessionContext, UserId};
use crate::store::supabase::SupabaseConfig;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const SIGNUP_PATH: &str = "auth/v1/signup";
const TOKEN_PATH: &str = "auth/v1/token";
const LOGOUT_PATH: &str = "auth/v1/logout";
pub const MIN_PASSWORD_LEN: usize = 6;

/// ---------------------------------------------------------------------------
/// Auth Data Structures
/// ---------------------------------------------------------------------------

/// User object returned by the auth service
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
  pub id: String,
  pub email: Option<String>,
}

/// Response from the token and signup endpoints.
///
/// Sign-in always carries tokens and a nested `user`. Sign-up returns the
/// bare user when email confirmation is pending, so `id`/`email` may sit at
/// the top level instead.
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
  pub access_token: Option<String>,
  pub refresh_token: Option<String>,
  pub expires_in: Option<i64>,
  pub user: Option<AuthUser>,
  pub id: Option<String>,
  pub email: Option<String>,
}

/// Signed-in identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
  pub user_id: UserId,
  pub email: Option<String>,
  #[serde(skip_serializing)]
  pub access_token: Option<String>,
  #[serde(skip_serializing)]
  pub refresh_token: Option<String>,
}

impl AuthSession {
  pub fn from_response(resp: AuthResponse) -> Result<Self, AuthError> {
    let (id, email) = match resp.user {
      Some(user) => (user.id, user.email),
      None => (
        resp
          .id
          .ok_or_else(|| AuthError::Rejected("response carried no user".into()))?,
        resp.email,
      ),
    };

    Ok(Self {
      user_id: UserId::new(id),
      email,
      access_token: resp.access_token,
      refresh_token: resp.refresh_token,
    })
  }

  /// Session context for the signed-in user on `today`.
  pub fn into_context(self, today: NaiveDate) -> SessionContext {
    SessionContext::signed_in(self.user_id, self.email, self.access_token, today)
  }
}

/// Error body; the service uses several shapes across endpoints
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
  error_description: Option<String>,
  msg: Option<String>,
  message: Option<String>,
  error: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
  #[error("{0}")]
  InvalidInput(String),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Authentication failed: {0}")]
  Rejected(String),

  #[error("Authentication service error ({status}): {message}")]
  Service { status: u16, message: String },
}

impl AuthError {
  pub fn is_connectivity(&self) -> bool {
    matches!(self, Self::Request(e) if !e.is_decode())
  }
}

impl Serialize for AuthError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Input Validation
/// ---------------------------------------------------------------------------

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), AuthError> {
  if email.trim().is_empty() || password.is_empty() {
    return Err(AuthError::InvalidInput(
      "Please enter your email address and password".into(),
    ));
  }
  Ok(())
}

/// Checked in order: all fields present, confirmation matches, length.
pub fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<(), AuthError> {
  if email.trim().is_empty() || password.is_empty() || confirm.is_empty() {
    return Err(AuthError::InvalidInput("Please fill in all fields".into()));
  }
  if password != confirm {
    return Err(AuthError::InvalidInput("Passwords do not match".into()));
  }
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AuthError::InvalidInput(format!(
      "Password must be at least {} characters",
      MIN_PASSWORD_LEN
    )));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthClient {
  client: Client,
  config: SupabaseConfig,
}

impl AuthClient {
  pub fn new(config: SupabaseConfig, timeout: Duration) -> Result<Self, AuthError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.config.url.trim_end_matches('/'), path)
  }

  /// Create an account. Inputs are validated before any request is sent.
  pub async fn sign_up(
    &self,
    email: &str,
    password: &str,
    confirm: &str,
  ) -> Result<AuthSession, AuthError> {
    validate_sign_up(email, password, confirm)?;

    let response = self
      .client
      .post(self.url(SIGNUP_PATH))
      .header("apikey", &self.config.key)
      .json(&serde_json::json!({ "email": email.trim(), "password": password }))
      .send()
      .await?;

    let session = AuthSession::from_response(read_auth_response(response).await?)?;
    tracing::info!(user = %session.user_id, "signed up");
    Ok(session)
  }

  /// Password grant sign-in.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
    validate_sign_in(email, password)?;

    let response = self
      .client
      .post(self.url(TOKEN_PATH))
      .query(&[("grant_type", "password")])
      .header("apikey", &self.config.key)
      .json(&serde_json::json!({ "email": email.trim(), "password": password }))
      .send()
      .await?;

    let session = AuthSession::from_response(read_auth_response(response).await?)?;
    if session.access_token.is_none() {
      return Err(AuthError::Rejected("no access token issued".into()));
    }
    tracing::info!(user = %session.user_id, "signed in");
    Ok(session)
  }

  /// Revoke the access token server-side.
  pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
    let response = self
      .client
      .post(self.url(LOGOUT_PATH))
      .header("apikey", &self.config.key)
      .bearer_auth(access_token)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(error_from_response(response).await);
    }
    Ok(())
  }
}

async fn read_auth_response(response: Response) -> Result<AuthResponse, AuthError> {
  if !response.status().is_success() {
    return Err(error_from_response(response).await);
  }
  Ok(response.json().await?)
}

async fn error_from_response(response: Response) -> AuthError {
  let status = response.status();
  let text = response.text().await.unwrap_or_default();
  let message = serde_json::from_str::<AuthErrorBody>(&text)
    .ok()
    .and_then(|body| {
      body
        .error_description
        .or(body.msg)
        .or(body.message)
        .or(body.error)
    })
    .unwrap_or(text);

  if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
    AuthError::Rejected(message)
  } else {
    AuthError::Service {
      status: status.as_u16(),
      message,
    }
  }
}
