use chrono::NaiveDate;

use super::CommandError;
use crate::auth::{validate_sign_in, validate_sign_up, AuthClient};
use crate::db::AppState;
use crate::models::SessionContext;

fn auth_client(state: &AppState) -> Result<&AuthClient, CommandError> {
  state.auth.as_ref().ok_or_else(|| {
    CommandError::Auth("Sign-in is unavailable: no hosted auth service is configured".into())
  })
}

/// ---------------------------------------------------------------------------
/// Sign In / Sign Up
/// ---------------------------------------------------------------------------

pub async fn sign_in(
  state: &AppState,
  email: &str,
  password: &str,
  today: NaiveDate,
) -> Result<SessionContext, CommandError> {
  validate_sign_in(email, password)?;
  let session = auth_client(state)?.sign_in(email, password).await?;
  Ok(session.into_context(today))
}

/// Create an account and start a session for it.
pub async fn sign_up(
  state: &AppState,
  email: &str,
  password: &str,
  confirm: &str,
  today: NaiveDate,
) -> Result<SessionContext, CommandError> {
  validate_sign_up(email, password, confirm)?;
  let session = auth_client(state)?.sign_up(email, password, confirm).await?;
  Ok(session.into_context(today))
}

/// ---------------------------------------------------------------------------
/// Sign Out / Guest
/// ---------------------------------------------------------------------------

/// End the session. The hosted token is revoked when there is one; on
/// failure the caller keeps its current session.
pub async fn sign_out(
  state: &AppState,
  session: &SessionContext,
) -> Result<SessionContext, CommandError> {
  if let (Some(client), Some(token)) = (state.auth.as_ref(), session.access_token.as_deref()) {
    client.sign_out(token).await?;
  }
  tracing::info!(user = %session.display_name(), "signed out");
  Ok(SessionContext::anonymous(session.today))
}

/// Guest mode needs no network call.
pub fn guest_login(today: NaiveDate) -> SessionContext {
  SessionContext::guest(today)
}
