use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserId;

/// Who is acting and on which calendar day.
///
/// Passed explicitly into every store call and every feedback computation.
/// Guest sessions never touch the configured store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
  pub authenticated: bool,
  pub user_id: Option<UserId>,
  pub is_guest: bool,
  pub email: Option<String>,
  /// Bearer token for the hosted store, when signed in through it
  #[serde(skip_serializing)]
  pub access_token: Option<String>,
  /// The session's current calendar date
  pub today: NaiveDate,
}

impl SessionContext {
  /// Not signed in.
  pub fn anonymous(today: NaiveDate) -> Self {
    Self {
      authenticated: false,
      user_id: None,
      is_guest: false,
      email: None,
      access_token: None,
      today,
    }
  }

  /// Guest mode: sample data for reads, nothing persisted on writes.
  pub fn guest(today: NaiveDate) -> Self {
    Self {
      authenticated: true,
      user_id: None,
      is_guest: true,
      email: Some("guest".into()),
      access_token: None,
      today,
    }
  }

  pub fn signed_in(
    user_id: UserId,
    email: Option<String>,
    access_token: Option<String>,
    today: NaiveDate,
  ) -> Self {
    Self {
      authenticated: true,
      user_id: Some(user_id),
      is_guest: false,
      email,
      access_token,
      today,
    }
  }

  /// The owner to scope queries to. Guests have none.
  pub fn owner(&self) -> Option<&UserId> {
    if self.is_guest {
      None
    } else {
      self.user_id.as_ref()
    }
  }

  pub fn display_name(&self) -> String {
    self
      .email
      .clone()
      .or_else(|| self.user_id.as_ref().map(|u| u.to_string()))
      .unwrap_or_else(|| "not signed in".into())
  }
}
