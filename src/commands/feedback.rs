use chrono::NaiveDate;

use super::{require_store, CommandError};
use crate::db::AppState;
use crate::feedback::{generate_feedback, FeedbackReport};
use crate::models::SessionContext;
use crate::store::{Direction, RecordQuery, SortField};

/// Today's feedback. Guests get feedback over the sample history.
pub async fn get_feedback(
  state: &AppState,
  session: &SessionContext,
) -> Result<FeedbackReport, CommandError> {
  let store = require_store(state, session)?;
  Ok(generate_feedback(store, session).await?)
}

/// Most recent day the user trained, shown under the feedback. Guests have
/// none; lookup failures other than connectivity read as none.
pub async fn latest_training_date(
  state: &AppState,
  session: &SessionContext,
) -> Result<Option<NaiveDate>, CommandError> {
  if session.is_guest {
    return Ok(None);
  }
  let store = require_store(state, session)?;

  let query = RecordQuery::owned_by(session.owner())
    .order(SortField::TrainingDate, Direction::Descending)
    .limit(1);
  match store.query(session, &query).await {
    Ok(set) => Ok(set.first().map(|r| r.training_date)),
    Err(e) if e.is_connectivity() => Err(e.into()),
    Err(e) => {
      tracing::warn!(error = %e, "failed to look up latest training date");
      Ok(None)
    }
  }
}
