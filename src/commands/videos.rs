use super::CommandError;
use crate::db::AppState;
use crate::models::SessionContext;
use crate::youtube::{search_form_videos, VideoSearchOutcome};

/// Form videos for an exercise. Provider trouble and guest sessions come
/// back as a warning, never as an error.
pub async fn search_videos(
  state: &AppState,
  session: &SessionContext,
  exercise: &str,
) -> Result<VideoSearchOutcome, CommandError> {
  if !session.authenticated {
    return Err(CommandError::NotSignedIn);
  }
  if session.is_guest {
    return Ok(VideoSearchOutcome::warn(
      "Video search is not available in guest mode",
    ));
  }
  if exercise.trim().is_empty() {
    return Ok(VideoSearchOutcome::warn("Enter an exercise name to search for videos"));
  }

  Ok(search_form_videos(state.videos.as_ref(), exercise).await)
}
