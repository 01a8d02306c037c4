//! Exercise form videos from the YouTube Data API v3 `search.list`
//!
//! Video search is optional. A missing key or any provider failure degrades
//! to an empty list plus a warning for the user.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch";
pub const DEFAULT_MAX_RESULTS: u32 = 3;

/// ---------------------------------------------------------------------------
/// API Response Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  id: SearchItemId,
  snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
  video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
  title: String,
  #[serde(default)]
  thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
  default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
  url: Option<String>,
}

/// `{"error": {"message": ..., "errors": [{"reason": ..., "message": ...}]}}`
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
  error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  message: Option<String>,
  #[serde(default)]
  errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  reason: Option<String>,
  message: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Public Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResult {
  pub title: String,
  pub video_id: String,
  pub thumbnail_url: String,
}

impl VideoResult {
  pub fn watch_url(&self) -> String {
    format!("{}?v={}", YOUTUBE_WATCH_URL, self.video_id)
  }
}

/// Search result as shown to the user: videos, or a warning explaining why
/// there are none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSearchOutcome {
  pub videos: Vec<VideoResult>,
  pub warning: Option<String>,
}

impl VideoSearchOutcome {
  pub fn warn(message: impl Into<String>) -> Self {
    Self {
      videos: Vec::new(),
      warning: Some(message.into()),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum VideoSearchError {
  #[error("YouTube API key is not configured, video search is unavailable")]
  MissingKey,

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("YouTube API error ({reason}): {message}")]
  Api { reason: String, message: String },
}

impl Serialize for VideoSearchError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct YouTubeClient {
  client: Client,
  api_key: String,
  base_url: String,
  max_results: u32,
}

impl YouTubeClient {
  pub fn new(api_key: String, max_results: u32, timeout: Duration) -> Result<Self, VideoSearchError> {
    if api_key.trim().is_empty() {
      return Err(VideoSearchError::MissingKey);
    }
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_key,
      base_url: YOUTUBE_SEARCH_URL.to_string(),
      max_results,
    })
  }

  /// Point the client at another search endpoint (tests).
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  /// Search form tutorials for `exercise`. Results without a default
  /// thumbnail are dropped.
  pub async fn search(&self, exercise: &str) -> Result<Vec<VideoResult>, VideoSearchError> {
    let mut url = Url::parse(&self.base_url).map_err(|e| VideoSearchError::Api {
      reason: "invalidUrl".into(),
      message: e.to_string(),
    })?;
    url
      .query_pairs_mut()
      .append_pair("part", "snippet")
      .append_pair("q", &format!("{} form tutorial", exercise.trim()))
      .append_pair("maxResults", &self.max_results.to_string())
      .append_pair("type", "video")
      .append_pair("videoEmbeddable", "true")
      .append_pair("order", "relevance")
      .append_pair("key", &self.api_key);

    let response = self.client.get(url).send().await?;

    if !response.status().is_success() {
      let status = response.status();
      let text = response.text().await.unwrap_or_default();
      return Err(api_error(status.as_u16(), &text));
    }

    let body: SearchResponse = response.json().await?;
    let videos: Vec<VideoResult> = body
      .items
      .into_iter()
      .filter_map(|item| {
        let video_id = item.id.video_id?;
        let thumbnail_url = item.snippet.thumbnails.default.and_then(|t| t.url)?;
        Some(VideoResult {
          title: item.snippet.title,
          video_id,
          thumbnail_url,
        })
      })
      .collect();

    tracing::debug!(exercise, count = videos.len(), "video search complete");
    Ok(videos)
  }
}

/// Pull `reason`/`message` out of the first entry of `error.errors`.
fn api_error(status: u16, body: &str) -> VideoSearchError {
  match serde_json::from_str::<ApiErrorEnvelope>(body) {
    Ok(envelope) => {
      let first = envelope.error.errors.into_iter().next();
      let reason = first
        .as_ref()
        .and_then(|d| d.reason.clone())
        .unwrap_or_else(|| "unknown reason".into());
      let message = first
        .and_then(|d| d.message)
        .or(envelope.error.message)
        .unwrap_or_else(|| format!("HTTP {}", status));
      VideoSearchError::Api { reason, message }
    }
    Err(_) => VideoSearchError::Api {
      reason: format!("HTTP {}", status),
      message: body.to_string(),
    },
  }
}

/// Run a search, folding every failure into a warning.
pub async fn search_form_videos(client: Option<&YouTubeClient>, exercise: &str) -> VideoSearchOutcome {
  let Some(client) = client else {
    return VideoSearchOutcome::warn(VideoSearchError::MissingKey.to_string());
  };

  match client.search(exercise).await {
    Ok(videos) => VideoSearchOutcome {
      videos,
      warning: None,
    },
    Err(e) => {
      tracing::warn!(error = %e, exercise, "video search failed");
      VideoSearchOutcome::warn(e.to_string())
    }
  }
}
