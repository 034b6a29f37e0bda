//! Core types for Gramcast

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GramcastError, Result};

/// Maximum caption length in UTF-16 code units, matching the platform's
/// own limit.
pub const CAPTION_LIMIT: usize = 2200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub id: String,
    pub owner_id: String,
    pub caption: String,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub scheduled_at: i64,
    pub status: PostStatus,
    pub error_message: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ScheduledPost {
    /// Create a new pending post scheduled for `scheduled_at`
    pub fn new(
        owner_id: String,
        caption: String,
        media_url: String,
        media_kind: MediaKind,
        scheduled_at: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            caption,
            media_url,
            media_kind,
            scheduled_at,
            status: PostStatus::Pending,
            error_message: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PostStatus {
    Pending,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            other => Err(GramcastError::InvalidInput(format!(
                "Unknown post status: '{}'. Valid options: pending, published, failed",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Kind of media a post carries, which selects the container field the
/// platform expects (`image_url` vs `video_url`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(GramcastError::InvalidInput(format!(
                "Unknown media kind: '{}'. Valid options: image, video",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A user's Instagram connection record.
///
/// Current records are keyed by the owner id (`id == owner_id`); legacy
/// records carry an arbitrary id and are found via the `owner_id` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConnection {
    pub id: String,
    pub owner_id: String,
    /// Publish target. Empty means the connect flow never completed;
    /// the resolver treats it as a missing credential.
    pub ig_user_id: String,
    pub username: Option<String>,
    /// Token captured at connect time. The pipeline publishes with the
    /// process-level token instead; this field mirrors the connect flow.
    pub access_token: Option<String>,
    pub connected_at: i64,
}

impl InstagramConnection {
    pub fn new(owner_id: String, ig_user_id: String, username: Option<String>) -> Self {
        Self {
            id: owner_id.clone(),
            owner_id,
            ig_user_id,
            username,
            access_token: None,
            connected_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Validate a caption against the platform limit.
///
/// The limit counts UTF-16 code units, the unit the platform itself
/// measures captions in.
pub fn validate_caption(caption: &str) -> Result<()> {
    let units = caption.encode_utf16().count();
    if units > CAPTION_LIMIT {
        return Err(GramcastError::InvalidInput(format!(
            "Caption exceeds {} character limit (got {})",
            CAPTION_LIMIT, units
        )));
    }
    Ok(())
}

/// Validate a media URL before scheduling
pub fn validate_media_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(GramcastError::InvalidInput(
            "Media URL cannot be empty".to_string(),
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(GramcastError::InvalidInput(format!(
            "Media URL must be an http(s) URL: {}",
            url
        )));
    }
    Ok(())
}
