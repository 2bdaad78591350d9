//! Media file model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of media, derived from the mime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Image (JPEG, PNG, GIF, WebP)
    Image,
    /// Video (MP4, WebM)
    Video,
    /// Unknown or unsupported media type
    Unknown,
}

/// A media file referenced by posts through the post_media join table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Unique identifier
    pub id: Uuid,
    /// Filesystem path, or an already-hosted https URL
    pub path: String,
    /// Mime type (e.g. "image/jpeg")
    pub mime_type: String,
    /// Pixel width, when known
    pub width: Option<u32>,
    /// Pixel height, when known
    pub height: Option<u32>,
    /// When this was added
    pub created_at: DateTime<Utc>,
}

impl MediaFile {
    /// Register a new media file
    pub fn new(path: &str, mime_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.to_string(),
            mime_type: mime_type.to_string(),
            width: None,
            height: None,
            created_at: Utc::now(),
        }
    }

    /// Kind of media, from the mime type prefix
    pub fn kind(&self) -> MediaKind {
        if self.mime_type.starts_with("image/") {
            MediaKind::Image
        } else if self.mime_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Unknown
        }
    }

    /// Whether the path is an already-hosted URL
    ///
    /// The Instagram and Threads Graph APIs take hosted URLs for container
    /// creation rather than byte uploads.
    pub fn is_hosted(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }

    /// File name portion of the path (for multipart uploads)
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}
