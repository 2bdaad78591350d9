//! Post model and status lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Platform;

/// Status of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Being written, not yet queued
    #[default]
    Draft,
    /// Queued with a future publish time
    Scheduled,
    /// Successfully published to the platform
    Published,
    /// Publish attempt failed
    Failed,
}

impl PostStatus {
    /// Get status as string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "scheduled" => Some(Self::Scheduled),
            "published" => Some(Self::Published),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Get emoji for status
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Draft => "📝",
            Self::Scheduled => "⏳",
            Self::Published => "✅",
            Self::Failed => "❌",
        }
    }
}

/// Denormalized engagement counts snapshotted onto the post row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    /// Likes/reactions
    pub likes: u32,
    /// Comments/replies
    pub comments: u32,
    /// Shares/reposts
    pub shares: u32,
}

/// A post targeted at one platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: Uuid,
    /// Target platform
    pub platform: Platform,
    /// Post content (plain text)
    pub content: String,
    /// Current status
    pub status: PostStatus,
    /// When to publish (scheduled posts)
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When the post went live
    pub published_at: Option<DateTime<Utc>>,
    /// Platform-assigned post id once published
    pub platform_post_id: Option<String>,
    /// Category for organization
    pub category_id: Option<Uuid>,
    /// Error message from the last failed publish attempt
    pub error: Option<String>,
    /// Latest engagement counts
    pub engagement: EngagementSnapshot,
    /// Attached media file ids (loaded from the post_media join table)
    pub media_ids: Vec<Uuid>,
    /// When this was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post
    pub fn new(platform: Platform, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            platform,
            content: content.into(),
            status: PostStatus::Draft,
            scheduled_for: None,
            published_at: None,
            platform_post_id: None,
            category_id: None,
            error: None,
            engagement: EngagementSnapshot::default(),
            media_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a scheduled post
    pub fn scheduled(
        platform: Platform,
        content: impl Into<String>,
        scheduled_for: DateTime<Utc>,
    ) -> Self {
        let mut post = Self::new(platform, content);
        post.status = PostStatus::Scheduled;
        post.scheduled_for = Some(scheduled_for);
        post
    }

    /// Check if this post is due (scheduled time has passed)
    pub fn is_due(&self) -> bool {
        self.status == PostStatus::Scheduled
            && self.scheduled_for.is_some_and(|at| Utc::now() >= at)
    }

    /// Get a short preview of the content (for list display)
    pub fn preview(&self, max_len: usize) -> String {
        let content = self.content.replace('\n', " ");
        if content.len() <= max_len {
            content
        } else {
            format!("{}...", &content[..max_len.saturating_sub(3)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_round_trip() {
        for status in [
            PostStatus::Draft,
            PostStatus::Scheduled,
            PostStatus::Published,
            PostStatus::Failed,
        ] {
            assert_eq!(PostStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_is_due() {
        let past = Post::scheduled(Platform::Facebook, "hi", Utc::now() - Duration::minutes(1));
        assert!(past.is_due());

        let future = Post::scheduled(Platform::Facebook, "hi", Utc::now() + Duration::hours(1));
        assert!(!future.is_due());

        let draft = Post::new(Platform::Facebook, "hi");
        assert!(!draft.is_due());
    }

    #[test]
    fn test_preview_truncates() {
        let post = Post::new(Platform::LinkedIn, "a".repeat(50));
        assert_eq!(post.preview(10).len(), 10);
        assert!(post.preview(10).ends_with("..."));
    }
}
