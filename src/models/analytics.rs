//! Analytics metrics model (append-only per-post snapshots)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Platform;

/// A per-post metrics snapshot fetched from the platform
///
/// Rows are append-only; each collection cycle writes a fresh snapshot so the
/// history of a post's engagement stays queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Unique identifier
    pub id: Uuid,
    /// Post this snapshot belongs to
    pub post_id: Uuid,
    /// Platform the counts came from
    pub platform: Platform,
    /// Unique accounts reached
    pub reach: u32,
    /// Total impressions
    pub impressions: u32,
    /// Likes/reactions
    pub likes: u32,
    /// Comments/replies
    pub comments: u32,
    /// Shares/reposts
    pub shares: u32,
    /// Link clicks
    pub clicks: u32,
    /// Interactions divided by reach
    pub engagement_rate: f64,
    /// Optional sentiment score in [-1, 1] when a source provides one
    pub sentiment_score: Option<f64>,
    /// When this snapshot was collected
    pub collected_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Create a snapshot for a post, deriving the engagement rate
    pub fn new(post_id: Uuid, platform: Platform, counts: &EngagementCounts) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            platform,
            reach: counts.reach,
            impressions: counts.impressions,
            likes: counts.likes,
            comments: counts.comments,
            shares: counts.shares,
            clicks: counts.clicks,
            engagement_rate: counts.engagement_rate(),
            sentiment_score: None,
            collected_at: Utc::now(),
        }
    }
}

/// Raw engagement counts as returned by a platform connector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementCounts {
    /// Unique accounts reached
    pub reach: u32,
    /// Total impressions
    pub impressions: u32,
    /// Likes/reactions
    pub likes: u32,
    /// Comments/replies
    pub comments: u32,
    /// Shares/reposts
    pub shares: u32,
    /// Link clicks
    pub clicks: u32,
}

impl EngagementCounts {
    /// Interactions divided by reach (0.0 when nothing was reached)
    pub fn engagement_rate(&self) -> f64 {
        if self.reach == 0 {
            return 0.0;
        }
        f64::from(self.likes + self.comments + self.shares) / f64::from(self.reach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_rate() {
        let counts = EngagementCounts {
            reach: 200,
            likes: 30,
            comments: 10,
            shares: 10,
            ..Default::default()
        };
        assert!((counts.engagement_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_engagement_rate_zero_reach() {
        let counts = EngagementCounts::default();
        assert!(counts.engagement_rate().abs() < f64::EPSILON);
    }
}
