//! Engagement metrics collection (the fetch-from-platform cycle)

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::api::connector_for;
use crate::auth::TokenSource;
use crate::config::Config;
use crate::db::Database;
use crate::models::{EngagementSnapshot, MetricsSnapshot, Platform, PostStatus};

/// Posts examined per collection cycle
const MAX_POSTS_PER_CYCLE: usize = 200;

/// Outcome of one collection cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionReport {
    /// Snapshots written
    pub collected: usize,
    /// Posts skipped (no remote id, no account, or a fetch failure)
    pub skipped: usize,
}

/// Metrics collector for published posts
pub struct MetricsCollector {
    config: Config,
    tokens: Arc<dyn TokenSource>,
}

impl MetricsCollector {
    /// Create a collector with explicit dependencies
    pub fn new(config: Config, tokens: Arc<dyn TokenSource>) -> Self {
        Self { config, tokens }
    }

    /// Fetch fresh engagement for every published post and append snapshots
    ///
    /// Posts run sequentially; a per-post failure is logged and skipped so
    /// one bad token does not stall the rest of the cycle.
    pub async fn collect(&self, db: &Database) -> Result<CollectionReport> {
        let posts = db.get_posts(None, Some(PostStatus::Published), MAX_POSTS_PER_CYCLE)?;
        let mut report = CollectionReport::default();

        for post in posts {
            let Some(remote_id) = post.platform_post_id.as_deref() else {
                report.skipped += 1;
                continue;
            };

            let Some(account) = db.get_active_account(post.platform)? else {
                tracing::warn!(
                    post = %post.id,
                    platform = post.platform.as_str(),
                    "no active account, skipping metrics"
                );
                report.skipped += 1;
                continue;
            };

            let Some(token) = self.tokens.access_token(&account)? else {
                tracing::warn!(account = %account.display_name, "no credentials, skipping metrics");
                report.skipped += 1;
                continue;
            };

            let connector = match connector_for(&account, &token, &self.config) {
                Ok(connector) => connector,
                Err(e) => {
                    tracing::warn!(post = %post.id, error = %e, "connector unavailable");
                    report.skipped += 1;
                    continue;
                }
            };

            match connector.fetch_metrics(remote_id).await {
                Ok(counts) => {
                    let snapshot = MetricsSnapshot::new(post.id, post.platform, &counts);
                    db.insert_metrics(&snapshot)?;
                    db.update_engagement(
                        post.id,
                        &EngagementSnapshot {
                            likes: counts.likes,
                            comments: counts.comments,
                            shares: counts.shares,
                        },
                    )?;
                    report.collected += 1;
                }
                Err(e) => {
                    tracing::warn!(post = %post.id, error = %format!("{e:#}"), "metrics fetch failed");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            collected = report.collected,
            skipped = report.skipped,
            "metrics cycle complete"
        );

        Ok(report)
    }
}

// ==================== Summary rollup ====================

/// Totals for one platform in the analytics view
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformTotals {
    /// Published posts with at least one snapshot
    pub posts: usize,
    /// Summed reach across latest snapshots
    pub reach: u64,
    /// Summed impressions
    pub impressions: u64,
    /// Summed likes
    pub likes: u64,
    /// Summed comments
    pub comments: u64,
    /// Summed shares
    pub shares: u64,
    /// Summed clicks
    pub clicks: u64,
}

/// Aggregate analytics across published posts
#[derive(Debug, Clone, Default)]
pub struct AnalyticsSummary {
    /// Overall totals
    pub totals: PlatformTotals,
    /// Per-platform breakdown
    pub by_platform: HashMap<Platform, PlatformTotals>,
    /// Mean engagement rate over the latest snapshots
    pub avg_engagement_rate: f64,
}

/// Roll up the latest snapshot of every published post
pub fn summarize(db: &Database) -> Result<AnalyticsSummary> {
    let posts = db.get_posts(None, Some(PostStatus::Published), MAX_POSTS_PER_CYCLE)?;
    let mut summary = AnalyticsSummary::default();
    let mut rate_sum = 0.0;

    for post in posts {
        let Some(snapshot) = db.latest_metrics(post.id)? else {
            continue;
        };

        let entry = summary.by_platform.entry(post.platform).or_default();
        for totals in [&mut summary.totals, entry] {
            totals.posts += 1;
            totals.reach += u64::from(snapshot.reach);
            totals.impressions += u64::from(snapshot.impressions);
            totals.likes += u64::from(snapshot.likes);
            totals.comments += u64::from(snapshot.comments);
            totals.shares += u64::from(snapshot.shares);
            totals.clicks += u64::from(snapshot.clicks);
        }
        rate_sum += snapshot.engagement_rate;
    }

    if summary.totals.posts > 0 {
        summary.avg_engagement_rate = rate_sum / summary.totals.posts as f64;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokens;
    use crate::models::{Post, SocialAccount};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_collect_appends_snapshot_and_updates_post() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v18.0/123_9")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"likes":{"summary":{"total_count":7}},
                    "comments":{"summary":{"total_count":1}},
                    "shares":{"count":2}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/v18.0/123_9/insights")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[{"name":"post_impressions_unique","values":[{"value":40}]}]}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();

        let account = SocialAccount::new_facebook("Page", "123");
        db.insert_account(&account).unwrap();
        db.set_active_account(account.id, Platform::Facebook).unwrap();

        let tokens = MemoryTokens::new();
        tokens.insert(&account, "token");

        let post = Post::new(Platform::Facebook, "published earlier");
        db.insert_post(&post).unwrap();
        db.mark_published(post.id, "123_9").unwrap();

        let mut config = Config::default();
        config.facebook_base_url = server.url();

        let collector = MetricsCollector::new(config, Arc::new(tokens));
        let report = collector.collect(&db).await.unwrap();

        assert_eq!(report.collected, 1);
        assert_eq!(report.skipped, 0);

        let snapshot = db.latest_metrics(post.id).unwrap().unwrap();
        assert_eq!(snapshot.likes, 7);
        assert_eq!(snapshot.shares, 2);
        assert_eq!(snapshot.reach, 40);

        let stored = db.get_post(post.id).unwrap().unwrap();
        assert_eq!(stored.engagement.likes, 7);
        assert_eq!(stored.engagement.comments, 1);
    }

    #[tokio::test]
    async fn test_collect_skips_posts_without_account() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();

        let post = Post::new(Platform::Threads, "orphan");
        db.insert_post(&post).unwrap();
        db.mark_published(post.id, "t_1").unwrap();

        let collector =
            MetricsCollector::new(Config::default(), Arc::new(MemoryTokens::new()));
        let report = collector.collect(&db).await.unwrap();

        assert_eq!(report.collected, 0);
        assert_eq!(report.skipped, 1);
        assert!(db.latest_metrics(post.id).unwrap().is_none());
    }

    #[test]
    fn test_summarize_uses_latest_snapshots() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();

        let post = Post::new(Platform::Facebook, "summed");
        db.insert_post(&post).unwrap();
        db.mark_published(post.id, "123_1").unwrap();

        let counts = crate::models::EngagementCounts {
            reach: 50,
            impressions: 80,
            likes: 10,
            ..Default::default()
        };
        db.insert_metrics(&MetricsSnapshot::new(post.id, post.platform, &counts))
            .unwrap();

        let summary = summarize(&db).unwrap();
        assert_eq!(summary.totals.posts, 1);
        assert_eq!(summary.totals.reach, 50);
        assert_eq!(
            summary.by_platform.get(&Platform::Facebook).unwrap().likes,
            10
        );
        assert!(summary.avg_engagement_rate > 0.0);
    }
}
