//! Demo fixtures, seeded into a dedicated organization database
//!
//! Sample data lives in its own tenant file (`orgs/demo.sqlite`) so it never
//! mixes with real organizations; wiping it removes exactly that file and
//! nothing else.

use anyhow::Result;
use chrono::{Duration, Utc};

use crate::db::Database;
use crate::models::{
    Category, EngagementCounts, MetricsSnapshot, Platform, Post, PostStatus, SocialAccount,
};
use crate::paths;

/// Name of the demo organization
pub const DEMO_ORGANIZATION: &str = "demo";

/// Seed the demo organization database, returning it for inspection
pub fn seed() -> Result<Database> {
    let db = Database::open_org(DEMO_ORGANIZATION)?;
    seed_into(&db)?;
    Ok(db)
}

/// Seed fixture rows into a database
pub fn seed_into(db: &Database) -> Result<()> {
    let product = Category::with_description("Product", "#6364FF", "Launches and release notes");
    let culture = Category::with_description("Culture", "#0085FF", "Team and behind the scenes");
    db.insert_category(&product)?;
    db.insert_category(&culture)?;

    let facebook = SocialAccount::new_facebook("Demo Page", "101010101010101");
    let linkedin = SocialAccount::new_linkedin("Demo Company", Some("22334455"));
    let threads = SocialAccount::new_threads("demo.brand", "31415926535");
    db.insert_account(&facebook)?;
    db.insert_account(&linkedin)?;
    db.insert_account(&threads)?;
    db.set_active_account(facebook.id, Platform::Facebook)?;
    db.set_active_account(linkedin.id, Platform::LinkedIn)?;
    db.set_active_account(threads.id, Platform::Threads)?;

    // A published post with two metric snapshots showing growth
    let mut launched = Post::new(Platform::Facebook, "We just shipped v2.0 🎉");
    launched.category_id = Some(product.id);
    db.insert_post(&launched)?;
    db.mark_published(launched.id, "101010101010101_555")?;

    let day_one = EngagementCounts {
        reach: 320,
        impressions: 410,
        likes: 18,
        comments: 4,
        shares: 6,
        clicks: 11,
    };
    let day_two = EngagementCounts {
        reach: 780,
        impressions: 1060,
        likes: 52,
        comments: 9,
        shares: 17,
        clicks: 34,
    };
    let mut early = MetricsSnapshot::new(launched.id, launched.platform, &day_one);
    early.collected_at = Utc::now() - Duration::days(1);
    db.insert_metrics(&early)?;
    db.insert_metrics(&MetricsSnapshot::new(launched.id, launched.platform, &day_two))?;
    db.update_engagement(
        launched.id,
        &crate::models::EngagementSnapshot {
            likes: day_two.likes,
            comments: day_two.comments,
            shares: day_two.shares,
        },
    )?;

    // A scheduled post and a draft to fill out the queue views
    let mut hiring = Post::scheduled(
        Platform::LinkedIn,
        "We're hiring! Come build with us.",
        Utc::now() + Duration::days(2),
    );
    hiring.category_id = Some(culture.id);
    db.insert_post(&hiring)?;

    let mut teaser = Post::new(Platform::Threads, "Something new is coming this week 👀");
    teaser.category_id = Some(product.id);
    db.insert_post(&teaser)?;

    // A failed post so the error surface shows up in listings
    let expired = Post::new(Platform::Facebook, "This one hit an expired token");
    db.insert_post(&expired)?;
    db.update_post_status(
        expired.id,
        PostStatus::Failed,
        Some("Facebook error 400 Bad Request: Error validating access token"),
    )?;

    Ok(())
}

/// Delete the demo organization database file
///
/// Returns whether a file was removed.
pub fn wipe() -> Result<bool> {
    let path = paths::organization_db_path(DEMO_ORGANIZATION)?;
    if path.exists() {
        std::fs::remove_file(&path)?;
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_seed_populates_every_table() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("demo.sqlite")).unwrap();
        seed_into(&db).unwrap();

        assert_eq!(db.get_categories().unwrap().len(), 2);
        assert_eq!(db.get_accounts().unwrap().len(), 3);
        assert_eq!(db.get_posts(None, None, 50).unwrap().len(), 4);

        let published = db
            .get_posts(None, Some(PostStatus::Published), 50)
            .unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(db.get_metrics_for_post(published[0].id).unwrap().len(), 2);

        let failed = db.get_posts(None, Some(PostStatus::Failed), 50).unwrap();
        assert!(failed[0].error.as_deref().unwrap().contains("access token"));
    }
}
