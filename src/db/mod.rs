//! Database module for `SQLite` storage (posts, accounts, analytics, categories, media)
//!
//! Each organization gets its own database file under
//! ~/.config/rookery/orgs/. Access goes through synchronous prepared
//! statements; callers wanting a shared handle use [`ConnectionCache`].

mod cache;
pub mod migrate;

pub use cache::{ConnectionCache, cache_from_config};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{
    Category, EngagementSnapshot, MediaFile, MetricsSnapshot, Platform, Post, PostStatus,
    SocialAccount,
};
use crate::paths;

/// Database connection wrapper for one organization
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database for an organization
    pub fn open_org(organization: &str) -> Result<Self> {
        let path = paths::organization_db_path(organization)?;
        Self::open_path(&path)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Borrow the underlying connection (migrations, maintenance)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Initialize the database schema at the current version
    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            PRAGMA journal_mode=WAL;

            -- Schema version tracking (single row)
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL
            );

            -- Posts table
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                content TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                scheduled_for TEXT,
                published_at TEXT,
                platform_post_id TEXT,
                category_id TEXT,
                error TEXT,
                like_count INTEGER NOT NULL DEFAULT 0,
                comment_count INTEGER NOT NULL DEFAULT 0,
                share_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Connected platform accounts
            CREATE TABLE IF NOT EXISTS social_accounts (
                id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                display_name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                page_id TEXT,
                business_account_id TEXT,
                organization_id TEXT,
                created_at TEXT NOT NULL,
                last_used_at TEXT
            );

            -- Append-only per-post metric snapshots
            CREATE TABLE IF NOT EXISTS analytics_metrics (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                reach INTEGER NOT NULL DEFAULT 0,
                impressions INTEGER NOT NULL DEFAULT 0,
                likes INTEGER NOT NULL DEFAULT 0,
                comments INTEGER NOT NULL DEFAULT 0,
                shares INTEGER NOT NULL DEFAULT 0,
                clicks INTEGER NOT NULL DEFAULT 0,
                engagement_rate REAL NOT NULL DEFAULT 0,
                sentiment_score REAL,
                collected_at TEXT NOT NULL
            );

            -- Categories table
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                color TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL
            );

            -- Media files
            CREATE TABLE IF NOT EXISTS media_files (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                width INTEGER,
                height INTEGER,
                created_at TEXT NOT NULL
            );

            -- Post/media join table (normalized, no JSON arrays)
            CREATE TABLE IF NOT EXISTS post_media (
                post_id TEXT NOT NULL,
                media_id TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (post_id, media_id)
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_posts_platform ON posts(platform);
            CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status);
            CREATE INDEX IF NOT EXISTS idx_posts_scheduled_for ON posts(scheduled_for);
            CREATE INDEX IF NOT EXISTS idx_accounts_platform ON social_accounts(platform);
            CREATE INDEX IF NOT EXISTS idx_metrics_post ON analytics_metrics(post_id);
            CREATE INDEX IF NOT EXISTS idx_post_media_post ON post_media(post_id);
            ",
        )?;

        migrate::stamp_current_version(&self.conn)?;

        Ok(())
    }

    // ==================== Posts ====================

    /// Insert a new post
    pub fn insert_post(&self, post: &Post) -> Result<()> {
        self.conn.execute(
            r"INSERT INTO posts (id, platform, content, status, scheduled_for, published_at,
               platform_post_id, category_id, error, like_count, comment_count, share_count,
               created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                post.id.to_string(),
                post.platform.as_str(),
                post.content,
                post.status.as_str(),
                post.scheduled_for.map(|dt| dt.to_rfc3339()),
                post.published_at.map(|dt| dt.to_rfc3339()),
                post.platform_post_id,
                post.category_id.map(|id| id.to_string()),
                post.error,
                post.engagement.likes,
                post.engagement.comments,
                post.engagement.shares,
                post.created_at.to_rfc3339(),
                post.updated_at.to_rfc3339(),
            ],
        )?;

        for (position, media_id) in post.media_ids.iter().enumerate() {
            self.attach_media(post.id, *media_id, position)?;
        }

        Ok(())
    }

    /// Get a post by id
    pub fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"
        ))?;

        let result = stmt.query_row(params![id.to_string()], Self::row_to_post);

        match result {
            Ok(mut post) => {
                post.media_ids = self.media_ids_for_post(post.id)?;
                Ok(Some(post))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get posts, optionally filtered by platform and status (newest first)
    pub fn get_posts(
        &self,
        platform: Option<Platform>,
        status: Option<PostStatus>,
        limit: usize,
    ) -> Result<Vec<Post>> {
        let mut clauses = Vec::new();
        if let Some(p) = platform {
            clauses.push(format!("platform = '{}'", p.as_str()));
        }
        if let Some(s) = status {
            clauses.push(format!("status = '{}'", s.as_str()));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts {where_clause} ORDER BY created_at DESC LIMIT {limit}"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let posts = stmt.query_map([], Self::row_to_post)?;
        let mut posts: Vec<Post> = posts.collect::<Result<Vec<_>, _>>()?;

        for post in &mut posts {
            post.media_ids = self.media_ids_for_post(post.id)?;
        }

        Ok(posts)
    }

    /// Get posts scheduled inside a date window (calendar view)
    pub fn get_posts_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Post>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE scheduled_for IS NOT NULL AND scheduled_for >= ?1 AND scheduled_for < ?2
             ORDER BY scheduled_for ASC"
        ))?;

        let posts = stmt.query_map(
            params![from.to_rfc3339(), to.to_rfc3339()],
            Self::row_to_post,
        )?;
        posts.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get scheduled posts that are due at `now`
    pub fn get_due_posts(&self, now: DateTime<Utc>) -> Result<Vec<Post>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE status = 'scheduled' AND scheduled_for IS NOT NULL AND scheduled_for <= ?1
             ORDER BY scheduled_for ASC"
        ))?;

        let posts = stmt.query_map(params![now.to_rfc3339()], Self::row_to_post)?;
        let mut posts: Vec<Post> = posts.collect::<Result<Vec<_>, _>>()?;

        for post in &mut posts {
            post.media_ids = self.media_ids_for_post(post.id)?;
        }

        Ok(posts)
    }

    /// Update a post's status and error message
    pub fn update_post_status(
        &self,
        id: Uuid,
        status: PostStatus,
        error: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE posts SET status = ?2, error = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                id.to_string(),
                status.as_str(),
                error,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Mark a post published with its platform-assigned id
    pub fn mark_published(&self, id: Uuid, platform_post_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE posts SET status = 'published', platform_post_id = ?2, published_at = ?3,
             error = NULL, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), platform_post_id, now],
        )?;
        Ok(())
    }

    /// Refresh the denormalized engagement snapshot on a post
    pub fn update_engagement(&self, id: Uuid, engagement: &EngagementSnapshot) -> Result<()> {
        self.conn.execute(
            "UPDATE posts SET like_count = ?2, comment_count = ?3, share_count = ?4,
             updated_at = ?5 WHERE id = ?1",
            params![
                id.to_string(),
                engagement.likes,
                engagement.comments,
                engagement.shares,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Delete a post and its dependent analytics and media-join rows
    pub fn delete_post(&self, id: Uuid) -> Result<()> {
        let id = id.to_string();
        self.conn.execute(
            "DELETE FROM analytics_metrics WHERE post_id = ?1",
            params![id],
        )?;
        self.conn
            .execute("DELETE FROM post_media WHERE post_id = ?1", params![id])?;
        self.conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Helper to convert a row to `Post` (media ids loaded separately)
    fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        let platform_str: String = row.get(1)?;
        let status_str: String = row.get(3)?;

        Ok(Post {
            id: parse_uuid(row.get::<_, String>(0)?),
            platform: Platform::from_str(&platform_str).unwrap_or_default(),
            content: row.get(2)?,
            status: PostStatus::from_str(&status_str).unwrap_or_default(),
            scheduled_for: parse_opt_datetime(row.get::<_, Option<String>>(4)?),
            published_at: parse_opt_datetime(row.get::<_, Option<String>>(5)?),
            platform_post_id: row.get(6)?,
            category_id: row
                .get::<_, Option<String>>(7)?
                .and_then(|s| Uuid::parse_str(&s).ok()),
            error: row.get(8)?,
            engagement: EngagementSnapshot {
                likes: row.get(9)?,
                comments: row.get(10)?,
                shares: row.get(11)?,
            },
            media_ids: Vec::new(),
            created_at: parse_datetime(row.get::<_, String>(12)?),
            updated_at: parse_datetime(row.get::<_, String>(13)?),
        })
    }

    // ==================== Accounts ====================

    /// Insert a new account
    pub fn insert_account(&self, account: &SocialAccount) -> Result<()> {
        self.conn.execute(
            r"INSERT INTO social_accounts (id, platform, display_name, is_active, page_id,
               business_account_id, organization_id, created_at, last_used_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                account.id.to_string(),
                account.platform.as_str(),
                account.display_name,
                i32::from(account.is_active),
                account.page_id,
                account.business_account_id,
                account.organization_id,
                account.created_at.to_rfc3339(),
                account.last_used_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get all accounts
    pub fn get_accounts(&self) -> Result<Vec<SocialAccount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM social_accounts ORDER BY platform, display_name"
        ))?;

        let accounts = stmt.query_map([], Self::row_to_account)?;
        accounts.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get accounts for a specific platform
    pub fn get_accounts_for_platform(&self, platform: Platform) -> Result<Vec<SocialAccount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM social_accounts WHERE platform = ?1 ORDER BY display_name"
        ))?;

        let accounts = stmt.query_map(params![platform.as_str()], Self::row_to_account)?;
        accounts.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get the active posting account for a platform
    pub fn get_active_account(&self, platform: Platform) -> Result<Option<SocialAccount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM social_accounts WHERE platform = ?1 AND is_active = 1"
        ))?;

        let result = stmt.query_row(params![platform.as_str()], Self::row_to_account);

        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set an account as the active one for its platform
    pub fn set_active_account(&self, id: Uuid, platform: Platform) -> Result<()> {
        // Unset the current active account for this platform only
        self.conn.execute(
            "UPDATE social_accounts SET is_active = 0 WHERE platform = ?1",
            params![platform.as_str()],
        )?;

        self.conn.execute(
            "UPDATE social_accounts SET is_active = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;

        Ok(())
    }

    /// Update last used timestamp
    pub fn touch_account(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE social_accounts SET last_used_at = ?2 WHERE id = ?1",
            params![id.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete an account
    pub fn delete_account(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM social_accounts WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// Helper to convert a row to `SocialAccount`
    fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<SocialAccount> {
        let platform_str: String = row.get(1)?;

        Ok(SocialAccount {
            id: parse_uuid(row.get::<_, String>(0)?),
            platform: Platform::from_str(&platform_str).unwrap_or_default(),
            display_name: row.get(2)?,
            is_active: row.get::<_, i32>(3)? != 0,
            page_id: row.get(4)?,
            business_account_id: row.get(5)?,
            organization_id: row.get(6)?,
            created_at: parse_datetime(row.get::<_, String>(7)?),
            last_used_at: parse_opt_datetime(row.get::<_, Option<String>>(8)?),
        })
    }

    // ==================== Analytics ====================

    /// Append a metrics snapshot (rows are never updated)
    pub fn insert_metrics(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        self.conn.execute(
            r"INSERT INTO analytics_metrics (id, post_id, platform, reach, impressions, likes,
               comments, shares, clicks, engagement_rate, sentiment_score, collected_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                snapshot.id.to_string(),
                snapshot.post_id.to_string(),
                snapshot.platform.as_str(),
                snapshot.reach,
                snapshot.impressions,
                snapshot.likes,
                snapshot.comments,
                snapshot.shares,
                snapshot.clicks,
                snapshot.engagement_rate,
                snapshot.sentiment_score,
                snapshot.collected_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get all snapshots for a post (oldest first)
    pub fn get_metrics_for_post(&self, post_id: Uuid) -> Result<Vec<MetricsSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, platform, reach, impressions, likes, comments, shares, clicks,
                    engagement_rate, sentiment_score, collected_at
             FROM analytics_metrics WHERE post_id = ?1 ORDER BY collected_at ASC",
        )?;

        let snapshots = stmt.query_map(params![post_id.to_string()], Self::row_to_metrics)?;
        snapshots.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get the most recent snapshot for a post
    pub fn latest_metrics(&self, post_id: Uuid) -> Result<Option<MetricsSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, platform, reach, impressions, likes, comments, shares, clicks,
                    engagement_rate, sentiment_score, collected_at
             FROM analytics_metrics WHERE post_id = ?1 ORDER BY collected_at DESC LIMIT 1",
        )?;

        let result = stmt.query_row(params![post_id.to_string()], Self::row_to_metrics);

        match result {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Helper to convert a row to `MetricsSnapshot`
    fn row_to_metrics(row: &rusqlite::Row<'_>) -> rusqlite::Result<MetricsSnapshot> {
        let platform_str: String = row.get(2)?;

        Ok(MetricsSnapshot {
            id: parse_uuid(row.get::<_, String>(0)?),
            post_id: parse_uuid(row.get::<_, String>(1)?),
            platform: Platform::from_str(&platform_str).unwrap_or_default(),
            reach: row.get(3)?,
            impressions: row.get(4)?,
            likes: row.get(5)?,
            comments: row.get(6)?,
            shares: row.get(7)?,
            clicks: row.get(8)?,
            engagement_rate: row.get(9)?,
            sentiment_score: row.get(10)?,
            collected_at: parse_datetime(row.get::<_, String>(11)?),
        })
    }

    // ==================== Categories ====================

    /// Insert a new category
    pub fn insert_category(&self, category: &Category) -> Result<()> {
        self.conn.execute(
            "INSERT INTO categories (id, name, color, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                category.id.to_string(),
                category.name,
                category.color,
                category.description,
                category.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get all categories
    pub fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, description, created_at FROM categories ORDER BY name",
        )?;

        let categories = stmt.query_map([], |row| {
            Ok(Category {
                id: parse_uuid(row.get::<_, String>(0)?),
                name: row.get(1)?,
                color: row.get(2)?,
                description: row.get(3)?,
                created_at: parse_datetime(row.get::<_, String>(4)?),
            })
        })?;

        categories.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a category (posts keep their dangling reference cleared)
    pub fn delete_category(&self, id: Uuid) -> Result<()> {
        let id = id.to_string();
        self.conn.execute(
            "UPDATE posts SET category_id = NULL WHERE category_id = ?1",
            params![id],
        )?;
        self.conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ==================== Media ====================

    /// Register a media file
    pub fn insert_media(&self, media: &MediaFile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO media_files (id, path, mime_type, width, height, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                media.id.to_string(),
                media.path,
                media.mime_type,
                media.width,
                media.height,
                media.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a media file by id
    pub fn get_media(&self, id: Uuid) -> Result<Option<MediaFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, path, mime_type, width, height, created_at FROM media_files WHERE id = ?1",
        )?;

        let result = stmt.query_row(params![id.to_string()], Self::row_to_media);

        match result {
            Ok(media) => Ok(Some(media)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Attach a media file to a post at a position
    pub fn attach_media(&self, post_id: Uuid, media_id: Uuid, position: usize) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO post_media (post_id, media_id, position) VALUES (?1, ?2, ?3)",
            params![post_id.to_string(), media_id.to_string(), position as i64],
        )?;
        Ok(())
    }

    /// Detach a media file from a post
    pub fn detach_media(&self, post_id: Uuid, media_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM post_media WHERE post_id = ?1 AND media_id = ?2",
            params![post_id.to_string(), media_id.to_string()],
        )?;
        Ok(())
    }

    /// Get the media files attached to a post, in position order
    pub fn media_for_post(&self, post_id: Uuid) -> Result<Vec<MediaFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.path, m.mime_type, m.width, m.height, m.created_at
             FROM media_files m
             JOIN post_media pm ON pm.media_id = m.id
             WHERE pm.post_id = ?1 ORDER BY pm.position ASC",
        )?;

        let media = stmt.query_map(params![post_id.to_string()], Self::row_to_media)?;
        media.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a media file and its join rows
    pub fn delete_media(&self, id: Uuid) -> Result<()> {
        let id = id.to_string();
        self.conn
            .execute("DELETE FROM post_media WHERE media_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM media_files WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Attached media ids for a post, in position order
    fn media_ids_for_post(&self, post_id: Uuid) -> Result<Vec<Uuid>> {
        let mut stmt = self.conn.prepare(
            "SELECT media_id FROM post_media WHERE post_id = ?1 ORDER BY position ASC",
        )?;

        let ids = stmt.query_map(params![post_id.to_string()], |row| {
            Ok(parse_uuid(row.get::<_, String>(0)?))
        })?;
        ids.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Helper to convert a row to `MediaFile`
    fn row_to_media(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaFile> {
        Ok(MediaFile {
            id: parse_uuid(row.get::<_, String>(0)?),
            path: row.get(1)?,
            mime_type: row.get(2)?,
            width: row.get(3)?,
            height: row.get(4)?,
            created_at: parse_datetime(row.get::<_, String>(5)?),
        })
    }
}

/// Column list shared by the post queries
const POST_COLUMNS: &str = "id, platform, content, status, scheduled_for, published_at, \
     platform_post_id, category_id, error, like_count, comment_count, share_count, \
     created_at, updated_at";

/// Column list shared by the account queries
const ACCOUNT_COLUMNS: &str = "id, platform, display_name, is_active, page_id, \
     business_account_id, organization_id, created_at, last_used_at";

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_default()
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

fn parse_opt_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn open_test_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("test.sqlite");
        Database::open_path(&path).unwrap()
    }

    #[test]
    fn test_database_init() {
        let dir = tempdir().unwrap();
        let _db = open_test_db(&dir);
        // Should create without error
    }

    #[test]
    fn test_post_round_trip() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let post = Post::new(Platform::Facebook, "Launch day!");
        db.insert_post(&post).unwrap();

        let posts = db.get_posts(None, None, 10).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "Launch day!");
        assert_eq!(posts[0].platform, Platform::Facebook);
        assert_eq!(posts[0].status, PostStatus::Draft);
    }

    #[test]
    fn test_post_filters() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        db.insert_post(&Post::new(Platform::Facebook, "fb draft")).unwrap();
        let scheduled = Post::scheduled(
            Platform::LinkedIn,
            "li scheduled",
            Utc::now() + Duration::hours(1),
        );
        db.insert_post(&scheduled).unwrap();

        let fb = db.get_posts(Some(Platform::Facebook), None, 10).unwrap();
        assert_eq!(fb.len(), 1);
        assert_eq!(fb[0].content, "fb draft");

        let li_scheduled = db
            .get_posts(Some(Platform::LinkedIn), Some(PostStatus::Scheduled), 10)
            .unwrap();
        assert_eq!(li_scheduled.len(), 1);

        let none = db
            .get_posts(Some(Platform::Threads), None, 10)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_due_posts() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let due = Post::scheduled(Platform::Threads, "due", Utc::now() - Duration::minutes(5));
        let not_due =
            Post::scheduled(Platform::Threads, "later", Utc::now() + Duration::hours(2));
        db.insert_post(&due).unwrap();
        db.insert_post(&not_due).unwrap();

        let posts = db.get_due_posts(Utc::now()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "due");
    }

    #[test]
    fn test_posts_between_window() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let inside = Post::scheduled(Platform::Facebook, "inside", Utc::now() + Duration::hours(2));
        let outside = Post::scheduled(Platform::Facebook, "outside", Utc::now() + Duration::days(9));
        db.insert_post(&inside).unwrap();
        db.insert_post(&outside).unwrap();

        let window = db
            .get_posts_between(Utc::now(), Utc::now() + Duration::days(7))
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content, "inside");
    }

    #[test]
    fn test_media_get_detach_delete() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let media = MediaFile::new("https://cdn.example.com/a.jpg", "image/jpeg");
        db.insert_media(&media).unwrap();

        let fetched = db.get_media(media.id).unwrap().unwrap();
        assert_eq!(fetched.path, "https://cdn.example.com/a.jpg");

        let post = Post::new(Platform::Facebook, "attach then detach");
        db.insert_post(&post).unwrap();
        db.attach_media(post.id, media.id, 0).unwrap();
        assert_eq!(db.media_for_post(post.id).unwrap().len(), 1);

        db.detach_media(post.id, media.id).unwrap();
        assert!(db.media_for_post(post.id).unwrap().is_empty());

        db.delete_media(media.id).unwrap();
        assert!(db.get_media(media.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_post_cleans_dependents() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let media = MediaFile::new("/tmp/pic.jpg", "image/jpeg");
        db.insert_media(&media).unwrap();

        let mut post = Post::new(Platform::Instagram, "with media");
        post.media_ids = vec![media.id];
        db.insert_post(&post).unwrap();

        let counts = crate::models::EngagementCounts {
            reach: 10,
            likes: 2,
            ..Default::default()
        };
        db.insert_metrics(&MetricsSnapshot::new(post.id, post.platform, &counts))
            .unwrap();

        assert_eq!(db.get_metrics_for_post(post.id).unwrap().len(), 1);
        assert_eq!(db.media_for_post(post.id).unwrap().len(), 1);

        db.delete_post(post.id).unwrap();

        assert!(db.get_post(post.id).unwrap().is_none());
        assert!(db.get_metrics_for_post(post.id).unwrap().is_empty());
        assert!(db.media_for_post(post.id).unwrap().is_empty());
    }

    #[test]
    fn test_account_crud_and_active_flag() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let first = SocialAccount::new_facebook("Main Page", "123");
        let second = SocialAccount::new_facebook("Backup Page", "456");
        let linkedin = SocialAccount::new_linkedin("Company", Some("789"));
        db.insert_account(&first).unwrap();
        db.insert_account(&second).unwrap();
        db.insert_account(&linkedin).unwrap();

        assert!(db.get_active_account(Platform::Facebook).unwrap().is_none());

        db.set_active_account(first.id, Platform::Facebook).unwrap();
        db.set_active_account(linkedin.id, Platform::LinkedIn).unwrap();

        let active = db.get_active_account(Platform::Facebook).unwrap().unwrap();
        assert_eq!(active.id, first.id);

        // Switching the active account clears the previous one for that
        // platform and leaves other platforms alone
        db.set_active_account(second.id, Platform::Facebook).unwrap();
        let active = db.get_active_account(Platform::Facebook).unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert!(db.get_active_account(Platform::LinkedIn).unwrap().is_some());

        db.delete_account(second.id).unwrap();
        assert!(db.get_active_account(Platform::Facebook).unwrap().is_none());
    }

    #[test]
    fn test_metrics_append_only_latest() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let post = Post::new(Platform::LinkedIn, "metrics");
        db.insert_post(&post).unwrap();

        let first = crate::models::EngagementCounts {
            reach: 100,
            likes: 5,
            ..Default::default()
        };
        let second = crate::models::EngagementCounts {
            reach: 250,
            likes: 12,
            ..Default::default()
        };

        let mut early = MetricsSnapshot::new(post.id, post.platform, &first);
        early.collected_at = Utc::now() - Duration::hours(1);
        db.insert_metrics(&early).unwrap();
        db.insert_metrics(&MetricsSnapshot::new(post.id, post.platform, &second))
            .unwrap();

        let all = db.get_metrics_for_post(post.id).unwrap();
        assert_eq!(all.len(), 2);

        let latest = db.latest_metrics(post.id).unwrap().unwrap();
        assert_eq!(latest.reach, 250);
    }

    #[test]
    fn test_category_delete_clears_references() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let category = Category::new("Product", "#6364FF");
        db.insert_category(&category).unwrap();

        let mut post = Post::new(Platform::Facebook, "categorized");
        post.category_id = Some(category.id);
        db.insert_post(&post).unwrap();

        db.delete_category(category.id).unwrap();

        assert!(db.get_categories().unwrap().is_empty());
        let post = db.get_post(post.id).unwrap().unwrap();
        assert!(post.category_id.is_none());
    }

    #[test]
    fn test_media_attachment_ordering() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let a = MediaFile::new("/tmp/a.jpg", "image/jpeg");
        let b = MediaFile::new("/tmp/b.jpg", "image/jpeg");
        db.insert_media(&a).unwrap();
        db.insert_media(&b).unwrap();

        let mut post = Post::new(Platform::Instagram, "gallery");
        post.media_ids = vec![b.id, a.id];
        db.insert_post(&post).unwrap();

        let media = db.media_for_post(post.id).unwrap();
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].id, b.id);
        assert_eq!(media[1].id, a.id);
    }
}
