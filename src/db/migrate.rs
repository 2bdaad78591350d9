//! Schema migrations, tracked through the `schema_version` table.
//!
//! Version 2 replaced the legacy `media_json` array column on posts with the
//! normalized `post_media` join table. Fresh databases are created at the
//! latest version; this module only has work to do on files written by older
//! releases.
//!
//! Statements are attempted independently: a failed step is logged and
//! skipped rather than aborting the run, and every step is idempotent
//! (`IF NOT EXISTS` / `INSERT OR IGNORE`) so re-running is harmless.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

/// Latest schema version
pub const CURRENT_VERSION: i64 = 2;

/// Outcome of one migration run
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationReport {
    /// Version before the run
    pub from_version: i64,
    /// Version after the run
    pub to_version: i64,
    /// Media references copied into the join table
    pub rows_migrated: usize,
    /// Statements that failed and were skipped
    pub statements_skipped: usize,
}

/// Read the recorded schema version (0 when the table is empty)
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);
    Ok(version)
}

fn set_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        params![version],
    )?;
    Ok(())
}

/// Check whether a table carries a column (pragma lookup)
fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Record the schema version for a freshly initialized database
///
/// A file written by an older release is recognizable by the legacy
/// `media_json` column; those are stamped at version 1 so [`run`] knows the
/// backfill is still pending.
pub(crate) fn stamp_current_version(conn: &Connection) -> Result<()> {
    if schema_version(conn)? != 0 {
        return Ok(());
    }

    let version = if has_column(conn, "posts", "media_json")? {
        1
    } else {
        CURRENT_VERSION
    };
    set_version(conn, version)
}

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<MigrationReport> {
    let from_version = schema_version(conn)?;
    let mut report = MigrationReport {
        from_version,
        to_version: from_version,
        ..Default::default()
    };

    if from_version >= CURRENT_VERSION {
        tracing::debug!(version = from_version, "schema already current");
        return Ok(report);
    }

    if from_version < 2 {
        migrate_media_to_join_table(conn, &mut report)?;
    }

    set_version(conn, CURRENT_VERSION).context("Failed to record schema version")?;
    report.to_version = CURRENT_VERSION;

    tracing::info!(
        from = from_version,
        to = CURRENT_VERSION,
        rows = report.rows_migrated,
        skipped = report.statements_skipped,
        "migration complete"
    );

    Ok(report)
}

/// v1 -> v2: move the `media_json` array on posts into `post_media`
fn migrate_media_to_join_table(conn: &Connection, report: &mut MigrationReport) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("Failed to begin migration transaction")?;

    if let Err(e) = tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS post_media (
            post_id TEXT NOT NULL,
            media_id TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (post_id, media_id)
        );
        CREATE INDEX IF NOT EXISTS idx_post_media_post ON post_media(post_id);",
    ) {
        tracing::warn!(error = %e, "post_media creation failed, skipping");
        report.statements_skipped += 1;
    }

    if has_column(&tx, "posts", "media_json")? {
        let rows: Vec<(String, String)> = {
            let mut stmt = tx.prepare(
                "SELECT id, media_json FROM posts
                 WHERE media_json IS NOT NULL AND media_json != '[]'",
            )?;
            let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            mapped.collect::<Result<Vec<_>, _>>()?
        };

        for (post_id, media_json) in rows {
            let media_ids: Vec<String> = match serde_json::from_str(&media_json) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(post = %post_id, error = %e, "unparseable media_json, skipping");
                    report.statements_skipped += 1;
                    continue;
                }
            };

            for (position, media_id) in media_ids.iter().enumerate() {
                match tx.execute(
                    "INSERT OR IGNORE INTO post_media (post_id, media_id, position)
                     VALUES (?1, ?2, ?3)",
                    params![post_id, media_id, position as i64],
                ) {
                    Ok(inserted) => report.rows_migrated += inserted,
                    Err(e) => {
                        tracing::warn!(post = %post_id, error = %e, "backfill insert failed, skipping");
                        report.statements_skipped += 1;
                    }
                }
            }
        }

        // Backfill complete: clear the legacy column so a re-run finds nothing
        if let Err(e) = tx.execute("UPDATE posts SET media_json = '[]'", []) {
            tracing::warn!(error = %e, "legacy column clear failed, skipping");
            report.statements_skipped += 1;
        }
    }

    tx.commit().context("Failed to commit migration")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A database as the v1 release laid it out: media ids as a JSON array
    /// column on the post row.
    fn legacy_v1_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE schema_version (version INTEGER NOT NULL);
            INSERT INTO schema_version (version) VALUES (1);

            CREATE TABLE posts (
                id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                content TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                media_json TEXT DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            INSERT INTO posts (id, platform, content, status, media_json, created_at, updated_at)
            VALUES
                ('post-1', 'facebook', 'two attachments', 'draft',
                 '["media-a","media-b"]', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z'),
                ('post-2', 'instagram', 'no attachments', 'draft',
                 '[]', '2024-01-02T00:00:00Z', '2024-01-02T00:00:00Z');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_migrates_media_json_to_join_table() {
        let conn = legacy_v1_conn();

        let report = run(&conn).unwrap();
        assert_eq!(report.from_version, 1);
        assert_eq!(report.to_version, CURRENT_VERSION);
        assert_eq!(report.rows_migrated, 2);
        assert_eq!(report.statements_skipped, 0);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM post_media WHERE post_id = 'post-1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(count, 2);

        // Positions preserve the array order
        let first: String = conn
            .query_row(
                "SELECT media_id FROM post_media WHERE post_id = 'post-1' AND position = 0",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(first, "media-a");
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let conn = legacy_v1_conn();

        let first = run(&conn).unwrap();
        assert_eq!(first.rows_migrated, 2);

        let second = run(&conn).unwrap();
        assert_eq!(second.rows_migrated, 0);
        assert_eq!(second.statements_skipped, 0);
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM post_media", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_unparseable_media_json_is_skipped() {
        let conn = legacy_v1_conn();
        conn.execute(
            "UPDATE posts SET media_json = 'not json' WHERE id = 'post-2'",
            [],
        )
        .unwrap();

        let report = run(&conn).unwrap();
        assert_eq!(report.rows_migrated, 2);
        assert_eq!(report.statements_skipped, 1);
        assert_eq!(report.to_version, CURRENT_VERSION);
    }

    #[test]
    fn test_fresh_database_is_stamped_current() {
        let dir = tempfile::tempdir().unwrap();
        let db = crate::db::Database::open_path(&dir.path().join("fresh.sqlite")).unwrap();

        assert_eq!(schema_version(db.connection()).unwrap(), CURRENT_VERSION);

        let report = run(db.connection()).unwrap();
        assert_eq!(report.rows_migrated, 0);
    }

    #[test]
    fn test_legacy_file_is_stamped_at_v1() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER NOT NULL);
             CREATE TABLE posts (id TEXT PRIMARY KEY, media_json TEXT DEFAULT '[]');",
        )
        .unwrap();

        stamp_current_version(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }
}
