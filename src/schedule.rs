//! Post scheduling: time parsing and the due-post dispatch loop

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::db::Database;
use crate::manager::{PublishOutcome, SocialMediaManager};
use crate::models::Post;

/// Parse a schedule time string into a `DateTime`<Utc>
///
/// Supports formats:
/// - Relative: "in 5m", "in 2h", "in 1d", "in 30 minutes", "in 2 hours"
/// - Absolute time today: "15:00", "3pm", "15:30"
/// - Absolute datetime: "YYYY-MM-DD 15:00", "YYYY-MM-DDT15:00:00"
/// - ISO 8601: "YYYY-MM-DDT15:00:00Z", "YYYY-MM-DDT15:00:00+01:00"
pub fn parse_schedule_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim().to_lowercase();

    // Try relative time first
    if let Some(rest) = input.strip_prefix("in ") {
        return parse_relative_time(rest);
    }

    // Try ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(&input) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try ISO 8601 variants
    if let Ok(dt) = DateTime::parse_from_str(&input, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try datetime without timezone (assume local)
    if let Ok(naive) = NaiveDateTime::parse_from_str(&input, "%Y-%m-%d %H:%M:%S") {
        return local_to_utc(naive);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&input, "%Y-%m-%d %H:%M") {
        return local_to_utc(naive);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&input, "%Y-%m-%dT%H:%M:%S") {
        return local_to_utc(naive);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&input, "%Y-%m-%dT%H:%M") {
        return local_to_utc(naive);
    }

    // Try time only (assume today, or tomorrow if time has passed)
    if let Some(time) = parse_time_only(&input) {
        let today = Local::now().date_naive();
        let naive_dt = today.and_time(time);
        let local_dt = Local.from_local_datetime(&naive_dt).single();

        if let Some(dt) = local_dt {
            // If time has passed, schedule for tomorrow
            if dt <= Local::now() {
                let tomorrow = today + Duration::days(1);
                let naive_dt = tomorrow.and_time(time);
                if let Some(dt) = Local.from_local_datetime(&naive_dt).single() {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
            return Ok(dt.with_timezone(&Utc));
        }
    }

    Err(anyhow!(
        "Could not parse schedule time: '{}'\n\
         Supported formats:\n  \
         - Relative: 'in 5m', 'in 2h', 'in 1d', 'in 30 minutes'\n  \
         - Time today: '15:00', '3pm', '15:30'\n  \
         - Date+time: 'YYYY-MM-DD 15:00'",
        input
    ))
}

/// Parse relative time like "5m", "2h", "1d", "30 minutes", "2 hours"
fn parse_relative_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    // Try short format: 5m, 2h, 1d
    if let Some(duration) = parse_short_duration(input) {
        return Ok(Utc::now() + duration);
    }

    // Try long format: "30 minutes", "2 hours", "1 day"
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() >= 2
        && let Ok(amount) = parts[0].parse::<i64>()
    {
        let unit = parts[1].trim_end_matches('s'); // Remove trailing 's'
        let duration = match unit {
            "second" | "sec" => Duration::seconds(amount),
            "minute" | "min" => Duration::minutes(amount),
            "hour" | "hr" => Duration::hours(amount),
            "day" => Duration::days(amount),
            "week" => Duration::weeks(amount),
            _ => return Err(anyhow!("Unknown time unit: {}", parts[1])),
        };
        return Ok(Utc::now() + duration);
    }

    Err(anyhow!(
        "Could not parse relative time: '{}'\n\
         Examples: '5m', '2h', '1d', '30 minutes', '2 hours'",
        input
    ))
}

/// Parse short duration format: 5m, 2h, 1d, 30s
fn parse_short_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let (num_str, unit) = input.split_at(input.len() - 1);
    let amount: i64 = num_str.parse().ok()?;

    match unit {
        "s" => Some(Duration::seconds(amount)),
        "m" => Some(Duration::minutes(amount)),
        "h" => Some(Duration::hours(amount)),
        "d" => Some(Duration::days(amount)),
        "w" => Some(Duration::weeks(amount)),
        _ => None,
    }
}

/// Parse time-only string like "15:00", "3pm", "15:30"
fn parse_time_only(input: &str) -> Option<NaiveTime> {
    // Try 24-hour format
    if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M:%S") {
        return Some(time);
    }
    if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M") {
        return Some(time);
    }

    // Try 12-hour format with am/pm
    let input = input.replace(' ', "");
    if input.ends_with("am") || input.ends_with("pm") {
        let is_pm = input.ends_with("pm");
        let time_part = input.trim_end_matches("am").trim_end_matches("pm");

        // Parse hour (and optional minutes)
        let parts: Vec<&str> = time_part.split(':').collect();
        if let Ok(mut hour) = parts[0].parse::<u32>() {
            let minute = parts.get(1).and_then(|m| m.parse().ok()).unwrap_or(0);

            // Convert to 24-hour
            if is_pm && hour != 12 {
                hour += 12;
            } else if !is_pm && hour == 12 {
                hour = 0;
            }

            return NaiveTime::from_hms_opt(hour, minute, 0);
        }
    }

    None
}

/// Convert naive local datetime to UTC
fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Ambiguous or invalid local time"))
}

// ==================== Due-post processing ====================

/// Publish every scheduled post whose time has arrived
///
/// Posts run sequentially, one publish to completion before the next. A
/// per-post failure is recorded on that post and the sweep continues.
pub async fn run_due(
    db: &Database,
    manager: &SocialMediaManager,
    now: DateTime<Utc>,
) -> Result<Vec<(Post, PublishOutcome)>> {
    let due = db.get_due_posts(now)?;
    let mut results = Vec::with_capacity(due.len());

    for post in due {
        let outcome = match manager.publish(db, &post).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(post = %post.id, error = %e, "scheduled publish errored");
                PublishOutcome::failed(format!("{e:#}"))
            }
        };
        results.push((post, outcome));
    }

    Ok(results)
}

/// Poll for due posts on an interval, forever
pub async fn run_forever(db: &Database, manager: &SocialMediaManager, interval_secs: u64) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));

    loop {
        interval.tick().await;

        match run_due(db, manager, Utc::now()).await {
            Ok(results) => {
                for (post, outcome) in results {
                    if outcome.success {
                        tracing::info!(post = %post.id, "scheduled post published");
                    } else {
                        tracing::warn!(
                            post = %post.id,
                            error = outcome.error.as_deref().unwrap_or("unknown"),
                            "scheduled post failed"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!("scheduler sweep failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokens;
    use crate::config::Config;
    use crate::models::{Platform, PostStatus, SocialAccount};
    use chrono::Datelike;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_relative_short() {
        let now = Utc::now();
        let result = parse_schedule_time("in 5m").unwrap();
        let diff = result - now;
        assert!(diff.num_minutes() >= 4 && diff.num_minutes() <= 6);
    }

    #[test]
    fn test_relative_long() {
        let now = Utc::now();
        let result = parse_schedule_time("in 2 hours").unwrap();
        let diff = result - now;
        assert!(diff.num_hours() >= 1 && diff.num_hours() <= 3);
    }

    #[test]
    fn test_datetime() {
        let result = parse_schedule_time("2030-01-15 14:30").unwrap();
        assert_eq!(result.year(), 2030);
        assert_eq!(result.month(), 1);
        assert_eq!(result.day(), 15);
    }

    #[test]
    fn test_rfc3339() {
        let result = parse_schedule_time("2030-06-01T09:00:00Z").unwrap();
        assert_eq!(result.year(), 2030);
        assert_eq!(result.month(), 6);
    }

    #[tokio::test]
    async fn test_run_due_publishes_and_continues_past_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v18.0/123/feed")
            .with_status(200)
            .with_body(r#"{"id":"123_1"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();

        // Facebook is connected; LinkedIn is not, so its post fails
        let account = SocialAccount::new_facebook("Page", "123");
        db.insert_account(&account).unwrap();
        db.set_active_account(account.id, Platform::Facebook).unwrap();

        let tokens = MemoryTokens::new();
        tokens.insert(&account, "token");

        let mut config = Config::default();
        config.facebook_base_url = server.url();
        config.linkedin_base_url = "http://127.0.0.1:9".to_string();

        let past = Utc::now() - Duration::minutes(2);
        let fb_post = Post::scheduled(Platform::Facebook, "fb", past);
        let li_post = Post::scheduled(Platform::LinkedIn, "li", past);
        db.insert_post(&fb_post).unwrap();
        db.insert_post(&li_post).unwrap();

        let manager = SocialMediaManager::new(config, Arc::new(tokens));
        let results = run_due(&db, &manager, Utc::now()).await.unwrap();

        assert_eq!(results.len(), 2);
        let fb_outcome = &results.iter().find(|(p, _)| p.id == fb_post.id).unwrap().1;
        let li_outcome = &results.iter().find(|(p, _)| p.id == li_post.id).unwrap().1;
        assert!(fb_outcome.success);
        assert!(!li_outcome.success);

        assert_eq!(
            db.get_post(fb_post.id).unwrap().unwrap().status,
            PostStatus::Published
        );
        assert_eq!(
            db.get_post(li_post.id).unwrap().unwrap().status,
            PostStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_run_due_ignores_future_posts() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();

        let future = Post::scheduled(
            Platform::Facebook,
            "later",
            Utc::now() + Duration::hours(3),
        );
        db.insert_post(&future).unwrap();

        let manager =
            SocialMediaManager::new(Config::default(), Arc::new(MemoryTokens::new()));
        let results = run_due(&db, &manager, Utc::now()).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(
            db.get_post(future.id).unwrap().unwrap().status,
            PostStatus::Scheduled
        );
    }
}
