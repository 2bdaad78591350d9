//! Social media manager: dispatches posts to the connector matching their
//! platform and normalizes every result into one outcome shape.
//!
//! There is no queueing, batching, or parallel fan-out here; each publish
//! call runs to completion before the caller proceeds, and a retry after a
//! failure is a brand-new remote post.

use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use crate::api::connector_for;
use crate::auth::TokenSource;
use crate::config::Config;
use crate::db::Database;
use crate::models::{Post, PostStatus, SocialAccount};

/// Normalized result of a publish attempt
///
/// Authentication, permission, validation, and transport failures all arrive
/// here as the same shape; callers read `error` for display, they do not
/// branch on failure class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Whether the post went live
    pub success: bool,
    /// Platform-assigned post id on success
    pub platform_post_id: Option<String>,
    /// Failure message on error
    pub error: Option<String>,
}

impl PublishOutcome {
    /// Successful publish
    pub fn published(platform_post_id: impl Into<String>) -> Self {
        Self {
            success: true,
            platform_post_id: Some(platform_post_id.into()),
            error: None,
        }
    }

    /// Failed publish
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            platform_post_id: None,
            error: Some(error.into()),
        }
    }
}

/// Dispatcher over the platform connectors
pub struct SocialMediaManager {
    config: Config,
    tokens: Arc<dyn TokenSource>,
}

impl SocialMediaManager {
    /// Create a manager with explicit dependencies
    pub fn new(config: Config, tokens: Arc<dyn TokenSource>) -> Self {
        Self { config, tokens }
    }

    /// Publish a stored post by id
    pub async fn publish_post(&self, db: &Database, post_id: Uuid) -> Result<PublishOutcome> {
        let Some(post) = db.get_post(post_id)? else {
            return Ok(PublishOutcome::failed(format!("Post {post_id} not found")));
        };
        self.publish(db, &post).await
    }

    /// Publish a post through the active account for its platform
    ///
    /// With no active account the call returns a not-connected outcome
    /// before any network activity.
    pub async fn publish(&self, db: &Database, post: &Post) -> Result<PublishOutcome> {
        let Some(account) = db.get_active_account(post.platform)? else {
            let outcome = PublishOutcome::failed(format!(
                "No active {} account connected",
                post.platform.name()
            ));
            db.update_post_status(post.id, PostStatus::Failed, outcome.error.as_deref())?;
            return Ok(outcome);
        };

        let Some(token) = self.tokens.access_token(&account)? else {
            let outcome = PublishOutcome::failed(format!(
                "No credentials stored for {}",
                account.display_name
            ));
            db.update_post_status(post.id, PostStatus::Failed, outcome.error.as_deref())?;
            return Ok(outcome);
        };

        let connector = match connector_for(&account, &token, &self.config) {
            Ok(connector) => connector,
            Err(e) => {
                let outcome = PublishOutcome::failed(format!("{e:#}"));
                db.update_post_status(post.id, PostStatus::Failed, outcome.error.as_deref())?;
                return Ok(outcome);
            }
        };

        let media = db.media_for_post(post.id)?;

        match connector.publish(&post.content, &media).await {
            Ok(platform_post_id) => {
                db.mark_published(post.id, &platform_post_id)?;
                db.touch_account(account.id)?;
                tracing::info!(
                    post = %post.id,
                    platform = post.platform.as_str(),
                    remote = %platform_post_id,
                    "post published"
                );
                Ok(PublishOutcome::published(platform_post_id))
            }
            Err(e) => {
                let message = format!("{e:#}");
                db.update_post_status(post.id, PostStatus::Failed, Some(&message))?;
                tracing::warn!(
                    post = %post.id,
                    platform = post.platform.as_str(),
                    error = %message,
                    "publish failed"
                );
                Ok(PublishOutcome::failed(message))
            }
        }
    }

    /// Check whether an account's stored token is currently valid
    pub async fn test_connection(&self, account: &SocialAccount) -> Result<bool> {
        let Some(token) = self.tokens.access_token(account)? else {
            return Ok(false);
        };

        let connector = connector_for(account, &token, &self.config)?;
        connector.test_connection().await
    }

    /// The configuration this manager dispatches with
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokens;
    use crate::models::Platform;
    use tempfile::tempdir;

    /// Config whose endpoints cannot be reached, so any accidental network
    /// call fails loudly with a connection error
    fn unroutable_config() -> Config {
        let mut config = Config::default();
        config.facebook_base_url = "http://127.0.0.1:9".to_string();
        config.linkedin_base_url = "http://127.0.0.1:9".to_string();
        config.threads_base_url = "http://127.0.0.1:9".to_string();
        config
    }

    fn open_test_db(dir: &tempfile::TempDir) -> Database {
        Database::open_path(&dir.path().join("test.sqlite")).unwrap()
    }

    #[tokio::test]
    async fn test_publish_without_active_account_makes_no_network_call() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let post = Post::new(Platform::Facebook, "hello");
        db.insert_post(&post).unwrap();

        let manager =
            SocialMediaManager::new(unroutable_config(), Arc::new(MemoryTokens::new()));
        let outcome = manager.publish(&db, &post).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("not connected") ||
            outcome.error.as_deref().unwrap().contains("No active"));

        // A network attempt against 127.0.0.1:9 would have produced a
        // connection error message instead
        assert!(!outcome.error.unwrap().contains("error sending request"));

        let stored = db.get_post(post.id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Failed);
    }

    #[tokio::test]
    async fn test_publish_without_credentials_fails_cleanly() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let account = SocialAccount::new_facebook("Main Page", "123");
        db.insert_account(&account).unwrap();
        db.set_active_account(account.id, Platform::Facebook).unwrap();

        let post = Post::new(Platform::Facebook, "hello");
        db.insert_post(&post).unwrap();

        let manager =
            SocialMediaManager::new(unroutable_config(), Arc::new(MemoryTokens::new()));
        let outcome = manager.publish(&db, &post).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("No credentials"));
    }

    #[tokio::test]
    async fn test_publish_success_marks_post_published() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v18.0/123/feed")
            .with_status(200)
            .with_body(r#"{"id":"123_789"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let account = SocialAccount::new_facebook("Main Page", "123");
        db.insert_account(&account).unwrap();
        db.set_active_account(account.id, Platform::Facebook).unwrap();

        let tokens = MemoryTokens::new();
        tokens.insert(&account, "EAAtoken");

        let mut config = Config::default();
        config.facebook_base_url = server.url();

        let post = Post::new(Platform::Facebook, "hello");
        db.insert_post(&post).unwrap();

        let manager = SocialMediaManager::new(config, Arc::new(tokens));
        let outcome = manager.publish_post(&db, post.id).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.platform_post_id.as_deref(), Some("123_789"));

        let stored = db.get_post(post.id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Published);
        assert_eq!(stored.platform_post_id.as_deref(), Some("123_789"));
        assert!(stored.published_at.is_some());
    }

    #[tokio::test]
    async fn test_publish_failure_surfaces_platform_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v18.0/123/feed")
            .with_status(400)
            .with_body(r#"{"error":{"message":"Invalid OAuth access token","code":190}}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let account = SocialAccount::new_facebook("Main Page", "123");
        db.insert_account(&account).unwrap();
        db.set_active_account(account.id, Platform::Facebook).unwrap();

        let tokens = MemoryTokens::new();
        tokens.insert(&account, "stale");

        let mut config = Config::default();
        config.facebook_base_url = server.url();

        let post = Post::new(Platform::Facebook, "hello");
        db.insert_post(&post).unwrap();

        let manager = SocialMediaManager::new(config, Arc::new(tokens));
        let outcome = manager.publish(&db, &post).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Invalid OAuth access token"));

        let stored = db.get_post(post.id).unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Failed);
        assert!(stored.error.unwrap().contains("Invalid OAuth access token"));
    }

    #[tokio::test]
    async fn test_missing_post_is_a_failed_outcome() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let manager =
            SocialMediaManager::new(unroutable_config(), Arc::new(MemoryTokens::new()));
        let outcome = manager.publish_post(&db, Uuid::new_v4()).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("not found"));
    }
}
