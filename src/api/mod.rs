//! API clients for social platforms

pub mod facebook;
pub mod instagram;
pub mod linkedin;
pub mod threads;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::{EngagementCounts, MediaFile, Platform, SocialAccount};

/// Unified connector trait for social platforms
#[allow(async_fn_in_trait)]
pub trait PlatformConnector {
    /// Check whether the stored token is currently valid
    ///
    /// Issues a lightweight authenticated GET; a non-2xx response means the
    /// connection is bad and yields `Ok(false)` rather than an error.
    async fn test_connection(&self) -> Result<bool>;

    /// Publish a post and return the platform-assigned post id
    ///
    /// A non-2xx or error-bearing response is a terminal failure for this
    /// call; there is no retry and no idempotency key, so re-invoking after
    /// a failure can create a duplicate remote post.
    async fn publish(&self, content: &str, media: &[MediaFile]) -> Result<String>;

    /// Fetch current engagement counts for a published post
    async fn fetch_metrics(&self, platform_post_id: &str) -> Result<EngagementCounts>;
}

/// Unified client that wraps platform-specific implementations
#[derive(Debug)]
pub enum Connector {
    /// Facebook Graph API client
    Facebook(facebook::FacebookClient),
    /// Instagram Graph API client
    Instagram(instagram::InstagramClient),
    /// LinkedIn REST API client
    LinkedIn(linkedin::LinkedInClient),
    /// Threads Graph API client
    Threads(threads::ThreadsClient),
}

impl Connector {
    /// Check whether the stored token is currently valid
    pub async fn test_connection(&self) -> Result<bool> {
        match self {
            Connector::Facebook(c) => c.test_connection().await,
            Connector::Instagram(c) => c.test_connection().await,
            Connector::LinkedIn(c) => c.test_connection().await,
            Connector::Threads(c) => c.test_connection().await,
        }
    }

    /// Publish a post and return the platform-assigned post id
    pub async fn publish(&self, content: &str, media: &[MediaFile]) -> Result<String> {
        match self {
            Connector::Facebook(c) => c.publish(content, media).await,
            Connector::Instagram(c) => c.publish(content, media).await,
            Connector::LinkedIn(c) => c.publish(content, media).await,
            Connector::Threads(c) => c.publish(content, media).await,
        }
    }

    /// Fetch current engagement counts for a published post
    pub async fn fetch_metrics(&self, platform_post_id: &str) -> Result<EngagementCounts> {
        match self {
            Connector::Facebook(c) => c.fetch_metrics(platform_post_id).await,
            Connector::Instagram(c) => c.fetch_metrics(platform_post_id).await,
            Connector::LinkedIn(c) => c.fetch_metrics(platform_post_id).await,
            Connector::Threads(c) => c.fetch_metrics(platform_post_id).await,
        }
    }
}

/// Build the connector for an account
///
/// Validates the platform-specific id is present before any network call.
pub fn connector_for(
    account: &SocialAccount,
    token: &str,
    config: &Config,
) -> Result<Connector> {
    match account.platform {
        Platform::Facebook => {
            let page_id = account
                .page_id
                .as_deref()
                .context("Facebook account has no page id")?;
            Ok(Connector::Facebook(facebook::FacebookClient::new(
                &config.graph_url(),
                token,
                page_id,
            )))
        }
        Platform::Instagram => {
            let business_account_id = account
                .business_account_id
                .as_deref()
                .context("Instagram account has no business account id")?;
            Ok(Connector::Instagram(instagram::InstagramClient::new(
                &config.graph_url(),
                token,
                business_account_id,
            )))
        }
        Platform::LinkedIn => Ok(Connector::LinkedIn(linkedin::LinkedInClient::new(
            &config.linkedin_base_url,
            token,
            account,
        ))),
        Platform::Threads => {
            let user_id = account
                .business_account_id
                .as_deref()
                .context("Threads account has no user id")?;
            Ok(Connector::Threads(threads::ThreadsClient::new(
                &config.threads_base_url,
                token,
                user_id,
            )))
        }
    }
}

/// Turn a failed response into an error carrying the platform's own message
///
/// Graph-family APIs wrap failures as `{"error":{"message":...}}`; LinkedIn
/// uses a top-level `message`. The platform message is passed through
/// verbatim so the caller can display it.
pub(crate) async fn api_error(platform: &str, response: reqwest::Response) -> anyhow::Error {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    #[derive(serde::Deserialize)]
    struct ErrorEnvelope {
        error: Option<ErrorBody>,
        message: Option<String>,
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.map(|b| b.message).or(e.message))
        .unwrap_or(body);

    anyhow::anyhow!("{platform} error {status}: {message}")
}
