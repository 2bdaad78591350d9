//! Threads API client (Meta Threads Graph)

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{EngagementCounts, MediaFile};

use super::facebook::InsightsResponse;
use super::{PlatformConnector, api_error};

/// Threads Graph API client for one user
#[derive(Debug)]
pub struct ThreadsClient {
    client: Client,
    base_url: String,
    access_token: String,
    user_id: String,
}

impl ThreadsClient {
    /// Create a new Threads client
    pub fn new(base_url: &str, access_token: &str, user_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Build an object URL
    fn object_url(&self, object: &str) -> String {
        format!("{}/{}", self.base_url, object)
    }
}

impl PlatformConnector for ThreadsClient {
    async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}?fields=id,username&access_token={}",
            self.object_url(&self.user_id),
            urlencoding::encode(&self.access_token)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the Threads API")?;

        Ok(response.status().is_success())
    }

    async fn publish(&self, content: &str, media: &[MediaFile]) -> Result<String> {
        // Step 1: create the thread container
        let url = self.object_url(&format!("{}/threads", self.user_id));

        let image_url = match media.first() {
            Some(first) if !first.is_hosted() => {
                bail!(
                    "Threads requires hosted image URLs; '{}' is a local file",
                    first.path
                );
            }
            Some(first) => Some(first.path.clone()),
            None => None,
        };

        let mut params: Vec<(&str, &str)> = vec![
            ("text", content),
            ("access_token", self.access_token.as_str()),
        ];
        match &image_url {
            Some(url) => {
                params.push(("media_type", "IMAGE"));
                params.push(("image_url", url));
            }
            None => params.push(("media_type", "TEXT")),
        }

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .context("Failed to create thread container")?;

        if !response.status().is_success() {
            return Err(api_error("Threads", response).await);
        }

        let container: ObjectIdResponse = response
            .json()
            .await
            .context("Failed to parse container response")?;

        // Step 2: publish it
        let publish_url = self.object_url(&format!("{}/threads_publish", self.user_id));

        let response = self
            .client
            .post(&publish_url)
            .form(&[
                ("creation_id", container.id.as_str()),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .context("Failed to publish thread")?;

        if !response.status().is_success() {
            return Err(api_error("Threads", response).await);
        }

        let published: ObjectIdResponse = response
            .json()
            .await
            .context("Failed to parse publish response")?;

        Ok(published.id)
    }

    async fn fetch_metrics(&self, platform_post_id: &str) -> Result<EngagementCounts> {
        let url = format!(
            "{}/insights?metric=views,likes,replies,reposts&access_token={}",
            self.object_url(platform_post_id),
            urlencoding::encode(&self.access_token)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch thread insights")?;

        if !response.status().is_success() {
            return Err(api_error("Threads", response).await);
        }

        let insights: InsightsResponse = response
            .json()
            .await
            .context("Failed to parse insights response")?;

        let mut counts = EngagementCounts::default();
        for metric in insights.data {
            let value = metric.latest_value();
            match metric.name.as_str() {
                "views" => counts.impressions = value,
                "likes" => counts.likes = value,
                "replies" => counts.comments = value,
                "reposts" => counts.shares = value,
                _ => {}
            }
        }

        Ok(counts)
    }
}

// ==================== API Types ====================

#[derive(Debug, Deserialize)]
struct ObjectIdResponse {
    id: String,
}
