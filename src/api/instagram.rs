//! Instagram Graph API client (business accounts via the Facebook Graph)

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{EngagementCounts, MediaFile};

use super::facebook::InsightsResponse;
use super::{PlatformConnector, api_error};

/// Instagram Graph API client for one business account
#[derive(Debug)]
pub struct InstagramClient {
    client: Client,
    /// Graph root including the version segment
    graph_url: String,
    access_token: String,
    business_account_id: String,
}

impl InstagramClient {
    /// Create a new Instagram client
    pub fn new(graph_url: &str, access_token: &str, business_account_id: &str) -> Self {
        Self {
            client: Client::new(),
            graph_url: graph_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            business_account_id: business_account_id.to_string(),
        }
    }

    /// Build an object URL
    fn object_url(&self, object: &str) -> String {
        format!("{}/{}", self.graph_url, object)
    }

    /// Create a media container and return its creation id
    async fn create_container(&self, params: &[(&str, &str)]) -> Result<String> {
        let url = self.object_url(&format!("{}/media", self.business_account_id));

        let response = self
            .client
            .post(&url)
            .form(params)
            .send()
            .await
            .context("Failed to create media container")?;

        if !response.status().is_success() {
            return Err(api_error("Instagram", response).await);
        }

        let container: ObjectIdResponse = response
            .json()
            .await
            .context("Failed to parse container response")?;

        Ok(container.id)
    }

    /// Publish a finished container
    async fn publish_container(&self, creation_id: &str) -> Result<String> {
        let url = self.object_url(&format!("{}/media_publish", self.business_account_id));

        let response = self
            .client
            .post(&url)
            .form(&[
                ("creation_id", creation_id),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .context("Failed to publish media container")?;

        if !response.status().is_success() {
            return Err(api_error("Instagram", response).await);
        }

        let published: ObjectIdResponse = response
            .json()
            .await
            .context("Failed to parse publish response")?;

        Ok(published.id)
    }
}

impl PlatformConnector for InstagramClient {
    async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}?fields=id,username&access_token={}",
            self.object_url(&self.business_account_id),
            urlencoding::encode(&self.access_token)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the Graph API")?;

        Ok(response.status().is_success())
    }

    async fn publish(&self, content: &str, media: &[MediaFile]) -> Result<String> {
        // The container endpoints take hosted URLs, not uploads
        if media.is_empty() {
            bail!("Instagram requires at least one image");
        }
        if let Some(local) = media.iter().find(|m| !m.is_hosted()) {
            bail!(
                "Instagram requires hosted image URLs; '{}' is a local file",
                local.path
            );
        }

        let creation_id = if media.len() == 1 {
            self.create_container(&[
                ("image_url", media[0].path.as_str()),
                ("caption", content),
                ("access_token", self.access_token.as_str()),
            ])
            .await?
        } else {
            // Carousel: one child container per image, then the carousel itself
            let mut children = Vec::new();
            for item in media {
                let child = self
                    .create_container(&[
                        ("image_url", item.path.as_str()),
                        ("is_carousel_item", "true"),
                        ("access_token", self.access_token.as_str()),
                    ])
                    .await?;
                children.push(child);
            }

            let children_list = children.join(",");
            self.create_container(&[
                ("media_type", "CAROUSEL"),
                ("children", children_list.as_str()),
                ("caption", content),
                ("access_token", self.access_token.as_str()),
            ])
            .await?
        };

        self.publish_container(&creation_id).await
    }

    async fn fetch_metrics(&self, platform_post_id: &str) -> Result<EngagementCounts> {
        let url = format!(
            "{}/insights?metric=reach,impressions,likes,comments,shares&access_token={}",
            self.object_url(platform_post_id),
            urlencoding::encode(&self.access_token)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch media insights")?;

        if !response.status().is_success() {
            return Err(api_error("Instagram", response).await);
        }

        let insights: InsightsResponse = response
            .json()
            .await
            .context("Failed to parse insights response")?;

        let mut counts = EngagementCounts::default();
        for metric in insights.data {
            let value = metric.latest_value();
            match metric.name.as_str() {
                "reach" => counts.reach = value,
                "impressions" => counts.impressions = value,
                "likes" => counts.likes = value,
                "comments" => counts.comments = value,
                "shares" => counts.shares = value,
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
