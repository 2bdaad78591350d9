//! Facebook Graph API client

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{EngagementCounts, MediaFile, MediaKind};

use super::{PlatformConnector, api_error};

/// Facebook Graph API client for one page
#[derive(Debug)]
pub struct FacebookClient {
    client: Client,
    /// Graph root including the version segment, e.g. `https://graph.facebook.com/v18.0`
    graph_url: String,
    access_token: String,
    page_id: String,
}

impl FacebookClient {
    /// Create a new Facebook client
    pub fn new(graph_url: &str, access_token: &str, page_id: &str) -> Self {
        Self {
            client: Client::new(),
            graph_url: graph_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            page_id: page_id.to_string(),
        }
    }

    /// Build an object URL
    fn object_url(&self, object: &str) -> String {
        format!("{}/{}", self.graph_url, object)
    }

    /// Upload one photo unpublished, returning its media fbid
    async fn upload_photo(&self, media: &MediaFile) -> Result<String> {
        // The photos edge takes images only
        if media.kind() != MediaKind::Image {
            anyhow::bail!(
                "Facebook photo uploads support images only; '{}' is {}",
                media.path,
                media.mime_type
            );
        }

        let url = self.object_url(&format!("{}/photos", self.page_id));

        let response = if media.is_hosted() {
            self.client
                .post(&url)
                .form(&[
                    ("url", media.path.as_str()),
                    ("published", "false"),
                    ("access_token", self.access_token.as_str()),
                ])
                .send()
                .await
                .context("Failed to upload photo")?
        } else {
            let bytes = tokio::fs::read(&media.path)
                .await
                .with_context(|| format!("Failed to read media file {}", media.path))?;

            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(media.file_name().to_string())
                .mime_str(&media.mime_type)
                .context("Invalid media mime type")?;

            let form = reqwest::multipart::Form::new()
                .part("source", part)
                .text("published", "false")
                .text("access_token", self.access_token.clone());

            self.client
                .post(&url)
                .multipart(form)
                .send()
                .await
                .context("Failed to upload photo")?
        };

        if !response.status().is_success() {
            return Err(api_error("Facebook", response).await);
        }

        let photo: ObjectIdResponse = response
            .json()
            .await
            .context("Failed to parse photo upload response")?;

        Ok(photo.id)
    }
}

impl PlatformConnector for FacebookClient {
    async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}?fields=id,name&access_token={}",
            self.object_url(&self.page_id),
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
        let url = self.object_url(&format!("{}/feed", self.page_id));

        let mut params: Vec<(String, String)> = vec![
            ("message".to_string(), content.to_string()),
            ("access_token".to_string(), self.access_token.clone()),
        ];

        // Photos attach to a feed post by fbid after an unpublished upload
        for (i, item) in media.iter().enumerate() {
            let fbid = self.upload_photo(item).await?;
            params.push((
                format!("attached_media[{i}]"),
                format!(r#"{{"media_fbid":"{fbid}"}}"#),
            ));
        }

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .context("Failed to publish to Facebook")?;

        if !response.status().is_success() {
            return Err(api_error("Facebook", response).await);
        }

        let post: ObjectIdResponse = response
            .json()
            .await
            .context("Failed to parse publish response")?;

        Ok(post.id)
    }

    async fn fetch_metrics(&self, platform_post_id: &str) -> Result<EngagementCounts> {
        let url = format!(
            "{}?fields=likes.summary(true),comments.summary(true),shares&access_token={}",
            self.object_url(platform_post_id),
            urlencoding::encode(&self.access_token)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch post engagement")?;

        if !response.status().is_success() {
            return Err(api_error("Facebook", response).await);
        }

        let engagement: PostEngagementResponse = response
            .json()
            .await
            .context("Failed to parse engagement response")?;

        let mut counts = EngagementCounts {
            likes: engagement.likes.map_or(0, |l| l.summary.total_count),
            comments: engagement.comments.map_or(0, |c| c.summary.total_count),
            shares: engagement.shares.map_or(0, |s| s.count),
            ..Default::default()
        };

        // Reach/impressions/clicks come from the insights edge
        let insights_url = format!(
            "{}/insights?metric=post_impressions,post_impressions_unique,post_clicks&access_token={}",
            self.object_url(platform_post_id),
            urlencoding::encode(&self.access_token)
        );

        let response = self
            .client
            .get(&insights_url)
            .send()
            .await
            .context("Failed to fetch post insights")?;

        if !response.status().is_success() {
            return Err(api_error("Facebook", response).await);
        }

        let insights: InsightsResponse = response
            .json()
            .await
            .context("Failed to parse insights response")?;

        for metric in insights.data {
            let value = metric.latest_value();
            match metric.name.as_str() {
                "post_impressions" => counts.impressions = value,
                "post_impressions_unique" => counts.reach = value,
                "post_clicks" => counts.clicks = value,
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

#[derive(Debug, Deserialize)]
struct PostEngagementResponse {
    likes: Option<SummaryEdge>,
    comments: Option<SummaryEdge>,
    shares: Option<ShareCount>,
}

#[derive(Debug, Deserialize)]
struct SummaryEdge {
    summary: EdgeSummary,
}

#[derive(Debug, Deserialize)]
struct EdgeSummary {
    total_count: u32,
}

#[derive(Debug, Deserialize)]
struct ShareCount {
    count: u32,
}

/// Graph insights payload shared by the Meta platforms
#[derive(Debug, Deserialize)]
pub(crate) struct InsightsResponse {
    pub(crate) data: Vec<InsightMetric>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightMetric {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) values: Vec<InsightValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightValue {
    #[serde(default)]
    pub(crate) value: u32,
}

impl InsightMetric {
    /// Most recent value for the metric (0 when the platform sent none)
    pub(crate) fn latest_value(&self) -> u32 {
        self.values.last().map_or(0, |v| v.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_connection_valid_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/123")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("fields".into(), "id,name".into()),
                Matcher::UrlEncoded("access_token".into(), "good-token".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id":"123","name":"Test Page"}"#)
            .create_async()
            .await;

        let client = FacebookClient::new(&server.url(), "good-token", "123");
        assert!(client.test_connection().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_invalid_token_is_false_not_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/123")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"message":"Invalid token","code":190}}"#)
            .create_async()
            .await;

        let client = FacebookClient::new(&server.url(), "bad-token", "123");
        assert!(!client.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_publish_text_post() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/123/feed")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("message".into(), "Hello page".into()),
                Matcher::UrlEncoded("access_token".into(), "token".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id":"123_456"}"#)
            .create_async()
            .await;

        let client = FacebookClient::new(&server.url(), "token", "123");
        let post_id = client.publish("Hello page", &[]).await.unwrap();

        assert_eq!(post_id, "123_456");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_publish_surfaces_platform_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/123/feed")
            .with_status(403)
            .with_body(r#"{"error":{"message":"(#200) Requires pages_manage_posts permission","code":200}}"#)
            .create_async()
            .await;

        let client = FacebookClient::new(&server.url(), "token", "123");
        let err = client.publish("Hello", &[]).await.unwrap_err();

        assert!(err.to_string().contains("Requires pages_manage_posts permission"));
    }

    #[tokio::test]
    async fn test_fetch_metrics() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/123_456")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"likes":{"summary":{"total_count":12}},
                    "comments":{"summary":{"total_count":3}},
                    "shares":{"count":4}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/123_456/insights")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"data":[
                    {"name":"post_impressions","values":[{"value":500}]},
                    {"name":"post_impressions_unique","values":[{"value":350}]},
                    {"name":"post_clicks","values":[{"value":20}]}]}"#,
            )
            .create_async()
            .await;

        let client = FacebookClient::new(&server.url(), "token", "123");
        let counts = client.fetch_metrics("123_456").await.unwrap();

        assert_eq!(counts.likes, 12);
        assert_eq!(counts.comments, 3);
        assert_eq!(counts.shares, 4);
        assert_eq!(counts.impressions, 500);
        assert_eq!(counts.reach, 350);
        assert_eq!(counts.clicks, 20);
    }
}
