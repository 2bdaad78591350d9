//! LinkedIn REST API client (UGC posts)

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::{EngagementCounts, MediaFile, SocialAccount};

use super::{PlatformConnector, api_error};

/// Restli protocol version header required on every v2 call
const RESTLI_VERSION: &str = "2.0.0";

/// LinkedIn REST API client for one member or organization
#[derive(Debug)]
pub struct LinkedInClient {
    client: Client,
    base_url: String,
    access_token: String,
    author_urn: String,
    organization_id: Option<String>,
}

impl LinkedInClient {
    /// Create a new LinkedIn client for an account
    pub fn new(base_url: &str, access_token: &str, account: &SocialAccount) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            author_urn: account.author_urn(),
            organization_id: account.organization_id.clone(),
        }
    }

    /// Build a v2 API URL
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/v2{}", self.base_url, endpoint)
    }

    /// The `author` URN this client posts as
    pub fn author_urn(&self) -> &str {
        &self.author_urn
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
    }
}

impl PlatformConnector for LinkedInClient {
    async fn test_connection(&self) -> Result<bool> {
        // Organization pages validate against the org lookup, members against /me
        let url = match &self.organization_id {
            Some(org) => self.api_url(&format!("/organizations/{org}")),
            None => self.api_url("/me"),
        };

        let response = self
            .get(&url)
            .send()
            .await
            .context("Failed to reach the LinkedIn API")?;

        Ok(response.status().is_success())
    }

    async fn publish(&self, content: &str, media: &[MediaFile]) -> Result<String> {
        let url = self.api_url("/ugcPosts");

        // Hosted links ride along as ARTICLE media; binary uploads would need
        // the assets API, which local files cannot reach from here
        let hosted: Vec<&MediaFile> = media.iter().filter(|m| m.is_hosted()).collect();
        if hosted.len() < media.len() {
            tracing::warn!(
                "LinkedIn posts attach hosted URLs only; skipping local media files"
            );
        }

        let share_media: Vec<ShareMedia> = hosted
            .iter()
            .map(|m| ShareMedia {
                status: "READY".to_string(),
                original_url: m.path.clone(),
            })
            .collect();

        let request = UgcPostRequest {
            author: self.author_urn.clone(),
            lifecycle_state: "PUBLISHED".to_string(),
            specific_content: SpecificContent {
                share_content: ShareContent {
                    share_commentary: Text {
                        text: content.to_string(),
                    },
                    share_media_category: if share_media.is_empty() {
                        "NONE".to_string()
                    } else {
                        "ARTICLE".to_string()
                    },
                    media: share_media,
                },
            },
            visibility: Visibility {
                member_network_visibility: "PUBLIC".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to publish to LinkedIn")?;

        if !response.status().is_success() {
            return Err(api_error("LinkedIn", response).await);
        }

        // The created URN arrives in the x-restli-id header, with the body id
        // as fallback
        if let Some(id) = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
        {
            return Ok(id.to_string());
        }

        let created: UgcPostResponse = response
            .json()
            .await
            .context("Failed to parse ugcPosts response")?;

        Ok(created.id)
    }

    async fn fetch_metrics(&self, platform_post_id: &str) -> Result<EngagementCounts> {
        let url = self.api_url(&format!(
            "/socialActions/{}",
            urlencoding::encode(platform_post_id)
        ));

        let response = self
            .get(&url)
            .send()
            .await
            .context("Failed to fetch social actions")?;

        if !response.status().is_success() {
            return Err(api_error("LinkedIn", response).await);
        }

        let actions: SocialActionsResponse = response
            .json()
            .await
            .context("Failed to parse social actions response")?;

        // LinkedIn exposes likes and comments here; reach needs the
        // organization analytics products and stays zero
        Ok(EngagementCounts {
            likes: actions.likes_summary.map_or(0, |l| l.total_likes),
            comments: actions
                .comments_summary
                .map_or(0, |c| c.aggregated_total_comments),
            ..Default::default()
        })
    }
}

// ==================== API Types ====================

#[derive(Debug, Serialize)]
struct UgcPostRequest {
    author: String,
    #[serde(rename = "lifecycleState")]
    lifecycle_state: String,
    #[serde(rename = "specificContent")]
    specific_content: SpecificContent,
    visibility: Visibility,
}

#[derive(Debug, Serialize)]
struct SpecificContent {
    #[serde(rename = "com.linkedin.ugc.ShareContent")]
    share_content: ShareContent,
}

#[derive(Debug, Serialize)]
struct ShareContent {
    #[serde(rename = "shareCommentary")]
    share_commentary: Text,
    #[serde(rename = "shareMediaCategory")]
    share_media_category: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media: Vec<ShareMedia>,
}

#[derive(Debug, Serialize)]
struct ShareMedia {
    status: String,
    #[serde(rename = "originalUrl")]
    original_url: String,
}

#[derive(Debug, Serialize)]
struct Text {
    text: String,
}

#[derive(Debug, Serialize)]
struct Visibility {
    #[serde(rename = "com.linkedin.ugc.MemberNetworkVisibility")]
    member_network_visibility: String,
}

#[derive(Debug, Deserialize)]
struct UgcPostResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SocialActionsResponse {
    #[serde(rename = "likesSummary")]
    likes_summary: Option<LikesSummary>,
    #[serde(rename = "commentsSummary")]
    comments_summary: Option<CommentsSummary>,
}

#[derive(Debug, Deserialize)]
struct LikesSummary {
    #[serde(rename = "totalLikes")]
    total_likes: u32,
}

#[derive(Debug, Deserialize)]
struct CommentsSummary {
    #[serde(rename = "aggregatedTotalComments")]
    aggregated_total_comments: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_publish_as_organization_uses_org_urn() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/ugcPosts")
            .match_header("X-Restli-Protocol-Version", "2.0.0")
            .match_header("Authorization", "Bearer bearer-token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "author": "urn:li:organization:7654321",
                "lifecycleState": "PUBLISHED"
            })))
            .with_status(201)
            .with_header("x-restli-id", "urn:li:share:42")
            .create_async()
            .await;

        let account = SocialAccount::new_linkedin("Acme", Some("7654321"));
        let client = LinkedInClient::new(&server.url(), "bearer-token", &account);
        let post_id = client.publish("We are hiring", &[]).await.unwrap();

        assert_eq!(post_id, "urn:li:share:42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_publish_as_member_uses_person_urn() {
        let mut server = mockito::Server::new_async().await;
        let account = SocialAccount::new_linkedin("Jordan", None);
        let expected_urn = format!("urn:li:person:{}", account.id);

        let mock = server
            .mock("POST", "/v2/ugcPosts")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "author": expected_urn.clone()
            })))
            .with_status(201)
            .with_header("x-restli-id", "urn:li:share:43")
            .create_async()
            .await;

        let client = LinkedInClient::new(&server.url(), "bearer-token", &account);
        client.publish("First post", &[]).await.unwrap();

        assert_eq!(client.author_urn(), expected_urn);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_checks_org_lookup() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/organizations/7654321")
            .with_status(200)
            .with_body(r#"{"id":7654321}"#)
            .create_async()
            .await;

        let account = SocialAccount::new_linkedin("Acme", Some("7654321"));
        let client = LinkedInClient::new(&server.url(), "bearer-token", &account);
        assert!(client.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_is_false_not_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/me")
            .with_status(401)
            .with_body(r#"{"message":"Expired access token","serviceErrorCode":65601,"status":401}"#)
            .create_async()
            .await;

        let account = SocialAccount::new_linkedin("Jordan", None);
        let client = LinkedInClient::new(&server.url(), "stale", &account);
        assert!(!client.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_metrics_reads_social_actions() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/socialActions/urn%3Ali%3Ashare%3A42")
            .with_status(200)
            .with_body(
                r#"{"likesSummary":{"totalLikes":8},
                    "commentsSummary":{"aggregatedTotalComments":2}}"#,
            )
            .create_async()
            .await;

        let account = SocialAccount::new_linkedin("Acme", Some("7654321"));
        let client = LinkedInClient::new(&server.url(), "bearer-token", &account);
        let counts = client.fetch_metrics("urn:li:share:42").await.unwrap();

        assert_eq!(counts.likes, 8);
        assert_eq!(counts.comments, 2);
        assert_eq!(counts.reach, 0);
    }
}
