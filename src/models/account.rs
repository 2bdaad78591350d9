//! Social account model for stored platform connections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Platform;

/// A connected social platform account
///
/// Access and refresh tokens are never stored on this record; they live in
/// the encrypted credential store, keyed by [`SocialAccount::credential_key`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    /// Unique identifier
    pub id: Uuid,
    /// Which platform this account posts to
    pub platform: Platform,
    /// Display name (for UI)
    pub display_name: String,
    /// Whether this is the active posting account for its platform
    pub is_active: bool,
    /// Facebook page id (Facebook accounts)
    pub page_id: Option<String>,
    /// Instagram business account id, or Threads user id
    pub business_account_id: Option<String>,
    /// LinkedIn organization id (organization pages; absent for member posting)
    pub organization_id: Option<String>,
    /// When the account was connected
    pub created_at: DateTime<Utc>,
    /// Last used timestamp
    pub last_used_at: Option<DateTime<Utc>>,
}

impl SocialAccount {
    /// Create a new account for a platform
    pub fn new(platform: Platform, display_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform,
            display_name: display_name.to_string(),
            is_active: false,
            page_id: None,
            business_account_id: None,
            organization_id: None,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    /// Create a new Facebook page account
    pub fn new_facebook(display_name: &str, page_id: &str) -> Self {
        let mut account = Self::new(Platform::Facebook, display_name);
        account.page_id = Some(page_id.to_string());
        account
    }

    /// Create a new Instagram business account
    pub fn new_instagram(display_name: &str, business_account_id: &str) -> Self {
        let mut account = Self::new(Platform::Instagram, display_name);
        account.business_account_id = Some(business_account_id.to_string());
        account
    }

    /// Create a new LinkedIn account (member posting when `organization_id` is None)
    pub fn new_linkedin(display_name: &str, organization_id: Option<&str>) -> Self {
        let mut account = Self::new(Platform::LinkedIn, display_name);
        account.organization_id = organization_id.map(String::from);
        account
    }

    /// Create a new Threads account
    pub fn new_threads(display_name: &str, threads_user_id: &str) -> Self {
        let mut account = Self::new(Platform::Threads, display_name);
        account.business_account_id = Some(threads_user_id.to_string());
        account
    }

    /// LinkedIn `author` URN for UGC posts
    ///
    /// Organization pages post as `urn:li:organization:{id}`; everything else
    /// falls back to the member form using this account's id.
    pub fn author_urn(&self) -> String {
        match &self.organization_id {
            Some(org) => format!("urn:li:organization:{org}"),
            None => format!("urn:li:person:{}", self.id),
        }
    }

    /// Get the key for storing credentials in the encrypted store
    pub fn credential_key(&self) -> String {
        format!("rookery:{}:{}", self.platform.as_str(), self.id)
    }

    /// Get the key for the optional refresh token
    pub fn refresh_credential_key(&self) -> String {
        format!("{}:refresh", self.credential_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_urn_organization() {
        let account = SocialAccount::new_linkedin("Acme Corp", Some("7654321"));
        assert_eq!(account.author_urn(), "urn:li:organization:7654321");
    }

    #[test]
    fn test_author_urn_person_fallback() {
        let account = SocialAccount::new_linkedin("Jordan", None);
        assert_eq!(account.author_urn(), format!("urn:li:person:{}", account.id));
    }

    #[test]
    fn test_credential_key_includes_platform() {
        let account = SocialAccount::new_facebook("Page", "123");
        assert!(account.credential_key().starts_with("rookery:facebook:"));
    }
}
