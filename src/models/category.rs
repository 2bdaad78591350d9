//! Category model for post organization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-defined category for grouping posts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: Uuid,
    /// Category name
    pub name: String,
    /// Display color (hex, e.g. "#6364FF")
    pub color: String,
    /// Optional description
    pub description: Option<String>,
    /// When this was created
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new category with a description
    pub fn with_description(name: &str, color: &str, description: &str) -> Self {
        let mut category = Self::new(name, color);
        category.description = Some(description.to_string());
        category
    }
}
