//! Platform type definitions

use serde::{Deserialize, Serialize};

/// Supported social platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Facebook (Graph API pages)
    #[default]
    Facebook,
    /// Instagram (Graph API business accounts)
    Instagram,
    /// LinkedIn (member or organization pages)
    LinkedIn,
    /// Threads (Meta Threads API)
    Threads,
}

impl Platform {
    /// Get all supported platforms
    pub const fn all() -> &'static [Self] {
        &[Self::Facebook, Self::Instagram, Self::LinkedIn, Self::Threads]
    }

    /// Get the display name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::LinkedIn => "LinkedIn",
            Self::Threads => "Threads",
        }
    }

    /// Get the emoji icon
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Facebook => "📘",
            Self::Instagram => "📸",
            Self::LinkedIn => "💼",
            Self::Threads => "🧵",
        }
    }

    /// Lowercase key used in database columns and config files
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::LinkedIn => "linkedin",
            Self::Threads => "threads",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "facebook" | "fb" => Some(Self::Facebook),
            "instagram" | "ig" | "insta" => Some(Self::Instagram),
            "linkedin" | "li" => Some(Self::LinkedIn),
            "threads" => Some(Self::Threads),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_aliases() {
        assert_eq!(Platform::from_str("fb"), Some(Platform::Facebook));
        assert_eq!(Platform::from_str("IG"), Some(Platform::Instagram));
        assert_eq!(Platform::from_str("LinkedIn"), Some(Platform::LinkedIn));
        assert_eq!(Platform::from_str("threads"), Some(Platform::Threads));
        assert_eq!(Platform::from_str("myspace"), None);
    }

    #[test]
    fn test_as_str_round_trip() {
        for platform in Platform::all() {
            assert_eq!(Platform::from_str(platform.as_str()), Some(*platform));
        }
    }
}
