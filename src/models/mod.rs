//! Data models for Rookery

mod account;
mod analytics;
mod category;
mod media;
mod platform;
mod post;

pub use account::SocialAccount;
pub use analytics::{EngagementCounts, MetricsSnapshot};
pub use category::Category;
pub use media::{MediaFile, MediaKind};
pub use platform::Platform;
pub use post::{EngagementSnapshot, Post, PostStatus};
