//! # Rookery 🐦‍⬛
//!
//! A terminal social media manager for Facebook, Instagram, LinkedIn, and Threads.
//!
//! ## Overview
//!
//! Rookery lets you compose, schedule, and publish posts across four
//! platforms and pull engagement metrics back into one place. Every
//! organization is its own tenant with its own database file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          CLI                                │
//! │   Parses commands and wires config, tokens, and databases   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Manager     │ │    Schedule     │ │    Insights     │
//! │                 │ │                 │ │                 │
//! │ • Dispatch      │ │ • Parse times   │ │ • Fetch metrics │
//! │ • Normalize     │ │ • Due sweep     │ │ • Snapshots     │
//! │ • Outcomes      │ │ • Poll loop     │ │ • Rollups       │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │                   │
//!          └───────────────────┴───────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │       API       │ │    Database     │ │      Auth       │
//! │                 │ │                 │ │                 │
//! │ • Facebook      │ │ • Per-org files │ │ • AES-GCM file  │
//! │ • Instagram     │ │ • Bounded cache │ │ • Token source  │
//! │ • LinkedIn      │ │ • Migrations    │ │ • Injection     │
//! │ • Threads       │ │ • CRUD          │ │                 │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Platform API clients (Facebook, Instagram, LinkedIn, Threads)
//! - [`auth`] — Encrypted token storage and the injectable token source
//! - [`config`] — Configuration management
//! - [`db`] — `SQLite` databases, one per organization, behind a bounded cache
//! - [`demo`] — Fixture data in a dedicated demo organization
//! - [`insights`] — Engagement metrics collection and rollups
//! - [`manager`] — Publish dispatch and outcome normalization
//! - [`models`] — Data models (Post, `SocialAccount`, Platform, ...)
//! - [`schedule`] — Schedule-time parsing and the due-post loop
//!
//! ## Features
//!
//! - **Four platforms** — Facebook, Instagram, LinkedIn, and Threads in one tool
//! - **Scheduling** — Queue posts with natural schedule times ("in 2h", "3pm")
//! - **Analytics** — Append-only engagement snapshots per post
//! - **Multi-tenant** — One database file per organization, capped open handles
//! - **Secure** — Tokens stored in an encrypted credentials file

#![doc(html_root_url = "https://docs.rs/rookery/0.2.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod demo;
pub mod insights;
pub mod manager;
pub mod models;
pub mod paths;
pub mod schedule;

// Re-export main types for convenience
pub use config::Config;
pub use db::{ConnectionCache, Database};
pub use manager::{PublishOutcome, SocialMediaManager};
pub use models::{Platform, Post, PostStatus, SocialAccount};

/// ASCII logo for the application
pub const LOGO: &str = r"
   ___            __
  / _ \___  ___  / /_____ ______ __
 / , _/ _ \/ _ \/  '_/ -_) __/ // /
/_/|_|\___/\___/_/\_\\__/_/  \_, /
                            /___/
";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Repository URL
pub const REPO_URL: &str = "https://github.com/rookery-app/rookery";
