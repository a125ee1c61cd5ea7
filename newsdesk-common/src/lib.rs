//! # Newsdesk Common Library
//!
//! Shared code for the newsdesk service crates:
//! - Error type and result alias
//! - Configuration resolution (CLI → ENV → TOML → defaults)
//! - Database initialization and schema
//! - Domain models (users, articles, comments, notifications, sources)
//! - Live-update hub and SSE rendering for open article sessions

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::{ArticleEvent, ArticleHub, ArticleSubscription};
