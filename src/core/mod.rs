//! Core types and functionality for specboard.
//!
//! This module contains the fundamental data structures used throughout
//! the application: cards, configuration, and retry policy.

mod card;
mod config;
mod retry;

pub use card::{count_by_category, truncate_chars, Card, Category, PriorItem, PRIOR_SNIPPET_CHARS};
pub use config::{
    load_env_file, ConfigError, GitHubSettings, LabelSettings, ModelSettings, Settings,
    DEFAULT_STATUS_VALUE, REQUIRED_VARS,
};
pub use retry::{retry_async_if, RetryConfig, RetryResult};
