//! X (Twitter) timeline access.
//!
//! Provides the post model, classification and the API v2 client.

mod client;
mod types;

use async_trait::async_trait;

use crate::error::FetchError;

pub use client::{XClient, XClientConfig, DEFAULT_API_BASE, DEFAULT_MAX_RESULTS};
pub use types::{InvalidPostId, Post, PostFlags, PostId, PostKind};

/// Source of recent posts for an account.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch the account's most recent posts, each classified.
    ///
    /// Order is not guaranteed; callers sort by id.
    async fn fetch_recent(&self, handle: &str) -> Result<Vec<Post>, FetchError>;
}
