//! Watcher crate for forwarding new X posts to Telegram.
//!
//! This crate provides:
//! - An X API v2 timeline client with reply/retweet/quote classification
//! - A pure diff of fetched posts against the last-seen marker
//! - An atomically written JSON state file
//! - A single-pass pipeline that persists only after full delivery

pub mod config;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod twitter;

// Re-export main types
pub use config::{Secrets, WatchConfig};
pub use diff::{diff, DiffOutcome};
pub use error::{FetchError, StateError, WatchError};
pub use pipeline::{RunOptions, RunSummary, Watcher};
pub use state::{StateRecord, StateStore};
pub use twitter::{Post, PostId, PostKind, PostSource, XClient};
