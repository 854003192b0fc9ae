//! Watch pipeline - runs one fetch-diff-notify-persist pass.

use std::sync::Arc;

use chrono::Utc;
use notify::{NotifyEvent, Notifier};

use crate::diff::diff;
use crate::error::WatchError;
use crate::state::StateStore;
use crate::twitter::{PostId, PostSource};

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute and log the outcome without sending or saving anything.
    pub dry_run: bool,
}

/// Result of a single run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of posts fetched.
    pub fetched: usize,
    /// Number of those that were original.
    pub originals: usize,
    /// Ids notified, in delivery order.
    pub delivered: Vec<PostId>,
    /// Whether this run initialized the marker.
    pub first_run: bool,
    /// Marker before the run.
    pub previous_marker: Option<PostId>,
    /// Marker after the run.
    pub marker: Option<PostId>,
    /// Whether the state file was written.
    pub state_saved: bool,
}

/// Watch pipeline orchestrator.
pub struct Watcher {
    handle: String,
    source: Arc<dyn PostSource>,
    notifier: Notifier,
    store: StateStore,
}

impl Watcher {
    /// Create a new watcher.
    #[must_use]
    pub fn new(
        handle: impl Into<String>,
        source: Arc<dyn PostSource>,
        notifier: Notifier,
        store: StateStore,
    ) -> Self {
        Self {
            handle: handle.into(),
            source,
            notifier,
            store,
        }
    }

    /// Run a single pass.
    ///
    /// The marker is written only after every notification went out. Any
    /// failure leaves the state file untouched so the next run retries.
    pub async fn run_once(&self, options: RunOptions) -> Result<RunSummary, WatchError> {
        tracing::info!(handle = %self.handle, dry_run = options.dry_run, "Starting run");

        let previous = self.store.load()?;
        tracing::debug!(
            last_seen_id = ?previous.last_seen_id.map(|id| id.to_string()),
            "Loaded state"
        );

        let posts = self.source.fetch_recent(&self.handle).await?;
        let originals = posts.iter().filter(|p| p.is_original()).count();
        tracing::info!(fetched = posts.len(), originals, "Fetched posts");

        let outcome = diff(&previous, &posts);
        let first_run = previous.is_uninitialized();

        let mut summary = RunSummary {
            fetched: posts.len(),
            originals,
            delivered: Vec::new(),
            first_run,
            previous_marker: previous.last_seen_id,
            marker: previous.last_seen_id,
            state_saved: false,
        };

        if first_run {
            tracing::info!(
                marker = ?outcome.next.last_seen_id.map(|id| id.to_string()),
                "First run: initializing marker without notifying"
            );
        }

        if options.dry_run {
            for post in &outcome.deliver {
                tracing::info!(id = %post.id, url = %post.permalink(), "Would notify");
            }
            summary.marker = outcome.next.last_seen_id;
            return Ok(summary);
        }

        if !outcome.deliver.is_empty() {
            let events: Vec<NotifyEvent> = outcome.deliver.iter().map(|p| p.to_event()).collect();
            let report = self.notifier.deliver_all(&events).await;

            if !report.is_complete() {
                for (id, e) in &report.failed {
                    tracing::error!(id = %id, error = %e, "Notification failed");
                }
                return Err(WatchError::Delivery {
                    failed: report.failed_ids(),
                    delivered: report.delivered,
                });
            }

            summary.delivered = outcome.deliver.iter().map(|p| p.id).collect();
        }

        if outcome.advances(&previous) {
            let mut next = outcome.next;
            next.updated_at = Some(Utc::now());
            self.store.save(&next)?;
            summary.marker = next.last_seen_id;
            summary.state_saved = true;
        } else {
            tracing::debug!("Marker unchanged, state not written");
        }

        tracing::info!(
            fetched = summary.fetched,
            originals = summary.originals,
            delivered = summary.delivered.len(),
            marker = ?summary.marker.map(|id| id.to_string()),
            state_saved = summary.state_saved,
            "Run complete"
        );

        Ok(summary)
    }
}
