//! Chat notifications for newly published posts.
//!
//! This crate delivers one chat message per new post, in the order the
//! caller hands them over, and reports exactly which messages made it.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use notify::{Notifier, NotifyChannel, NotifyEvent, TelegramChannel};
//!
//! # async fn run() -> Result<(), notify::ChannelError> {
//! let telegram = TelegramChannel::new("123:bot-token", "-1001", Duration::from_secs(30))?;
//! let notifier = Notifier::with_channels(vec![Arc::new(telegram) as Arc<dyn NotifyChannel>]);
//!
//! let report = notifier
//!     .deliver_all(&[NotifyEvent::NewPost {
//!         handle: "rustlang".to_string(),
//!         post_id: "105".to_string(),
//!         text: "Rust 1.90 is out".to_string(),
//!         url: "https://x.com/rustlang/status/105".to_string(),
//!         posted_at: chrono::Utc::now(),
//!     }])
//!     .await;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`TelegramChannel`] implements the Telegram Bot API `sendMessage` call
//! - [`Notifier`] delivers events to every configured channel, one at a time

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::telegram::TelegramChannel;
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::NotifyEvent;

use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outcome of delivering a batch of events.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Ids of events every channel accepted, in delivery order.
    pub delivered: Vec<String>,
    /// Ids of events that at least one channel rejected, with the error.
    pub failed: Vec<(String, ChannelError)>,
}

impl DeliveryReport {
    /// True when no event failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Ids of failed events.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<String> {
        self.failed.iter().map(|(id, _)| id.clone()).collect()
    }
}

/// Central notification dispatcher.
///
/// Events are sent strictly in sequence. A failure on one event is logged and
/// recorded, and delivery carries on with the next one.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
}

impl Notifier {
    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self { channels }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        self.channels.iter().any(|c| c.enabled())
    }

    /// Get the number of configured channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Send one event to every enabled channel.
    ///
    /// Fails with the first channel error; later channels are still tried.
    pub async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        if !self.has_channels() {
            return Err(ChannelError::NotConfigured(
                "no notification channel enabled".to_string(),
            ));
        }

        let mut first_error = None;

        for channel in self.channels.iter().filter(|c| c.enabled()) {
            let channel_name = channel.name();
            match channel.send(event).await {
                Ok(()) => {
                    debug!(channel = channel_name, post_id = event.id(), "Notification sent");
                }
                Err(e) => {
                    error!(
                        channel = channel_name,
                        post_id = event.id(),
                        error = %e,
                        "Failed to send notification"
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Deliver a batch of events in order, continuing past failures.
    pub async fn deliver_all(&self, events: &[NotifyEvent]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for event in events {
            match self.send(event).await {
                Ok(()) => report.delivered.push(event.id().to_string()),
                Err(e) => report.failed.push((event.id().to_string(), e)),
            }
        }

        if report.is_complete() {
            debug!(delivered = report.delivered.len(), "Batch delivered");
        } else {
            warn!(
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "Batch delivery incomplete"
            );
        }

        report
    }
}
