//! Notification event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events that can trigger notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// A watched account published a new original post
    NewPost {
        /// Account handle, without the leading `@`.
        handle: String,
        /// Platform id of the post.
        post_id: String,
        /// Post text as published.
        text: String,
        /// Permalink to the post.
        url: String,
        posted_at: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Get a short title for this event type.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::NewPost { handle, .. } => format!("New post from @{handle}"),
        }
    }

    /// Identifier used when reporting delivery results.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::NewPost { post_id, .. } => post_id,
        }
    }

    /// Get the permalink for this event.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::NewPost { url, .. } => url,
        }
    }

    /// Render the event as a plain-text chat message.
    ///
    /// The message is the title, the post text and the permalink, separated
    /// by blank lines.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::NewPost { text, url, .. } => {
                format!("{}\n\n{}\n\n{url}", self.title(), text.trim())
            }
        }
    }
}
