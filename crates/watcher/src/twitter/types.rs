//! Post data types and classification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Platform-assigned post id.
///
/// X ids are 64-bit snowflakes transmitted as decimal strings. They order
/// numerically, which is not the same as lexical order (`"98" > "100"` as
/// strings), so the id is held as an integer and compared as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostId(u64);

impl PostId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Error returned when an id is not a decimal snowflake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid post id {0:?}: expected a decimal integer")]
pub struct InvalidPostId(pub String);

impl FromStr for PostId {
    type Err = InvalidPostId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| InvalidPostId(s.to_string()))
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for PostId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(Self(n)),
        }
    }
}

/// What kind of post this is relative to other posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    /// Stands on its own.
    Original,
    /// Answers another post.
    Reply,
    /// Re-shares another post verbatim.
    Retweet,
    /// Re-shares another post with commentary.
    Quote,
    /// Classification data was missing or unrecognized.
    Unknown,
}

impl PostKind {
    /// Only [`PostKind::Original`] counts; anything ambiguous does not.
    #[must_use]
    pub const fn is_original(self) -> bool {
        matches!(self, Self::Original)
    }
}

/// Raw reply/retweet/quote markers as reported by the platform.
///
/// `None` means the platform said nothing about that marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFlags {
    pub is_reply: Option<bool>,
    pub is_retweet: Option<bool>,
    pub is_quote: Option<bool>,
}

impl PostFlags {
    /// Flags for a post that references nothing.
    #[must_use]
    pub const fn original() -> Self {
        Self {
            is_reply: Some(false),
            is_retweet: Some(false),
            is_quote: Some(false),
        }
    }

    /// Classify the post.
    ///
    /// A set marker decides the kind (retweet over quote over reply). The post
    /// is original only when all three markers are present and false.
    #[must_use]
    pub fn classify(self) -> PostKind {
        match (self.is_retweet, self.is_quote, self.is_reply) {
            (Some(true), _, _) => PostKind::Retweet,
            (_, Some(true), _) => PostKind::Quote,
            (_, _, Some(true)) => PostKind::Reply,
            (Some(false), Some(false), Some(false)) => PostKind::Original,
            _ => PostKind::Unknown,
        }
    }
}

/// A post fetched from the watched account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Platform id.
    pub id: PostId,
    /// Handle of the account that published it (without @).
    pub author: String,
    /// When the post was published.
    pub created_at: DateTime<Utc>,
    /// Post text content.
    pub text: String,
    /// Classification.
    pub kind: PostKind,
}

impl Post {
    /// Create a new post.
    #[must_use]
    pub fn new(
        id: PostId,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
        text: impl Into<String>,
        kind: PostKind,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            created_at,
            text: text.into(),
            kind,
        }
    }

    /// Whether this post should ever produce a notification.
    #[must_use]
    pub const fn is_original(&self) -> bool {
        self.kind.is_original()
    }

    /// Public link to the post.
    #[must_use]
    pub fn permalink(&self) -> String {
        format!("https://x.com/{}/status/{}", self.author, self.id)
    }

    /// Turn the post into a chat notification.
    #[must_use]
    pub fn to_event(&self) -> notify::NotifyEvent {
        notify::NotifyEvent::NewPost {
            handle: self.author.clone(),
            post_id: self.id.to_string(),
            text: self.text.clone(),
            url: self.permalink(),
            posted_at: self.created_at,
        }
    }
}
