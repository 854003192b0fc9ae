//! X API v2 client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::error::FetchError;

use super::types::{Post, PostFlags, PostId};
use super::PostSource;

/// Public API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Posts requested per fetch.
pub const DEFAULT_MAX_RESULTS: u8 = 20;

/// Range the timeline endpoint accepts for `max_results`.
const MAX_RESULTS_RANGE: (u8, u8) = (5, 100);

/// Configuration for [`XClient`].
#[derive(Clone)]
pub struct XClientConfig {
    /// App-only bearer token.
    pub bearer_token: String,
    /// API base URL, without trailing slash.
    pub api_base: String,
    /// Numeric user id; looked up from the handle when absent.
    pub user_id: Option<String>,
    /// Posts requested per fetch (clamped to 5..=100).
    pub max_results: u8,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for XClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XClientConfig")
            .field("bearer_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("user_id", &self.user_id)
            .field("max_results", &self.max_results)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl XClientConfig {
    /// Config with defaults for everything but the token.
    #[must_use]
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_id: None,
            max_results: DEFAULT_MAX_RESULTS,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Timeline fetcher backed by the X API v2.
pub struct XClient {
    config: XClientConfig,
    client: Client,
}

impl XClient {
    /// Create a new client.
    pub fn new(mut config: XClientConfig) -> Result<Self, FetchError> {
        config.api_base = config.api_base.trim_end_matches('/').to_string();
        config.max_results = config
            .max_results
            .clamp(MAX_RESULTS_RANGE.0, MAX_RESULTS_RANGE.1);

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Effective `max_results` sent to the API.
    #[must_use]
    pub fn max_results(&self) -> u8 {
        self.config.max_results
    }

    /// Resolve a handle to the numeric user id.
    pub async fn lookup_user_id(&self, handle: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}/2/users/by/username/{}",
            self.config.api_base,
            urlencoding::encode(handle)
        );

        tracing::debug!(handle, "Resolving user id");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.bearer_token)
            .send()
            .await?;
        let body: UserLookup = check_status(response).await?.json().await?;

        match body.data {
            Some(user) => Ok(user.id),
            None => {
                let detail = body
                    .errors
                    .and_then(|e| e.into_iter().next())
                    .map(|e| e.detail.or(e.title).unwrap_or_default())
                    .unwrap_or_else(|| "no user data".to_string());
                Err(FetchError::InvalidResponse(format!(
                    "user lookup for @{handle} failed: {detail}"
                )))
            }
        }
    }

    /// Fetch the most recent posts of a user id, newest first.
    async fn fetch_timeline(&self, user_id: &str) -> Result<Vec<TweetData>, FetchError> {
        let url = format!("{}/2/users/{user_id}/tweets", self.config.api_base);
        let max_results = self.config.max_results.to_string();

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.bearer_token)
            .query(&[
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at,referenced_tweets"),
            ])
            .send()
            .await?;
        let body: Timeline = check_status(response).await?.json().await?;

        let tweets = body.data.unwrap_or_default();
        tracing::debug!(
            user_id,
            count = tweets.len(),
            result_count = ?body.meta.and_then(|m| m.result_count),
            "Fetched timeline"
        );
        Ok(tweets)
    }
}

#[async_trait]
impl PostSource for XClient {
    async fn fetch_recent(&self, handle: &str) -> Result<Vec<Post>, FetchError> {
        let handle = handle.trim_start_matches('@');

        let user_id = match &self.config.user_id {
            Some(id) => id.clone(),
            None => self.lookup_user_id(handle).await?,
        };

        let tweets = self.fetch_timeline(&user_id).await?;
        tweets
            .into_iter()
            .map(|t| t.into_post(handle))
            .collect()
    }
}

/// Map the HTTP status onto the fetch error taxonomy.
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_at = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());
        tracing::warn!(?reset_at, "X API rate limit hit");
        return Err(FetchError::RateLimited { reset_at });
    }

    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::Auth {
            status: status.as_u16(),
            body,
        });
    }

    Err(FetchError::Transient(format!(
        "X API returned {status}: {body}"
    )))
}

// =============================================================================
// X API types
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserLookup {
    data: Option<UserData>,
    errors: Option<Vec<ApiProblem>>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    data: Option<Vec<TweetData>>,
    meta: Option<TimelineMeta>,
}

#[derive(Debug, Deserialize)]
struct TimelineMeta {
    result_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    text: String,
    /// Always requested through `tweet.fields`.
    created_at: DateTime<Utc>,
    referenced_tweets: Option<Vec<ReferencedTweet>>,
}

#[derive(Debug, Deserialize)]
struct ReferencedTweet {
    #[serde(rename = "type")]
    kind: String,
}

impl TweetData {
    /// Classification markers for this tweet.
    ///
    /// The API omits `referenced_tweets` for tweets that reference nothing.
    fn flags(&self) -> PostFlags {
        let Some(refs) = &self.referenced_tweets else {
            // Old-style manual retweets carry no reference.
            let is_retweet = self.text.starts_with("RT @");
            return PostFlags {
                is_retweet: Some(is_retweet),
                ..PostFlags::original()
            };
        };

        let mut reply = false;
        let mut retweet = false;
        let mut quote = false;
        let mut unrecognized = false;
        for r in refs {
            match r.kind.as_str() {
                "replied_to" => reply = true,
                "retweeted" => retweet = true,
                "quoted" => quote = true,
                other => {
                    tracing::debug!(id = %self.id, kind = other, "Unrecognized reference type");
                    unrecognized = true;
                }
            }
        }

        if unrecognized {
            // Only positive markers are trusted.
            let known = |set: bool| set.then_some(true);
            PostFlags {
                is_reply: known(reply),
                is_retweet: known(retweet),
                is_quote: known(quote),
            }
        } else {
            PostFlags {
                is_reply: Some(reply),
                is_retweet: Some(retweet),
                is_quote: Some(quote),
            }
        }
    }

    fn into_post(self, handle: &str) -> Result<Post, FetchError> {
        let id: PostId = self
            .id
            .parse()
            .map_err(|e| FetchError::InvalidResponse(format!("{e}")))?;
        let kind = self.flags().classify();

        Ok(Post::new(id, handle, self.created_at, self.text, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::PostKind;
    use chrono::TimeZone;

    fn tweet(text: &str, refs: Option<Vec<&str>>) -> TweetData {
        TweetData {
            id: "1".to_string(),
            text: text.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 9, 18, 12, 0, 0).unwrap(),
            referenced_tweets: refs.map(|r| {
                r.into_iter()
                    .map(|k| ReferencedTweet {
                        kind: k.to_string(),
                    })
                    .collect()
            }),
        }
    }

    #[test]
    fn test_flags_for_plain_tweet() {
        assert_eq!(tweet("hello", None).flags().classify(), PostKind::Original);
    }

    #[test]
    fn test_flags_for_references() {
        assert_eq!(
            tweet("@a hi", Some(vec!["replied_to"])).flags().classify(),
            PostKind::Reply
        );
        assert_eq!(
            tweet("RT @a: hi", Some(vec!["retweeted"])).flags().classify(),
            PostKind::Retweet
        );
        assert_eq!(
            tweet("look", Some(vec!["quoted"])).flags().classify(),
            PostKind::Quote
        );
        assert_eq!(
            tweet("look", Some(vec!["replied_to", "quoted"]))
                .flags()
                .classify(),
            PostKind::Quote
        );
    }

    #[test]
    fn test_flags_legacy_retweet_prefix() {
        assert_eq!(
            tweet("RT @someone: hi", None).flags().classify(),
            PostKind::Retweet
        );
    }

    #[test]
    fn test_flags_unrecognized_reference_fails_closed() {
        let kind = tweet("hmm", Some(vec!["something_new"])).flags().classify();
        assert_eq!(kind, PostKind::Unknown);
        assert!(!kind.is_original());
    }

    #[test]
    fn test_flags_empty_reference_list_is_original() {
        assert_eq!(tweet("hi", Some(vec![])).flags().classify(), PostKind::Original);
    }

    #[test]
    fn test_into_post_rejects_bad_id() {
        let mut t = tweet("hi", None);
        t.id = "abc".to_string();
        assert!(matches!(
            t.into_post("x"),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_max_results_clamped() {
        let mut config = XClientConfig::new("t");
        config.max_results = 1;
        assert_eq!(XClient::new(config.clone()).unwrap().max_results(), 5);
        config.max_results = 200;
        assert_eq!(XClient::new(config).unwrap().max_results(), 100);
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = XClientConfig::new("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
