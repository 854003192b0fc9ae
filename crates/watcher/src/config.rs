//! Run configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::twitter::{XClientConfig, DEFAULT_MAX_RESULTS};

/// Account watched when no handle is configured.
pub const DEFAULT_HANDLE: &str = "XDevelopers";

/// Default state file location.
pub const DEFAULT_STATE_FILE: &str = "state.json";

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the X bearer token.
pub const ENV_X_BEARER_TOKEN: &str = "X_BEARER_TOKEN";

/// Environment variable holding the Telegram bot token.
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the destination chat id.
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Credentials, read only from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub x_bearer_token: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("x_bearer_token", &"<redacted>")
            .field("telegram_bot_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Secrets {
    /// Load credentials from environment variables.
    ///
    /// # Required Environment Variables
    /// - `X_BEARER_TOKEN`: app-only bearer token for the X API
    /// - `TELEGRAM_BOT_TOKEN`: bot token from BotFather
    /// - `TELEGRAM_CHAT_ID`: destination chat, channel or group id
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            x_bearer_token: required_env(ENV_X_BEARER_TOKEN)?,
            telegram_bot_token: required_env(ENV_TELEGRAM_BOT_TOKEN)?,
            telegram_chat_id: required_env(ENV_TELEGRAM_CHAT_ID)?,
        })
    }
}

fn required_env(name: &str) -> Result<String> {
    let value =
        std::env::var(name).with_context(|| format!("{name} environment variable not set"))?;
    if value.trim().is_empty() {
        bail!("{name} environment variable is empty");
    }
    Ok(value.trim().to_string())
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Account handle, without the leading `@`.
    pub handle: String,
    /// Numeric X user id, skipping the handle lookup.
    pub user_id: Option<String>,
    /// State file path.
    pub state_path: PathBuf,
    /// Posts requested per fetch.
    pub max_results: u8,
    /// Timeout for each HTTP request.
    pub timeout: Duration,
    /// X API base URL.
    pub x_api_base: String,
    /// Telegram Bot API base URL.
    pub telegram_api_base: String,
    pub secrets: Secrets,
}

impl WatchConfig {
    /// Configuration with defaults around the given secrets.
    #[must_use]
    pub fn new(secrets: Secrets) -> Self {
        Self {
            handle: DEFAULT_HANDLE.to_string(),
            user_id: None,
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            x_api_base: crate::twitter::DEFAULT_API_BASE.to_string(),
            telegram_api_base: notify::channels::telegram::DEFAULT_API_BASE.to_string(),
            secrets,
        }
    }

    /// Reject values that cannot work.
    pub fn validate(&self) -> Result<()> {
        let handle = self.handle.trim_start_matches('@');
        if handle.is_empty() {
            bail!("account handle must not be empty");
        }
        if !handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("account handle {:?} contains invalid characters", self.handle);
        }
        if let Some(id) = &self.user_id {
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                bail!("user id {id:?} must be numeric");
            }
        }
        if self.timeout.is_zero() {
            bail!("HTTP timeout must be greater than zero");
        }
        Ok(())
    }

    /// Handle without a leading `@`.
    #[must_use]
    pub fn normalized_handle(&self) -> &str {
        self.handle.trim_start_matches('@')
    }

    /// Fetcher configuration.
    #[must_use]
    pub fn x_client_config(&self) -> XClientConfig {
        XClientConfig {
            bearer_token: self.secrets.x_bearer_token.clone(),
            api_base: self.x_api_base.clone(),
            user_id: self.user_id.clone(),
            max_results: self.max_results,
            timeout: self.timeout,
        }
    }
}
