//! Watcher CLI - forwards new original X posts to a Telegram chat.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use notify::{Notifier, NotifyChannel, TelegramChannel};
use watcher::config::{
    Secrets, WatchConfig, DEFAULT_HANDLE, DEFAULT_STATE_FILE, DEFAULT_TIMEOUT_SECS,
};
use watcher::pipeline::{RunOptions, Watcher};
use watcher::state::StateStore;
use watcher::twitter::{XClient, DEFAULT_API_BASE, DEFAULT_MAX_RESULTS};
use watcher::WatchError;

/// Watcher CLI - Forward new original posts from an X account to Telegram.
#[derive(Parser)]
#[command(name = "watcher")]
#[command(about = "Forward new original X posts to a Telegram chat")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// State file path (holds the last-seen marker)
    #[arg(long, global = true, env = "WATCH_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single poll cycle (for cron / scheduled CI use)
    Poll {
        /// Account handle to watch
        #[arg(long, env = "WATCH_HANDLE", default_value = DEFAULT_HANDLE)]
        handle: String,

        /// Numeric X user id (skips the handle lookup)
        #[arg(long, env = "X_USER_ID")]
        user_id: Option<String>,

        /// Posts requested per poll (5-100)
        #[arg(long, env = "WATCH_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: u8,

        /// Timeout for each HTTP request, in seconds
        #[arg(long, env = "WATCH_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// X API base URL
        #[arg(long, env = "X_API_BASE", default_value = DEFAULT_API_BASE, hide = true)]
        x_api_base: String,

        /// Telegram Bot API base URL
        #[arg(
            long,
            env = "TELEGRAM_API_BASE",
            default_value = notify::channels::telegram::DEFAULT_API_BASE,
            hide = true
        )]
        telegram_api_base: String,

        /// Show what would be sent without sending or saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the stored last-seen marker
    State,

    /// Delete the state file so the next poll re-initializes quietly
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("watcher=debug,notify=debug,info")
        } else {
            EnvFilter::new("watcher=info,notify=info,warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<WatchError>().map_or(1, WatchError::exit_code);
            tracing::error!(error = %format!("{e:#}"), exit_code = code, "Run failed");
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = StateStore::new(cli.state);

    match cli.command {
        Commands::Poll {
            handle,
            user_id,
            max_results,
            timeout_secs,
            x_api_base,
            telegram_api_base,
            dry_run,
        } => {
            let secrets = Secrets::from_env()?;
            let config = WatchConfig {
                handle,
                user_id,
                state_path: store.path().to_path_buf(),
                max_results,
                timeout: Duration::from_secs(timeout_secs),
                x_api_base,
                telegram_api_base,
                ..WatchConfig::new(secrets)
            };
            config.validate()?;
            tracing::debug!(?config, "Loaded configuration");

            run_poll(&config, store, dry_run).await
        }
        Commands::State => run_state(&store),
        Commands::Reset => run_reset(&store),
    }
}

async fn run_poll(config: &WatchConfig, store: StateStore, dry_run: bool) -> Result<()> {
    let source = XClient::new(config.x_client_config())?;

    let telegram = TelegramChannel::new(
        config.secrets.telegram_bot_token.clone(),
        config.secrets.telegram_chat_id.clone(),
        config.timeout,
    )
    .context("failed to build Telegram client")?
    .with_api_base(config.telegram_api_base.clone());
    let notifier = Notifier::with_channels(vec![Arc::new(telegram) as Arc<dyn NotifyChannel>]);

    let watcher = Watcher::new(
        config.normalized_handle(),
        Arc::new(source),
        notifier,
        store,
    );
    let summary = watcher.run_once(RunOptions { dry_run }).await?;

    let marker = summary
        .marker
        .map_or_else(|| "none".to_string(), |id| id.to_string());

    println!("\nPoll Summary");
    println!("   Fetched: {}", summary.fetched);
    println!("   Original: {}", summary.originals);
    println!("   Notified: {}", summary.delivered.len());
    println!("   Marker: {marker}");
    if summary.first_run {
        println!("   First run: marker initialized, no notifications sent");
    }
    if dry_run {
        println!("   Dry run: nothing sent, state not saved");
    }

    Ok(())
}

fn run_state(store: &StateStore) -> Result<()> {
    let record = store.load()?;

    match record.last_seen_id {
        Some(id) => {
            println!("Last seen: {id}");
            if let Some(at) = record.updated_at {
                println!("Updated:   {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        None => println!("No marker stored at {}", store.path().display()),
    }

    Ok(())
}

fn run_reset(store: &StateStore) -> Result<()> {
    if store.clear()? {
        println!("Removed {}", store.path().display());
    } else {
        println!("Nothing to remove at {}", store.path().display());
    }
    Ok(())
}
