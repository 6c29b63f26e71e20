//! Rotarr console - a CLI for administering a Rotarr collection rotation
//! server.
//!
//! Subcommands cover login/logout, the dashboard health overview, the
//! collections listings, and log tailing. Slowly-changing responses are
//! served from the persistent response cache when still valid.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rotarr_console::api::ApiClient;
use rotarr_console::auth::TokenStore;
use rotarr_console::cache::{ResponseCache, COLLECTIONS_CACHE_KEY};
use rotarr_console::config::Config;
use rotarr_console::models::CollectionSummary;
use rotarr_console::poll::LogPoller;
use rotarr_console::storage::FileStorage;
use rotarr_console::utils::time_ago;

// ============================================================================
// Constants
// ============================================================================

/// How many log lines a plain `logs` invocation shows.
const DEFAULT_LOG_LIMIT: usize = 50;

/// Poll interval for `logs --follow`.
const LOG_FOLLOW_INTERVAL_SECS: u64 = 2;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn usage() -> ExitCode {
    eprintln!("Usage: rotarr <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login [username]       Sign in and store the session token");
    eprintln!("  logout                 End the session and clear credentials");
    eprintln!("  status                 Service health and next rotation countdown");
    eprintln!("  collections [--active] List configured (or active) collections");
    eprintln!("  logs [--follow]        Show recent server logs, optionally tailing");
    ExitCode::from(2)
}

struct Console {
    config: Config,
    client: ApiClient,
    cache: ResponseCache,
}

impl Console {
    fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(config.storage_dir()?)?);
        let tokens = TokenStore::new(storage.clone());
        let cache = ResponseCache::new(storage);

        let client = ApiClient::new(config.resolved_base_url(), tokens)?
            .on_session_invalidated(Arc::new(|| {
                eprintln!("Session expired - run `rotarr login` to sign in again.");
            }));

        Ok(Self {
            config,
            client,
            cache,
        })
    }

    async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username.or_else(|| self.config.last_username.clone()) {
            Some(u) => u,
            None => anyhow::bail!("No username given and none remembered; run `rotarr login <username>`"),
        };

        let password = rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?;

        self.client.login(&username, &password).await?;
        self.config.last_username = Some(username.clone());
        self.config.save()?;
        println!("Logged in as {}", username);
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.client.logout().await?;
        println!("Logged out");
        Ok(())
    }

    async fn status(&self) -> Result<()> {
        let report = self.client.health_overview(&self.cache).await?;

        let mut services: Vec<_> = report.iter().collect();
        services.sort_by(|a, b| a.0.cmp(b.0));

        println!("Service health:");
        for (service, component) in services {
            let checked = component
                .checked_at
                .as_deref()
                .map(time_ago)
                .unwrap_or_else(|| "never".to_string());
            match &component.message {
                Some(message) => {
                    println!("  {:<12} {:<12} ({}) - {}", service, component.status, checked, message)
                }
                None => println!("  {:<12} {:<12} ({})", service, component.status, checked),
            }
        }

        match self.client.fetch_next_rotation().await {
            Ok(event) => {
                let group = event.group.as_deref().unwrap_or("all groups");
                println!("Next rotation ({}): {}", group, event.countdown());
            }
            Err(e) => {
                info!(error = %e, "No next rotation available");
                println!("Next rotation: not scheduled");
            }
        }
        Ok(())
    }

    async fn collections(&self, active_only: bool) -> Result<()> {
        let collections = if active_only {
            self.client.fetch_active_collections().await?
        } else {
            self.client.all_collections(&self.cache).await?
        };

        if collections.is_empty() {
            println!("No collections configured");
            return Ok(());
        }

        for c in &collections {
            let items = c
                .item_count
                .map(|n| format!("{} items", n))
                .unwrap_or_else(|| "-".to_string());
            let rotated = c
                .last_rotated_at
                .as_deref()
                .map(time_ago)
                .unwrap_or_else(|| "never".to_string());
            let marker = if c.active { "*" } else { " " };
            println!("{} {:<40} {:<12} rotated {}", marker, c.display_name(), items, rotated);
        }

        if !active_only {
            if let Some(envelope) = self.cache.load::<Vec<CollectionSummary>>(COLLECTIONS_CACHE_KEY)
            {
                println!("(cached {})", envelope.age_display());
            }
        }
        Ok(())
    }

    async fn logs(&self, follow: bool) -> Result<()> {
        let entries = self.client.fetch_recent_logs(DEFAULT_LOG_LIMIT).await?;
        for entry in &entries {
            println!("{}", entry.display_line());
        }
        if !follow {
            return Ok(());
        }

        let client = self.client.clone();
        let poller = LogPoller::new(Duration::from_secs(LOG_FOLLOW_INTERVAL_SECS), move || {
            let client = client.clone();
            async move { client.fetch_recent_logs(DEFAULT_LOG_LIMIT).await }
        });

        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(poller.run(tx));

        // Print only lines newer than the last batch
        let mut last_seen = entries.last().map(|e| e.timestamp.clone());
        while let Some(batch) = rx.recv().await {
            for entry in batch {
                if last_seen.as_deref() < Some(entry.timestamp.as_str()) {
                    println!("{}", entry.display_line());
                    last_seen = Some(entry.timestamp.clone());
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        return Ok(usage());
    };

    let config = Config::load().context("Failed to load configuration")?;
    let mut console = Console::new(config)?;

    info!(command, "Rotarr console starting");

    match command {
        "login" => console.login(args.get(2).cloned()).await?,
        "logout" => console.logout().await?,
        "status" => console.status().await?,
        "collections" => {
            let active_only = args.iter().any(|a| a == "--active");
            console.collections(active_only).await?
        }
        "logs" => {
            let follow = args.iter().any(|a| a == "--follow");
            console.logs(follow).await?
        }
        _ => return Ok(usage()),
    }

    Ok(ExitCode::SUCCESS)
}
