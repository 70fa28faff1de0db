mod config;
mod extract;
mod fetch;
mod notify;
mod pipeline;
mod server;
mod state;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::config::Config;
use crate::notify::TelegramNotifier;
use crate::pipeline::CycleReport;
use crate::state::local::LocalStore;
use crate::state::remote::RemoteStore;
use crate::state::StateStore;

#[derive(Parser)]
#[command(name = "bouco_watch", about = "BOUCO announcements watcher: fetch, diff, notify")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single fetch-diff-deliver-commit cycle
    Run,
    /// Run cycles forever on a fixed interval, with a liveness endpoint
    Watch {
        /// Seconds between cycles (overrides INTERVAL_SECS)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Parse a saved announcements page and print the extracted records
    Extract {
        /// Path to an HTML file
        #[arg(short, long)]
        file: std::path::PathBuf,
    },
    /// Show the persisted seen ids
    Seen,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        // Needs no credentials; usable before any configuration exists.
        Commands::Extract { file } => {
            let html = std::fs::read_to_string(&file)?;
            let batch = extract::extract(&html);
            println!("{}", serde_json::to_string_pretty(&batch)?);
            Ok(())
        }
        Commands::Run => {
            let (config, client, store, notifier) = setup()?;
            let report =
                pipeline::run_cycle(&client, &config, store.as_ref(), &notifier).await?;
            print_report(&report);
            Ok(())
        }
        Commands::Watch { interval_secs } => {
            let (config, client, store, notifier) = setup()?;
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.interval);

            let port = config.port;
            tokio::spawn(async move {
                if let Err(e) = server::serve(port).await {
                    error!("Liveness endpoint failed: {:#}", e);
                }
            });

            loop {
                match pipeline::run_cycle(&client, &config, store.as_ref(), &notifier).await {
                    Ok(r) => info!(
                        "Cycle done: {} records, {} new, {} delivered, {} failed",
                        r.total, r.new, r.delivered, r.failed
                    ),
                    Err(e) => error!("Cycle failed: {:#}", e),
                }
                info!("Next cycle in {}s", interval.as_secs());
                tokio::time::sleep(interval).await;
            }
        }
        Commands::Seen => {
            let (_config, _client, store, _notifier) = setup()?;
            let seen = store.load().await?;
            for id in &seen {
                println!("{}", id);
            }
            println!("{} seen ids", seen.len());
            Ok(())
        }
    }
}

fn setup() -> Result<(Config, reqwest::Client, Box<dyn StateStore>, TelegramNotifier)> {
    let config = Config::from_env()?;
    let client = reqwest::Client::new();
    let store: Box<dyn StateStore> = match &config.blob {
        Some(blob) => Box::new(RemoteStore::new(
            &config.data_dir,
            client.clone(),
            &blob.base_url,
            blob.key.clone(),
        )),
        None => Box::new(LocalStore::new(&config.data_dir)),
    };
    let notifier = TelegramNotifier::new(
        client.clone(),
        config.telegram_token.clone(),
        config.telegram_channel_id.clone(),
    );
    Ok((config, client, store, notifier))
}

fn print_report(r: &CycleReport) {
    println!(
        "{} records, {} new, {} delivered, {} failed",
        r.total, r.new, r.delivered, r.failed
    );
}
