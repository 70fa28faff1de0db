use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_SOURCE_URL: &str = "https://sede.uco.es/bouco/";
const DEFAULT_INTERVAL_SECS: u64 = 8 * 60 * 60;
const DEFAULT_PORT: u16 = 8080;
/// Fixed path of the credential file for the remote state backend.
const BLOB_KEY_FILE: &str = "blob-key.txt";

/// Remote state backend settings; present only when STATE_BLOB_URL is set.
pub struct BlobConfig {
    pub base_url: String,
    pub key: String,
}

/// Process configuration, read and validated once at startup and passed by
/// reference from there on. Components never read the environment themselves.
pub struct Config {
    pub telegram_token: String,
    pub telegram_channel_id: String,
    pub source_url: String,
    pub data_dir: PathBuf,
    pub interval: Duration,
    pub port: u16,
    pub download_attachments: bool,
    pub blob: Option<BlobConfig>,
}

impl Config {
    /// Missing required settings are fatal here, before any cycle runs.
    pub fn from_env() -> Result<Self> {
        let telegram_token = env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN must be set")?;
        let telegram_channel_id =
            env::var("TELEGRAM_CHANNEL_ID").context("TELEGRAM_CHANNEL_ID must be set")?;

        let source_url =
            env::var("SOURCE_URL").unwrap_or_else(|_| DEFAULT_SOURCE_URL.to_string());
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

        let interval = match env::var("INTERVAL_SECS") {
            Ok(v) => Duration::from_secs(
                v.parse().context("INTERVAL_SECS must be a number of seconds")?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_INTERVAL_SECS),
        };
        let port = match env::var("PORT") {
            Ok(v) => v.parse().context("PORT must be a port number")?,
            Err(_) => DEFAULT_PORT,
        };
        let download_attachments = env::var("DOWNLOAD_ATTACHMENTS").is_ok();

        let blob = match env::var("STATE_BLOB_URL") {
            Ok(base_url) => {
                let key = std::fs::read_to_string(BLOB_KEY_FILE)
                    .with_context(|| {
                        format!("remote state configured but {} is unreadable", BLOB_KEY_FILE)
                    })?
                    .trim()
                    .to_string();
                Some(BlobConfig { base_url, key })
            }
            Err(_) => None,
        };

        Ok(Self {
            telegram_token,
            telegram_channel_id,
            source_url,
            data_dir,
            interval,
            port,
            download_attachments,
            blob,
        })
    }
}
