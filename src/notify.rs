use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::extract::Announcement;

const TELEGRAM_API: &str = "https://api.telegram.org";
/// Static illustrative image attached to every notification.
const PHOTO_URL: &str = "https://sede.uco.es/layout/logo-uco.png";

/// Outbound notification capability: one message per record, no retry here.
/// Retry across cycles comes from the record staying out of the seen set.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn deliver(&self, record: &Announcement) -> Result<()>;
}

/// Telegram channel gateway via the Bot API sendPhoto method.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    channel_id: String,
}

#[derive(Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: String,
    parse_mode: &'a str,
}

impl TelegramNotifier {
    pub fn new(client: Client, token: String, channel_id: String) -> Self {
        Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            token,
            channel_id,
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.to_string();
        self
    }
}

/// Fixed caption template; a missing description renders as an empty string.
fn caption(record: &Announcement) -> String {
    format!(
        "*Publicación: {}*\n\n*Título*: {}\n\n*Descripción*: {}\n",
        record.id,
        record.title,
        record.description.as_deref().unwrap_or("")
    )
}

#[async_trait]
impl Notify for TelegramNotifier {
    async fn deliver(&self, record: &Announcement) -> Result<()> {
        let url = format!("{}/bot{}/sendPhoto", self.api_base, self.token);
        let body = SendPhoto {
            chat_id: &self.channel_id,
            photo: PHOTO_URL,
            caption: caption(record),
            parse_mode: "Markdown",
        };

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("sendPhoto rejected with HTTP {}: {}", status, body);
        }

        info!("Delivered {}", record.id);
        Ok(())
    }
}

// ── Tests ──
