use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use reqwest::Client;
use tracing::info;

/// First single-quoted token inside the download affordance's onclick handler.
static DOC_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'([^']+)'").unwrap());

/// Fetch the announcements page. Any non-2xx response is a fetch failure and
/// aborts the whole cycle upstream.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .context("announcements page request failed")?;
    if !resp.status().is_success() {
        bail!("announcements page returned HTTP {}", resp.status());
    }
    resp.text()
        .await
        .context("failed to read announcements page body")
}

/// Pull the postback document id out of a raw onclick token.
pub fn doc_id_from_onclick(onclick: &str) -> Option<&str> {
    DOC_ID_RE
        .captures(onclick)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Best-effort enrichment: POST the document id back to the source endpoint
/// and save the published document under the data dir. Callers log failures
/// and move on; nothing here is fatal to a cycle.
pub async fn download_attachment(
    client: &Client,
    source_url: &str,
    record_id: &str,
    onclick: &str,
    data_dir: &Path,
) -> Result<PathBuf> {
    let doc_id = doc_id_from_onclick(onclick)
        .with_context(|| format!("no document id in action token for {}", record_id))?;

    let resp = client
        .post(source_url)
        .form(&[("idBandejaAnuncios:j_idcl", doc_id)])
        .send()
        .await
        .with_context(|| format!("attachment request failed for {}", record_id))?;
    if !resp.status().is_success() {
        bail!(
            "attachment download for {} returned HTTP {}",
            record_id,
            resp.status()
        );
    }
    let bytes = resp.bytes().await?;

    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join(format!("{}.pdf", record_id.replace(['/', ' '], "_")));
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to save attachment {}", path.display()))?;
    info!("Saved attachment {}", path.display());
    Ok(path)
}

// ── Tests ──
