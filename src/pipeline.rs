use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::extract::{self, Announcement};
use crate::fetch;
use crate::notify::Notify;
use crate::state::{SeenSet, StateStore};

/// Snapshot of the full extracted batch, written every cycle for debugging
/// the brittle upstream markup. Independent of the seen set.
pub const BATCH_FILE: &str = "records-batch.json";

/// Outcome of one fetch-extract-diff-deliver-commit cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub total: usize,
    pub new: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// One full cycle. Fetch failure aborts before anything is touched; a commit
/// failure surfaces as an error even though deliveries already went out.
pub async fn run_cycle(
    client: &Client,
    config: &Config,
    store: &dyn StateStore,
    notifier: &dyn Notify,
) -> Result<CycleReport> {
    let html = fetch::fetch_page(client, &config.source_url).await?;

    let batch = extract::extract(&html);
    write_batch_snapshot(&config.data_dir, &batch)?;
    info!("Extracted {} records", batch.len());

    // A load failure degrades to an empty set: re-delivering everything is
    // recoverable, a permanently crashing pipeline is not.
    let mut seen = match store.load().await {
        Ok(seen) => seen,
        Err(e) => {
            warn!("Could not load seen ids, starting from empty set: {}", e);
            SeenSet::new()
        }
    };

    let new_records: Vec<&Announcement> =
        batch.iter().filter(|r| !seen.contains(&r.id)).collect();
    let new = new_records.len();
    if new > 0 {
        info!("{} new records to deliver", new);
    }

    let mut delivered = 0usize;
    let mut failed = 0usize;
    for record in new_records {
        match notifier.deliver(record).await {
            Ok(()) => {
                delivered += 1;
                seen.insert(record.id.clone());
                if config.download_attachments {
                    if let Some(onclick) = &record.attachment_ref {
                        if let Err(e) = fetch::download_attachment(
                            client,
                            &config.source_url,
                            &record.id,
                            onclick,
                            &config.data_dir,
                        )
                        .await
                        {
                            warn!("Attachment download failed for {}: {:#}", record.id, e);
                        }
                    }
                }
            }
            Err(e) => {
                // Stays out of the seen set; the next cycle retries it.
                failed += 1;
                warn!("Delivery failed for {}: {:#}", record.id, e);
            }
        }
    }

    store.save(&seen).await.with_context(|| {
        format!(
            "cycle delivered {} records but the seen set was not committed",
            delivered
        )
    })?;

    Ok(CycleReport {
        total: batch.len(),
        new,
        delivered,
        failed,
    })
}

fn write_batch_snapshot(data_dir: &Path, batch: &[Announcement]) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join(BATCH_FILE);
    let json = serde_json::to_vec_pretty(batch)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

// ── Tests ──
