pub mod local;
pub mod remote;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Blob/file name of the persisted seen set.
pub const SEEN_FILE: &str = "seen-ids.json";

/// Ids of announcements already delivered to the channel.
pub type SeenSet = BTreeSet<String>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read {}: {}", path.display(), source)]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {}", path.display(), source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {}: {}", path.display(), source)]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to download state blob: {0}")]
    Download(String),
    /// Kept distinct from the local write errors: the local copy was written,
    /// but a future run on a fresh instance only sees the remote one.
    #[error("state blob upload failed, seen set not durably committed: {0}")]
    Upload(String),
}

/// Durable serialization target for the seen set. The pipeline owns the set
/// for the duration of a cycle; backends never mutate it on their own.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<SeenSet, StateError>;
    async fn save(&self, seen: &SeenSet) -> Result<(), StateError>;
}

/// Write-then-rename so a crash mid-write never leaves a truncated file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StateError> {
    let write_err = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}
