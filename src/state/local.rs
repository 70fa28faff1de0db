use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{write_atomic, SeenSet, StateError, StateStore, SEEN_FILE};

/// Seen set persisted as a JSON array of id strings under the data dir.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SEEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty set, not an error: first run, or a fresh
    /// instance that has not synced yet.
    pub fn read(&self) -> Result<SeenSet, StateError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SeenSet::new()),
            Err(e) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        let ids: Vec<String> = serde_json::from_str(&raw).map_err(|e| StateError::Parse {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(ids.into_iter().collect())
    }

    pub fn write(&self, seen: &SeenSet) -> Result<(), StateError> {
        let json = serde_json::to_vec_pretty(seen).expect("seen set serializes");
        write_atomic(&self.path, &json)
    }
}

#[async_trait]
impl StateStore for LocalStore {
    async fn load(&self) -> Result<SeenSet, StateError> {
        self.read()
    }

    async fn save(&self, seen: &SeenSet) -> Result<(), StateError> {
        self.write(seen)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn seen(ids: &[&str]) -> SeenSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_file_reads_as_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let ids = seen(&["ANUNCIO 2025/00731", "ANUNCIO 2025/00744"]);
        store.write(&ids).unwrap();
        assert_eq!(store.read().unwrap(), ids);
    }

    #[test]
    fn write_replaces_previous_content_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.write(&seen(&["ANUNCIO 2025/00001", "ANUNCIO 2025/00002"])).unwrap();
        store.write(&seen(&["ANUNCIO 2025/00003"])).unwrap();

        assert_eq!(store.read().unwrap(), seen(&["ANUNCIO 2025/00003"]));
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec![SEEN_FILE.to_string()]);
    }

    #[test]
    fn persisted_format_is_a_json_string_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.write(&seen(&["ANUNCIO 2025/00731"])).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec!["ANUNCIO 2025/00731"]);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.read(), Err(StateError::Parse { .. })));
    }
}
