use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::local::LocalStore;
use super::{write_atomic, SeenSet, StateError, StateStore, SEEN_FILE};

/// Blob-backed seen set for ephemeral deployments. The local file is only a
/// working copy; the blob endpoint holds the durable one, so a load starts by
/// pulling the blob down and a save is not committed until the upload lands.
pub struct RemoteStore {
    local: LocalStore,
    client: Client,
    blob_url: String,
    key: String,
}

impl RemoteStore {
    pub fn new(data_dir: &Path, client: Client, base_url: &str, key: String) -> Self {
        Self {
            local: LocalStore::new(data_dir),
            client,
            blob_url: format!("{}/{}", base_url.trim_end_matches('/'), SEEN_FILE),
            key,
        }
    }
}

#[async_trait]
impl StateStore for RemoteStore {
    async fn load(&self) -> Result<SeenSet, StateError> {
        let resp = self
            .client
            .get(&self.blob_url)
            .bearer_auth(&self.key)
            .send()
            .await
            .map_err(|e| StateError::Download(e.to_string()))?;

        // Blob not found reads the same as a missing local file.
        if resp.status() == StatusCode::NOT_FOUND {
            debug!("No state blob at {}, starting empty", self.blob_url);
            return Ok(SeenSet::new());
        }
        if !resp.status().is_success() {
            return Err(StateError::Download(format!("HTTP {}", resp.status())));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StateError::Download(e.to_string()))?;
        write_atomic(self.local.path(), &bytes)?;
        self.local.read()
    }

    async fn save(&self, seen: &SeenSet) -> Result<(), StateError> {
        self.local.write(seen)?;

        let bytes = std::fs::read(self.local.path()).map_err(|e| StateError::Read {
            path: self.local.path().to_path_buf(),
            source: e,
        })?;
        let resp = self
            .client
            .put(&self.blob_url)
            .bearer_auth(&self.key)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StateError::Upload(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(StateError::Upload(format!("HTTP {}", resp.status())));
        }
        Ok(())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, server: &mockito::ServerGuard) -> RemoteStore {
        RemoteStore::new(dir, Client::new(), &server.url(), "blob-key".to_string())
    }

    fn seen(ids: &[&str]) -> SeenSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_blob_loads_as_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/seen-ids.json")
            .with_status(404)
            .create_async()
            .await;

        let loaded = store(dir.path(), &server).load().await.unwrap();
        assert!(loaded.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn load_pulls_blob_into_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/seen-ids.json")
            .match_header("authorization", "Bearer blob-key")
            .with_status(200)
            .with_body(r#"["ANUNCIO 2025/00731"]"#)
            .create_async()
            .await;

        let remote = store(dir.path(), &server);
        let loaded = remote.load().await.unwrap();
        assert_eq!(loaded, seen(&["ANUNCIO 2025/00731"]));
        // The working copy now matches the blob.
        assert!(dir.path().join(SEEN_FILE).exists());
    }

    #[tokio::test]
    async fn save_uploads_after_local_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/seen-ids.json")
            .match_header("authorization", "Bearer blob-key")
            .with_status(200)
            .create_async()
            .await;

        store(dir.path(), &server)
            .save(&seen(&["ANUNCIO 2025/00731"]))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_failure_is_distinct_even_though_local_write_succeeded() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/seen-ids.json")
            .with_status(500)
            .create_async()
            .await;

        let result = store(dir.path(), &server)
            .save(&seen(&["ANUNCIO 2025/00731"]))
            .await;
        assert!(matches!(result, Err(StateError::Upload(_))));
        // Local working copy was still written.
        assert!(dir.path().join(SEEN_FILE).exists());
    }
}
