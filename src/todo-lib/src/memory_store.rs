use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use tokio::sync::Barrier;

use crate::{
    decode_transport, encode_transport, AppendRequest, CaptureError, CaptureResult, ContentStore,
    RemoteFile, WriteReceipt,
};

struct MemoryFileState {
    content: Vec<u8>,
    version_token: String,
    revision: u64,
}

/// In-process `ContentStore` that checks version tokens the way the remote
/// contents API does. Only built for tests and the `test-util` feature.
pub struct MemoryContentStore {
    path: String,
    state: Mutex<MemoryFileState>,
    read_failure: Mutex<Option<StatusCode>>,
    write_failure: Mutex<Option<StatusCode>>,
    // every reader waits here after taking its snapshot
    read_barrier: Option<Arc<Barrier>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new(path: &str, content: &str, version_token: &str) -> Self {
        Self {
            path: path.to_string(),
            state: Mutex::new(MemoryFileState {
                content: content.as_bytes().to_vec(),
                version_token: version_token.to_string(),
                revision: 0,
            }),
            read_failure: Mutex::new(None),
            write_failure: Mutex::new(None),
            read_barrier: None,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn with_raw_content(path: &str, content: Vec<u8>, version_token: &str) -> Self {
        let store = Self::new(path, "", version_token);
        store.lock_state().content = content;
        store
    }

    pub fn with_read_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.read_barrier = Some(barrier);
        self
    }

    pub fn fail_reads_with(&self, status: Option<StatusCode>) {
        *self.read_failure.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    pub fn fail_writes_with(&self, status: Option<StatusCode>) {
        *self.write_failure.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    pub fn content_text(&self) -> String {
        String::from_utf8_lossy(&self.lock_state().content).into_owned()
    }

    pub fn version_token(&self) -> String {
        self.lock_state().version_token.clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MemoryFileState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_version_token(content: &[u8], revision: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(revision.to_be_bytes());
        hasher.update(content);
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get_file(&self) -> CaptureResult<RemoteFile> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let failure = *self.read_failure.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(status) = failure {
            return Err(CaptureError::from_fetch_status(status, &self.path));
        }

        let file = {
            let state = self.lock_state();
            RemoteFile {
                path: self.path.clone(),
                encoded_content: encode_transport(&state.content),
                version_token: state.version_token.clone(),
            }
        };

        if let Some(barrier) = self.read_barrier.as_ref() {
            barrier.wait().await;
        }
        Ok(file)
    }

    async fn put_file(&self, request: &AppendRequest) -> CaptureResult<WriteReceipt> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let failure = *self.write_failure.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(status) = failure {
            return Err(CaptureError::from_write_status(status, &self.path));
        }

        let content = decode_transport(&request.encoded_content)
            .map_err(|_| CaptureError::from_write_status(StatusCode::UNPROCESSABLE_ENTITY, &self.path))?;

        let mut state = self.lock_state();
        if state.version_token != request.version_token {
            debug!(
                "memory store reject write: {} does not match {}",
                request.version_token, state.version_token
            );
            return Err(CaptureError::from_write_status(
                StatusCode::CONFLICT,
                &self.path,
            ));
        }

        state.revision += 1;
        state.version_token = Self::next_version_token(&content, state.revision);
        state.content = content;
        Ok(WriteReceipt {
            version_token: state.version_token.clone(),
            commit_id: Some(format!("memory-{}", state.revision)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str, version_token: &str) -> AppendRequest {
        AppendRequest {
            message: "test".to_string(),
            encoded_content: encode_transport(content.as_bytes()),
            version_token: version_token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_put_with_current_token() {
        let store = MemoryContentStore::new("todo.md", "a", "v1");
        let file = store.get_file().await.unwrap();
        assert_eq!(file.version_token, "v1");

        let receipt = store.put_file(&request("a\n\nb", "v1")).await.unwrap();
        assert_ne!(receipt.version_token, "v1");
        assert_eq!(store.version_token(), receipt.version_token);
        assert_eq!(store.content_text(), "a\n\nb");
    }

    #[tokio::test]
    async fn test_memory_store_rejects_stale_token() {
        let store = MemoryContentStore::new("todo.md", "a", "v1");
        store.put_file(&request("b", "v1")).await.unwrap();

        let err = store.put_file(&request("c", "v1")).await.unwrap_err();
        assert!(err.is_version_conflict());
        assert_eq!(store.content_text(), "b");
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_injected_failures() {
        let store = MemoryContentStore::new("todo.md", "a", "v1");
        store.fail_reads_with(Some(StatusCode::NOT_FOUND));
        assert!(matches!(
            store.get_file().await.unwrap_err(),
            CaptureError::FetchError(_)
        ));

        store.fail_writes_with(Some(StatusCode::FORBIDDEN));
        let err = store.put_file(&request("b", "v1")).await.unwrap_err();
        assert!(matches!(err, CaptureError::WriteConflict { .. }));
        assert!(!err.is_version_conflict());
        assert_eq!(store.version_token(), "v1");
    }
}
