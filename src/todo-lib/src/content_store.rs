use std::sync::Arc;

use async_trait::async_trait;

use crate::CaptureResult;

/// Snapshot of the target file as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    // base64 transport text, exactly as the store returned it
    pub encoded_content: String,
    pub version_token: String,
}

/// Full replacement content, accepted only while `version_token` is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRequest {
    pub message: String,
    pub encoded_content: String,
    pub version_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub version_token: String,
    pub commit_id: Option<String>,
}

/// A remote versioned file with optimistic-concurrency writes.
///
/// `get_file` fails with `FetchError` (or `DecodeError` for a malformed body);
/// `put_file` fails with `WriteConflict` for any rejected write, stale token
/// included.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_file(&self) -> CaptureResult<RemoteFile>;
    async fn put_file(&self, request: &AppendRequest) -> CaptureResult<WriteReceipt>;
}

pub type ContentStoreRef = Arc<dyn ContentStore>;
