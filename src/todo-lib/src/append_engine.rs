use std::sync::Arc;

use crate::{
    append_text, decode_text, decode_transport, encode_transport, AppendRequest, CaptureConfig,
    CaptureError, CaptureResult, ContentStoreRef, GithubContentStore, RemoteFile,
    APPEND_SEPARATOR,
};

/// Read-append-write cycle against one remote file.
///
/// Each `append` reads the file once and writes it at most once, conditioned on
/// the version token it read. A stale token is reported as `WriteConflict` and
/// never retried.
pub struct AppendEngine {
    store: ContentStoreRef,
    commit_message: String,
    separator: String,
}

impl AppendEngine {
    pub fn new(store: ContentStoreRef, commit_message: &str) -> Self {
        Self {
            store,
            commit_message: commit_message.to_string(),
            separator: APPEND_SEPARATOR.to_string(),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> CaptureResult<Self> {
        let store = GithubContentStore::new(config)?;
        Ok(Self::new(Arc::new(store), &config.commit_message))
    }

    pub async fn append(&self, new_text: &str) -> CaptureResult<()> {
        if new_text.trim().is_empty() {
            return Err(CaptureError::InvalidParam("append text is empty".to_string()));
        }

        let remote_file = self.store.get_file().await?;
        debug!(
            "append: read {} at version {}",
            remote_file.path, remote_file.version_token
        );
        let request = self.build_append_request(&remote_file, new_text)?;

        let receipt = match self.store.put_file(&request).await {
            Ok(receipt) => receipt,
            Err(err) => {
                if err.is_version_conflict() {
                    warn!(
                        "append: {} changed since version {}, write refused",
                        remote_file.path, remote_file.version_token
                    );
                }
                return Err(err);
            }
        };

        info!(
            "append {} OK, version {} => {}, commit:{:?}",
            remote_file.path, remote_file.version_token, receipt.version_token, receipt.commit_id
        );
        Ok(())
    }

    pub fn build_append_request(
        &self,
        remote_file: &RemoteFile,
        new_text: &str,
    ) -> CaptureResult<AppendRequest> {
        let current = decode_text(decode_transport(&remote_file.encoded_content)?)?;
        let updated = append_text(&current, new_text, &self.separator);
        Ok(AppendRequest {
            message: self.commit_message.clone(),
            encoded_content: encode_transport(updated.as_bytes()),
            version_token: remote_file.version_token.clone(),
        })
    }
}
