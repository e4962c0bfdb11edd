mod append_engine;
mod codec;
mod config;
mod content_store;
mod github_store;
#[cfg(any(test, feature = "test-util"))]
mod memory_store;

pub use append_engine::*;
pub use codec::*;
pub use config::*;
pub use content_store::*;
pub use github_store::*;
#[cfg(any(test, feature = "test-util"))]
pub use memory_store::*;

/// HTTP status as reported by a content store.
#[cfg(any(test, feature = "test-util"))]
pub use reqwest::StatusCode as StoreStatus;

use reqwest::StatusCode;
use thiserror::Error;

#[macro_use]
extern crate log;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("invalid param: {0}")]
    InvalidParam(String),
    #[error("fetch error: {0}")]
    FetchError(String),
    #[error("decode error: {0}")]
    DecodeError(String),
    #[error("write conflict: {info}")]
    WriteConflict {
        info: String,
        // the store reported the version token as stale
        version_mismatch: bool,
    },
    #[error("config error: {0}")]
    ConfigError(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    pub fn from_fetch_status(code: StatusCode, info: &str) -> Self {
        CaptureError::FetchError(format!("HTTP error: {} for {}", code, info))
    }

    pub fn from_write_status(code: StatusCode, info: &str) -> Self {
        CaptureError::WriteConflict {
            info: format!("HTTP error: {} for {}", code, info),
            version_mismatch: code == StatusCode::CONFLICT,
        }
    }

    pub fn write_failed(info: String) -> Self {
        CaptureError::WriteConflict {
            info,
            version_mismatch: false,
        }
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(
            self,
            CaptureError::WriteConflict {
                version_mismatch: true,
                ..
            }
        )
    }

    pub fn is_invalid_param(&self) -> bool {
        matches!(self, CaptureError::InvalidParam(_))
    }
}

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_status_marks_only_conflict_as_version_mismatch() {
        let conflict = CaptureError::from_write_status(StatusCode::CONFLICT, "todo.md");
        assert!(conflict.is_version_conflict());

        let rejected = CaptureError::from_write_status(StatusCode::UNPROCESSABLE_ENTITY, "todo.md");
        assert!(!rejected.is_version_conflict());
        assert!(matches!(rejected, CaptureError::WriteConflict { .. }));
    }

    #[test]
    fn test_fetch_status_keeps_code_in_message() {
        let err = CaptureError::from_fetch_status(StatusCode::NOT_FOUND, "todo.md");
        assert!(matches!(err, CaptureError::FetchError(_)));
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("todo.md"));
    }
}
