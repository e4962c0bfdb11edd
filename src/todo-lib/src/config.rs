use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::{CaptureError, CaptureResult};

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_REPO_OWNER: &str = "REPO_OWNER";
pub const ENV_REPO_NAME: &str = "REPO_NAME";
pub const ENV_FILE_PATH: &str = "FILE_PATH";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const ENV_REPO_BRANCH: &str = "REPO_BRANCH";
pub const ENV_COMMIT_MESSAGE: &str = "COMMIT_MESSAGE";
pub const ENV_STORE_TIMEOUT_SECS: &str = "STORE_TIMEOUT_SECS";
pub const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Append TODO via todo-capture";
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Clone)]
pub struct CaptureConfig {
    pub github_token: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub file_path: String,
    pub api_url: String,
    pub branch: Option<String>,
    pub commit_message: String,
    pub store_timeout: Duration,
    pub listen_addr: SocketAddr,
}

impl CaptureConfig {
    pub fn from_env() -> CaptureResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> CaptureResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            optional(key).ok_or_else(|| {
                CaptureError::ConfigError(format!("missing required environment variable {}", key))
            })
        };

        let github_token = required(ENV_GITHUB_TOKEN)?;
        let repo_owner = required(ENV_REPO_OWNER)?;
        let repo_name = required(ENV_REPO_NAME)?;
        let file_path = required(ENV_FILE_PATH)?;

        let store_timeout = match optional(ENV_STORE_TIMEOUT_SECS) {
            Some(value) => {
                let secs = value.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                    CaptureError::ConfigError(format!(
                        "{} must be a positive integer, got {}",
                        ENV_STORE_TIMEOUT_SECS, value
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        };

        let listen_addr_str =
            optional(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr_str.parse::<SocketAddr>().map_err(|e| {
            CaptureError::ConfigError(format!(
                "{} is not a socket address ({}): {}",
                ENV_LISTEN_ADDR, listen_addr_str, e
            ))
        })?;

        Ok(Self {
            github_token,
            repo_owner,
            repo_name,
            file_path,
            api_url: optional(ENV_GITHUB_API_URL)
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            branch: optional(ENV_REPO_BRANCH),
            commit_message: optional(ENV_COMMIT_MESSAGE)
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            store_timeout,
            listen_addr,
        })
    }

    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url.trim_end_matches('/'),
            self.repo_owner,
            self.repo_name,
            self.file_path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for CaptureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureConfig")
            .field("github_token", &"<redacted>")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("file_path", &self.file_path)
            .field("api_url", &self.api_url)
            .field("branch", &self.branch)
            .field("commit_message", &self.commit_message)
            .field("store_timeout", &self.store_timeout)
            .field("listen_addr", &self.listen_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn required_vars() -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert(ENV_GITHUB_TOKEN, "secret-token".to_string());
        vars.insert(ENV_REPO_OWNER, "owner".to_string());
        vars.insert(ENV_REPO_NAME, "notes".to_string());
        vars.insert(ENV_FILE_PATH, "inbox/todo.md".to_string());
        vars
    }

    fn load(vars: &HashMap<&'static str, String>) -> CaptureResult<CaptureConfig> {
        CaptureConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_for_optional_values() {
        let config = load(&required_vars()).unwrap();
        assert_eq!(config.api_url, DEFAULT_GITHUB_API_URL);
        assert_eq!(config.branch, None);
        assert_eq!(config.commit_message, DEFAULT_COMMIT_MESSAGE);
        assert_eq!(config.store_timeout, Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS));
        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(
            config.contents_url(),
            "https://api.github.com/repos/owner/notes/contents/inbox/todo.md"
        );
    }

    #[test]
    fn test_each_required_value_is_fatal_when_missing() {
        for key in [ENV_GITHUB_TOKEN, ENV_REPO_OWNER, ENV_REPO_NAME, ENV_FILE_PATH] {
            let mut vars = required_vars();
            vars.remove(key);
            let err = load(&vars).unwrap_err();
            assert!(matches!(err, CaptureError::ConfigError(_)));
            assert!(err.to_string().contains(key), "error should name {}", key);
        }
    }

    #[test]
    fn test_blank_required_value_counts_as_missing() {
        let mut vars = required_vars();
        vars.insert(ENV_REPO_NAME, "   ".to_string());
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains(ENV_REPO_NAME));
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = required_vars();
        vars.insert(ENV_GITHUB_API_URL, "https://ghe.example.com/api/v3/".to_string());
        vars.insert(ENV_REPO_BRANCH, "inbox".to_string());
        vars.insert(ENV_COMMIT_MESSAGE, "capture".to_string());
        vars.insert(ENV_STORE_TIMEOUT_SECS, "5".to_string());
        vars.insert(ENV_LISTEN_ADDR, "127.0.0.1:9000".to_string());
        vars.insert(ENV_FILE_PATH, "/todo.md".to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.branch.as_deref(), Some("inbox"));
        assert_eq!(config.commit_message, "capture");
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(
            config.contents_url(),
            "https://ghe.example.com/api/v3/repos/owner/notes/contents/todo.md"
        );
    }

    #[test]
    fn test_invalid_timeout_and_listen_addr() {
        let mut vars = required_vars();
        vars.insert(ENV_STORE_TIMEOUT_SECS, "0".to_string());
        assert!(matches!(load(&vars).unwrap_err(), CaptureError::ConfigError(_)));

        let mut vars = required_vars();
        vars.insert(ENV_LISTEN_ADDR, "localhost".to_string());
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains(ENV_LISTEN_ADDR));
    }

    #[test]
    fn test_debug_output_hides_token() {
        let config = load(&required_vars()).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("<redacted>"));
    }
}
