use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    AppendRequest, CaptureConfig, CaptureError, CaptureResult, ContentStore, RemoteFile,
    WriteReceipt,
};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CAPTURE_USER_AGENT: &str = "todo-capture";
const CONTENT_ENCODING_BASE64: &str = "base64";

#[derive(Debug, Deserialize)]
struct GetContentsResp {
    #[serde(default)]
    path: String,
    // "none" for files too large to be inlined; content is empty then
    encoding: String,
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsReq<'a> {
    message: &'a str,
    content: &'a str,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResp {
    content: PutContentsFile,
    #[serde(default)]
    commit: Option<PutContentsCommit>,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentsCommit {
    sha: String,
}

/// `ContentStore` backed by the GitHub repository contents API.
pub struct GithubContentStore {
    client: Client,
    contents_url: String,
    branch: Option<String>,
}

impl GithubContentStore {
    pub fn new(config: &CaptureConfig) -> CaptureResult<Self> {
        let mut auth_value = HeaderValue::from_str(&format!("token {}", config.github_token))
            .map_err(|e| {
                CaptureError::ConfigError(format!("github token is not a valid header value: {}", e))
            })?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let client = Client::builder()
            .timeout(config.store_timeout)
            .user_agent(CAPTURE_USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| CaptureError::Internal(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            contents_url: config.contents_url(),
            branch: config.branch.clone(),
        })
    }
}

#[async_trait]
impl ContentStore for GithubContentStore {
    async fn get_file(&self) -> CaptureResult<RemoteFile> {
        let mut req = self.client.get(&self.contents_url);
        if let Some(branch) = self.branch.as_deref() {
            req = req.query(&[("ref", branch)]);
        }

        let res = req.send().await.map_err(|e| {
            CaptureError::FetchError(format!("GET {} failed: {}", self.contents_url, e))
        })?;
        debug!("SEND GET contents request, status:{}", res.status());
        if !res.status().is_success() {
            return Err(CaptureError::from_fetch_status(
                res.status(),
                &self.contents_url,
            ));
        }

        let body = res.bytes().await.map_err(|e| {
            CaptureError::FetchError(format!("read body of {} failed: {}", self.contents_url, e))
        })?;
        let resp: GetContentsResp = serde_json::from_slice(&body).map_err(|e| {
            CaptureError::DecodeError(format!(
                "invalid contents response from {}: {}",
                self.contents_url, e
            ))
        })?;
        if resp.encoding != CONTENT_ENCODING_BASE64 {
            return Err(CaptureError::DecodeError(format!(
                "unsupported content encoding {:?} from {}",
                resp.encoding, self.contents_url
            )));
        }

        Ok(RemoteFile {
            path: resp.path,
            encoded_content: resp.content,
            version_token: resp.sha,
        })
    }

    async fn put_file(&self, request: &AppendRequest) -> CaptureResult<WriteReceipt> {
        let body = PutContentsReq {
            message: &request.message,
            content: &request.encoded_content,
            sha: &request.version_token,
            branch: self.branch.as_deref(),
        };

        info!(
            "SEND PUT contents request, url:{} base sha:{}",
            self.contents_url, request.version_token
        );
        let res = self
            .client
            .put(&self.contents_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CaptureError::write_failed(format!("PUT {} failed: {}", self.contents_url, e))
            })?;

        if !res.status().is_success() {
            return Err(CaptureError::from_write_status(
                res.status(),
                &self.contents_url,
            ));
        }

        let body = res.bytes().await.map_err(|e| {
            CaptureError::write_failed(format!(
                "read body of {} failed: {}",
                self.contents_url, e
            ))
        })?;
        let resp: PutContentsResp = serde_json::from_slice(&body).map_err(|e| {
            CaptureError::DecodeError(format!(
                "invalid write response from {}: {}",
                self.contents_url, e
            ))
        })?;

        Ok(WriteReceipt {
            version_token: resp.content.sha,
            commit_id: resp.commit.map(|c| c.sha),
        })
    }
}
