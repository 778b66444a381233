use super::{
    ApiError, BatchKind, BatchLaunch, BatchRequest, Download, Entry, FileStorageApi, JobStatus,
    ListFolderResult, Relocation, TokenGrant,
};
use crate::config::AppConfig;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use std::time::Duration;

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const API_RESULT_HEADER: &str = "Dropbox-API-Result";

/// Dropbox API v2 client. Base URLs come from configuration so the same
/// client works against Dropbox-compatible servers.
pub struct DropboxClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    authorize_url: String,
    token_url: String,
    api_base: String,
    content_base: String,
}

#[derive(Debug, Deserialize)]
struct DownloadResult {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

impl DropboxClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
            authorize_url: config.oauth_authorize_url.clone(),
            token_url: config.oauth_token_url.clone(),
            api_base: config.api_base.clone(),
            content_base: config.content_base.clone(),
        })
    }

    /// RPC-style call: JSON in, JSON out
    async fn rpc_call<T: DeserializeOwned>(
        &self,
        access_token: &str,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.api_base, endpoint);
        tracing::debug!("RPC {}", endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FileStorageApi for DropboxClient {
    fn authorize_url(&self, state: &str) -> String {
        match url::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("state", state),
            ],
        ) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::error!("Invalid authorize URL {}: {}", self.authorize_url, e);
                self.authorize_url.clone()
            }
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ApiError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                // Only validated against the authorize request, no second redirect
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn list_folder(&self, access_token: &str, path: &str) -> Result<Vec<Entry>, ApiError> {
        let body = serde_json::json!({
            "path": path,
            "recursive": false,
            "include_deleted": false,
        });

        let mut result: ListFolderResult =
            self.rpc_call(access_token, "files/list_folder", &body).await?;
        let mut entries = result.entries;

        while result.has_more {
            let body = serde_json::json!({ "cursor": result.cursor });
            result = self
                .rpc_call(access_token, "files/list_folder/continue", &body)
                .await?;
            entries.extend(result.entries);
        }

        tracing::debug!("Listed {} entries in '{}'", entries.len(), path);
        Ok(entries)
    }

    async fn download(&self, access_token: &str, path: &str) -> Result<Download, ApiError> {
        let arg = header_safe_json(&serde_json::json!({ "path": path }));
        let response = self
            .client
            .post(format!("{}files/download", self.content_base))
            .bearer_auth(access_token)
            .header(API_ARG_HEADER, arg)
            .send()
            .await?;

        let response = check_status(response).await?;

        let meta = response
            .headers()
            .get(API_RESULT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| serde_json::from_str::<DownloadResult>(v).ok());

        let (name, size) = match meta {
            Some(meta) => (meta.name, meta.size.or(response.content_length())),
            None => (
                crate::utils::paths::basename(path).to_string(),
                response.content_length(),
            ),
        };

        let stream = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(Download { name, size, stream })
    }

    async fn create_folder(&self, access_token: &str, path: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "path": path, "autorename": false });
        let _: serde_json::Value = self
            .rpc_call(access_token, "files/create_folder_v2", &body)
            .await?;
        Ok(())
    }

    async fn relocate(
        &self,
        access_token: &str,
        kind: Relocation,
        from_path: &str,
        to_path: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "from_path": from_path,
            "to_path": to_path,
            "autorename": false,
        });
        let _: serde_json::Value = self.rpc_call(access_token, kind.endpoint(), &body).await?;
        Ok(())
    }

    async fn delete(&self, access_token: &str, path: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "path": path });
        let _: serde_json::Value = self
            .rpc_call(access_token, "files/delete_v2", &body)
            .await?;
        Ok(())
    }

    async fn launch_batch(
        &self,
        access_token: &str,
        request: &BatchRequest,
    ) -> Result<BatchLaunch, ApiError> {
        self.rpc_call(
            access_token,
            request.kind().launch_endpoint(),
            &request.to_body(),
        )
        .await
    }

    async fn check_batch(
        &self,
        access_token: &str,
        kind: BatchKind,
        async_job_id: &str,
    ) -> Result<JobStatus, ApiError> {
        let body = serde_json::json!({ "async_job_id": async_job_id });
        self.rpc_call(access_token, kind.check_endpoint(), &body)
            .await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_error(status.as_u16(), &body))
}

/// Map a non-success provider response onto [`ApiError`]
pub fn classify_error(status: u16, body: &str) -> ApiError {
    match status {
        401 => ApiError::Unauthorized,
        409 => {
            let summary = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error_summary"].as_str().map(str::to_string))
                .unwrap_or_else(|| body.to_string());

            if summary.contains("not_found") {
                ApiError::NotFound(summary)
            } else {
                ApiError::Conflict(summary)
            }
        }
        _ => ApiError::Unexpected {
            status,
            body: body.chars().take(512).collect(),
        },
    }
}

/// Serialize JSON for an HTTP header: DEL and everything outside ASCII
/// becomes `\uXXXX`
pub fn header_safe_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() && c != '\x7f' {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
    out
}
