//! Seam between the web layer and the storage provider's HTTP API.
//!
//! [`FileStorageApi`] is what handlers and the job tracker talk to;
//! [`DropboxClient`] implements it against Dropbox API v2 (or any server
//! speaking the same protocol).

use async_trait::async_trait;
use thiserror::Error;

pub mod client;
pub mod types;

pub use client::DropboxClient;
pub use types::*;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("access token rejected")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Unexpected { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait FileStorageApi: Send + Sync {
    /// Authorization endpoint the browser is sent to for login
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ApiError>;

    /// List every entry of a folder, following pagination cursors
    async fn list_folder(&self, access_token: &str, path: &str) -> Result<Vec<Entry>, ApiError>;

    /// Stream a file's content
    async fn download(&self, access_token: &str, path: &str) -> Result<Download, ApiError>;

    async fn create_folder(&self, access_token: &str, path: &str) -> Result<(), ApiError>;

    /// Move or copy a single entry
    async fn relocate(
        &self,
        access_token: &str,
        kind: Relocation,
        from_path: &str,
        to_path: &str,
    ) -> Result<(), ApiError>;

    async fn delete(&self, access_token: &str, path: &str) -> Result<(), ApiError>;

    /// Queue a multi-entry operation
    async fn launch_batch(
        &self,
        access_token: &str,
        request: &BatchRequest,
    ) -> Result<BatchLaunch, ApiError>;

    /// Poll a queued batch operation
    async fn check_batch(
        &self,
        access_token: &str,
        kind: BatchKind,
        async_job_id: &str,
    ) -> Result<JobStatus, ApiError>;
}
