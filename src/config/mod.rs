use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

const DROPBOX_AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";
const DROPBOX_TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
const DROPBOX_API_BASE: &str = "https://api.dropboxapi.com/2/";
const DROPBOX_CONTENT_BASE: &str = "https://content.dropboxapi.com/2/";

/// Runtime configuration for the file manager
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server listens on (default: 3000)
    pub port: u16,

    /// OAuth app key
    pub client_id: String,

    /// OAuth app secret
    pub client_secret: String,

    /// Redirect URI registered with the provider, must point at `/auth`
    pub redirect_url: String,

    /// Provider authorization endpoint
    pub oauth_authorize_url: String,

    /// Provider token endpoint
    pub oauth_token_url: String,

    /// RPC endpoint base (always ends with `/`)
    pub api_base: String,

    /// Content (download) endpoint base (always ends with `/`)
    pub content_base: String,

    /// Secret the session cookies are signed with
    pub cookie_secret: String,

    /// Delay between two batch job status checks (default: 1000 ms)
    pub job_poll_interval_ms: u64,

    /// Status checks before a batch job is declared failed (default: 600)
    pub job_max_polls: u32,

    /// How long finished jobs stay queryable (default: 1 hour)
    pub job_retention_secs: u64,

    /// Timeout applied to every provider request (default: 30 s)
    pub request_timeout_secs: u64,

    /// Directory served under `/public` (default: `public`)
    pub public_dir: String,

    /// Human readable origin of this configuration, logged at startup
    pub config_details: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: "http://localhost:3000/auth".to_string(),
            oauth_authorize_url: DROPBOX_AUTHORIZE_URL.to_string(),
            oauth_token_url: DROPBOX_TOKEN_URL.to_string(),
            api_base: DROPBOX_API_BASE.to_string(),
            content_base: DROPBOX_CONTENT_BASE.to_string(),
            cookie_secret: "cookie_secret_420".to_string(),
            job_poll_interval_ms: 1000,
            job_max_polls: 600,
            job_retention_secs: 3600,
            request_timeout_secs: 30,
            public_dir: "public".to_string(),
            config_details: "defaults".to_string(),
        }
    }
}

/// Settings as they appear in a JSON config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConfigFile {
    pub port: Option<u16>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub oauth_base: Option<String>,
    pub api_base: Option<String>,
    pub content_base: Option<String>,
    pub cookie_secret: Option<String>,
    pub job_poll_interval_ms: Option<u64>,
    pub job_max_polls: Option<u32>,
    pub job_retention_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub public_dir: Option<String>,
}

/// Values given on the command line; they win over everything else
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub port: Option<u16>,
}

impl AppConfig {
    /// Load configuration: defaults, then the optional JSON file, then
    /// environment variables, then command line overrides.
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();
        let mut sources = vec!["defaults".to_string()];

        if let Some(path) = config_path {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let file: ConfigFile = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            config.apply(file);
            sources.push(format!("file {}", path.display()));
        }

        config.apply(ConfigFile::from_env());
        sources.push("environment".to_string());

        if let Some(port) = overrides.port {
            config.port = port;
            sources.push("command line".to_string());
        }

        config.config_details = sources.join(" + ");
        Ok(config)
    }

    /// Merge every value present in `file` into this configuration
    pub fn apply(&mut self, file: ConfigFile) {
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(v) = file.client_id {
            self.client_id = v;
        }
        if let Some(v) = file.client_secret {
            self.client_secret = v;
        }
        if let Some(v) = file.redirect_url {
            self.redirect_url = v;
        }
        if let Some(base) = file.oauth_base {
            let base = with_trailing_slash(&base);
            self.oauth_authorize_url = format!("{}authorize", base);
            self.oauth_token_url = format!("{}token", base);
        }
        if let Some(v) = file.api_base {
            self.api_base = with_trailing_slash(&v);
        }
        if let Some(v) = file.content_base {
            self.content_base = with_trailing_slash(&v);
        }
        if let Some(v) = file.cookie_secret {
            self.cookie_secret = v;
        }
        if let Some(v) = file.job_poll_interval_ms {
            self.job_poll_interval_ms = v;
        }
        if let Some(v) = file.job_max_polls {
            self.job_max_polls = v;
        }
        if let Some(v) = file.job_retention_secs {
            self.job_retention_secs = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.public_dir {
            self.public_dir = v;
        }
    }

    /// Create config for tests and local development (fast job polling)
    pub fn development() -> Self {
        Self {
            client_id: "dev_client".to_string(),
            client_secret: "dev_secret".to_string(),
            cookie_secret: "development_cookie_secret".to_string(),
            job_poll_interval_ms: 10,
            job_max_polls: 50,
            config_details: "development".to_string(),
            ..Self::default()
        }
    }
}

impl ConfigFile {
    /// Read the same keys from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()),
            client_id: env::var("CLIENT_ID").ok(),
            client_secret: env::var("CLIENT_SECRET").ok(),
            redirect_url: env::var("REDIRECT_URL").ok(),
            oauth_base: env::var("OAUTH_BASE").ok(),
            api_base: env::var("API_BASE").ok(),
            content_base: env::var("CONTENT_BASE").ok(),
            cookie_secret: env::var("COOKIE_SECRET").ok(),
            job_poll_interval_ms: env::var("JOB_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            job_max_polls: env::var("JOB_MAX_POLLS").ok().and_then(|v| v.parse().ok()),
            job_retention_secs: env::var("JOB_RETENTION_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
            public_dir: env::var("PUBLIC_DIR").ok(),
        }
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
