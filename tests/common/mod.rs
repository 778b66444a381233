#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use bytes::Bytes;
use cloudstash_ux::config::AppConfig;
use cloudstash_ux::services::dropbox::{
    ApiError, BatchEntryResult, BatchKind, BatchLaunch, BatchRequest, Download, Entry, EntryTag,
    FileStorageApi, JobStatus, Relocation, TokenGrant,
};
use cloudstash_ux::{AppState, create_app};
use futures::StreamExt;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const GOOD_CODE: &str = "good-code";
pub const ACCESS_TOKEN: &str = "token-abc";
pub const EXPIRED_TOKEN: &str = "token-expired";

/// Provider double: serves a fixed tree and records every mutating call
#[derive(Default)]
pub struct MockStorage {
    pub calls: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<BatchRequest>>,
    pub checks: Mutex<Vec<BatchKind>>,
    /// Tokens handed out by `exchange_code`, in order
    pub grants: Mutex<Vec<String>>,
}

impl MockStorage {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_token(&self, access_token: &str) -> Result<(), ApiError> {
        if access_token == EXPIRED_TOKEN || access_token.is_empty() {
            Err(ApiError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

fn entry(tag: EntryTag, path: &str, size: Option<u64>) -> Entry {
    Entry {
        tag,
        name: path.rsplit('/').next().unwrap_or_default().to_string(),
        path_lower: Some(path.to_lowercase()),
        path_display: Some(path.to_string()),
        id: Some(format!("id:{}", path)),
        size,
        server_modified: size.map(|_| "2024-05-01T10:00:00Z".to_string()),
    }
}

#[async_trait]
impl FileStorageApi for MockStorage {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "http://provider.test/oauth2/authorize?response_type=code&client_id=dev_client&state={}",
            state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ApiError> {
        if code != GOOD_CODE {
            return Err(ApiError::Unexpected {
                status: 400,
                body: "invalid_grant".to_string(),
            });
        }
        let token = self
            .grants
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| ACCESS_TOKEN.to_string());
        Ok(TokenGrant {
            access_token: token,
            token_type: Some("bearer".to_string()),
            account_id: Some("dbid:test".to_string()),
            uid: Some("1".to_string()),
        })
    }

    async fn list_folder(&self, access_token: &str, path: &str) -> Result<Vec<Entry>, ApiError> {
        self.check_token(access_token)?;
        match path {
            "" => Ok(vec![
                entry(EntryTag::File, "/notes.txt", Some(12)),
                entry(EntryTag::Folder, "/Photos", None),
                entry(EntryTag::File, "/Budget.xlsx", Some(2048)),
                entry(EntryTag::Folder, "/archive", None),
            ]),
            "/Photos" => Ok(vec![entry(EntryTag::File, "/Photos/beach & sun.jpg", Some(4096))]),
            "/Photos/2024 trip" => Ok(vec![]),
            _ => Err(ApiError::NotFound(format!("path/not_found/.. ({})", path))),
        }
    }

    async fn download(&self, access_token: &str, path: &str) -> Result<Download, ApiError> {
        self.check_token(access_token)?;
        if path != "/Photos/beach & sun.jpg" {
            return Err(ApiError::NotFound("path/not_found/".to_string()));
        }
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        Ok(Download {
            name: "beach & sun.jpg".to_string(),
            size: Some(11),
            stream: futures::stream::iter(chunks).boxed(),
        })
    }

    async fn create_folder(&self, access_token: &str, path: &str) -> Result<(), ApiError> {
        self.check_token(access_token)?;
        if path == "/Photos" {
            return Err(ApiError::Conflict("path/conflict/folder/".to_string()));
        }
        self.record(format!("create_folder {}", path));
        Ok(())
    }

    async fn relocate(
        &self,
        access_token: &str,
        kind: Relocation,
        from_path: &str,
        to_path: &str,
    ) -> Result<(), ApiError> {
        self.check_token(access_token)?;
        let op = match kind {
            Relocation::Move => "move",
            Relocation::Copy => "copy",
        };
        self.record(format!("{} {} -> {}", op, from_path, to_path));
        Ok(())
    }

    async fn delete(&self, access_token: &str, path: &str) -> Result<(), ApiError> {
        self.check_token(access_token)?;
        self.record(format!("delete {}", path));
        Ok(())
    }

    async fn launch_batch(
        &self,
        access_token: &str,
        request: &BatchRequest,
    ) -> Result<BatchLaunch, ApiError> {
        self.check_token(access_token)?;
        self.batches.lock().unwrap().push(request.clone());
        Ok(BatchLaunch::AsyncJobId {
            async_job_id: format!("dbjid:{}", request.kind().as_str()),
        })
    }

    async fn check_batch(
        &self,
        access_token: &str,
        kind: BatchKind,
        async_job_id: &str,
    ) -> Result<JobStatus, ApiError> {
        self.check_token(access_token)?;
        assert_eq!(async_job_id, format!("dbjid:{}", kind.as_str()));

        let mut checks = self.checks.lock().unwrap();
        checks.push(kind);
        if checks.len() < 2 {
            return Ok(JobStatus::InProgress);
        }

        let size = self
            .batches
            .lock()
            .unwrap()
            .last()
            .map(|b| b.len())
            .unwrap_or(0);
        Ok(JobStatus::Complete {
            entries: vec![BatchEntryResult::Success; size],
        })
    }
}

pub fn setup_app() -> (Router, Arc<MockStorage>) {
    let storage = Arc::new(MockStorage::default());
    let state = AppState::new(AppConfig::development(), storage.clone());
    (create_app(state), storage)
}

/// Minimal browser cookie store
#[derive(Default, Clone)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    pub fn absorb(&mut self, response: &Response<Body>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if raw.contains("Max-Age=0") || value.is_empty() {
                self.0.remove(name);
            } else {
                self.0.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn header(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn set_cookie_names(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| {
            let raw = v.to_str().unwrap();
            raw.split('=').next().unwrap().to_string()
        })
        .collect()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

pub fn state_param(location: &str) -> String {
    let url = url::Url::parse(location).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

pub async fn send(app: &Router, cookies: &mut Cookies, request: Request<Body>) -> Response<Body> {
    let (mut parts, body) = request.into_parts();
    if !cookies.0.is_empty() {
        parts
            .headers
            .insert(header::COOKIE, cookies.header().parse().unwrap());
    }
    let response = app
        .clone()
        .oneshot(Request::from_parts(parts, body))
        .await
        .unwrap();
    cookies.absorb(&response);
    response
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Run the full OAuth round trip and return the resulting cookie store
pub async fn login(app: &Router) -> Cookies {
    let mut cookies = Cookies::default();

    let response = send(app, &mut cookies, get("/")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let state = state_param(&location(&response));

    let response = send(
        app,
        &mut cookies,
        get(&format!("/auth?code={}&state={}", GOOD_CODE, state)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(cookies.contains("dbx_access_token"));
    assert!(!cookies.contains("oauth_state"));

    cookies
}
