pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::api::handlers;
use crate::api::middleware::{request_id::request_id_middleware, session::require_session};
use crate::config::AppConfig;
use crate::services::dropbox::FileStorageApi;
use crate::services::jobs::JobTracker;
use axum::{
    Router,
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::entries::list_entries,
        handlers::entries::create_folder,
        handlers::entries::rename_entry,
        handlers::entries::move_entries,
        handlers::entries::copy_entries,
        handlers::entries::delete_entries,
        handlers::entries::job_status,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::EntryResponse,
            handlers::ListingResponse,
            handlers::SelectedItem,
            handlers::CreateFolderRequest,
            handlers::RenameRequest,
            handlers::RelocateRequest,
            handlers::DeleteRequest,
            handlers::OperationResponse,
            services::jobs::JobSnapshot,
            services::jobs::JobState,
            services::dropbox::BatchKind,
            utils::paths::PathElement,
        )
    ),
    tags(
        (name = "entries", description = "Browse and manage files and folders"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn FileStorageApi>,
    pub jobs: Arc<JobTracker>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn FileStorageApi>) -> Self {
        let jobs = Arc::new(JobTracker::new(storage.clone(), &config));
        let cookie_key = api::session::cookie_key(&config.cookie_secret);
        Self {
            config: Arc::new(config),
            storage,
            jobs,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn create_app(state: AppState) -> Router {
    let session_layer = from_fn_with_state(state.clone(), require_session);

    let api_routes = Router::new()
        .route("/entries", get(handlers::entries::list_entries))
        .route("/folders", post(handlers::entries::create_folder))
        .route("/rename", post(handlers::entries::rename_entry))
        .route("/move", post(handlers::entries::move_entries))
        .route("/copy", post(handlers::entries::copy_entries))
        .route("/delete", post(handlers::entries::delete_entries))
        .route("/jobs/:id", get(handlers::entries::job_status))
        .layer(session_layer.clone());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health::health_check))
        .route("/", get(handlers::browse::browse_root))
        .route("/browse/*path", get(handlers::browse::browse_folder))
        .route("/auth", get(handlers::auth::oauth_callback))
        .route("/logout", get(handlers::auth::logout))
        .route(
            "/download",
            get(handlers::download::download_file).layer(session_layer),
        )
        .nest("/api", api_routes)
        .nest_service("/public", ServeDir::new(&state.config.public_dir))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
