use crate::AppState;
use crate::api::error::AppError;
use crate::api::session::{
    ACCESS_TOKEN_COOKIE, NOTIFICATION_COOKIE, Session, login_redirect, removal,
};
use crate::api::views::{self, HomePage};
use crate::services::dropbox::{ApiError, Entry};
use crate::utils::paths;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::SignedCookieJar;

pub async fn browse_root(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    render_folder(&state, jar, "").await
}

pub async fn browse_folder(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    render_folder(&state, jar, &path).await
}

/// Folders first, then case-insensitive by name
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

async fn render_folder(
    state: &AppState,
    jar: SignedCookieJar,
    raw_path: &str,
) -> Result<Response, AppError> {
    let Some(session) = Session::from_jar(&jar) else {
        tracing::info!("No access token, redirecting to login");
        return Ok(login_redirect(state, jar).into_response());
    };

    let dirpath = paths::normalize(raw_path);
    tracing::info!("Path: '{}'", dirpath);

    let mut entries = match state
        .storage
        .list_folder(&session.access_token, &dirpath)
        .await
    {
        Ok(entries) => entries,
        Err(ApiError::Unauthorized) => {
            tracing::info!("Access token rejected, starting a new login");
            let jar = jar.remove(removal(ACCESS_TOKEN_COOKIE));
            return Ok(login_redirect(state, jar).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    sort_entries(&mut entries);

    let notification = jar.get(NOTIFICATION_COOKIE).map(|c| c.value().to_string());
    let jar = if notification.is_some() {
        jar.remove(removal(NOTIFICATION_COOKIE))
    } else {
        jar
    };

    let page = HomePage {
        path: &dirpath,
        breadcrumbs: paths::breadcrumbs(&dirpath),
        entries: &entries,
        notification: notification.as_deref(),
    };

    Ok((jar, Html(views::render_home(&page))).into_response())
}
