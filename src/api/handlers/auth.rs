use crate::AppState;
use crate::api::error::AppError;
use crate::api::session::{
    ACCESS_TOKEN_COOKIE, OAUTH_STATE_COOKIE, removal, session_cookie,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth2 redirect target: trade the authorization code for an access
/// token and keep it in the signed session cookie
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(params): Query<AuthCallbackQuery>,
) -> Result<Response, AppError> {
    tracing::info!("🔐 Auth callback from OAuth provider");

    if let Some(error) = params.error {
        let reason = params.error_description.unwrap_or(error);
        tracing::warn!("Authorization was not granted: {}", reason);
        return Err(AppError::BadRequest(format!(
            "Authorization was not granted: {}",
            reason
        )));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => {
            tracing::warn!("OAuth state mismatch, rejecting callback");
            return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
        }
    }

    let grant = match state.storage.exchange_code(&code).await {
        Ok(grant) => grant,
        Err(e) => {
            tracing::error!("Error getting token from code: {}", e);
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error getting token from code",
            )
                .into_response());
        }
    };

    tracing::info!(
        "Got token response (type: {}, account: {})",
        grant.token_type.as_deref().unwrap_or("bearer"),
        grant.account_id.as_deref().unwrap_or("unknown")
    );

    let jar = jar
        .remove(removal(OAUTH_STATE_COOKIE))
        .add(session_cookie(grant.access_token));

    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    tracing::info!("Clearing access token cookie");
    (jar.remove(removal(ACCESS_TOKEN_COOKIE)), Redirect::to("/"))
}
