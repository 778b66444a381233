use crate::api::error::AppError;
use crate::api::session::Session;
use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::SignedCookieJar;

/// Reject requests without a valid signed access token cookie
pub async fn require_session(
    jar: SignedCookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match Session::from_jar(&jar) {
        Some(session) => {
            req.extensions_mut().insert(session);
            Ok(next.run(req).await)
        }
        None => {
            tracing::warn!("No access token for {}", req.uri().path());
            Err(AppError::Unauthorized("Not signed in".to_string()))
        }
    }
}
