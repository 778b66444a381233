//! Cookie-backed sessions. The provider access token lives in a signed
//! cookie on the client; nothing is stored server-side.

use axum::response::Redirect;
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use sha2::{Digest, Sha512};
use uuid::Uuid;

use crate::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "dbx_access_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
pub const NOTIFICATION_COOKIE: &str = "notification";

/// Signing key derived from the configured secret (SHA-512 yields the 64
/// bytes the cookie crate requires)
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Authenticated browser session, inserted into request extensions by
/// [`crate::api::middleware::session::require_session`]
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
}

impl Session {
    pub fn from_jar(jar: &SignedCookieJar) -> Option<Self> {
        jar.get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|token| !token.is_empty())
            .map(|access_token| Session { access_token })
    }
}

pub fn session_cookie(access_token: String) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, access_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Flash message shown once by the next page render
pub fn notification_cookie(message: String) -> Cookie<'static> {
    Cookie::build((NOTIFICATION_COOKIE, message)).path("/").build()
}

pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Send the browser to the provider's authorize page, remembering a fresh
/// `state` nonce in a signed cookie
pub fn login_redirect(state: &AppState, jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    let nonce = Uuid::new_v4().simple().to_string();
    let auth_url = state.storage.authorize_url(&nonce);
    tracing::info!("Auth url: {}", auth_url);

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, nonce))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    (jar.add(cookie), Redirect::to(&auth_url))
}
