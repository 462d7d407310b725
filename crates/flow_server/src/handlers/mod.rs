//! HTTP handlers.

pub mod account;
pub mod health;
pub mod oauth2;

use axum::Json;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use flow_core::Session;

use crate::extract::TOKEN_COOKIE;

/// Respond with a session, also setting the token cookie.
pub(crate) fn session_response(jar: CookieJar, session: Session) -> (CookieJar, Json<Session>) {
    let cookie = Cookie::build((TOKEN_COOKIE, session.token.clone()))
        .http_only(true)
        .path("/");
    (jar.add(cookie), Json(session))
}
