//! OAuth2 provider routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use flow_core::{LinkView, OAuth2Grant, OAuth2Registration, Session};

use super::session_response;
use crate::error::ApiError;
use crate::extract::{ApiJson, CurrentUser};
use crate::state::AppState;

/// `POST /{provider}/register`
pub async fn register(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    ApiJson(body): ApiJson<OAuth2Registration>,
) -> Result<(CookieJar, Json<Session>), ApiError> {
    let session = state.service.oauth2_register(&provider, body).await?;
    Ok(session_response(jar, session))
}

/// `POST /{provider}/connect`
pub async fn connect(
    State(state): State<AppState>,
    CurrentUser(id): CurrentUser,
    Path(provider): Path<String>,
    jar: CookieJar,
    ApiJson(grant): ApiJson<OAuth2Grant>,
) -> Result<(CookieJar, Json<Session>), ApiError> {
    let session = state.service.oauth2_connect(id, &provider, grant).await?;
    Ok(session_response(jar, session))
}

/// `POST /{provider}/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    CurrentUser(id): CurrentUser,
    Path(provider): Path<String>,
) -> Result<Json<LinkView>, ApiError> {
    Ok(Json(state.service.oauth2_refresh(id, &provider).await?))
}

/// `DELETE /{provider}`
pub async fn disconnect(
    State(state): State<AppState>,
    CurrentUser(id): CurrentUser,
    Path(provider): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.oauth2_disconnect(id, &provider).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /connections`
pub async fn connections(
    State(state): State<AppState>,
    CurrentUser(id): CurrentUser,
) -> Result<Json<Vec<LinkView>>, ApiError> {
    Ok(Json(state.service.connections(id).await?))
}
