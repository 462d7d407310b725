//! Password accounts and self-service routes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use flow_core::{AccountPatch, AccountView, Session, SignIn, SignUp};
use serde::Serialize;

use super::session_response;
use crate::error::ApiError;
use crate::extract::{ApiJson, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: i64,
}

/// `POST /`
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<SignUp>,
) -> Result<(CookieJar, Json<Session>), ApiError> {
    let session = state.service.sign_up(body).await?;
    Ok(session_response(jar, session))
}

/// `POST /sign_in`
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<SignIn>,
) -> Result<(CookieJar, Json<Session>), ApiError> {
    let session = state.service.sign_in(body).await?;
    Ok(session_response(jar, session))
}

/// `GET /`
pub async fn get_self(
    State(state): State<AppState>,
    CurrentUser(id): CurrentUser,
) -> Result<Json<AccountView>, ApiError> {
    Ok(Json(state.service.get_self(id).await?))
}

/// `PATCH /`
pub async fn update_self(
    State(state): State<AppState>,
    CurrentUser(id): CurrentUser,
    ApiJson(patch): ApiJson<AccountPatch>,
) -> Result<Json<AccountView>, ApiError> {
    Ok(Json(state.service.update_self(id, patch).await?))
}

/// `DELETE /`
pub async fn delete_self(
    State(state): State<AppState>,
    CurrentUser(id): CurrentUser,
) -> Result<StatusCode, ApiError> {
    state.service.delete_self(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /id`
pub async fn get_id(CurrentUser(id): CurrentUser) -> Json<IdResponse> {
    Json(IdResponse { id })
}
