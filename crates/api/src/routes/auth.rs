//! Authentication route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::extract::ApiJson;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::User;
use crate::state::AppState;

/// Registration request body.
///
/// Missing fields deserialize as empty so they fail validation with a
/// field-specific message.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Issued bearer token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /api/auth/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Json<TokenResponse>> {
    let token = state
        .auth()
        .register(&body.name, &body.email, &body.password, body.role.as_deref())
        .await?;
    Ok(Json(TokenResponse { token }))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let token = state.auth().login(&body.email, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}

/// `GET /api/auth/me`
#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>> {
    Ok(Json(state.auth().current_user(user.id).await?))
}
