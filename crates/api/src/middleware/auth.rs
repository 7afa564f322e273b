//! Bearer token authentication and role extractors.
//!
//! Guards compose in order: [`AuthUser`] verifies the token, then
//! [`AdminUser`] checks the role it carries. Both reject before any handler
//! runs.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use shopfront_core::{Role, UserId};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// The caller identified by a verified bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
    pub role: Role,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<Self>() {
            return Ok(*user);
        }

        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))?;

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized("Token is not valid".to_string())
        })?;

        let user = Self {
            id: claims.sub,
            role: claims.role,
        };
        set_sentry_user(&user.id);
        parts.extensions.insert(user);

        Ok(user)
    }
}

/// An authenticated caller whose token carries the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden(
                "Admin resource. Access denied.".to_string(),
            ));
        }
        Ok(Self(user))
    }
}
