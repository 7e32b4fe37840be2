use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    identity::{resolve_identity, Identity},
    jwt::TokenError,
};
use crate::{
    error::{AdminError, AppError},
    state::AppState,
};

/// Verifies the bearer token and resolves the caller. The identity is cached in
/// request extensions so later extractors reuse it.
pub struct CurrentUser(pub Identity);

/// An identity already resolved by [`CurrentUser`] that also holds the admin role.
pub struct AdminUser(pub Identity);

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let no_token = || AppError::Unauthenticated("Access denied. No token provided".into());
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(no_token)?;
    let token = header.strip_prefix("Bearer ").ok_or_else(no_token)?.trim();
    if token.is_empty() {
        return Err(no_token());
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(CurrentUser(identity.clone()));
        }

        let token = bearer_token(&parts.headers)?;
        let claims = state.keys.verify(token).map_err(|e| match e {
            TokenError::Expired => {
                warn!("expired token");
                AppError::Unauthenticated("Token expired".into())
            }
            TokenError::Invalid(err) => {
                warn!(error = %err, "invalid token");
                AppError::Unauthenticated("Invalid token".into())
            }
        })?;

        let identity = resolve_identity(state.accounts.as_ref(), claims).await?;
        parts.extensions.insert(identity.clone());
        Ok(CurrentUser(identity))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            warn!(subject = %identity.subject(), role = %identity.role(), "admin route refused");
            return Err(AppError::Forbidden("Access denied. Admin privileges required".into()).into());
        }
        Ok(AdminUser(identity))
    }
}
