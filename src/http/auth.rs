use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderName;

use crate::app::auth::{AuthService, AuthSession};
use crate::http::AppError;
use crate::AppState;

/// Authenticated caller, extracted from `Authorization: Bearer` or the
/// legacy `x-auth-token` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub session: AuthSession,
}

const AUTH_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-auth-token");

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        {
            Some(auth_header) => auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?,
            None => parts
                .headers
                .get(AUTH_TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| AppError::unauthorized("no token, authorization denied"))?,
        };

        let service = AuthService::new(state.paseto_access_key, state.access_ttl_minutes);
        let session = service.authenticate_access_token(token).map_err(|err| {
            tracing::error!(error = ?err, "failed to authenticate");
            AppError::internal("failed to authenticate")
        })?;

        let session = session.ok_or_else(|| AppError::unauthorized("token is not valid"))?;
        Ok(AuthUser { session })
    }
}
