//! User JWT authentication extractor.
//!
//! Validates the `Authorization: Bearer <jwt>` header issued by the auth
//! provider and exposes the caller's user id.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use shared::jwt::{extract_user_id, JwtError};
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated user information from the JWT.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the `sub` claim.
    pub user_id: Uuid,
    /// Email claim, when the token carries one.
    pub email: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jwt = state.jwt.as_ref().ok_or_else(|| {
            ApiError::ServiceUnavailable("Authentication is not configured".to_string())
        })?;

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
                })?;

        let claims = jwt.validate_token(bearer.token()).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            match e {
                JwtError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
                _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
            }
        })?;

        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

        Ok(UserAuth {
            user_id,
            email: claims.email,
        })
    }
}
