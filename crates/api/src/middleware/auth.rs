//! Bearer-token identity for talent and studio callers.
//!
//! Tokens are minted by the account service; this crate only checks the
//! signature and expiry and reads the account id and role out of them.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use casting_core::error::CoreError;
use casting_core::types::DbId;
use casting_db::models::account::{ROLE_STUDIO, ROLE_TALENT};

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The account behind the request's Bearer token.
///
/// `account_id` is the token's `sub`. For talent callers it is the account
/// the reconciliation engine converts shadow records onto.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: DbId,
    /// `"talent"` or `"studio"`.
    pub role: String,
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_string()))
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let token = value
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty());

    token.ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let claims = validate_token(token, &state.config.jwt).map_err(|err| {
            tracing::debug!(error = %err, "Rejected access token");
            unauthorized("Invalid or expired token")
        })?;

        // A validly signed token for a role this service does not serve.
        if claims.role != ROLE_TALENT && claims.role != ROLE_STUDIO {
            return Err(unauthorized("Unknown account role"));
        }

        Ok(AuthUser {
            account_id: claims.sub,
            role: claims.role,
        })
    }
}
