//! Role extractors wrapping [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use casting_core::error::CoreError;
use casting_db::models::account::{ROLE_STUDIO, ROLE_TALENT};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `talent` role. Rejects with 403 otherwise.
pub struct RequireTalent(pub AuthUser);

impl FromRequestParts<AppState> for RequireTalent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_TALENT {
            return Err(AppError::Core(CoreError::Forbidden(
                "Talent role required".into(),
            )));
        }
        Ok(RequireTalent(user))
    }
}

/// Requires the `studio` role. Rejects with 403 otherwise.
pub struct RequireStudio(pub AuthUser);

impl FromRequestParts<AppState> for RequireStudio {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_STUDIO {
            return Err(AppError::Core(CoreError::Forbidden(
                "Studio role required".into(),
            )));
        }
        Ok(RequireStudio(user))
    }
}
