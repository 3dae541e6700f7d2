//! Handlers for studio-side production membership assignment.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use casting_core::conversion::membership_role;
use casting_core::error::CoreError;
use casting_core::types::DbId;
use casting_db::models::membership::{CreateMembership, Membership};
use casting_db::repositories::{MembershipRepo, ProductionRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStudio;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/productions/{production_id}/memberships
///
/// 409 when the talent is already a member.
pub async fn create(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(production_id): Path<DbId>,
    Json(input): Json<CreateMembership>,
) -> AppResult<(StatusCode, Json<DataResponse<Membership>>)> {
    ProductionRepo::find_by_id(&state.pool, production_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Production",
            id: production_id,
        }))?;

    let role = membership_role(input.role.as_deref());
    let membership = MembershipRepo::create(&state.pool, production_id, &input, &role).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: membership })))
}

/// GET /api/v1/productions/{production_id}/memberships
pub async fn list(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(production_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Membership>>>> {
    let memberships = MembershipRepo::list_for_production(&state.pool, production_id).await?;
    Ok(Json(DataResponse { data: memberships }))
}

/// DELETE /api/v1/productions/{production_id}/memberships/{talent_id}
///
/// A removed membership stays removed: later scans do not replay it again.
pub async fn delete(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path((production_id, talent_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if MembershipRepo::delete(&state.pool, production_id, talent_id).await? {
        tracing::info!(production_id, talent_id, "Membership removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Membership",
            id: talent_id,
        }))
    }
}
