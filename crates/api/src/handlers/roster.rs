//! Handlers for studio roster management.
//!
//! - `/studios/{studio_id}/roster[/import]`
//! - `/roster/{entry_id}[/productions]`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use casting_core::error::CoreError;
use casting_core::lifecycle::RosterStatus;
use casting_core::types::DbId;
use casting_db::models::roster_entry::{
    CreateRosterEntry, CreateRosterEntryProduction, RosterEntry, RosterEntryProduction,
    UpdateRosterEntry,
};
use casting_db::repositories::{ProductionRepo, RosterEntryRepo, StudioRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStudio;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /studios/{studio_id}/roster`.
#[derive(Debug, Deserialize)]
pub struct RosterListParams {
    pub status: Option<RosterStatus>,
}

/// Request body for the bulk import endpoint.
#[derive(Debug, Deserialize)]
pub struct ImportRosterRequest {
    pub entries: Vec<CreateRosterEntry>,
}

/// Outcome of one import row. `row` is the zero-based position in the request.
#[derive(Debug, Serialize)]
pub struct ImportRowResult {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster_entry_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportRosterResponse {
    pub created: usize,
    pub failed: usize,
    pub rows: Vec<ImportRowResult>,
}

async fn ensure_studio(state: &AppState, studio_id: DbId) -> AppResult<()> {
    StudioRepo::find_by_id(&state.pool, studio_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Studio",
            id: studio_id,
        }))?;
    Ok(())
}

/// POST /api/v1/studios/{studio_id}/roster
pub async fn create(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(studio_id): Path<DbId>,
    Json(input): Json<CreateRosterEntry>,
) -> AppResult<(StatusCode, Json<DataResponse<RosterEntry>>)> {
    input.validate()?;
    ensure_studio(&state, studio_id).await?;
    let entry = RosterEntryRepo::create(&state.pool, studio_id, &input).await?;
    tracing::info!(roster_entry_id = entry.id, studio_id, "Roster entry created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// POST /api/v1/studios/{studio_id}/roster/import
///
/// Rows are validated and inserted independently; one bad row does not
/// reject the batch.
pub async fn import(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(studio_id): Path<DbId>,
    Json(input): Json<ImportRosterRequest>,
) -> AppResult<Json<DataResponse<ImportRosterResponse>>> {
    if input.entries.is_empty() {
        return Err(AppError::BadRequest("No roster entries to import".into()));
    }
    ensure_studio(&state, studio_id).await?;

    let mut rows = Vec::with_capacity(input.entries.len());
    for (row, entry) in input.entries.iter().enumerate() {
        if let Err(errors) = entry.validate() {
            rows.push(ImportRowResult {
                row,
                roster_entry_id: None,
                error: Some(errors.to_string()),
            });
            continue;
        }
        match RosterEntryRepo::create(&state.pool, studio_id, entry).await {
            Ok(created) => rows.push(ImportRowResult {
                row,
                roster_entry_id: Some(created.id),
                error: None,
            }),
            Err(err) => {
                tracing::warn!(studio_id, row, error = %err, "Roster import row failed");
                rows.push(ImportRowResult {
                    row,
                    roster_entry_id: None,
                    error: Some("Could not store roster entry".to_string()),
                });
            }
        }
    }

    let created = rows.iter().filter(|r| r.roster_entry_id.is_some()).count();
    let failed = rows.len() - created;
    tracing::info!(studio_id, created, failed, "Roster import finished");

    Ok(Json(DataResponse {
        data: ImportRosterResponse {
            created,
            failed,
            rows,
        },
    }))
}

/// GET /api/v1/studios/{studio_id}/roster
pub async fn list(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(studio_id): Path<DbId>,
    Query(params): Query<RosterListParams>,
) -> AppResult<Json<DataResponse<Vec<RosterEntry>>>> {
    let entries = RosterEntryRepo::list_for_studio(&state.pool, studio_id, params.status).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// PUT /api/v1/roster/{entry_id}
pub async fn update(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(entry_id): Path<DbId>,
    Json(input): Json<UpdateRosterEntry>,
) -> AppResult<Json<DataResponse<RosterEntry>>> {
    input.validate()?;
    let entry = RosterEntryRepo::update(&state.pool, entry_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "RosterEntry",
            id: entry_id,
        }))?;
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/roster/{entry_id}/productions
///
/// 409 when the entry is already associated with the production.
pub async fn add_production(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(entry_id): Path<DbId>,
    Json(input): Json<CreateRosterEntryProduction>,
) -> AppResult<(StatusCode, Json<DataResponse<RosterEntryProduction>>)> {
    let entry = RosterEntryRepo::find_by_id(&state.pool, entry_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "RosterEntry",
            id: entry_id,
        }))?;
    let production = ProductionRepo::find_by_id(&state.pool, input.production_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Production",
            id: input.production_id,
        }))?;
    if production.studio_id != entry.studio_id {
        return Err(AppError::Core(CoreError::Validation(
            "Production belongs to a different studio".into(),
        )));
    }

    let link = RosterEntryRepo::add_production(&state.pool, entry_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: link })))
}
