//! Handlers for lead submissions: guest intake through a shareable code and
//! studio review.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;
use casting_core::error::CoreError;
use casting_core::matching::MatchCriteria;
use casting_core::types::DbId;
use casting_db::models::lead_submission::{CreateLeadSubmission, LeadSubmission, ReviewSubmission};
use casting_db::repositories::{LeadSubmissionRepo, RosterEntryRepo, ShareableCodeRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStudio;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/codes/{code}/submissions
///
/// Unauthenticated. When the guest's contact details match an active
/// roster entry of the code's studio, the submission references it so the
/// entry converts together with the submission at registration.
pub async fn submit(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<CreateLeadSubmission>,
) -> AppResult<(StatusCode, Json<DataResponse<LeadSubmission>>)> {
    input.validate()?;

    let code = ShareableCodeRepo::find_by_code(&state.pool, code.trim())
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| AppError::Core(CoreError::Validation("Unknown or inactive code".into())))?;

    let roster_entry_id = recognize_roster_entry(&state, code.studio_id, &input).await?;

    let submission =
        LeadSubmissionRepo::create(&state.pool, code.id, roster_entry_id, &input).await?;
    tracing::info!(
        submission_id = submission.id,
        studio_id = code.studio_id,
        roster_entry_id = ?roster_entry_id,
        "Lead submission received"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: submission })))
}

/// First active roster entry of the studio matching the guest's contact details.
async fn recognize_roster_entry(
    state: &AppState,
    studio_id: DbId,
    input: &CreateLeadSubmission,
) -> AppResult<Option<DbId>> {
    let Some(email) = input.email.as_deref() else {
        return Ok(None);
    };
    let Ok(criteria) = MatchCriteria::new(email, input.phone.as_deref()) else {
        return Ok(None);
    };
    let matches =
        RosterEntryRepo::find_active_matches_in_studio(&state.pool, studio_id, &criteria).await?;
    if matches.len() > 1 {
        tracing::debug!(
            studio_id,
            candidates = matches.len(),
            "Several roster entries match submission; using the oldest"
        );
    }
    Ok(matches.first().map(|entry| entry.id))
}

/// POST /api/v1/submissions/{id}/review
///
/// 409 once the submission has been converted.
pub async fn review(
    State(state): State<AppState>,
    RequireStudio(_user): RequireStudio,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewSubmission>,
) -> AppResult<Json<DataResponse<LeadSubmission>>> {
    let submission = LeadSubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "LeadSubmission",
            id,
        }))?;
    let target = submission.status.review(input.decision)?;

    // Guarded update: loses cleanly to a conversion that landed in between.
    let updated = LeadSubmissionRepo::set_review_status(&state.pool, id, target)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Submission was converted while being reviewed".into(),
            ))
        })?;
    tracing::info!(submission_id = id, status = %updated.status, "Lead submission reviewed");
    Ok(Json(DataResponse { data: updated }))
}
