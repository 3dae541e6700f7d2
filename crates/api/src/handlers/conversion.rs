//! Handlers for the `/me/conversions` resource.
//!
//! The caller is always the talent identified by the access token. Direct
//! conversion never fails the request on reconciliation trouble: issues are
//! returned inside the result body.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use casting_core::conversion::{ConversionResult, ScanResult};
use casting_core::error::CoreError;
use casting_core::lifecycle::RosterStatus;
use casting_core::matching::MatchCriteria;
use casting_core::types::DbId;
use casting_db::models::account::Account;
use casting_db::models::lead_submission::LeadSubmission;
use casting_db::models::membership::Membership;
use casting_db::models::roster_entry::RosterEntry;
use casting_db::repositories::{
    AccountRepo, LeadSubmissionRepo, MembershipRepo, RosterEntryRepo, TalentRecordRepo,
};
use casting_reconcile::TalentIdentity;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireTalent;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /me/conversions/submission`.
#[derive(Debug, Deserialize)]
pub struct ConvertSubmissionRequest {
    pub submission_id: DbId,
}

/// Scan result plus the message shown to the user.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    #[serde(flatten)]
    pub result: ScanResult,
    pub message: String,
}

/// Everything already folded into the caller's account.
#[derive(Debug, Serialize)]
pub struct ConversionHistory {
    pub roster_entries: Vec<RosterEntry>,
    pub submissions: Vec<LeadSubmission>,
    pub memberships: Vec<Membership>,
}

/// Resolve the caller's account and talent record.
async fn resolve_identity(state: &AppState, user: &AuthUser) -> AppResult<(Account, TalentIdentity)> {
    let account = AccountRepo::find_by_id(&state.pool, user.account_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Account",
            id: user.account_id,
        }))?;
    let talent = TalentRecordRepo::find_by_account_id(&state.pool, account.id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TalentRecord",
            id: account.id,
        }))?;
    let identity = TalentIdentity {
        account_id: account.id,
        talent_id: talent.id,
    };
    Ok((account, identity))
}

/// Refuse to convert a submission the caller does not own.
///
/// The submission must match the account under the same rule the scan
/// uses, and so must the roster entry it references while that entry is
/// still active. A missing submission passes through so the engine can
/// report it.
async fn ensure_submission_owned(
    state: &AppState,
    account: &Account,
    submission_id: DbId,
) -> AppResult<()> {
    let Some(submission) = LeadSubmissionRepo::find_by_id(&state.pool, submission_id).await?
    else {
        return Ok(());
    };

    let criteria = MatchCriteria::new(&account.email, account.phone.as_deref())?;
    let not_owned = |what: &str| {
        tracing::warn!(
            account_id = account.id,
            submission_id,
            "Refusing conversion of {what} not matching the caller"
        );
        AppError::Core(CoreError::Forbidden(format!(
            "This {what} does not match your account's contact details"
        )))
    };

    if criteria
        .match_on(submission.email.as_deref(), submission.phone.as_deref())
        .is_none()
    {
        return Err(not_owned("submission"));
    }

    if let Some(roster_entry_id) = submission.roster_entry_id {
        let entry = RosterEntryRepo::find_by_id(&state.pool, roster_entry_id).await?;
        if let Some(entry) = entry.filter(|e| e.status == RosterStatus::Active) {
            if criteria
                .match_on(entry.email.as_deref(), entry.phone.as_deref())
                .is_none()
            {
                return Err(not_owned("roster entry"));
            }
        }
    }

    Ok(())
}

/// POST /api/v1/me/conversions/submission
///
/// 403 when the submission, or the active roster entry it references,
/// belongs to someone else.
pub async fn convert_submission(
    State(state): State<AppState>,
    RequireTalent(user): RequireTalent,
    Json(input): Json<ConvertSubmissionRequest>,
) -> AppResult<Json<DataResponse<ConversionResult>>> {
    let (account, identity) = resolve_identity(&state, &user).await?;
    ensure_submission_owned(&state, &account, input.submission_id).await?;
    let result = state
        .engine
        .convert_from_submission(identity, input.submission_id)
        .await;
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/me/conversions/scan
///
/// Uses the email and phone stored on the account, never caller input.
pub async fn scan(
    State(state): State<AppState>,
    RequireTalent(user): RequireTalent,
) -> AppResult<Json<DataResponse<ScanResponse>>> {
    let (account, identity) = resolve_identity(&state, &user).await?;
    let result = state
        .engine
        .scan_and_convert(identity, &account.email, account.phone.as_deref())
        .await?;
    let message = result.summary_message();
    Ok(Json(DataResponse {
        data: ScanResponse { result, message },
    }))
}

/// GET /api/v1/me/conversions
pub async fn history(
    State(state): State<AppState>,
    RequireTalent(user): RequireTalent,
) -> AppResult<Json<DataResponse<ConversionHistory>>> {
    let (_, identity) = resolve_identity(&state, &user).await?;
    let roster_entries =
        RosterEntryRepo::list_converted_for_talent(&state.pool, identity.talent_id).await?;
    let submissions =
        LeadSubmissionRepo::list_converted_for_talent(&state.pool, identity.talent_id).await?;
    let memberships = MembershipRepo::list_for_talent(&state.pool, identity.talent_id).await?;
    Ok(Json(DataResponse {
        data: ConversionHistory {
            roster_entries,
            submissions,
            memberships,
        },
    }))
}
