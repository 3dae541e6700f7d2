//! Registration-triggered conversion of one lead submission.
//!
//! Runs after the account and talent record already exist. Nothing here
//! may fail registration: every step reports into the [`ConversionResult`]
//! and later steps never undo earlier ones. A link lost here is recovered
//! by the scan path.

use casting_core::conversion::{
    ConversionIssue, ConversionResult, ConversionSource, ConversionStep, RosterOutcome,
    SubmissionOutcome,
};
use casting_core::lifecycle::ConversionCheck;
use casting_core::types::DbId;
use casting_db::models::lead_submission::LeadSubmission;
use casting_db::repositories::LeadSubmissionRepo;

use crate::replay::{replay_roster_entry, replay_submission};
use crate::roster::{convert_entry, EntryConversion};
use crate::{ReconciliationEngine, TalentIdentity};

/// Result of the submission status step.
enum SubmissionStep {
    Converted(LeadSubmission),
    Stop(SubmissionOutcome, Option<ConversionIssue>),
}

impl ReconciliationEngine {
    /// Convert a lead submission (and the roster entry it references) onto
    /// a freshly registered talent.
    ///
    /// Safe to retry: a second call for the same submission finds it
    /// converted and returns a no-op result.
    pub async fn convert_from_submission(
        &self,
        identity: TalentIdentity,
        submission_id: DbId,
    ) -> ConversionResult {
        // 1-2. Lock, validate and convert the submission itself.
        let submission = match self.convert_submission(identity, submission_id).await {
            SubmissionStep::Converted(submission) => submission,
            SubmissionStep::Stop(outcome, issue) => {
                let mut result = ConversionResult::new(submission_id, outcome);
                result.issues.extend(issue);
                return result;
            }
        };

        let mut result = ConversionResult::new(submission_id, SubmissionOutcome::Converted);

        // 3. Convert the referenced roster entry, if still active.
        if let Some(roster_entry_id) = submission.roster_entry_id {
            let outcome = self
                .convert_referenced_entry(identity, roster_entry_id, &mut result)
                .await;
            result.roster_entry = Some(outcome);
        }

        // 4. Membership on the production the submission's code designates.
        let report = replay_submission(self.pool(), identity.talent_id, submission_id).await;
        result.memberships.extend(report.memberships);
        result.issues.extend(report.issues);

        tracing::info!(
            submission_id,
            talent_id = identity.talent_id,
            account_id = identity.account_id,
            roster_entry = ?result.roster_entry,
            memberships_created = result.memberships_created(),
            issues = result.issues.len(),
            "Lead submission converted"
        );
        result
    }

    async fn convert_submission(
        &self,
        identity: TalentIdentity,
        submission_id: DbId,
    ) -> SubmissionStep {
        let source = Some(ConversionSource::LeadSubmission(submission_id));
        let failed = |step: ConversionStep, err: sqlx::Error| {
            tracing::error!(submission_id, error = %err, ?step, "Submission conversion step failed");
            SubmissionStep::Stop(
                SubmissionOutcome::Failed,
                Some(ConversionIssue::StepFailed {
                    step,
                    source,
                    message: err.to_string(),
                }),
            )
        };

        let mut tx = match self.pool().begin().await {
            Ok(tx) => tx,
            Err(err) => return failed(ConversionStep::LoadSubmission, err),
        };

        let submission = match LeadSubmissionRepo::lock_for_update(&mut tx, submission_id).await {
            Ok(Some(submission)) => submission,
            Ok(None) => {
                tracing::warn!(submission_id, "Lead submission not found; nothing to convert");
                return SubmissionStep::Stop(
                    SubmissionOutcome::NotFound,
                    Some(ConversionIssue::NotFound {
                        entity: "LeadSubmission",
                        id: submission_id,
                    }),
                );
            }
            Err(err) => return failed(ConversionStep::LoadSubmission, err),
        };

        match submission.status.conversion_check() {
            ConversionCheck::Proceed => {}
            ConversionCheck::AlreadyConverted => {
                if submission.converted_talent_id != Some(identity.talent_id) {
                    tracing::warn!(
                        submission_id,
                        converted_talent_id = ?submission.converted_talent_id,
                        "Lead submission already converted to a different talent"
                    );
                } else {
                    tracing::debug!(submission_id, "Lead submission already converted");
                }
                return SubmissionStep::Stop(SubmissionOutcome::AlreadyConverted, None);
            }
            ConversionCheck::Refused => {
                tracing::warn!(
                    submission_id,
                    status = %submission.status,
                    "Refusing to convert lead submission in terminal state"
                );
                return SubmissionStep::Stop(
                    SubmissionOutcome::Refused,
                    Some(ConversionIssue::TerminalStateConflict {
                        submission_id,
                        status: submission.status,
                    }),
                );
            }
        }

        let converted = match LeadSubmissionRepo::mark_converted(
            &mut tx,
            submission_id,
            identity.talent_id,
            identity.account_id,
        )
        .await
        {
            Ok(converted) => converted,
            Err(err) => return failed(ConversionStep::ConvertSubmission, err),
        };

        if let Err(err) = tx.commit().await {
            return failed(ConversionStep::ConvertSubmission, err);
        }

        match converted {
            Some(submission) => SubmissionStep::Converted(submission),
            // Unreachable while the row lock is held; treated like a lost race.
            None => SubmissionStep::Stop(SubmissionOutcome::AlreadyConverted, None),
        }
    }

    async fn convert_referenced_entry(
        &self,
        identity: TalentIdentity,
        roster_entry_id: DbId,
        result: &mut ConversionResult,
    ) -> RosterOutcome {
        match convert_entry(self.pool(), identity, roster_entry_id).await {
            Ok(EntryConversion::Converted(entry)) => {
                let report = replay_roster_entry(self.pool(), identity.talent_id, entry.id).await;
                let memberships_created = report.memberships_created();
                result.memberships.extend(report.memberships);
                result.issues.extend(report.issues);
                RosterOutcome::Converted {
                    roster_entry_id,
                    memberships_created,
                }
            }
            Ok(EntryConversion::AlreadyConverted) => {
                tracing::debug!(roster_entry_id, "Referenced roster entry already converted; skipping");
                RosterOutcome::AlreadyConverted { roster_entry_id }
            }
            Ok(EntryConversion::NotFound) => {
                tracing::warn!(roster_entry_id, "Referenced roster entry not found");
                result.issues.push(ConversionIssue::NotFound {
                    entity: "RosterEntry",
                    id: roster_entry_id,
                });
                RosterOutcome::NotFound { roster_entry_id }
            }
            Err(err) => {
                tracing::error!(roster_entry_id, error = %err, "Roster entry conversion failed");
                result.issues.push(ConversionIssue::StepFailed {
                    step: ConversionStep::ConvertRosterEntry,
                    source: Some(ConversionSource::RosterEntry(roster_entry_id)),
                    message: err.to_string(),
                });
                RosterOutcome::Failed { roster_entry_id }
            }
        }
    }
}
