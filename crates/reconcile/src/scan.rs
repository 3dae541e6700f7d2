//! Sign-in / on-demand conversion of every matching roster entry.

use std::collections::HashSet;

use casting_core::conversion::{
    ConversionIssue, ConversionSource, ConversionStep, RepairDetail, ScanEntryDetail, ScanResult,
};
use casting_core::matching::MatchCriteria;
use casting_core::types::DbId;
use casting_db::repositories::{LeadSubmissionRepo, RosterEntryRepo};

use crate::error::ReconcileError;
use crate::matching::find_candidates;
use crate::replay::{replay_roster_entry, replay_submission, ReplayReport};
use crate::roster::{convert_entry, EntryConversion};
use crate::{ReconciliationEngine, TalentIdentity};

impl ReconciliationEngine {
    /// Convert every active roster entry, in any studio, matching the
    /// account's contact details, then finish any membership replay a
    /// previous run left incomplete.
    ///
    /// Only the candidate lookup can fail the call. Each entry is converted
    /// in its own transaction; an entry another caller converted first is
    /// reported in [`ScanResult::skipped`].
    pub async fn scan_and_convert(
        &self,
        identity: TalentIdentity,
        email: &str,
        phone: Option<&str>,
    ) -> Result<ScanResult, ReconcileError> {
        let criteria = MatchCriteria::new(email, phone)?;
        let candidates = find_candidates(self.pool(), &criteria).await?;

        tracing::debug!(
            talent_id = identity.talent_id,
            candidates = candidates.len(),
            phone_matching = criteria.phone().is_some(),
            "Scanning for matching roster entries"
        );

        let mut result = ScanResult::default();
        let mut handled: HashSet<DbId> = HashSet::new();

        for candidate in candidates {
            let entry = &candidate.roster.entry;
            handled.insert(entry.id);

            match convert_entry(self.pool(), identity, entry.id).await {
                Ok(EntryConversion::Converted(converted)) => {
                    let report =
                        replay_roster_entry(self.pool(), identity.talent_id, converted.id).await;
                    result.converted_count += 1;
                    result.entries.push(ScanEntryDetail {
                        roster_entry_id: converted.id,
                        studio_id: converted.studio_id,
                        studio_name: candidate.roster.studio_name.clone(),
                        matched_by: candidate.matched_by,
                        productions_replayed: report.productions,
                        memberships_created: report.memberships_created(),
                    });
                    result.issues.extend(report.issues);
                }
                Ok(EntryConversion::AlreadyConverted) | Ok(EntryConversion::NotFound) => {
                    tracing::debug!(
                        roster_entry_id = entry.id,
                        "Matched roster entry converted by another caller; skipping"
                    );
                    result.skipped.push(entry.id);
                }
                Err(err) => {
                    tracing::error!(
                        roster_entry_id = entry.id,
                        error = %err,
                        "Roster entry conversion failed during scan"
                    );
                    result.issues.push(ConversionIssue::StepFailed {
                        step: ConversionStep::ConvertRosterEntry,
                        source: Some(ConversionSource::RosterEntry(entry.id)),
                        message: err.to_string(),
                    });
                }
            }
        }

        self.repair_pending_replays(identity, &handled, &mut result)
            .await;

        tracing::info!(
            talent_id = identity.talent_id,
            account_id = identity.account_id,
            converted = result.converted_count,
            skipped = result.skipped.len(),
            repaired = result.repaired.len(),
            issues = result.issues.len(),
            "Roster scan finished"
        );
        Ok(result)
    }

    /// Re-run membership replay for records already converted to this
    /// talent whose replay never completed.
    async fn repair_pending_replays(
        &self,
        identity: TalentIdentity,
        handled: &HashSet<DbId>,
        result: &mut ScanResult,
    ) {
        let talent_id = identity.talent_id;

        match RosterEntryRepo::list_pending_replay(self.pool(), talent_id).await {
            Ok(entries) => {
                for entry in entries.into_iter().filter(|e| !handled.contains(&e.id)) {
                    let report = replay_roster_entry(self.pool(), talent_id, entry.id).await;
                    record_repair(result, report);
                }
            }
            Err(err) => push_listing_failure(result, talent_id, err),
        }

        match LeadSubmissionRepo::list_pending_replay(self.pool(), talent_id).await {
            Ok(submissions) => {
                for submission in submissions {
                    let report = replay_submission(self.pool(), talent_id, submission.id).await;
                    record_repair(result, report);
                }
            }
            Err(err) => push_listing_failure(result, talent_id, err),
        }
    }
}

fn record_repair(result: &mut ScanResult, report: ReplayReport) {
    if report.is_complete() || report.memberships_created() > 0 {
        tracing::info!(
            source = ?report.source,
            memberships_created = report.memberships_created(),
            complete = report.is_complete(),
            "Pending membership replay repaired"
        );
        result.repaired.push(RepairDetail {
            source: report.source,
            memberships_created: report.memberships_created(),
        });
    }
    result.issues.extend(report.issues);
}

fn push_listing_failure(result: &mut ScanResult, talent_id: DbId, err: sqlx::Error) {
    tracing::error!(talent_id, error = %err, "Failed to list pending membership replays");
    result.issues.push(ConversionIssue::StepFailed {
        step: ConversionStep::ReplayMemberships,
        source: None,
        message: err.to_string(),
    });
}
