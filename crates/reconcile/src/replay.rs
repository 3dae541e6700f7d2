//! Membership replay: turn the production associations implied by a
//! converted shadow record into memberships for the talent record.
//!
//! Replay never fails the caller. Per-production failures are reported as
//! [`ConversionIssue::PartialReplayFailure`] and leave the source's
//! `memberships_replayed_at` unset, so the next scan retries it.

use casting_core::conversion::{
    membership_role, ConversionIssue, ConversionSource, ConversionStep, MembershipOutcome,
    DEFAULT_MEMBERSHIP_ROLE,
};
use casting_core::types::DbId;
use casting_db::repositories::{
    LeadSubmissionRepo, MembershipRepo, RosterEntryRepo, ShareableCodeRepo,
};
use casting_db::DbPool;

/// What a replay did for one source record.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub source: ConversionSource,
    /// Production associations the source implied.
    pub productions: usize,
    pub memberships: Vec<MembershipOutcome>,
    pub issues: Vec<ConversionIssue>,
}

impl ReplayReport {
    fn new(source: ConversionSource) -> Self {
        Self {
            source,
            productions: 0,
            memberships: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn memberships_created(&self) -> usize {
        self.memberships.iter().filter(|m| m.created).count()
    }

    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    fn record_failure(&mut self, talent_id: DbId, production_id: Option<DbId>, err: &sqlx::Error) {
        tracing::error!(
            source = ?self.source,
            talent_id,
            production_id = ?production_id,
            error = %err,
            "Membership replay failed; next scan will retry"
        );
        self.issues.push(ConversionIssue::PartialReplayFailure {
            source: self.source,
            talent_id,
            production_id,
            message: err.to_string(),
        });
    }
}

/// Ensure the talent is a member of the production.
///
/// The existence check is only a fast path. The insert itself is
/// `ON CONFLICT DO NOTHING` on `uq_memberships_production_talent`, so a
/// concurrent replay that wins the race simply makes this call report
/// `created: false`.
pub async fn ensure_membership(
    pool: &DbPool,
    talent_id: DbId,
    production_id: DbId,
    role: &str,
    source: ConversionSource,
) -> Result<MembershipOutcome, sqlx::Error> {
    let outcome = |created| MembershipOutcome {
        production_id,
        source,
        created,
    };

    if MembershipRepo::exists(pool, production_id, talent_id).await? {
        tracing::debug!(production_id, talent_id, "Membership already present");
        return Ok(outcome(false));
    }

    let note = source.membership_note();
    let inserted =
        MembershipRepo::insert_if_absent(pool, production_id, talent_id, role, Some(&note))
            .await?;

    match inserted {
        Some(membership) => {
            tracing::info!(
                membership_id = membership.id,
                production_id,
                talent_id,
                role,
                "Membership created by replay"
            );
            Ok(outcome(true))
        }
        None => {
            tracing::debug!(
                production_id,
                talent_id,
                "Membership created concurrently by another caller"
            );
            Ok(outcome(false))
        }
    }
}

/// Replay every production association of a converted roster entry.
pub async fn replay_roster_entry(
    pool: &DbPool,
    talent_id: DbId,
    roster_entry_id: DbId,
) -> ReplayReport {
    let mut report = ReplayReport::new(ConversionSource::RosterEntry(roster_entry_id));

    let links = match RosterEntryRepo::list_productions(pool, roster_entry_id).await {
        Ok(links) => links,
        Err(err) => {
            report.record_failure(talent_id, None, &err);
            return report;
        }
    };
    report.productions = links.len();

    for link in links {
        let role = membership_role(link.role.as_deref());
        match ensure_membership(pool, talent_id, link.production_id, &role, report.source).await {
            Ok(outcome) => report.memberships.push(outcome),
            Err(err) => report.record_failure(talent_id, Some(link.production_id), &err),
        }
    }

    mark_replayed(pool, talent_id, &mut report).await;
    report
}

/// Replay the production designated by a converted submission's shareable code.
pub async fn replay_submission(
    pool: &DbPool,
    talent_id: DbId,
    submission_id: DbId,
) -> ReplayReport {
    let mut report = ReplayReport::new(ConversionSource::LeadSubmission(submission_id));

    let production_id = match ShareableCodeRepo::production_for_submission(pool, submission_id).await
    {
        Ok(production_id) => production_id,
        Err(err) => {
            report.record_failure(talent_id, None, &err);
            return report;
        }
    };

    if let Some(production_id) = production_id {
        report.productions = 1;
        match ensure_membership(
            pool,
            talent_id,
            production_id,
            DEFAULT_MEMBERSHIP_ROLE,
            report.source,
        )
        .await
        {
            Ok(outcome) => report.memberships.push(outcome),
            Err(err) => report.record_failure(talent_id, Some(production_id), &err),
        }
    }

    mark_replayed(pool, talent_id, &mut report).await;
    report
}

/// Stamp `memberships_replayed_at` once every membership is in place.
async fn mark_replayed(pool: &DbPool, talent_id: DbId, report: &mut ReplayReport) {
    if !report.is_complete() {
        return;
    }

    let result = match report.source {
        ConversionSource::RosterEntry(id) => RosterEntryRepo::mark_replayed(pool, id, talent_id).await,
        ConversionSource::LeadSubmission(id) => {
            LeadSubmissionRepo::mark_replayed(pool, id, talent_id).await
        }
    };

    if let Err(err) = result {
        tracing::warn!(
            source = ?report.source,
            talent_id,
            error = %err,
            "Failed to record completed membership replay"
        );
        report.issues.push(ConversionIssue::StepFailed {
            step: ConversionStep::MarkReplayed,
            source: Some(report.source),
            message: err.to_string(),
        });
    }
}
