//! Conversion outcomes, issue taxonomy and membership defaults.
//!
//! These types describe what the reconciliation engine did. They are plain
//! serializable values so the API can hand them to the client unchanged.

use serde::Serialize;

use crate::lifecycle::SubmissionStatus;
use crate::matching::MatchedBy;
use crate::types::DbId;

/// Role assigned to a replayed membership when the source carries none.
pub const DEFAULT_MEMBERSHIP_ROLE: &str = "Talent";

/// The shadow record a conversion or membership replay came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ConversionSource {
    LeadSubmission(DbId),
    RosterEntry(DbId),
}

impl ConversionSource {
    /// Note stored on memberships created by replay.
    pub fn membership_note(self) -> String {
        match self {
            ConversionSource::LeadSubmission(id) => {
                format!("Converted from lead submission #{id}")
            }
            ConversionSource::RosterEntry(id) => format!("Converted from roster entry #{id}"),
        }
    }
}

/// Pick the membership role, falling back to [`DEFAULT_MEMBERSHIP_ROLE`].
pub fn membership_role(role: Option<&str>) -> String {
    role.map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_MEMBERSHIP_ROLE)
        .to_string()
}

/// The step of a conversion that produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStep {
    LoadSubmission,
    ConvertSubmission,
    ConvertRosterEntry,
    ReplayMemberships,
    MarkReplayed,
}

/// Something that went wrong or was refused during a conversion.
///
/// "Already converted" is deliberately absent: it is a successful outcome,
/// reported through the outcome enums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionIssue {
    /// A referenced submission or roster entry does not exist.
    NotFound { entity: &'static str, id: DbId },
    /// The submission is in a state that must never be converted.
    TerminalStateConflict {
        submission_id: DbId,
        status: SubmissionStatus,
    },
    /// A status conversion succeeded but a membership could not be written.
    /// Retried by the next scan through the pending-replay repair pass.
    PartialReplayFailure {
        source: ConversionSource,
        talent_id: DbId,
        production_id: Option<DbId>,
        message: String,
    },
    /// A database step failed outright.
    StepFailed {
        step: ConversionStep,
        source: Option<ConversionSource>,
        message: String,
    },
}

/// What happened to the submission itself during a direct conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Converted,
    AlreadyConverted,
    NotFound,
    Refused,
    Failed,
}

/// What happened to the roster entry a submission pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RosterOutcome {
    Converted {
        roster_entry_id: DbId,
        memberships_created: usize,
    },
    AlreadyConverted {
        roster_entry_id: DbId,
    },
    NotFound {
        roster_entry_id: DbId,
    },
    Failed {
        roster_entry_id: DbId,
    },
}

/// One membership the engine ensured for a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MembershipOutcome {
    pub production_id: DbId,
    pub source: ConversionSource,
    /// `false` when the membership already existed.
    pub created: bool,
}

/// Result of converting a single lead submission at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub submission_id: DbId,
    pub submission: SubmissionOutcome,
    pub roster_entry: Option<RosterOutcome>,
    pub memberships: Vec<MembershipOutcome>,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionResult {
    pub fn new(submission_id: DbId, submission: SubmissionOutcome) -> Self {
        Self {
            submission_id,
            submission,
            roster_entry: None,
            memberships: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// `true` when the call changed nothing: a retry, a missing submission,
    /// or a refused one.
    pub fn is_noop(&self) -> bool {
        self.submission != SubmissionOutcome::Converted
            && !matches!(self.roster_entry, Some(RosterOutcome::Converted { .. }))
            && self.memberships.iter().all(|m| !m.created)
    }

    pub fn memberships_created(&self) -> usize {
        self.memberships.iter().filter(|m| m.created).count()
    }
}

/// Per-entry detail of a scan conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntryDetail {
    pub roster_entry_id: DbId,
    pub studio_id: DbId,
    pub studio_name: String,
    pub matched_by: MatchedBy,
    /// Production associations found on the entry.
    pub productions_replayed: usize,
    /// Memberships that did not exist before and were created.
    pub memberships_created: usize,
}

/// A previously converted record whose membership replay was completed late.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairDetail {
    pub source: ConversionSource,
    pub memberships_created: usize,
}

/// Summary of a scan conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub converted_count: usize,
    pub entries: Vec<ScanEntryDetail>,
    /// Matched entries another caller converted first.
    pub skipped: Vec<DbId>,
    pub repaired: Vec<RepairDetail>,
    pub issues: Vec<ConversionIssue>,
}

impl ScanResult {
    pub fn nothing_to_convert(&self) -> bool {
        self.converted_count == 0
    }

    pub fn is_partial(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Human-readable summary for the newly converted user.
    pub fn summary_message(&self) -> String {
        let mut message = match self.converted_count {
            0 => "Nothing to convert: no earlier studio records matched your account".to_string(),
            1 => "We found 1 prior record and linked it to your account".to_string(),
            n => format!("We found {n} prior records and linked them to your account"),
        };
        if self.is_partial() {
            let n = self.issues.len();
            message.push_str(&format!(
                " ({n} step{} could not be completed and will be retried on your next sign-in)",
                if n == 1 { "" } else { "s" }
            ));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_talent() {
        assert_eq!(membership_role(None), "Talent");
        assert_eq!(membership_role(Some("  ")), "Talent");
        assert_eq!(membership_role(Some(" Lead ")), "Lead");
    }

    #[test]
    fn membership_note_names_source() {
        assert_eq!(
            ConversionSource::LeadSubmission(12).membership_note(),
            "Converted from lead submission #12"
        );
        assert_eq!(
            ConversionSource::RosterEntry(5).membership_note(),
            "Converted from roster entry #5"
        );
    }

    #[test]
    fn already_converted_result_is_noop() {
        let result = ConversionResult::new(1, SubmissionOutcome::AlreadyConverted);
        assert!(result.is_noop());
    }

    #[test]
    fn converted_result_is_not_noop() {
        let result = ConversionResult::new(1, SubmissionOutcome::Converted);
        assert!(!result.is_noop());
    }

    #[test]
    fn existing_memberships_keep_result_noop() {
        let mut result = ConversionResult::new(1, SubmissionOutcome::AlreadyConverted);
        result.roster_entry = Some(RosterOutcome::AlreadyConverted { roster_entry_id: 3 });
        result.memberships.push(MembershipOutcome {
            production_id: 9,
            source: ConversionSource::LeadSubmission(1),
            created: false,
        });
        assert!(result.is_noop());
        assert_eq!(result.memberships_created(), 0);
    }

    #[test]
    fn empty_scan_says_nothing_to_convert() {
        let result = ScanResult::default();
        assert!(result.nothing_to_convert());
        assert!(result.summary_message().starts_with("Nothing to convert"));
    }

    #[test]
    fn scan_message_counts_records() {
        let result = ScanResult {
            converted_count: 3,
            ..Default::default()
        };
        assert_eq!(
            result.summary_message(),
            "We found 3 prior records and linked them to your account"
        );
    }

    #[test]
    fn partial_scan_mentions_retry() {
        let result = ScanResult {
            converted_count: 1,
            issues: vec![ConversionIssue::PartialReplayFailure {
                source: ConversionSource::RosterEntry(4),
                talent_id: 2,
                production_id: Some(7),
                message: "boom".into(),
            }],
            ..Default::default()
        };
        assert!(result.is_partial());
        assert!(result.summary_message().ends_with(
            "(1 step could not be completed and will be retried on your next sign-in)"
        ));
    }

    #[test]
    fn issue_serializes_with_kind_tag() {
        let issue = ConversionIssue::TerminalStateConflict {
            submission_id: 8,
            status: SubmissionStatus::Rejected,
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "terminal_state_conflict");
        assert_eq!(json["status"], "rejected");
    }

    #[test]
    fn source_serializes_with_kind_and_id() {
        let json = serde_json::to_value(ConversionSource::RosterEntry(4)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "roster_entry", "id": 4}));
    }
}
