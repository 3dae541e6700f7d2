//! Lifecycle status enums for shadow records.
//!
//! Each variant's discriminant matches the seed data order (1-based) in the
//! corresponding `*_statuses` lookup table. Rows decode straight into these
//! enums, so an unknown status id is a decode error rather than a string the
//! code has to interpret.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// A status id read from the database that has no matching variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status id {id}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub id: StatusId,
}

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Lowercase name, identical to the seed data and the JSON form.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl TryFrom<StatusId> for $name {
            type Error = UnknownStatus;

            fn try_from(id: StatusId) -> Result<Self, Self::Error> {
                match id {
                    $( $val => Ok($name::$variant), )+
                    _ => Err(UnknownStatus { kind: $kind, id }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Roster entry lifecycle. `Converted` is permanent.
    RosterStatus ("roster entry") {
        Active = 1 => "active",
        Converted = 2 => "converted",
    }
}

define_status_enum! {
    /// Lead submission lifecycle.
    SubmissionStatus ("lead submission") {
        Pending = 1 => "pending",
        Approved = 2 => "approved",
        Rejected = 3 => "rejected",
        Converted = 4 => "converted",
    }
}

/// What a conversion attempt must do given a record's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionCheck {
    /// The record may be converted now.
    Proceed,
    /// Someone else already converted it; treat as success.
    AlreadyConverted,
    /// The record is in a terminal state that forbids conversion.
    Refused,
}

impl RosterStatus {
    pub fn conversion_check(self) -> ConversionCheck {
        match self {
            RosterStatus::Active => ConversionCheck::Proceed,
            RosterStatus::Converted => ConversionCheck::AlreadyConverted,
        }
    }
}

impl SubmissionStatus {
    /// Statuses a submission may be converted from.
    pub const CONVERTIBLE: [SubmissionStatus; 2] =
        [SubmissionStatus::Pending, SubmissionStatus::Approved];

    pub fn conversion_check(self) -> ConversionCheck {
        match self {
            SubmissionStatus::Pending | SubmissionStatus::Approved => ConversionCheck::Proceed,
            SubmissionStatus::Converted => ConversionCheck::AlreadyConverted,
            SubmissionStatus::Rejected => ConversionCheck::Refused,
        }
    }

    /// Apply a studio review decision.
    ///
    /// Review moves freely between pending, approved and rejected. A
    /// converted submission is linked to an account and can no longer be
    /// reviewed.
    pub fn review(self, decision: ReviewDecision) -> Result<SubmissionStatus, CoreError> {
        match self {
            SubmissionStatus::Converted => Err(CoreError::Conflict(
                "Submission has already been converted and can no longer be reviewed".into(),
            )),
            _ => Ok(decision.target()),
        }
    }
}

/// A studio's review decision on a lead submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn target(self) -> SubmissionStatus {
        match self {
            ReviewDecision::Approve => SubmissionStatus::Approved,
            ReviewDecision::Reject => SubmissionStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn roster_status_ids_match_seed_data() {
        assert_eq!(RosterStatus::Active.id(), 1);
        assert_eq!(RosterStatus::Converted.id(), 2);
    }

    #[test]
    fn submission_status_ids_match_seed_data() {
        assert_eq!(SubmissionStatus::Pending.id(), 1);
        assert_eq!(SubmissionStatus::Approved.id(), 2);
        assert_eq!(SubmissionStatus::Rejected.id(), 3);
        assert_eq!(SubmissionStatus::Converted.id(), 4);
    }

    #[test]
    fn unknown_status_id_is_rejected() {
        let err = SubmissionStatus::try_from(9).unwrap_err();
        assert_eq!(err.id, 9);
        assert_eq!(err.to_string(), "unknown lead submission status id 9");
        assert!(RosterStatus::try_from(0).is_err());
    }

    #[test]
    fn status_round_trips_through_id() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
            SubmissionStatus::Converted,
        ] {
            assert_eq!(SubmissionStatus::try_from(status.id()), Ok(status));
        }
    }

    #[test]
    fn serializes_as_lowercase_name() {
        let json = serde_json::to_string(&RosterStatus::Converted).unwrap();
        assert_eq!(json, "\"converted\"");
        assert_eq!(SubmissionStatus::Approved.to_string(), "approved");
    }

    #[test]
    fn converted_roster_entry_is_already_converted() {
        assert_eq!(
            RosterStatus::Converted.conversion_check(),
            ConversionCheck::AlreadyConverted
        );
        assert_eq!(RosterStatus::Active.conversion_check(), ConversionCheck::Proceed);
    }

    #[test]
    fn pending_and_approved_submissions_convert() {
        assert_eq!(SubmissionStatus::Pending.conversion_check(), ConversionCheck::Proceed);
        assert_eq!(SubmissionStatus::Approved.conversion_check(), ConversionCheck::Proceed);
        for status in SubmissionStatus::CONVERTIBLE {
            assert_eq!(status.conversion_check(), ConversionCheck::Proceed);
        }
    }

    #[test]
    fn rejected_submission_is_refused() {
        assert_eq!(SubmissionStatus::Rejected.conversion_check(), ConversionCheck::Refused);
    }

    #[test]
    fn review_moves_between_open_states() {
        assert_eq!(
            SubmissionStatus::Pending.review(ReviewDecision::Approve).unwrap(),
            SubmissionStatus::Approved
        );
        assert_eq!(
            SubmissionStatus::Approved.review(ReviewDecision::Reject).unwrap(),
            SubmissionStatus::Rejected
        );
        assert_eq!(
            SubmissionStatus::Rejected.review(ReviewDecision::Approve).unwrap(),
            SubmissionStatus::Approved
        );
    }

    #[test]
    fn converted_submission_cannot_be_reviewed() {
        assert_matches!(
            SubmissionStatus::Converted.review(ReviewDecision::Reject),
            Err(CoreError::Conflict(_))
        );
    }
}
