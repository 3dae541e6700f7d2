//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Methods that must run inside a
//! caller-owned transaction take `&mut sqlx::Transaction<'_, sqlx::Postgres>`
//! instead.

pub mod account_repo;
pub mod lead_submission_repo;
pub mod membership_repo;
pub mod roster_entry_repo;
pub mod shareable_code_repo;
pub mod studio_repo;

pub use account_repo::{AccountRepo, TalentRecordRepo};
pub use lead_submission_repo::LeadSubmissionRepo;
pub use membership_repo::MembershipRepo;
pub use roster_entry_repo::RosterEntryRepo;
pub use shareable_code_repo::ShareableCodeRepo;
pub use studio_repo::{ProductionRepo, StudioRepo};
