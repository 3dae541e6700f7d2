//! Reconciliation engine: folds pre-registration shadow records into a
//! registered talent account.
//!
//! Two trigger paths share one matching rule and one conversion primitive:
//!
//! - [`ReconciliationEngine::convert_from_submission`] runs during
//!   registration with an explicit lead submission reference.
//! - [`ReconciliationEngine::scan_and_convert`] runs on sign-in or on demand
//!   and converts every matching active roster entry across all studios.
//!
//! There is no in-process lock manager. Every status write re-reads the row
//! under `FOR UPDATE` in its own transaction, and the
//! `uq_memberships_production_talent` constraint is the final guard against
//! duplicate memberships when the two paths race.

pub mod direct;
pub mod error;
pub mod matching;
pub mod replay;
pub mod roster;
pub mod scan;

use casting_core::types::DbId;
use casting_db::DbPool;

pub use error::ReconcileError;

/// The canonical identity shadow records are converted onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TalentIdentity {
    pub account_id: DbId,
    pub talent_id: DbId,
}

/// Entry point for both conversion paths.
///
/// Cheap to clone; holds only the connection pool.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    pool: DbPool,
}

impl ReconciliationEngine {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
