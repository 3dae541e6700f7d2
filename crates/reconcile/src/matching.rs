//! Candidate lookup shared by both trigger paths.

use casting_core::matching::{dedup_by_key, MatchCriteria, MatchedBy};
use casting_db::models::roster_entry::RosterMatch;
use casting_db::repositories::RosterEntryRepo;
use casting_db::DbPool;

/// An active roster entry that matched an account, and why.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub roster: RosterMatch,
    pub matched_by: MatchedBy,
}

/// Find every active roster entry, across all studios, matching the criteria.
///
/// Read-only. Results are unique by entry id and ordered by id.
pub async fn find_candidates(
    pool: &DbPool,
    criteria: &MatchCriteria,
) -> Result<Vec<Candidate>, sqlx::Error> {
    let rows = RosterEntryRepo::find_active_matches(pool, criteria).await?;
    let rows = dedup_by_key(rows, |row| row.entry.id);

    let candidates = rows
        .into_iter()
        .filter_map(|roster| {
            let matched_by =
                criteria.match_on(roster.entry.email.as_deref(), roster.entry.phone.as_deref());
            match matched_by {
                Some(matched_by) => Some(Candidate { roster, matched_by }),
                None => {
                    tracing::debug!(
                        roster_entry_id = roster.entry.id,
                        "Discarding database match that fails the matching rule"
                    );
                    None
                }
            }
        })
        .collect();

    Ok(candidates)
}
