//! The roster-entry conversion primitive used by both trigger paths.

use casting_core::lifecycle::ConversionCheck;
use casting_core::types::DbId;
use casting_db::models::roster_entry::RosterEntry;
use casting_db::repositories::RosterEntryRepo;
use casting_db::DbPool;

use crate::TalentIdentity;

/// What happened when converting one roster entry.
#[derive(Debug, Clone)]
pub enum EntryConversion {
    /// This call converted the entry.
    Converted(RosterEntry),
    /// The entry was already converted, by this or another caller.
    AlreadyConverted,
    /// No entry with that id exists.
    NotFound,
}

/// Convert a single roster entry inside its own transaction.
///
/// The status is re-read under a row lock immediately before the write, so
/// a concurrent conversion either finishes first (and this call reports
/// [`EntryConversion::AlreadyConverted`]) or waits for this one.
pub async fn convert_entry(
    pool: &DbPool,
    identity: TalentIdentity,
    roster_entry_id: DbId,
) -> Result<EntryConversion, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(status) = RosterEntryRepo::lock_status(&mut tx, roster_entry_id).await? else {
        return Ok(EntryConversion::NotFound);
    };

    match status.conversion_check() {
        ConversionCheck::Proceed => {}
        ConversionCheck::AlreadyConverted | ConversionCheck::Refused => {
            return Ok(EntryConversion::AlreadyConverted);
        }
    }

    let converted = RosterEntryRepo::mark_converted(
        &mut tx,
        roster_entry_id,
        identity.talent_id,
        identity.account_id,
    )
    .await?;
    tx.commit().await?;

    Ok(match converted {
        Some(entry) => {
            tracing::info!(
                roster_entry_id,
                studio_id = entry.studio_id,
                talent_id = identity.talent_id,
                account_id = identity.account_id,
                "Roster entry converted"
            );
            EntryConversion::Converted(entry)
        }
        None => EntryConversion::AlreadyConverted,
    })
}
