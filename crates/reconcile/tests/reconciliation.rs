//! Integration tests for both reconciliation trigger paths.
//!
//! Exercises the engine against a real database:
//! - Scan conversion across studios, by email and by phone
//! - Registration-time conversion of a lead submission and its roster entry
//! - Idempotent retries and races between concurrent callers
//! - Terminal-state refusal and missing references
//! - Repair of incomplete membership replays

use assert_matches::assert_matches;
use sqlx::PgPool;
use casting_core::conversion::{ConversionIssue, RosterOutcome, SubmissionOutcome};
use casting_core::lifecycle::{RosterStatus, SubmissionStatus};
use casting_core::matching::MatchedBy;
use casting_core::types::DbId;
use casting_db::models::account::{CreateAccount, CreateTalentRecord, ROLE_TALENT};
use casting_db::models::lead_submission::CreateLeadSubmission;
use casting_db::models::roster_entry::{CreateRosterEntry, CreateRosterEntryProduction};
use casting_db::models::shareable_code::CreateShareableCode;
use casting_db::models::studio::{CreateProduction, CreateStudio};
use casting_db::repositories::{
    AccountRepo, LeadSubmissionRepo, MembershipRepo, ProductionRepo, RosterEntryRepo,
    ShareableCodeRepo, StudioRepo, TalentRecordRepo,
};
use casting_reconcile::{ReconcileError, ReconciliationEngine, TalentIdentity};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_studio(pool: &PgPool, name: &str) -> DbId {
    StudioRepo::create(pool, &CreateStudio { name: name.to_string() })
        .await
        .unwrap()
        .id
}

async fn new_production(pool: &PgPool, studio_id: DbId, title: &str) -> DbId {
    ProductionRepo::create(
        pool,
        &CreateProduction {
            studio_id,
            title: title.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_roster_entry(
    pool: &PgPool,
    studio_id: DbId,
    email: Option<&str>,
    phone: Option<&str>,
) -> DbId {
    RosterEntryRepo::create(
        pool,
        studio_id,
        &CreateRosterEntry {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        },
    )
    .await
    .unwrap()
    .id
}

async fn link_production(
    pool: &PgPool,
    roster_entry_id: DbId,
    production_id: DbId,
    role: Option<&str>,
) {
    RosterEntryRepo::add_production(
        pool,
        roster_entry_id,
        &CreateRosterEntryProduction {
            production_id,
            role: role.map(str::to_string),
            notes: None,
        },
    )
    .await
    .unwrap();
}

async fn new_submission(
    pool: &PgPool,
    studio_id: DbId,
    production_id: Option<DbId>,
    roster_entry_id: Option<DbId>,
    email: &str,
) -> DbId {
    let code = ShareableCodeRepo::create(
        pool,
        &CreateShareableCode {
            studio_id,
            production_id,
            code: format!("CODE-{studio_id}-{}", production_id.unwrap_or_default()),
        },
    )
    .await
    .unwrap();
    LeadSubmissionRepo::create(
        pool,
        code.id,
        roster_entry_id,
        &CreateLeadSubmission {
            name: "Ada Lovelace".to_string(),
            email: Some(email.to_string()),
            phone: None,
            message: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn register(pool: &PgPool, email: &str, phone: Option<&str>) -> TalentIdentity {
    let account = AccountRepo::create(
        pool,
        &CreateAccount {
            email: email.to_string(),
            phone: phone.map(str::to_string),
            role: ROLE_TALENT.to_string(),
        },
    )
    .await
    .unwrap();
    let talent = TalentRecordRepo::create(
        pool,
        &CreateTalentRecord {
            account_id: account.id,
            display_name: "Ada Lovelace".to_string(),
        },
    )
    .await
    .unwrap();
    TalentIdentity {
        account_id: account.id,
        talent_id: talent.id,
    }
}

async fn membership_count(pool: &PgPool, production_id: DbId) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE production_id = $1")
            .bind(production_id)
            .fetch_one(pool)
            .await
            .unwrap();
    count
}

// ---------------------------------------------------------------------------
// Scan conversion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scan_converts_entry_and_replays_membership(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let production = new_production(&pool, studio, "Winter Tale").await;
    let entry = new_roster_entry(&pool, studio, Some("a@x.com"), None).await;
    link_production(&pool, entry, production, Some("Lead")).await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine
        .scan_and_convert(identity, "A@X.com", None)
        .await
        .unwrap();

    assert_eq!(result.converted_count, 1);
    assert!(result.issues.is_empty());
    assert_eq!(result.entries[0].roster_entry_id, entry);
    assert_eq!(result.entries[0].studio_name, "Northlight");
    assert_eq!(result.entries[0].matched_by, MatchedBy::Email);
    assert_eq!(result.entries[0].memberships_created, 1);

    let converted = RosterEntryRepo::find_by_id(&pool, entry).await.unwrap().unwrap();
    assert_eq!(converted.status, RosterStatus::Converted);
    assert_eq!(converted.converted_talent_id, Some(identity.talent_id));
    assert_eq!(converted.converted_account_id, Some(identity.account_id));
    assert!(converted.converted_at.is_some());
    assert!(converted.memberships_replayed_at.is_some());

    let memberships = MembershipRepo::list_for_talent(&pool, identity.talent_id)
        .await
        .unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].production_id, production);
    assert_eq!(memberships[0].role, "Lead");
    assert_eq!(
        memberships[0].notes.as_deref(),
        Some(format!("Converted from roster entry #{entry}").as_str())
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scan_matches_across_studios(pool: PgPool) {
    let first = new_studio(&pool, "Northlight").await;
    let second = new_studio(&pool, "Southpaw").await;
    new_roster_entry(&pool, first, Some("a@x.com"), None).await;
    new_roster_entry(&pool, second, None, Some("+1 (555) 010-0200")).await;
    new_roster_entry(&pool, second, Some("someone@else.com"), None).await;

    let identity = register(&pool, "a@x.com", Some("+15550100200")).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine
        .scan_and_convert(identity, "a@x.com", Some("+1 555 010 0200"))
        .await
        .unwrap();

    assert_eq!(result.converted_count, 2);
    let matched: Vec<MatchedBy> = result.entries.iter().map(|e| e.matched_by).collect();
    assert_eq!(matched, vec![MatchedBy::Email, MatchedBy::Phone]);
    assert_eq!(
        result.summary_message(),
        "We found 2 prior records and linked them to your account"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scan_without_phone_ignores_phone_only_entries(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let phone_only = new_roster_entry(&pool, studio, None, Some("5550100200")).await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();

    assert!(result.nothing_to_convert());
    let entry = RosterEntryRepo::find_by_id(&pool, phone_only).await.unwrap().unwrap();
    assert_eq!(entry.status, RosterStatus::Active);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scan_requires_email(pool: PgPool) {
    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine.scan_and_convert(identity, "   ", None).await;
    assert_matches!(result, Err(ReconcileError::Core(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_scan_is_noop(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let production = new_production(&pool, studio, "Winter Tale").await;
    let entry = new_roster_entry(&pool, studio, Some("a@x.com"), None).await;
    link_production(&pool, entry, production, None).await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();
    let again = engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();

    assert!(again.nothing_to_convert());
    assert!(again.repaired.is_empty());
    assert!(again.issues.is_empty());
    assert_eq!(membership_count(&pool, production).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_scans_convert_each_entry_once(pool: PgPool) {
    let first = new_studio(&pool, "Northlight").await;
    let second = new_studio(&pool, "Southpaw").await;
    let p1 = new_production(&pool, first, "Winter Tale").await;
    let p2 = new_production(&pool, second, "Summer Stock").await;
    let e1 = new_roster_entry(&pool, first, Some("a@x.com"), None).await;
    let e2 = new_roster_entry(&pool, second, Some("a@x.com"), None).await;
    link_production(&pool, e1, p1, None).await;
    link_production(&pool, e2, p2, None).await;
    link_production(&pool, e2, p1, None).await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let (left, right) = tokio::join!(
        engine.scan_and_convert(identity, "a@x.com", None),
        engine.scan_and_convert(identity, "a@x.com", None),
    );
    let (left, right) = (left.unwrap(), right.unwrap());

    assert_eq!(left.converted_count + right.converted_count, 2);
    assert!(left.skipped.len() + right.skipped.len() <= 2);
    assert!(left.issues.is_empty() && right.issues.is_empty());

    let (converted,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM roster_entries WHERE status_id = $1 AND converted_talent_id = $2",
    )
    .bind(RosterStatus::Converted.id())
    .bind(identity.talent_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(converted, 2);
    assert_eq!(membership_count(&pool, p1).await, 1);
    assert_eq!(membership_count(&pool, p2).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_registration_racing_scan_converts_entry_once(pool: PgPool) {
    let engine = ReconciliationEngine::new(pool.clone());

    for round in 0..10 {
        let email = format!("talent{round}@x.com");
        let studio = new_studio(&pool, &format!("Studio {round}")).await;
        let production = new_production(&pool, studio, "Winter Tale").await;
        let entry = new_roster_entry(&pool, studio, Some(&email), None).await;
        link_production(&pool, entry, production, Some("Lead")).await;
        let submission =
            new_submission(&pool, studio, Some(production), Some(entry), &email).await;
        let identity = register(&pool, &email, None).await;

        let direct = tokio::spawn({
            let engine = engine.clone();
            async move { engine.convert_from_submission(identity, submission).await }
        });
        let scan = tokio::spawn({
            let engine = engine.clone();
            let email = email.clone();
            async move { engine.scan_and_convert(identity, &email, None).await }
        });
        let direct = direct.await.unwrap();
        let scan = scan.await.unwrap().unwrap();

        assert_eq!(direct.submission, SubmissionOutcome::Converted);
        assert!(direct.issues.is_empty(), "round {round}: {:?}", direct.issues);
        assert!(scan.issues.is_empty(), "round {round}: {:?}", scan.issues);

        let entry_converted_by_direct =
            matches!(direct.roster_entry, Some(RosterOutcome::Converted { .. }));
        assert_eq!(
            usize::from(entry_converted_by_direct) + scan.converted_count,
            1,
            "round {round}: entry converted by both paths"
        );

        let stored = RosterEntryRepo::find_by_id(&pool, entry).await.unwrap().unwrap();
        assert_eq!(stored.status, RosterStatus::Converted);
        assert_eq!(stored.converted_talent_id, Some(identity.talent_id));
        assert_eq!(membership_count(&pool, production).await, 1);
    }
}

// ---------------------------------------------------------------------------
// Registration-time conversion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submission_converts_with_referenced_entry(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let production = new_production(&pool, studio, "Winter Tale").await;
    let entry = new_roster_entry(&pool, studio, Some("a@x.com"), None).await;
    let submission = new_submission(&pool, studio, Some(production), Some(entry), "a@x.com").await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine.convert_from_submission(identity, submission).await;

    assert_eq!(result.submission, SubmissionOutcome::Converted);
    assert_matches!(
        result.roster_entry,
        Some(RosterOutcome::Converted { roster_entry_id, memberships_created: 0 }) if roster_entry_id == entry
    );
    assert!(result.issues.is_empty());
    assert_eq!(result.memberships_created(), 1);

    let stored = LeadSubmissionRepo::find_by_id(&pool, submission).await.unwrap().unwrap();
    assert_eq!(stored.status, SubmissionStatus::Converted);
    assert_eq!(stored.converted_talent_id, Some(identity.talent_id));
    assert!(stored.memberships_replayed_at.is_some());

    let stored_entry = RosterEntryRepo::find_by_id(&pool, entry).await.unwrap().unwrap();
    assert_eq!(stored_entry.status, RosterStatus::Converted);

    let memberships = MembershipRepo::list_for_talent(&pool, identity.talent_id)
        .await
        .unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].role, "Talent");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submission_retry_is_noop(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let production = new_production(&pool, studio, "Winter Tale").await;
    let entry = new_roster_entry(&pool, studio, Some("a@x.com"), None).await;
    let submission = new_submission(&pool, studio, Some(production), Some(entry), "a@x.com").await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let first = engine.convert_from_submission(identity, submission).await;
    let second = engine.convert_from_submission(identity, submission).await;

    assert_eq!(first.submission, SubmissionOutcome::Converted);
    assert_eq!(second.submission, SubmissionOutcome::AlreadyConverted);
    assert!(second.is_noop());
    assert!(second.issues.is_empty());
    assert_eq!(membership_count(&pool, production).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submission_skips_entry_converted_by_scan(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let production = new_production(&pool, studio, "Winter Tale").await;
    let entry = new_roster_entry(&pool, studio, Some("a@x.com"), None).await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());
    engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();

    let submission = new_submission(&pool, studio, Some(production), Some(entry), "a@x.com").await;
    let result = engine.convert_from_submission(identity, submission).await;

    assert_eq!(result.submission, SubmissionOutcome::Converted);
    assert_eq!(
        result.roster_entry,
        Some(RosterOutcome::AlreadyConverted { roster_entry_id: entry })
    );
    assert!(result.issues.is_empty());

    let stored = LeadSubmissionRepo::find_by_id(&pool, submission).await.unwrap().unwrap();
    assert_eq!(stored.status, SubmissionStatus::Converted);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rejected_submission_is_refused(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let submission = new_submission(&pool, studio, None, None, "a@x.com").await;
    LeadSubmissionRepo::set_review_status(&pool, submission, SubmissionStatus::Rejected)
        .await
        .unwrap();

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine.convert_from_submission(identity, submission).await;

    assert_eq!(result.submission, SubmissionOutcome::Refused);
    assert_matches!(
        result.issues.as_slice(),
        [ConversionIssue::TerminalStateConflict { status: SubmissionStatus::Rejected, .. }]
    );
    let stored = LeadSubmissionRepo::find_by_id(&pool, submission).await.unwrap().unwrap();
    assert_eq!(stored.status, SubmissionStatus::Rejected);
    assert!(stored.converted_talent_id.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_submission_is_informational(pool: PgPool) {
    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine.convert_from_submission(identity, 9_999).await;

    assert_eq!(result.submission, SubmissionOutcome::NotFound);
    assert_matches!(
        result.issues.as_slice(),
        [ConversionIssue::NotFound { entity: "LeadSubmission", id: 9_999 }]
    );
    assert!(result.is_noop());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approved_submission_without_production_converts(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let submission = new_submission(&pool, studio, None, None, "a@x.com").await;
    LeadSubmissionRepo::set_review_status(&pool, submission, SubmissionStatus::Approved)
        .await
        .unwrap();

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());

    let result = engine.convert_from_submission(identity, submission).await;

    assert_eq!(result.submission, SubmissionOutcome::Converted);
    assert!(result.roster_entry.is_none());
    assert!(result.memberships.is_empty());
}

// ---------------------------------------------------------------------------
// Replay repair
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scan_repairs_incomplete_replay(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let production = new_production(&pool, studio, "Winter Tale").await;
    let entry = new_roster_entry(&pool, studio, Some("a@x.com"), None).await;
    link_production(&pool, entry, production, None).await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());
    engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();

    // Simulate a replay that converted the entry but never wrote the membership.
    MembershipRepo::delete(&pool, production, identity.talent_id)
        .await
        .unwrap();
    sqlx::query("UPDATE roster_entries SET memberships_replayed_at = NULL WHERE id = $1")
        .bind(entry)
        .execute(&pool)
        .await
        .unwrap();

    let result = engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();

    assert_eq!(result.converted_count, 0);
    assert_eq!(result.repaired.len(), 1);
    assert_eq!(result.repaired[0].memberships_created, 1);
    assert_eq!(membership_count(&pool, production).await, 1);

    let stored = RosterEntryRepo::find_by_id(&pool, entry).await.unwrap().unwrap();
    assert!(stored.memberships_replayed_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scan_does_not_restore_removed_membership(pool: PgPool) {
    let studio = new_studio(&pool, "Northlight").await;
    let production = new_production(&pool, studio, "Winter Tale").await;
    let entry = new_roster_entry(&pool, studio, Some("a@x.com"), None).await;
    link_production(&pool, entry, production, None).await;

    let identity = register(&pool, "a@x.com", None).await;
    let engine = ReconciliationEngine::new(pool.clone());
    engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();

    // Studio removes the talent from the production after conversion.
    MembershipRepo::delete(&pool, production, identity.talent_id)
        .await
        .unwrap();

    let result = engine.scan_and_convert(identity, "a@x.com", None).await.unwrap();

    assert!(result.repaired.is_empty());
    assert_eq!(membership_count(&pool, production).await, 0);
}
