//! Vote ledger consensus semantics against the SQLite-backed store.

mod helpers;

use std::collections::HashMap;

use proptest::prelude::*;
use uuid::Uuid;

use demodesk::domain::models::{Organization, Permissions};
use demodesk::{DomainError, NewTrack, VoteRequest, VoteValue};

use helpers::database::{make_engine, make_ledger, org_scope, seed_org, seed_staff, setup_test_db};

async fn seed_track(pool: &sqlx::SqlitePool, org: &Organization, staff_id: Uuid) -> Uuid {
    let engine = make_engine(pool);
    let scope = org_scope(staff_id, &[org.id], Permissions::all());
    engine
        .submit_track(
            &scope,
            NewTrack {
                title: "Contender".to_string(),
                artist_name: "Test Artist".to_string(),
                ..NewTrack::default()
            },
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_two_voters_aggregate_and_flip() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let alice = seed_staff(&pool, "alice", false).await;
    let bob = seed_staff(&pool, "bob", false).await;
    let track_id = seed_track(&pool, &org, alice).await;
    let ledger = make_ledger(&pool);

    let alice_scope = org_scope(alice, &[org.id], Permissions::all());
    let bob_scope = org_scope(bob, &[org.id], Permissions::all());

    let track = ledger.cast_vote(&alice_scope, track_id, VoteRequest::Up).await.unwrap();
    assert_eq!(track.vote_total, 1);

    let track = ledger.cast_vote(&bob_scope, track_id, VoteRequest::Up).await.unwrap();
    assert_eq!(track.vote_total, 2);
    assert_eq!(track.votes_by_voter.len(), 2);

    // First voter flips: +1 -> -1 swings the total by two.
    let track = ledger.cast_vote(&alice_scope, track_id, VoteRequest::Down).await.unwrap();
    assert_eq!(track.vote_total, 0);
    assert_eq!(track.votes_by_voter.get(&alice), Some(&VoteValue::Down));
    assert_eq!(track.votes_by_voter.get(&bob), Some(&VoteValue::Up));
}

#[tokio::test]
async fn test_recasting_same_value_is_idempotent() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let alice = seed_staff(&pool, "alice", false).await;
    let track_id = seed_track(&pool, &org, alice).await;
    let ledger = make_ledger(&pool);
    let scope = org_scope(alice, &[org.id], Permissions::all());

    let first = ledger.cast_vote(&scope, track_id, VoteRequest::Up).await.unwrap();
    let second = ledger.cast_vote(&scope, track_id, VoteRequest::Up).await.unwrap();

    assert_eq!(first.vote_total, 1);
    assert_eq!(second.vote_total, first.vote_total);
    assert_eq!(second.votes_by_voter.len(), 1);
}

#[tokio::test]
async fn test_retract_deletes_the_row() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let alice = seed_staff(&pool, "alice", false).await;
    let track_id = seed_track(&pool, &org, alice).await;
    let ledger = make_ledger(&pool);
    let scope = org_scope(alice, &[org.id], Permissions::all());

    ledger.cast_vote(&scope, track_id, VoteRequest::Down).await.unwrap();
    let track = ledger.cast_vote(&scope, track_id, VoteRequest::Retract).await.unwrap();

    assert_eq!(track.vote_total, 0);
    assert!(track.votes_by_voter.is_empty());

    // Retracting again is harmless.
    let track = ledger.cast_vote(&scope, track_id, VoteRequest::Retract).await.unwrap();
    assert_eq!(track.vote_total, 0);
}

#[tokio::test]
async fn test_voting_requires_permission_and_live_track() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let alice = seed_staff(&pool, "alice", false).await;
    let track_id = seed_track(&pool, &org, alice).await;
    let ledger = make_ledger(&pool);

    let mut muted = Permissions::all();
    muted.can_vote = false;
    let muted_scope = org_scope(alice, &[org.id], muted);
    let err = ledger.cast_vote(&muted_scope, track_id, VoteRequest::Up).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    // A track outside the scope reads as not found.
    let foreign_scope = org_scope(alice, &[Uuid::new_v4()], Permissions::all());
    let err = ledger.cast_vote(&foreign_scope, track_id, VoteRequest::Up).await.unwrap_err();
    assert!(matches!(err, DomainError::TrackNotFound(_)));

    // Archived tracks accept no further votes.
    let scope = org_scope(alice, &[org.id], Permissions::all());
    make_engine(&pool).reject(&scope, track_id, None).await.unwrap();
    let err = ledger.cast_vote(&scope, track_id, VoteRequest::Up).await.unwrap_err();
    assert!(matches!(err, DomainError::AlreadyFinal));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// After any sequence of casts from a small voter pool, at most one
    /// row exists per (track, voter), its value is the last non-retract
    /// request, and the aggregate equals the sum of surviving rows.
    #[test]
    fn prop_one_row_per_voter_and_total_matches(
        sequence in proptest::collection::vec((0usize..3, 0u8..3), 1..24)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let pool = setup_test_db().await;
            let org = Organization::new("Prop Records");
            seed_org(&pool, &org).await;
            let voters = [
                seed_staff(&pool, "v0", false).await,
                seed_staff(&pool, "v1", false).await,
                seed_staff(&pool, "v2", false).await,
            ];
            let track_id = seed_track(&pool, &org, voters[0]).await;
            let ledger = make_ledger(&pool);

            let mut model: HashMap<Uuid, i64> = HashMap::new();
            let mut last = None;
            for (voter_idx, request_idx) in sequence {
                let voter = voters[voter_idx];
                let request = match request_idx {
                    0 => VoteRequest::Up,
                    1 => VoteRequest::Down,
                    _ => VoteRequest::Retract,
                };
                let scope = org_scope(voter, &[org.id], Permissions::all());
                last = Some(ledger.cast_vote(&scope, track_id, request).await.unwrap());

                match request {
                    VoteRequest::Up => { model.insert(voter, 1); }
                    VoteRequest::Down => { model.insert(voter, -1); }
                    VoteRequest::Retract => { model.remove(&voter); }
                }
            }

            let track = last.unwrap();
            prop_assert_eq!(track.votes_by_voter.len(), model.len());
            prop_assert_eq!(track.vote_total, model.values().sum::<i64>());
            for (voter, value) in model {
                prop_assert_eq!(
                    track.votes_by_voter.get(&voter).map(|v| v.as_i64()),
                    Some(value)
                );
            }
            Ok(())
        })?;
    }
}
