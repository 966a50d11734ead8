//! Shared test fixtures: in-memory database and seeded tenants.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::sync::watch;
use uuid::Uuid;

use demodesk::adapters::sqlite::{
    all_embedded_migrations, create_test_pool, Migrator, SqliteListenLog, SqliteOrgDirectory,
    SqliteStaffDirectory, SqliteTrackRepository, SqliteUsageGate, SqliteVoteRepository,
};
use demodesk::adapters::BroadcastChangeFeed;
use demodesk::domain::models::{
    FatigueConfig, Membership, Organization, Permissions, ResolvedScope, ScopeFilter, StaffRole,
    SyncConfig,
};
use demodesk::{
    FatigueAnalyzer, ListenLog, OrgDirectory, PipelineEngine, ScopeResolver, SessionDeps,
    StaffDirectory, TrackRepository, UsageGate, UsageLimiter, VoteLedger, VoteRepository,
};

/// Create a fresh in-memory database with migrations applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = create_test_pool().await.expect("failed to create test database");
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .expect("failed to run migrations");
    pool
}

/// Insert an organization.
pub async fn seed_org(pool: &SqlitePool, org: &Organization) {
    SqliteOrgDirectory::new(pool.clone())
        .create(org)
        .await
        .expect("failed to seed organization");
}

/// Insert a staff record and return its id.
pub async fn seed_staff(pool: &SqlitePool, name: &str, is_system_admin: bool) -> Uuid {
    let staff_id = Uuid::new_v4();
    SqliteStaffDirectory::new(pool.clone())
        .create_staff(staff_id, name, is_system_admin)
        .await
        .expect("failed to seed staff");
    staff_id
}

/// Insert a membership with the role's default permissions.
pub async fn seed_membership(pool: &SqlitePool, staff_id: Uuid, org_id: Uuid, role: StaffRole) {
    SqliteStaffDirectory::new(pool.clone())
        .upsert_membership(&Membership::new(staff_id, org_id, role))
        .await
        .expect("failed to seed membership");
}

/// Insert a membership with explicit permissions.
pub async fn seed_membership_with(
    pool: &SqlitePool,
    staff_id: Uuid,
    org_id: Uuid,
    role: StaffRole,
    permissions: Permissions,
) {
    let mut membership = Membership::new(staff_id, org_id, role);
    membership.permissions = permissions;
    SqliteStaffDirectory::new(pool.clone())
        .upsert_membership(&membership)
        .await
        .expect("failed to seed membership");
}

/// A hand-built scope for driving services directly.
pub fn org_scope(staff_id: Uuid, org_ids: &[Uuid], permissions: Permissions) -> ResolvedScope {
    ResolvedScope {
        staff_id,
        filter: ScopeFilter::Orgs(org_ids.to_vec()),
        permissions,
    }
}

pub fn personal_scope(staff_id: Uuid) -> ResolvedScope {
    ResolvedScope {
        staff_id,
        filter: ScopeFilter::Personal { owner_id: staff_id },
        permissions: Permissions::all(),
    }
}

/// Pipeline engine plus the repositories it runs over.
pub fn make_engine(pool: &SqlitePool) -> Arc<PipelineEngine> {
    let tracks: Arc<dyn TrackRepository> = Arc::new(SqliteTrackRepository::new(pool.clone()));
    let orgs: Arc<dyn OrgDirectory> = Arc::new(SqliteOrgDirectory::new(pool.clone()));
    let gate: Arc<dyn UsageGate> = Arc::new(SqliteUsageGate::new(pool.clone()));
    Arc::new(PipelineEngine::new(tracks, orgs, Arc::new(UsageLimiter::new(gate))))
}

pub fn make_ledger(pool: &SqlitePool) -> VoteLedger {
    let tracks: Arc<dyn TrackRepository> = Arc::new(SqliteTrackRepository::new(pool.clone()));
    let votes: Arc<dyn VoteRepository> = Arc::new(SqliteVoteRepository::new(pool.clone()));
    VoteLedger::new(tracks, votes)
}

/// Full session dependency wiring over one pool and one shared feed.
pub fn build_deps(pool: &SqlitePool, feed: Arc<BroadcastChangeFeed>) -> SessionDeps {
    let tracks: Arc<dyn TrackRepository> = Arc::new(SqliteTrackRepository::new(pool.clone()));
    let votes: Arc<dyn VoteRepository> = Arc::new(SqliteVoteRepository::new(pool.clone()));
    let listens: Arc<dyn ListenLog> = Arc::new(SqliteListenLog::new(pool.clone()));
    let orgs: Arc<dyn OrgDirectory> = Arc::new(SqliteOrgDirectory::new(pool.clone()));
    let staff: Arc<dyn StaffDirectory> = Arc::new(SqliteStaffDirectory::new(pool.clone()));
    let gate: Arc<dyn UsageGate> = Arc::new(SqliteUsageGate::new(pool.clone()));
    let limiter = Arc::new(UsageLimiter::new(gate));
    let pipeline = Arc::new(PipelineEngine::new(tracks.clone(), orgs.clone(), limiter.clone()));
    let ledger = Arc::new(VoteLedger::new(tracks.clone(), votes));
    let fatigue = Arc::new(FatigueAnalyzer::new(
        listens.clone(),
        tracks.clone(),
        orgs.clone(),
        FatigueConfig::default(),
    ));

    SessionDeps {
        resolver: ScopeResolver::new(staff, orgs),
        pipeline,
        ledger,
        fatigue,
        limiter,
        tracks,
        listens,
        feed,
    }
}

/// Sync config with a cooldown long enough that a test hits the throttle.
pub fn test_sync_config() -> SyncConfig {
    SyncConfig {
        focus_cooldown_secs: 30,
        read_retry_max_elapsed_secs: 1,
        feed_capacity: 64,
    }
}

/// Block until a watch channel satisfies the predicate, or panic after
/// two seconds.
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, pred: F)
where
    F: Fn(&T) -> bool,
{
    if pred(&*rx.borrow()) {
        return;
    }
    loop {
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("timed out waiting for watch update")
            .expect("watch channel closed");
        if pred(&*rx.borrow()) {
            return;
        }
    }
}
