//! Fatigue analytics over the SQLite-backed listen log.

mod helpers;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use demodesk::adapters::sqlite::{SqliteListenLog, SqliteOrgDirectory, SqliteTrackRepository};
use demodesk::domain::models::{
    FatigueConfig, ListenEvent, LoadStatus, Organization, Permissions, StaffRole,
};
use demodesk::{FatigueAnalyzer, ListenLog, NewTrack, OrgDirectory, TrackRepository};

use helpers::database::{
    make_engine, org_scope, seed_membership, seed_org, seed_staff, setup_test_db,
};

fn make_analyzer(pool: &sqlx::SqlitePool, config: FatigueConfig) -> FatigueAnalyzer {
    let listens: Arc<dyn ListenLog> = Arc::new(SqliteListenLog::new(pool.clone()));
    let tracks: Arc<dyn TrackRepository> = Arc::new(SqliteTrackRepository::new(pool.clone()));
    let orgs: Arc<dyn OrgDirectory> = Arc::new(SqliteOrgDirectory::new(pool.clone()));
    FatigueAnalyzer::new(listens, tracks, orgs, config)
}

/// Record `count` listens for one staff member, backdated by `age`.
async fn seed_listens(
    pool: &sqlx::SqlitePool,
    staff_id: Uuid,
    track_id: Uuid,
    org_id: Uuid,
    count: usize,
    age: Duration,
) {
    let log = SqliteListenLog::new(pool.clone());
    for _ in 0..count {
        let mut event = ListenEvent::new(staff_id, track_id, Some(org_id));
        event.listened_at = Utc::now() - age;
        log.record(&event).await.unwrap();
    }
}

async fn seed_demos(pool: &sqlx::SqlitePool, staff_id: Uuid, org_id: Uuid, count: usize) -> Uuid {
    let engine = make_engine(pool);
    let scope = org_scope(staff_id, &[org_id], Permissions::all());
    let mut last = Uuid::nil();
    for i in 0..count {
        last = engine
            .submit_track(
                &scope,
                NewTrack {
                    title: format!("Demo {i}"),
                    artist_name: "Artist".to_string(),
                    ..NewTrack::default()
                },
            )
            .await
            .unwrap()
            .id;
    }
    last
}

#[tokio::test]
async fn test_windows_partition_by_age() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let staff_id = seed_staff(&pool, "ava", false).await;
    let track_id = seed_demos(&pool, staff_id, org.id, 1).await;

    // 5 listens today, 10 three days ago, 20 two weeks ago.
    seed_listens(&pool, staff_id, track_id, org.id, 5, Duration::hours(1)).await;
    seed_listens(&pool, staff_id, track_id, org.id, 10, Duration::days(3)).await;
    seed_listens(&pool, staff_id, track_id, org.id, 20, Duration::days(14)).await;

    let analyzer = make_analyzer(&pool, FatigueConfig::default());
    let scope = org_scope(staff_id, &[org.id], Permissions::all());
    let report = analyzer.compute_load(&scope, staff_id).await.unwrap();

    assert_eq!(report.day.raw_listens, 5);
    assert_eq!(report.week.raw_listens, 15);
    assert_eq!(report.month.raw_listens, 35);
}

#[tokio::test]
async fn test_daily_binge_reads_fatigued_through_the_store() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let staff_id = seed_staff(&pool, "ava", false).await;

    let track_id = seed_demos(&pool, staff_id, org.id, 50).await;
    seed_listens(&pool, staff_id, track_id, org.id, 75, Duration::hours(2)).await;

    let analyzer = make_analyzer(&pool, FatigueConfig::default());
    let scope = org_scope(staff_id, &[org.id], Permissions::all());
    let report = analyzer.compute_load(&scope, staff_id).await.unwrap();

    assert_eq!(report.day.raw_listens, 75);
    assert_eq!(report.day.capped_listens, 60);
    assert_eq!(report.day.demand, 50);
    assert_eq!(report.day.status, LoadStatus::Fatigued);
    assert_eq!(report.overall, LoadStatus::Fatigued);
}

#[tokio::test]
async fn test_weekly_census_drives_company_health() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let tired = seed_staff(&pool, "tired", false).await;
    let fresh = seed_staff(&pool, "fresh", false).await;
    seed_membership(&pool, tired, org.id, StaffRole::Manager).await;
    seed_membership(&pool, fresh, org.id, StaffRole::Scout).await;

    let track_id = seed_demos(&pool, tired, org.id, 4).await;
    // Weekly threshold is 300; spread the listens inside the week.
    seed_listens(&pool, tired, track_id, org.id, 150, Duration::days(1)).await;
    seed_listens(&pool, tired, track_id, org.id, 160, Duration::days(5)).await;
    seed_listens(&pool, fresh, track_id, org.id, 30, Duration::days(2)).await;

    let analyzer = make_analyzer(&pool, FatigueConfig::default());
    let scope = org_scope(tired, &[org.id], Permissions::all());
    let report = analyzer.compute_health(&scope, org.id).await.unwrap();

    assert_eq!(report.staff_count, 2);
    assert_eq!(report.active_staff_count, 2);
    assert_eq!(report.fatigued_staff_count, 1);
    assert_eq!(report.daily_demo_volume, 4);
    assert!(!report.staffing_alert);
    // 100 - 50 * (1/2)
    assert!((report.health_score - 75.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_health_cache_expires_by_ttl() {
    let pool = setup_test_db().await;
    let org = Organization::new("Night Shift Records");
    seed_org(&pool, &org).await;
    let staff_id = seed_staff(&pool, "ava", false).await;
    seed_membership(&pool, staff_id, org.id, StaffRole::Owner).await;

    let config = FatigueConfig { health_cache_ttl_secs: 1, ..FatigueConfig::default() };
    let analyzer = make_analyzer(&pool, config);
    let scope = org_scope(staff_id, &[org.id], Permissions::all());

    let before = analyzer.compute_health(&scope, org.id).await.unwrap();
    assert_eq!(before.daily_demo_volume, 0);

    seed_demos(&pool, staff_id, org.id, 3).await;

    // Still inside the TTL: the cached report is served.
    let cached = analyzer.compute_health(&scope, org.id).await.unwrap();
    assert_eq!(cached.daily_demo_volume, 0);

    // After expiry the report recomputes.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let after = analyzer.compute_health(&scope, org.id).await.unwrap();
    assert_eq!(after.daily_demo_volume, 3);
}
