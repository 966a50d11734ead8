//! Staff fatigue and company-health analytics.
//!
//! Aggregates the listen log over trailing day/week/month windows,
//! caps per-window counts so one binge session cannot skew the relative
//! metric, and classifies each staff member's workload against the
//! workspace's submission volume. Reports are cached with a moka TTL
//! cache keyed per workspace and entity; entries expire purely by TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    FatigueConfig, HealthReport, LoadReport, LoadStatus, LoadWindow, ResolvedScope, ScopeFilter,
    WindowLoad,
};
use crate::domain::ports::{ListenLog, OrgDirectory, TrackRepository};

/// Maximum distinct entries kept per report cache.
const CACHE_MAX_CAPACITY: u64 = 1_000;

pub struct FatigueAnalyzer {
    listens: Arc<dyn ListenLog>,
    tracks: Arc<dyn TrackRepository>,
    orgs: Arc<dyn OrgDirectory>,
    config: FatigueConfig,
    /// Load reports keyed by (workspace key, staff id).
    load_cache: Cache<(String, Uuid), Arc<LoadReport>>,
    /// Health reports keyed by organization id.
    health_cache: Cache<Uuid, Arc<HealthReport>>,
}

impl FatigueAnalyzer {
    pub fn new(
        listens: Arc<dyn ListenLog>,
        tracks: Arc<dyn TrackRepository>,
        orgs: Arc<dyn OrgDirectory>,
        config: FatigueConfig,
    ) -> Self {
        let load_cache = Cache::builder()
            .max_capacity(CACHE_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(config.load_cache_ttl_secs))
            .build();
        let health_cache = Cache::builder()
            .max_capacity(CACHE_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(config.health_cache_ttl_secs))
            .build();

        Self { listens, tracks, orgs, config, load_cache, health_cache }
    }

    /// Cognitive-load report for one staff member, cached per workspace.
    pub async fn compute_load(
        &self,
        scope: &ResolvedScope,
        staff_id: Uuid,
    ) -> DomainResult<LoadReport> {
        if !scope.permissions.can_view_metrics {
            return Err(DomainError::forbidden("view staff metrics"));
        }

        let key = (scope.filter.cache_key(), staff_id);
        if let Some(hit) = self.load_cache.get(&key).await {
            return Ok((*hit).clone());
        }

        let report = self.compute_load_uncached(&scope.filter, staff_id).await?;
        self.load_cache.insert(key, Arc::new(report.clone())).await;
        Ok(report)
    }

    async fn compute_load_uncached(
        &self,
        filter: &ScopeFilter,
        staff_id: Uuid,
    ) -> DomainResult<LoadReport> {
        let now = Utc::now();

        let mut raw = [0u64; 3];
        let mut demand = [0u64; 3];
        for (i, window) in LoadWindow::ALL.iter().enumerate() {
            let since = now - window.duration();
            raw[i] = self.listens.count_for_staff(staff_id, since).await?;
            demand[i] = self.tracks.count_created_since(filter, since).await?;
        }
        // Sleeping is only meaningful when there is demand somewhere.
        let any_demand = demand.iter().any(|&d| d > 0);

        let mut loads = [WindowLoad {
            raw_listens: 0,
            capped_listens: 0,
            demand: 0,
            relative_pct: 100.0,
            status: LoadStatus::Optimal,
        }; 3];
        for (i, window) in LoadWindow::ALL.iter().enumerate() {
            let cap = self.config.daily_cap * window.cap_multiplier();
            let capped = raw[i].min(cap);
            let relative_pct = if demand[i] == 0 {
                // Fully caught up rather than undefined.
                100.0
            } else {
                capped as f64 / demand[i] as f64 * 100.0
            };
            let status = self.classify(raw[i], self.config.threshold(*window), relative_pct, any_demand);
            loads[i] = WindowLoad {
                raw_listens: raw[i],
                capped_listens: capped,
                demand: demand[i],
                relative_pct,
                status,
            };
        }

        let overall = loads
            .iter()
            .map(|l| l.status)
            .max()
            .unwrap_or(LoadStatus::Optimal);

        Ok(LoadReport {
            staff_id,
            day: loads[0],
            week: loads[1],
            month: loads[2],
            overall,
            computed_at: now,
        })
    }

    fn classify(&self, raw: u64, threshold: u64, relative_pct: f64, any_demand: bool) -> LoadStatus {
        if raw >= threshold {
            LoadStatus::Fatigued
        } else if relative_pct < self.config.sleeping_floor_pct && any_demand {
            LoadStatus::Sleeping
        } else if raw as f64 >= self.config.warning_ratio * threshold as f64 {
            LoadStatus::Warning
        } else {
            LoadStatus::Optimal
        }
    }

    /// Company-wide staffing health for one organization, cached per org.
    pub async fn compute_health(
        &self,
        scope: &ResolvedScope,
        org_id: Uuid,
    ) -> DomainResult<HealthReport> {
        if !scope.permissions.can_view_metrics {
            return Err(DomainError::forbidden("view company health"));
        }
        if !scope.filter.covers_org(Some(org_id)) {
            return Err(DomainError::forbidden("view another organization's health"));
        }

        if let Some(hit) = self.health_cache.get(&org_id).await {
            return Ok((*hit).clone());
        }

        let report = self.compute_health_uncached(org_id).await?;
        self.health_cache.insert(org_id, Arc::new(report.clone())).await;
        Ok(report)
    }

    async fn compute_health_uncached(&self, org_id: Uuid) -> DomainResult<HealthReport> {
        let now = Utc::now();
        let counts = self.orgs.staff_counts(org_id).await?;

        let org_filter = ScopeFilter::Orgs(vec![org_id]);
        let daily_demo_volume = self
            .tracks
            .count_created_since(&org_filter, now - LoadWindow::Day.duration())
            .await?;

        let demos_per_staff = daily_demo_volume as f64 / counts.active.max(1) as f64;
        let staffing_alert = demos_per_staff > self.config.daily_cap as f64;

        let weekly = self
            .listens
            .counts_by_staff(org_id, now - LoadWindow::Week.duration())
            .await?;
        let fatigued_staff_count = weekly
            .iter()
            .filter(|(_, count)| *count >= self.config.threshold_week)
            .count() as u64;

        let fatigued_ratio = if counts.total == 0 {
            0.0
        } else {
            fatigued_staff_count as f64 / counts.total as f64
        };
        let health_score =
            (100.0 - 50.0 * fatigued_ratio - 30.0 * f64::from(staffing_alert as u8)).clamp(0.0, 100.0);

        Ok(HealthReport {
            organization_id: org_id,
            staff_count: counts.total,
            active_staff_count: counts.active,
            daily_demo_volume,
            demos_per_staff,
            staffing_alert,
            fatigued_staff_count,
            health_score,
            computed_at: now,
        })
    }
}
