//! Metric aggregation: raw counts in, [`DashboardSnapshot`] out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::analytics::{AnalyticsQueryClient, DatastoreQueryClient};
use crate::config::DashboardConfig;
use crate::funnel::{compute_funnel_rows, ratio, FunnelRow, FunnelStep};
use crate::query::MetricResult;
use crate::window::{resolve_windows, DashboardWindows, LookbackDays};

/// Funnel step count before collapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFunnelStep {
    pub name: String,
    pub result: MetricResult,
}

/// Every query outcome of one render, still tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMetrics {
    pub first_time_visits: MetricResult,
    pub signups: MetricResult,
    pub total_signups: MetricResult,
    pub funnel: Vec<RawFunnelStep>,
}

impl RawMetrics {
    /// Number of queries that came back unavailable.
    pub fn unavailable_count(&self) -> usize {
        [self.first_time_visits, self.signups, self.total_signups]
            .into_iter()
            .chain(self.funnel.iter().map(|s| s.result))
            .filter(|r| !r.is_available())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayCards {
    pub first_time_visits: u64,
    pub signups: u64,
    /// `signups / first_time_visits`, or `0.0` when there were no visits.
    pub conversion: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifetimeCard {
    pub total_signups: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub today: TodayCards,
    pub lifetime: LifetimeCard,
    pub funnel: Vec<FunnelRow>,
    pub lookback_days: u32,
}

pub fn conversion_rate(signups: u64, first_time_visits: u64) -> f64 {
    ratio(signups, first_time_visits).unwrap_or(0.0)
}

/// Collapse tagged outcomes and apply the ratio formulas.
pub fn aggregate(raw: &RawMetrics, lookback_days: LookbackDays) -> DashboardSnapshot {
    let first_time_visits = raw.first_time_visits.value_or_zero();
    let signups = raw.signups.value_or_zero();

    let steps: Vec<FunnelStep> = raw
        .funnel
        .iter()
        .map(|step| FunnelStep {
            name: step.name.clone(),
            total: step.result.value_or_zero(),
        })
        .collect();

    DashboardSnapshot {
        today: TodayCards {
            first_time_visits,
            signups,
            conversion: conversion_rate(signups, first_time_visits),
        },
        lifetime: LifetimeCard {
            total_signups: raw.total_signups.value_or_zero(),
        },
        funnel: compute_funnel_rows(&steps),
        lookback_days: lookback_days.days(),
    }
}

/// Request-scoped pipeline: windows → queries → aggregation.
///
/// Holds no per-render state; every call to [`Dashboard::snapshot`] queries
/// both backends from scratch.
#[derive(Clone)]
pub struct Dashboard {
    analytics: AnalyticsQueryClient,
    datastore: DatastoreQueryClient,
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new(
        analytics: AnalyticsQueryClient,
        datastore: DatastoreQueryClient,
        config: DashboardConfig,
    ) -> Self {
        Self {
            analytics,
            datastore,
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn windows(&self, now: DateTime<Utc>, lookback: LookbackDays) -> DashboardWindows {
        resolve_windows(now, self.config.timezone, lookback)
    }

    /// Issue every query of one render concurrently.
    ///
    /// Funnel steps run on a [`JoinSet`]; dropping this future aborts any
    /// step query still in flight.
    pub async fn collect(&self, windows: &DashboardWindows) -> RawMetrics {
        let funnel = self.config.funnel();
        let mut step_tasks = JoinSet::new();
        for (idx, step) in funnel.steps.iter().enumerate() {
            let client = self.analytics.clone();
            let kind = step.metric.clone();
            let window = windows.lookback;
            step_tasks.spawn(async move { (idx, client.count(kind, &window).await) });
        }

        let (first_time_visits, signups, total_signups) = tokio::join!(
            self.analytics.count_new_users(&windows.today),
            self.analytics
                .count_named_event(&self.config.events.signup, &windows.today),
            self.datastore.count_total_signups(),
        );

        let mut results = vec![MetricResult::Unavailable; funnel.steps.len()];
        while let Some(joined) = step_tasks.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    if let Some(slot) = results.get_mut(idx) {
                        *slot = result;
                    }
                }
                Err(error) => warn!(error = %error, "Funnel query task failed"),
            }
        }

        let steps: Vec<RawFunnelStep> = funnel
            .steps
            .into_iter()
            .zip(results)
            .map(|(step, result)| RawFunnelStep {
                name: step.name,
                result,
            })
            .collect();

        RawMetrics {
            first_time_visits,
            signups,
            total_signups,
            funnel: steps,
        }
    }

    pub async fn snapshot(&self, now: DateTime<Utc>, lookback: LookbackDays) -> DashboardSnapshot {
        let windows = self.windows(now, lookback);
        let raw = self.collect(&windows).await;
        debug!(
            lookback_days = lookback.days(),
            unavailable = raw.unavailable_count(),
            "Dashboard metrics collected"
        );
        aggregate(&raw, lookback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(visits: MetricResult, signups: MetricResult, funnel: &[u64]) -> RawMetrics {
        RawMetrics {
            first_time_visits: visits,
            signups,
            total_signups: MetricResult::Value(321),
            funnel: funnel
                .iter()
                .enumerate()
                .map(|(i, total)| RawFunnelStep {
                    name: format!("step {i}"),
                    result: MetricResult::Value(*total),
                })
                .collect(),
        }
    }

    #[test]
    fn conversion_is_zero_without_visits() {
        for signups in [0, 5, 10_000] {
            assert_eq!(conversion_rate(signups, 0), 0.0);
        }
        let snapshot = aggregate(
            &raw(MetricResult::Value(0), MetricResult::Value(5), &[1, 1]),
            LookbackDays::Seven,
        );
        assert_eq!(snapshot.today.conversion, 0.0);
        assert_eq!(snapshot.today.signups, 5);
    }

    #[test]
    fn conversion_divides_signups_by_visits() {
        let snapshot = aggregate(
            &raw(MetricResult::Value(200), MetricResult::Value(30), &[]),
            LookbackDays::Thirty,
        );
        assert!((snapshot.today.conversion - 0.15).abs() < 1e-9);
        assert_eq!(snapshot.lookback_days, 30);
        assert!(snapshot.funnel.is_empty());
    }

    #[test]
    fn unavailable_values_render_as_zero() {
        let mut metrics = raw(MetricResult::Unavailable, MetricResult::Value(3), &[10, 5]);
        metrics.total_signups = MetricResult::Unavailable;
        metrics.funnel[0].result = MetricResult::Unavailable;

        assert_eq!(metrics.unavailable_count(), 3);
        let snapshot = aggregate(&metrics, LookbackDays::Fourteen);
        assert_eq!(snapshot.today.first_time_visits, 0);
        assert_eq!(snapshot.today.conversion, 0.0);
        assert_eq!(snapshot.lifetime.total_signups, 0);
        assert_eq!(snapshot.funnel[0].total, 0);
        assert_eq!(snapshot.funnel[0].pct_of_first, None);
        assert_eq!(snapshot.funnel[0].drop_off_to_next, None);
    }

    #[test]
    fn lifetime_is_passthrough() {
        let snapshot = aggregate(
            &raw(MetricResult::Value(1), MetricResult::Value(1), &[]),
            LookbackDays::Seven,
        );
        assert_eq!(snapshot.lifetime.total_signups, 321);
    }
}
