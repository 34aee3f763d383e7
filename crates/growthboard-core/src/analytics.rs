//! Backend abstraction for the two external systems.
//!
//! Backends report failures as `anyhow::Error`. The query clients in this
//! module sit in front of them and turn every failure into
//! [`MetricResult::Unavailable`], so nothing from a remote call can abort a
//! dashboard render.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::query::{MetricKind, MetricQuery, MetricResult};
use crate::window::TimeWindow;

/// An event-analytics API able to answer single aggregate counts.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync + 'static {
    /// Run one aggregate count. An empty report is a legitimate `Ok(0)`.
    async fn run_count(&self, query: &MetricQuery) -> anyhow::Result<u64>;
}

/// A relational store holding the canonical signup records.
#[async_trait]
pub trait SignupStore: Send + Sync + 'static {
    async fn count_rows(&self, table: &str) -> anyhow::Result<u64>;
}

/// Fail-soft front for an [`AnalyticsBackend`]. One remote query per call.
#[derive(Clone)]
pub struct AnalyticsQueryClient {
    backend: Arc<dyn AnalyticsBackend>,
}

impl AnalyticsQueryClient {
    pub fn new(backend: Arc<dyn AnalyticsBackend>) -> Self {
        Self { backend }
    }

    pub async fn count_new_users(&self, window: &TimeWindow) -> MetricResult {
        self.count(MetricKind::NewUsers, window).await
    }

    pub async fn count_named_event(&self, event_name: &str, window: &TimeWindow) -> MetricResult {
        self.count(MetricKind::NamedEvent(event_name.to_string()), window)
            .await
    }

    pub async fn count_page_visits(&self, path_pattern: &str, window: &TimeWindow) -> MetricResult {
        self.count(MetricKind::PagePathFilter(path_pattern.to_string()), window)
            .await
    }

    /// Run any query kind. Funnel steps dispatch through here so the step list
    /// decides which of the three operations is used.
    pub async fn count(&self, kind: MetricKind, window: &TimeWindow) -> MetricResult {
        let query = MetricQuery::new(kind, *window);
        match self.backend.run_count(&query).await {
            Ok(value) => MetricResult::Value(value),
            Err(error) => {
                warn!(
                    metric = %query.kind,
                    start = %query.window.start_date(),
                    end = %query.window.end_date(),
                    error = %error,
                    "Analytics query failed; showing zero"
                );
                MetricResult::Unavailable
            }
        }
    }
}

/// Fail-soft front for a [`SignupStore`].
#[derive(Clone)]
pub struct DatastoreQueryClient {
    store: Arc<dyn SignupStore>,
    table: String,
}

impl DatastoreQueryClient {
    pub fn new(store: Arc<dyn SignupStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Row count of the signup table.
    pub async fn count_total_signups(&self) -> MetricResult {
        match self.store.count_rows(&self.table).await {
            Ok(value) => MetricResult::Value(value),
            Err(error) => {
                warn!(table = %self.table, error = %error, "Signup count failed; showing zero");
                MetricResult::Unavailable
            }
        }
    }
}
