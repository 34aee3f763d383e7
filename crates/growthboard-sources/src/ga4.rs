//! Google Analytics 4 Data API backend (`properties/{id}:runReport`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use growthboard_core::analytics::AnalyticsBackend;
use growthboard_core::query::{MetricKind, MetricQuery};

use crate::error::SourceError;
use crate::oauth::ServiceAccountTokens;

pub const GA4_API_BASE: &str = "https://analyticsdata.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    Contains,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFilter {
    pub value: String,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub field_name: String,
    pub string_filter: StringFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterExpression {
    pub filter: Filter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_filter: Option<FilterExpression>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    #[serde(default)]
    metric_values: Vec<MetricValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

impl RunReportResponse {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First metric of the first row. GA4 omits rows entirely when the count
    /// is zero, so no rows means `0`.
    pub fn single_count(&self) -> Result<u64, SourceError> {
        let Some(row) = self.rows.first() else {
            return Ok(0);
        };
        let raw = row
            .metric_values
            .first()
            .map(|m| m.value.as_str())
            .ok_or_else(|| SourceError::Malformed("report row has no metric values".to_string()))?;
        raw.trim()
            .parse::<u64>()
            .map_err(|_| SourceError::Malformed(format!("non-integer metric value {raw:?}")))
    }
}

fn string_filter(field: &str, value: &str, match_type: MatchType) -> FilterExpression {
    FilterExpression {
        filter: Filter {
            field_name: field.to_string(),
            string_filter: StringFilter {
                value: value.to_string(),
                match_type,
            },
        },
    }
}

/// Translate a [`MetricQuery`] into the report body. Dates are the window's
/// calendar days in the dashboard timezone.
pub fn report_request(query: &MetricQuery) -> RunReportRequest {
    let (metric, dimension_filter) = match &query.kind {
        MetricKind::NewUsers => ("newUsers", None),
        MetricKind::NamedEvent(name) => (
            "eventCount",
            Some(string_filter("eventName", name, MatchType::Exact)),
        ),
        MetricKind::PagePathFilter(pattern) => (
            "screenPageViews",
            Some(string_filter("pagePath", pattern, MatchType::Contains)),
        ),
    };

    RunReportRequest {
        date_ranges: vec![DateRange {
            start_date: query.window.start_date().format("%Y-%m-%d").to_string(),
            end_date: query.window.end_date().format("%Y-%m-%d").to_string(),
        }],
        metrics: vec![Metric {
            name: metric.to_string(),
        }],
        dimension_filter,
    }
}

pub struct Ga4Client {
    http: Client,
    base_url: String,
    property_id: String,
    tokens: ServiceAccountTokens,
}

impl Ga4Client {
    pub fn new(http: Client, property_id: &str, tokens: ServiceAccountTokens) -> Self {
        Self {
            http,
            base_url: GA4_API_BASE.to_string(),
            property_id: property_id.trim().to_string(),
            tokens,
        }
    }

    /// Point the client at a different API root (used against mock servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    pub async fn run_report(
        &self,
        request: &RunReportRequest,
    ) -> Result<RunReportResponse, SourceError> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/properties/{}:runReport",
            self.base_url, self.property_id
        );

        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SourceError::from_response("analytics data api", resp).await);
        }

        resp.json::<RunReportResponse>()
            .await
            .map_err(|e| SourceError::Malformed(format!("runReport response: {e}")))
    }

    /// Small `activeUsers` report over yesterday and today, used by the
    /// connection check. Returns the number of rows GA4 sent back.
    pub async fn probe(&self) -> Result<usize, SourceError> {
        let request = RunReportRequest {
            date_ranges: vec![DateRange {
                start_date: "yesterday".to_string(),
                end_date: "today".to_string(),
            }],
            metrics: vec![Metric {
                name: "activeUsers".to_string(),
            }],
            dimension_filter: None,
        };
        Ok(self.run_report(&request).await?.row_count())
    }
}

#[async_trait]
impl AnalyticsBackend for Ga4Client {
    async fn run_count(&self, query: &MetricQuery) -> anyhow::Result<u64> {
        let response = self.run_report(&report_request(query)).await?;
        Ok(response.single_count()?)
    }
}
