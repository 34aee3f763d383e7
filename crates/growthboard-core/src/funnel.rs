use serde::Serialize;

use crate::query::MetricKind;

/// A funnel step as configured: display name plus the count behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStepDef {
    pub name: String,
    pub metric: MetricKind,
}

impl FunnelStepDef {
    pub fn new(name: impl Into<String>, metric: MetricKind) -> Self {
        Self {
            name: name.into(),
            metric,
        }
    }
}

/// Ordered funnel steps, broadest first. Order is semantic and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelDefinition {
    pub steps: Vec<FunnelStepDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStep {
    pub name: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelRow {
    pub name: String,
    pub total: u64,
    /// `total / first step total`; `None` when the first step is zero.
    pub pct_of_first: Option<f64>,
    /// `1 - next / total`; `None` for the last row or when `total` is zero.
    /// Negative when the next step counted more than this one.
    pub drop_off_to_next: Option<f64>,
}

/// `numerator / denominator`, or `None` for a zero denominator.
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

pub fn compute_funnel_rows(steps: &[FunnelStep]) -> Vec<FunnelRow> {
    let first_total = steps.first().map(|s| s.total).unwrap_or(0);

    steps
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            let drop_off_to_next = steps
                .get(idx + 1)
                .and_then(|next| ratio(next.total, step.total))
                .map(|kept| 1.0 - kept);

            FunnelRow {
                name: step.name.clone(),
                total: step.total,
                pct_of_first: ratio(step.total, first_total),
                drop_off_to_next,
            }
        })
        .collect()
}
