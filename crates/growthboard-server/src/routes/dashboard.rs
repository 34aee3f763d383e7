use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use growthboard_core::display::render;
use growthboard_core::window::LookbackDays;

use crate::state::AppState;

/// Lookback from raw query pairs. The first `lookback_days` wins; repeated or
/// malformed values degrade to the fallback lookback instead of a 400.
pub fn lookback_from_pairs(pairs: &[(String, String)]) -> LookbackDays {
    let selection = pairs
        .iter()
        .find(|(key, _)| key == "lookback_days")
        .map(|(_, raw)| raw.trim().parse::<u32>().unwrap_or(0));
    LookbackDays::from_selection(selection)
}

/// `GET /api/dashboard` - today cards, lifetime card and funnel.
#[tracing::instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<Value> {
    let lookback = lookback_from_pairs(&pairs);
    let snapshot = state.dashboard.snapshot(Utc::now(), lookback).await;
    let display = render(&snapshot);

    Json(json!({
        "data": snapshot,
        "display": display,
        "lookback_options": LookbackDays::option_days(),
        "timezone": state.dashboard.config().timezone.name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn lookback_selection() {
        assert_eq!(lookback_from_pairs(&[]), LookbackDays::INITIAL);
        assert_eq!(
            lookback_from_pairs(&pairs(&[("other", "1")])),
            LookbackDays::INITIAL
        );
        assert_eq!(
            lookback_from_pairs(&pairs(&[("lookback_days", "30")])),
            LookbackDays::Thirty
        );
        assert_eq!(
            lookback_from_pairs(&pairs(&[("lookback_days", " 7 ")])),
            LookbackDays::Seven
        );
        assert_eq!(
            lookback_from_pairs(&pairs(&[("lookback_days", "90")])),
            LookbackDays::FALLBACK
        );
        assert_eq!(
            lookback_from_pairs(&pairs(&[("lookback_days", "two weeks")])),
            LookbackDays::FALLBACK
        );
        assert_eq!(
            lookback_from_pairs(&pairs(&[("lookback_days", "")])),
            LookbackDays::FALLBACK
        );
    }

    #[test]
    fn repeated_key_uses_first_value() {
        assert_eq!(
            lookback_from_pairs(&pairs(&[("lookback_days", "30"), ("lookback_days", "14")])),
            LookbackDays::Thirty
        );
    }
}
