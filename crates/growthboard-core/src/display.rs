//! Display strings for the cards and funnel table.
//!
//! This is the presentation boundary: missing ratios become [`PLACEHOLDER`]
//! and counts are grouped with thousands separators.

use serde::Serialize;

use crate::dashboard::DashboardSnapshot;

pub const PLACEHOLDER: &str = "—";

pub const FUNNEL_COLUMNS: [&str; 4] = ["Step", "Total", "% of Impressions", "Drop-off"];

/// `1234567` → `"1,234,567"`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `0.625` → `"62.5%"`, `0.6` → `"60%"`. One decimal at most.
pub fn format_percent(fraction: f64) -> String {
    let rounded = format!("{:.1}", fraction * 100.0);
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    format!("{trimmed}%")
}

pub fn format_optional_percent(fraction: Option<f64>) -> String {
    fraction
        .map(format_percent)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelRowView {
    pub step: String,
    pub total: String,
    pub pct_of_impressions: String,
    pub drop_off: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub today: Vec<CardView>,
    pub lifetime: CardView,
    pub funnel_title: String,
    pub funnel_columns: [&'static str; 4],
    pub funnel: Vec<FunnelRowView>,
}

fn card(label: &str, value: String) -> CardView {
    CardView {
        label: label.to_string(),
        value,
    }
}

pub fn render(snapshot: &DashboardSnapshot) -> DashboardView {
    DashboardView {
        today: vec![
            card("First-time visits", format_count(snapshot.today.first_time_visits)),
            card("Signups", format_count(snapshot.today.signups)),
            card("Conversion", format_percent(snapshot.today.conversion)),
        ],
        lifetime: card(
            "Total Signups (Lifetime)",
            format_count(snapshot.lifetime.total_signups),
        ),
        funnel_title: format!("Funnel (Last {} Days)", snapshot.lookback_days),
        funnel_columns: FUNNEL_COLUMNS,
        funnel: snapshot
            .funnel
            .iter()
            .map(|row| FunnelRowView {
                step: row.name.clone(),
                total: format_count(row.total),
                pct_of_impressions: format_optional_percent(row.pct_of_first),
                drop_off: format_optional_percent(row.drop_off_to_next),
            })
            .collect(),
    }
}
