//! Resolved dashboard settings handed to the core by the host process.

use chrono_tz::Tz;

use crate::error::CoreError;
use crate::funnel::{FunnelDefinition, FunnelStepDef};
use crate::query::MetricKind;

pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Analytics event names. `signup` feeds the today card and `discord_signup`
/// the last funnel step; the two are configured separately on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNames {
    pub signup: String,
    pub impression: String,
    pub register_click: String,
    pub discord_signup: String,
}

impl Default for EventNames {
    fn default() -> Self {
        Self {
            signup: "sign_up".to_string(),
            impression: "page_view".to_string(),
            register_click: "click_register".to_string(),
            discord_signup: "discord_signup".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub timezone: Tz,
    pub events: EventNames,
    /// Substring matched against page paths for the naming page step.
    pub naming_path: String,
    pub signup_table: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Los_Angeles,
            events: EventNames::default(),
            naming_path: "/naming".to_string(),
            signup_table: "profiles".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn parse_timezone(raw: &str) -> Result<Tz, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidTimezone(raw.to_string()));
        }
        trimmed
            .parse::<Tz>()
            .map_err(|_| CoreError::InvalidTimezone(trimmed.to_string()))
    }

    /// Reject blank names, which would turn a filter into "match everything".
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("signup event", &self.events.signup),
            ("impression event", &self.events.impression),
            ("register click event", &self.events.register_click),
            ("discord signup event", &self.events.discord_signup),
            ("naming page path", &self.naming_path),
            ("signup table", &self.signup_table),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::EmptySetting(label));
            }
        }
        Ok(())
    }

    /// Impressions → Naming Page Visits → Register Clicks → Discord Signups.
    pub fn funnel(&self) -> FunnelDefinition {
        FunnelDefinition {
            steps: vec![
                FunnelStepDef::new(
                    "Impressions",
                    MetricKind::NamedEvent(self.events.impression.clone()),
                ),
                FunnelStepDef::new(
                    "Naming Page Visits",
                    MetricKind::PagePathFilter(self.naming_path.clone()),
                ),
                FunnelStepDef::new(
                    "Register Clicks",
                    MetricKind::NamedEvent(self.events.register_click.clone()),
                ),
                FunnelStepDef::new(
                    "Discord Signups",
                    MetricKind::NamedEvent(self.events.discord_signup.clone()),
                ),
            ],
        }
    }
}
