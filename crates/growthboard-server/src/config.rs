use std::fmt;
use std::time::Duration;

use thiserror::Error;

use growthboard_core::config::{DashboardConfig, EventNames, DEFAULT_TIMEZONE};
use growthboard_core::error::CoreError;

/// The four settings without which neither backend can be reached.
pub const REQUIRED_SETTINGS: [&str; 4] = [
    "GA4_PROPERTY_ID",
    "GA4_SERVICE_ACCOUNT_JSON",
    "SUPABASE_URL",
    "SUPABASE_SERVICE_ROLE_KEY",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error(transparent)]
    Dashboard(#[from] CoreError),
}

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub ga4_property_id: String,
    pub ga4_service_account_json: String,
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub request_timeout_secs: u64,
    pub timezone: String,
    pub events: EventNames,
    pub naming_path: String,
    pub signup_table: String,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("ga4_property_id", &self.ga4_property_id)
            .field("ga4_service_account_json", &"<redacted>")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_service_role_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("timezone", &self.timezone)
            .field("events", &self.events)
            .field("naming_path", &self.naming_path)
            .field("signup_table", &self.signup_table)
            .finish()
    }
}

/// `Some` only for set, non-blank values.
fn present(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Which required settings are present, in [`REQUIRED_SETTINGS`] order.
pub fn required_settings_status(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, bool)> {
    REQUIRED_SETTINGS
        .iter()
        .map(|name| (*name, present(&lookup, name).is_some()))
        .collect()
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key/value source; `from_env` passes the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| present(&lookup, name).ok_or(ConfigError::Missing(name));
        let or_default =
            |name: &str, default: &str| present(&lookup, name).unwrap_or_else(|| default.to_string());
        let defaults = EventNames::default();

        Ok(Self {
            port: or_default("GROWTHBOARD_PORT", "3000")
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid {
                    name: "GROWTHBOARD_PORT",
                    reason: format!("{e}"),
                })?,
            ga4_property_id: require("GA4_PROPERTY_ID")?,
            ga4_service_account_json: require("GA4_SERVICE_ACCOUNT_JSON")?,
            supabase_url: require("SUPABASE_URL")?,
            supabase_service_role_key: require("SUPABASE_SERVICE_ROLE_KEY")?,
            request_timeout_secs: or_default("GROWTHBOARD_REQUEST_TIMEOUT_SECS", "10")
                .trim()
                .parse::<u64>()
                .map_err(|e| e.to_string())
                .and_then(|secs| {
                    if secs == 0 {
                        Err("must be at least 1 second".to_string())
                    } else {
                        Ok(secs)
                    }
                })
                .map_err(|reason| ConfigError::Invalid {
                    name: "GROWTHBOARD_REQUEST_TIMEOUT_SECS",
                    reason,
                })?,
            timezone: or_default("GROWTHBOARD_TIMEZONE", DEFAULT_TIMEZONE),
            events: EventNames {
                signup: or_default("GROWTHBOARD_SIGNUP_EVENT", &defaults.signup),
                impression: or_default("GROWTHBOARD_IMPRESSION_EVENT", &defaults.impression),
                register_click: or_default("GROWTHBOARD_REGISTER_EVENT", &defaults.register_click),
                discord_signup: or_default("GROWTHBOARD_DISCORD_EVENT", &defaults.discord_signup),
            },
            naming_path: or_default("GROWTHBOARD_NAMING_PATH", "/naming"),
            signup_table: or_default("GROWTHBOARD_SIGNUP_TABLE", "profiles"),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the core's view of the settings.
    pub fn dashboard(&self) -> Result<DashboardConfig, ConfigError> {
        let config = DashboardConfig {
            timezone: DashboardConfig::parse_timezone(&self.timezone)?,
            events: self.events.clone(),
            naming_path: self.naming_path.clone(),
            signup_table: self.signup_table.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
