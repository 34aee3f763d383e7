//! `growthboard check`: verify the four secrets and make one live call to
//! each backend before the dashboard is deployed.

use growthboard_sources::{
    http_client, Ga4Client, ServiceAccountKey, ServiceAccountTokens, SourceError, SupabaseClient,
};

use crate::config::{required_settings_status, ServerConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCheck {
    pub source: &'static str,
    /// Success detail or failure message.
    pub outcome: Result<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub settings: Vec<(&'static str, bool)>,
    /// Empty when a required setting is missing; live calls are skipped then.
    pub sources: Vec<SourceCheck>,
}

impl CheckReport {
    pub fn settings_found(&self) -> bool {
        self.settings.iter().all(|(_, found)| *found)
    }

    pub fn passed(&self) -> bool {
        self.settings_found()
            && !self.sources.is_empty()
            && self.sources.iter().all(|s| s.outcome.is_ok())
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .settings
            .iter()
            .map(|(name, found)| {
                if *found {
                    format!("ok    found {name}")
                } else {
                    format!("FAIL  {name} not set")
                }
            })
            .collect();

        for check in &self.sources {
            lines.push(match &check.outcome {
                Ok(detail) => format!("ok    {}: {detail}", check.source),
                Err(message) => format!("FAIL  {}: {message}", check.source),
            });
        }

        lines.push(if self.passed() {
            "All connections are working.".to_string()
        } else if !self.settings_found() {
            "Set the missing settings and run the check again.".to_string()
        } else {
            "One or more connections failed.".to_string()
        });
        lines
    }
}

pub async fn run_checks(lookup: impl Fn(&str) -> Option<String>) -> CheckReport {
    let settings = required_settings_status(&lookup);
    if !settings.iter().all(|(_, found)| *found) {
        return CheckReport {
            settings,
            sources: Vec::new(),
        };
    }

    let sources = match ServerConfig::from_lookup(&lookup) {
        Ok(config) => vec![check_supabase(&config).await, check_ga4(&config).await],
        Err(e) => vec![SourceCheck {
            source: "config",
            outcome: Err(e.to_string()),
        }],
    };
    CheckReport { settings, sources }
}

async fn check_supabase(config: &ServerConfig) -> SourceCheck {
    let table = config.signup_table.as_str();
    let outcome = async {
        let http = http_client(config.request_timeout())?;
        SupabaseClient::new(http, &config.supabase_url, &config.supabase_service_role_key)?
            .count_table(table)
            .await
    }
    .await
    .map(|rows| format!("{rows} rows in `{table}`"))
    .map_err(|e| with_hint(&e, supabase_hint(&e, table)));

    SourceCheck {
        source: "supabase",
        outcome,
    }
}

async fn check_ga4(config: &ServerConfig) -> SourceCheck {
    let outcome = async {
        let http = http_client(config.request_timeout())?;
        let key = ServiceAccountKey::from_json(&config.ga4_service_account_json)?;
        let tokens = ServiceAccountTokens::new(http.clone(), key)?;
        Ga4Client::new(http, &config.ga4_property_id, tokens)
            .probe()
            .await
    }
    .await
    .map(|rows| format!("test report returned {rows} rows"))
    .map_err(|e| with_hint(&e, ga4_hint(&e)));

    SourceCheck {
        source: "ga4",
        outcome,
    }
}

fn with_hint(err: &SourceError, hint: Option<String>) -> String {
    match hint {
        Some(hint) => format!("{err} ({hint})"),
        None => err.to_string(),
    }
}

fn supabase_hint(err: &SourceError, table: &str) -> Option<String> {
    match err {
        SourceError::Status {
            status: 401 | 403, ..
        } => Some("check SUPABASE_SERVICE_ROLE_KEY".to_string()),
        SourceError::Status { status: 404, .. } => Some(format!("does table `{table}` exist?")),
        SourceError::Url(_) | SourceError::Http(_) => Some("check SUPABASE_URL".to_string()),
        _ => None,
    }
}

fn ga4_hint(err: &SourceError) -> Option<String> {
    match err {
        SourceError::ServiceAccount(_) => Some(
            "GA4_SERVICE_ACCOUNT_JSON must hold the whole service account key file".to_string(),
        ),
        SourceError::Status { status: 403, .. } => Some(
            "grant the service account Viewer access on the GA4 property".to_string(),
        ),
        SourceError::Status { status: 400, .. } => {
            Some("GA4_PROPERTY_ID may be incorrect".to_string())
        }
        _ => None,
    }
}
