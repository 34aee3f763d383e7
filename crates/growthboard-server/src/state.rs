use std::sync::Arc;

use anyhow::Context;

use growthboard_core::analytics::{AnalyticsQueryClient, DatastoreQueryClient};
use growthboard_core::dashboard::Dashboard;
use growthboard_sources::{
    http_client, Ga4Client, ServiceAccountKey, ServiceAccountTokens, SupabaseClient,
};

use crate::config::ServerConfig;

/// Shared application state injected into every handler via
/// [`axum::extract::State`].
///
/// Holds no cached metrics: each dashboard request queries both backends.
pub struct AppState {
    pub dashboard: Dashboard,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self { dashboard }
    }

    /// Wire the live GA4 and Supabase backends from `config`.
    ///
    /// Only local validation happens here (key parsing, URL shape). Nothing
    /// is fetched until the first request.
    pub fn connect(config: &ServerConfig) -> anyhow::Result<Self> {
        let dashboard_config = config.dashboard()?;
        let http = http_client(config.request_timeout())?;

        let key = ServiceAccountKey::from_json(&config.ga4_service_account_json)
            .context("GA4_SERVICE_ACCOUNT_JSON")?;
        let tokens = ServiceAccountTokens::new(http.clone(), key)
            .context("GA4_SERVICE_ACCOUNT_JSON private_key")?;
        tracing::info!(
            client_email = tokens.client_email(),
            property_id = %config.ga4_property_id,
            "GA4 service account loaded"
        );
        let ga4 = Ga4Client::new(http.clone(), &config.ga4_property_id, tokens);

        let supabase = SupabaseClient::new(
            http,
            &config.supabase_url,
            &config.supabase_service_role_key,
        )
        .context("SUPABASE_URL")?;

        let analytics = AnalyticsQueryClient::new(Arc::new(ga4));
        let datastore =
            DatastoreQueryClient::new(Arc::new(supabase), dashboard_config.signup_table.clone());

        Ok(Self::new(Dashboard::new(
            analytics,
            datastore,
            dashboard_config,
        )))
    }
}
