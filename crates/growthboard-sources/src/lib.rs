//! HTTP backends for the Google Analytics 4 Data API and Supabase PostgREST.

pub mod error;
pub mod ga4;
pub mod oauth;
pub mod supabase;

use std::time::Duration;

use reqwest::Client;

pub use error::SourceError;
pub use ga4::Ga4Client;
pub use oauth::{ServiceAccountKey, ServiceAccountTokens};
pub use supabase::SupabaseClient;

/// Shared pooled client. `timeout` bounds each whole request, so a hung
/// remote surfaces as an error instead of stalling the render.
pub fn http_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("growthboard/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(SourceError::Http)
}
