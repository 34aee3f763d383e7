//! Supabase (PostgREST) backend for the signup row count.

use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::Client;
use url::Url;

use growthboard_core::analytics::SignupStore;

use crate::error::SourceError;

/// PostgREST wrapper. Counts use `Prefer: count=exact` with `limit=0`, so no
/// rows cross the wire; the total comes back in `Content-Range`.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(http: Client, url: &str, service_key: &str) -> Result<Self, SourceError> {
        let base_url = Url::parse(url.trim())?;
        Ok(Self {
            http,
            base_url,
            service_key: service_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, SourceError> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SourceError::TableName(table.to_string()));
        }
        let root = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{root}/rest/v1/{table}"))?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("limit", "0");
        Ok(url)
    }

    pub async fn count_table(&self, table: &str) -> Result<u64, SourceError> {
        let resp = self
            .http
            .get(self.table_url(table)?)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SourceError::from_response("supabase", resp).await);
        }

        let header = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| SourceError::Malformed("missing Content-Range header".to_string()))?;
        parse_content_range_total(header)
            .ok_or_else(|| SourceError::Malformed(format!("unusable Content-Range {header:?}")))
    }
}

/// Total from a PostgREST `Content-Range` such as `0-24/3573` or `*/0`.
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

#[async_trait]
impl SignupStore for SupabaseClient {
    async fn count_rows(&self, table: &str) -> anyhow::Result<u64> {
        Ok(self.count_table(table).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range_total("*/3573"), Some(3573));
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn table_url_keeps_project_path() {
        let client =
            SupabaseClient::new(Client::new(), "https://abc.supabase.co/", "key").expect("client");
        let url = client.table_url("profiles").expect("url");
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/profiles?select=*&limit=0"
        );
    }

    #[test]
    fn table_names_are_restricted() {
        let client =
            SupabaseClient::new(Client::new(), "https://abc.supabase.co", "key").expect("client");
        assert!(matches!(
            client.table_url("profiles?select=secret"),
            Err(SourceError::TableName(_))
        ));
        assert!(matches!(client.table_url(""), Err(SourceError::TableName(_))));
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(matches!(
            SupabaseClient::new(Client::new(), "not a url", "key"),
            Err(SourceError::Url(_))
        ));
    }
}
