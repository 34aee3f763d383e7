use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid service account key: {0}")]
    ServiceAccount(String),

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid table name: {0}")]
    TableName(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Build a [`SourceError::Status`] from a non-success response, keeping
    /// the body for logs.
    pub(crate) async fn from_response(service: &'static str, resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        SourceError::Status {
            service,
            status,
            body,
        }
    }
}
