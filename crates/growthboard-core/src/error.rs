use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("{0} cannot be empty")]
    EmptySetting(&'static str),
}
