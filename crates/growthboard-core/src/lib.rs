pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod funnel;
pub mod query;
pub mod window;
