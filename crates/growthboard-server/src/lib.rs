pub mod app;
pub mod check;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
