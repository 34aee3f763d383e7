use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use growthboard_server::config::ServerConfig;
use growthboard_server::state::AppState;

/// `growthboard health` - liveness probe for container health checks.
///
/// Calls `GET http://localhost:$GROWTHBOARD_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("GROWTHBOARD_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

/// `growthboard check` - print one line per setting and backend.
async fn run_connection_check() -> ! {
    let report = growthboard_server::check::run_checks(|name| std::env::var(name).ok()).await;
    for line in report.lines() {
        println!("{line}");
    }
    std::process::exit(if report.passed() { 0 } else { 1 })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("health") => run_health_check(),
        Some("check") => run_connection_check().await,
        _ => {}
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("growthboard=info".parse()?),
        )
        .json()
        .init();

    let cfg = ServerConfig::from_env()?;
    let state = Arc::new(AppState::connect(&cfg)?);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = growthboard_server::app::build_app(Arc::clone(&state));

    info!(
        port = cfg.port,
        timezone = %cfg.timezone,
        "Growthboard listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Growthboard stopped");
    Ok(())
}
