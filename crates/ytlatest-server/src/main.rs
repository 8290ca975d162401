use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use ytlatest_server::{app, shutdown_signal, telemetry::init_tracing, AppState, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    init_tracing(settings.logging.json);

    info!("Starting ytlatest v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_settings(&settings).context("Failed to initialise services")?;
    let addr = settings.server.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{addr}");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
