//! # ytlatest-server
//!
//! HTTP surface: `POST /audio` with `{ "channelYouTube": "<handle>" }` answers
//! with the audio of that channel's newest upload as an MP3 attachment.

pub mod config;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod state;
pub mod telemetry;

use std::any::Any;

use axum::{
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

pub use config::Settings;
pub use state::AppState;

/// Build the router with every route and middleware layer.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/audio", post(handlers::audio::latest_audio))
        .route("/yt-audio-mp3", post(handlers::audio::latest_audio))
        .route("/latest-video", post(handlers::audio::latest_audio))
        .route("/health", get(handlers::health::health))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any)
        .expose_headers([HeaderName::from_static("x-video-title")])
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("Signal received, starting graceful shutdown");
}
