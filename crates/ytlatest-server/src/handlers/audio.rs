use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{delivery::deliver, error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AudioRequest {
    #[serde(rename = "channelYouTube", default)]
    pub channel: Option<String>,
}

/// Resolve the channel's newest upload and answer with its audio.
///
/// Dropping this future (the client disconnected) cancels every stage still
/// running. Once the response exists, the body's own drop takes over cleanup.
pub async fn latest_audio(
    State(state): State<AppState>,
    payload: Result<Json<AudioRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let channel = request.channel.unwrap_or_default();

    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let reference = state.resolver().resolve_handle(&channel, &cancel).await?;
    info!("Acquiring audio for {reference}");
    let acquired = state.acquirer().acquire(&reference, &cancel).await?;
    let response = deliver(acquired).await?;

    drop(guard.disarm());
    Ok(response)
}
