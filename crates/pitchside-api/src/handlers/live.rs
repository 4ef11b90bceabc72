//! Live state handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use pitchside_models::{LiveSnapshot, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Live state query params.
#[derive(Deserialize)]
pub struct LiveStateQuery {
    /// Playback offset in seconds; defaults to the start of the video
    pub t: Option<f64>,
}

/// Live state response.
///
/// `analyzed: false` with no snapshot means the video has no completed
/// annotation run yet; the client should poll rather than treat it as an
/// error.
#[derive(Serialize)]
pub struct LiveStateResponse {
    pub analyzed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<LiveSnapshot>,
}

/// Get the live state of a video at a playback offset.
pub async fn get_live_state(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<LiveStateQuery>,
) -> ApiResult<Json<LiveStateResponse>> {
    let t = query.t.unwrap_or(0.0);
    if !t.is_finite() {
        return Err(ApiError::bad_request("t must be a finite number"));
    }

    let video_id = VideoId::from_string(video_id);
    let snapshot = state.reader.read(&video_id, t).await?;

    Ok(Json(LiveStateResponse {
        analyzed: snapshot.is_some(),
        snapshot,
    }))
}

/// Prime response.
#[derive(Serialize)]
pub struct PrimeResponse {
    pub status: String,
}

/// Trigger a prewarm run for a video. Fire-and-forget: the run continues
/// in the background and its errors are logged, never surfaced.
pub async fn prime_live_state(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> (StatusCode, Json<PrimeResponse>) {
    let video_id = VideoId::from_string(video_id);
    let prewarm = state.prewarm.clone();

    tokio::spawn(async move {
        match prewarm.prewarm(&video_id).await {
            Ok(built) => {
                info!(video_id = %video_id, built, "Prewarm run finished");
                metrics::record_prewarm_run("ok", built);
            }
            Err(e) => {
                error!(video_id = %video_id, error = %e, "Prewarm run failed");
                metrics::record_prewarm_run("error", 0);
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(PrimeResponse {
            status: "prewarm started".to_string(),
        }),
    )
}
