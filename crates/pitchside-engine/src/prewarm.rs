//! Prewarm driver.
//!
//! Builds snapshots ahead of anticipated playback positions so interactive
//! reads hit the cache. Purely a latency optimization, never required for
//! correctness.

use std::sync::Arc;

use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use pitchside_models::VideoId;

use crate::builder::SnapshotBuilder;
use crate::error::EngineResult;
use crate::store::AnnotationStore;

/// Default spacing between prewarmed timestamps.
pub const DEFAULT_STEP_SECS: f64 = 1.0;

/// Default number of builds in flight.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default ceiling on how far into a video prewarming reaches.
pub const DEFAULT_HORIZON_SECS: f64 = 600.0;

/// Prewarm configuration.
#[derive(Debug, Clone)]
pub struct PrewarmConfig {
    /// Seconds between consecutive prewarmed timestamps
    pub step_secs: f64,
    /// Bounded build concurrency
    pub concurrency: usize,
    /// Maximum horizon; caps total work for long videos
    pub horizon_secs: f64,
}

impl Default for PrewarmConfig {
    fn default() -> Self {
        Self {
            step_secs: DEFAULT_STEP_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            horizon_secs: DEFAULT_HORIZON_SECS,
        }
    }
}

impl PrewarmConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            step_secs: std::env::var("PREWARM_STEP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s: &f64| *s > 0.0)
                .unwrap_or(DEFAULT_STEP_SECS),
            concurrency: std::env::var("PREWARM_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_CONCURRENCY),
            horizon_secs: std::env::var("PREWARM_HORIZON_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_HORIZON_SECS),
        }
    }
}

/// Prewarms snapshots for a video across its playable range.
pub struct PrewarmDriver {
    annotations: Arc<dyn AnnotationStore>,
    builder: SnapshotBuilder,
    config: PrewarmConfig,
}

impl PrewarmDriver {
    /// Create a driver over the given store and builder.
    pub fn new(
        annotations: Arc<dyn AnnotationStore>,
        builder: SnapshotBuilder,
        config: PrewarmConfig,
    ) -> Self {
        Self {
            annotations,
            builder,
            config,
        }
    }

    /// Build snapshots at `0, step, 2*step, ..` up to the video duration
    /// clamped to the horizon. Returns the number of snapshots built.
    ///
    /// Individual build failures are logged and skipped; the run continues.
    pub async fn prewarm(&self, video_id: &VideoId) -> EngineResult<u32> {
        let Some(analysis) = self.annotations.latest_analysis(video_id).await? else {
            debug!(video_id = %video_id, "No analysis yet, nothing to prewarm");
            return Ok(0);
        };

        // Approximate the duration from the latest-ending detection.
        let detections = self.annotations.object_detections(&analysis.id).await?;
        let duration = detections
            .iter()
            .map(|d| d.time.end)
            .fold(0.0_f64, f64::max);
        let horizon = duration.min(self.config.horizon_secs);

        // A non-positive or non-finite step would never advance the loop.
        let step = if self.config.step_secs > 0.0 && self.config.step_secs.is_finite() {
            self.config.step_secs
        } else {
            DEFAULT_STEP_SECS
        };

        let mut timestamps = Vec::new();
        let mut t = 0.0;
        while t <= horizon {
            timestamps.push(t);
            t += step;
        }

        let built = stream::iter(timestamps)
            .map(|t| self.build_one(video_id, t))
            .buffer_unordered(self.config.concurrency.max(1))
            .fold(0u32, |acc, n| async move { acc + n })
            .await;

        info!(video_id = %video_id, built, horizon, "Prewarm complete");
        Ok(built)
    }

    async fn build_one(&self, video_id: &VideoId, t: f64) -> u32 {
        match self.builder.build(video_id, t).await {
            Ok(Some(_)) => 1,
            Ok(None) => 0,
            Err(e) => {
                warn!(video_id = %video_id, t, error = %e, "Prewarm build failed, skipping");
                0
            }
        }
    }
}
