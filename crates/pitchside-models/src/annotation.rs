//! Annotation event models.
//!
//! These are the durable rows produced by one annotation run over a video.
//! They are written by the ingestion pipeline and read-only from the
//! engine's perspective: once an analysis completes, its rows never change.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time_range::TimeRange;
use crate::video::VideoId;

/// One completed annotation run over a video.
///
/// Groups the object/text/label rows of that run. Only the most recent
/// analysis per video is considered live.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoAnalysis {
    /// Unique identifier for this analysis run (UUID)
    pub id: String,

    /// Video this analysis belongs to
    pub video_id: VideoId,

    /// When the analysis run completed
    pub created_at: DateTime<Utc>,
}

impl VideoAnalysis {
    /// Create a new analysis grouping for a video, stamped now.
    pub fn new(video_id: VideoId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            video_id,
            created_at: Utc::now(),
        }
    }
}

/// One tracked entity segment (e.g. a detected person).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObjectDetection {
    /// Entity name as reported by the annotation service (e.g. "person")
    pub name: String,

    /// Detection confidence in [0, 1]
    pub confidence: f64,

    /// Segment during which the entity is visible
    pub time: TimeRange,

    /// Track identifier linking segments of the same entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl ObjectDetection {
    /// Create a new detection segment.
    pub fn new(name: impl Into<String>, confidence: f64, time: TimeRange) -> Self {
        Self {
            name: name.into(),
            confidence,
            time,
            track_id: None,
        }
    }

    /// Attach a track identifier.
    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }

    /// Whether this detection is active at playback offset `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.time.contains(t)
    }
}

/// On-screen text recognized over a span of the video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecognizedText {
    /// The recognized text, as reported (not normalized)
    pub text: String,

    /// OCR confidence in [0, 1]
    pub confidence: f64,

    /// Span during which the text is on screen. Point events are common
    /// here: sparse OCR sampling often yields a single observation frame.
    pub time: TimeRange,
}

impl RecognizedText {
    /// Create a new recognized-text row.
    pub fn new(text: impl Into<String>, confidence: f64, time: TimeRange) -> Self {
        Self {
            text: text.into(),
            confidence,
            time,
        }
    }

    /// Whether this text is active at playback offset `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.time.contains(t)
    }
}

/// A classification label global to the whole analysis.
///
/// Historically time-unbounded: labels apply to the video as a whole and
/// carry no intrinsic time range.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationLabel {
    /// Label name (e.g. "team sport")
    pub name: String,

    /// Classification confidence in [0, 1]
    pub confidence: f64,
}

impl ClassificationLabel {
    /// Create a new classification label.
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}
