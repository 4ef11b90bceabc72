//! Shared data models for the Pitchside backend.
//!
//! This crate provides Serde-serializable types for:
//! - Annotation events (object detections, recognized text, labels)
//! - Analysis groupings per video
//! - Live snapshots derived at playback time
//! - Time ranges and the active-window predicate

pub mod annotation;
pub mod snapshot;
pub mod time_range;
pub mod video;

// Re-export common types
pub use annotation::{ClassificationLabel, ObjectDetection, RecognizedText, VideoAnalysis};
pub use snapshot::{LabelScore, LiveSnapshot, MAX_TOP_LABELS};
pub use time_range::TimeRange;
pub use video::VideoId;
