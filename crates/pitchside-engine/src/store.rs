//! Storage seams for the engine.
//!
//! The builder and reader never talk to Firestore or Redis directly; they
//! go through these traits so the concrete backends stay swappable and the
//! engine semantics stay testable against in-memory stores.

use async_trait::async_trait;

use pitchside_cache::SnapshotCache;
use pitchside_firestore::AnnotationRepository;
use pitchside_models::{
    ClassificationLabel, LiveSnapshot, ObjectDetection, RecognizedText, VideoAnalysis, VideoId,
};

use crate::error::EngineResult;

/// Read-only view of the durable annotation rows.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Most recent analysis grouping for a video, if any.
    async fn latest_analysis(&self, video_id: &VideoId) -> EngineResult<Option<VideoAnalysis>>;

    /// All object detection rows for an analysis.
    async fn object_detections(&self, analysis_id: &str) -> EngineResult<Vec<ObjectDetection>>;

    /// All recognized text rows for an analysis.
    async fn recognized_texts(&self, analysis_id: &str) -> EngineResult<Vec<RecognizedText>>;

    /// All classification label rows for an analysis.
    async fn classification_labels(
        &self,
        analysis_id: &str,
    ) -> EngineResult<Vec<ClassificationLabel>>;
}

/// Snapshot cache owned by the engine. Only the builder writes here.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Write a snapshot, replacing any entry for its `(video_id, t)` key.
    async fn write(&self, snapshot: &LiveSnapshot) -> EngineResult<()>;

    /// Read the snapshot for `(video_id, t)`, or `None` on a miss.
    async fn read(&self, video_id: &VideoId, t: i64) -> EngineResult<Option<LiveSnapshot>>;
}

#[async_trait]
impl AnnotationStore for AnnotationRepository {
    async fn latest_analysis(&self, video_id: &VideoId) -> EngineResult<Option<VideoAnalysis>> {
        Ok(AnnotationRepository::latest_analysis(self, video_id).await?)
    }

    async fn object_detections(&self, analysis_id: &str) -> EngineResult<Vec<ObjectDetection>> {
        Ok(AnnotationRepository::object_detections(self, analysis_id).await?)
    }

    async fn recognized_texts(&self, analysis_id: &str) -> EngineResult<Vec<RecognizedText>> {
        Ok(AnnotationRepository::recognized_texts(self, analysis_id).await?)
    }

    async fn classification_labels(
        &self,
        analysis_id: &str,
    ) -> EngineResult<Vec<ClassificationLabel>> {
        Ok(AnnotationRepository::classification_labels(self, analysis_id).await?)
    }
}

#[async_trait]
impl SnapshotStore for SnapshotCache {
    async fn write(&self, snapshot: &LiveSnapshot) -> EngineResult<()> {
        Ok(SnapshotCache::write(self, snapshot).await?)
    }

    async fn read(&self, video_id: &VideoId, t: i64) -> EngineResult<Option<LiveSnapshot>> {
        Ok(SnapshotCache::read(self, video_id, t).await?)
    }
}
