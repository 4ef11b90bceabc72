//! Cache-aside snapshot reader.

use std::sync::Arc;

use tracing::{debug, warn};

use pitchside_models::{LiveSnapshot, VideoId};

use crate::builder::SnapshotBuilder;
use crate::error::EngineResult;
use crate::store::SnapshotStore;

/// Reads snapshots, rebuilding through the cache on a miss.
///
/// The cache is never the source of truth: a miss costs one synchronous
/// rebuild from durable data, and a cache read failure is downgraded to a
/// miss rather than surfaced.
#[derive(Clone)]
pub struct SnapshotReader {
    snapshots: Arc<dyn SnapshotStore>,
    builder: SnapshotBuilder,
}

impl SnapshotReader {
    /// Create a reader over the snapshot store and builder.
    pub fn new(snapshots: Arc<dyn SnapshotStore>, builder: SnapshotBuilder) -> Self {
        Self { snapshots, builder }
    }

    /// Snapshot for `(video_id, floor(t))`, building it on a miss.
    ///
    /// `Ok(None)` means the video has no analysis yet.
    pub async fn read(&self, video_id: &VideoId, t: f64) -> EngineResult<Option<LiveSnapshot>> {
        let key_t = t.max(0.0).floor() as i64;

        match self.snapshots.read(video_id, key_t).await {
            Ok(Some(snapshot)) => {
                debug!(video_id = %video_id, t = key_t, "Snapshot cache hit");
                return Ok(Some(snapshot));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(video_id = %video_id, t = key_t, error = %e, "Cache read failed, treating as miss");
            }
        }

        if self.builder.build(video_id, t).await?.is_none() {
            return Ok(None);
        }

        match self.snapshots.read(video_id, key_t).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!(video_id = %video_id, t = key_t, error = %e, "Cache re-read failed after build");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pitchside_models::{ClassificationLabel, TimeRange};

    use super::*;
    use crate::store::memory::{MemoryAnnotationStore, MemorySnapshotStore};
    use crate::store::AnnotationStore;

    fn reader_for(
        annotations: MemoryAnnotationStore,
    ) -> (SnapshotReader, Arc<MemorySnapshotStore>) {
        let snapshots = Arc::new(MemorySnapshotStore::default());
        let builder = SnapshotBuilder::new(Arc::new(annotations), snapshots.clone());
        (SnapshotReader::new(snapshots.clone(), builder), snapshots)
    }

    fn analyzed_store(video_id: &VideoId) -> MemoryAnnotationStore {
        let mut annotations = MemoryAnnotationStore::analyzed(video_id);
        annotations.detections = vec![pitchside_models::ObjectDetection::new(
            "person",
            0.9,
            TimeRange::new(0.0, 60.0),
        )];
        annotations.labels = vec![ClassificationLabel::new("football", 0.97)];
        annotations
    }

    #[tokio::test]
    async fn test_miss_triggers_exactly_one_rebuild() {
        let video_id = VideoId::from("vid-1");
        let (reader, snapshots) = reader_for(analyzed_store(&video_id));

        let snapshot = reader.read(&video_id, 10.2).await.unwrap().unwrap();
        assert_eq!(snapshot.t, 10);
        assert_eq!(snapshot.player_count, 1);
        assert_eq!(snapshots.write_count(), 1);

        // Immediate second read is a pure cache hit.
        let again = reader.read(&video_id, 10.9).await.unwrap().unwrap();
        assert_eq!(again, snapshot);
        assert_eq!(snapshots.write_count(), 1);
    }

    #[tokio::test]
    async fn test_unanalyzed_video_reads_as_none() {
        let video_id = VideoId::from("vid-1");
        let (reader, snapshots) = reader_for(MemoryAnnotationStore::default());

        assert!(reader.read(&video_id, 5.0).await.unwrap().is_none());
        assert_eq!(snapshots.write_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_read_failure_falls_through_to_build() {
        let video_id = VideoId::from("vid-1");
        let (reader, snapshots) = reader_for(analyzed_store(&video_id));
        snapshots
            .fail_next_reads
            .store(1, std::sync::atomic::Ordering::SeqCst);

        let snapshot = reader.read(&video_id, 3.0).await.unwrap().unwrap();
        assert_eq!(snapshot.t, 3);
        assert_eq!(snapshots.write_count(), 1);
    }

    #[tokio::test]
    async fn test_sub_second_queries_share_a_snapshot() {
        let video_id = VideoId::from("vid-1");
        let (reader, snapshots) = reader_for(analyzed_store(&video_id));

        let a = reader.read(&video_id, 7.1).await.unwrap().unwrap();
        let b = reader.read(&video_id, 7.9).await.unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(snapshots.write_count(), 1);
    }

    #[tokio::test]
    async fn test_durable_failure_propagates() {
        // A store whose durable reads fail should surface a retriable
        // error to the on-demand caller, not an empty result.
        struct FailingStore;

        #[async_trait::async_trait]
        impl AnnotationStore for FailingStore {
            async fn latest_analysis(
                &self,
                _video_id: &VideoId,
            ) -> EngineResult<Option<pitchside_models::VideoAnalysis>> {
                Err(pitchside_firestore::FirestoreError::ServerError(
                    503,
                    "unavailable".to_string(),
                )
                .into())
            }

            async fn object_detections(
                &self,
                _analysis_id: &str,
            ) -> EngineResult<Vec<pitchside_models::ObjectDetection>> {
                unreachable!()
            }

            async fn recognized_texts(
                &self,
                _analysis_id: &str,
            ) -> EngineResult<Vec<pitchside_models::RecognizedText>> {
                unreachable!()
            }

            async fn classification_labels(
                &self,
                _analysis_id: &str,
            ) -> EngineResult<Vec<ClassificationLabel>> {
                unreachable!()
            }
        }

        let snapshots = Arc::new(MemorySnapshotStore::default());
        let builder = SnapshotBuilder::new(Arc::new(FailingStore), snapshots.clone());
        let reader = SnapshotReader::new(snapshots, builder);

        let err = reader.read(&VideoId::from("vid-1"), 1.0).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
