//! Snapshot builder.
//!
//! Derives the live state of a video at a playback offset from the durable
//! annotation rows and writes it into the snapshot cache.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use pitchside_models::{
    ClassificationLabel, LabelScore, LiveSnapshot, ObjectDetection, RecognizedText, VideoId,
    MAX_TOP_LABELS,
};

use crate::error::EngineResult;
use crate::scoreboard::{extract_score, is_scoreboard_candidate};
use crate::store::{AnnotationStore, SnapshotStore};

/// Detection name the annotation service uses for people.
const PERSON_NAME: &str = "person";

/// Minimum segment duration for a detection to count as a player.
/// Discards spurious single-frame detections.
const MIN_PLAYER_DURATION_SECS: f64 = 2.0;

/// Ceiling on the reported player count. Crowd and background detections
/// would otherwise produce nonsensical totals.
const MAX_PLAYER_COUNT: u32 = 14;

/// The minimal result a synchronous build caller needs; the full snapshot
/// is available through a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePair {
    /// Normalized "A-B" score, empty when none could be inferred
    pub score: String,
    /// Raw text of the selected scoreboard reading, empty when none
    pub scoreboard_text: String,
}

/// Counts people active at `t`, capped at [`MAX_PLAYER_COUNT`].
fn player_count(detections: &[ObjectDetection], t: f64) -> u32 {
    let count = detections
        .iter()
        .filter(|d| {
            d.name == PERSON_NAME
                && d.time.duration() >= MIN_PLAYER_DURATION_SECS
                && d.is_active_at(t)
        })
        .count() as u32;
    count.min(MAX_PLAYER_COUNT)
}

/// Picks the scoreboard reading to trust at `t`.
///
/// Among active candidates, prefers the most recently appeared reading,
/// then the more confident one, then the later-ending one.
fn select_scoreboard(texts: &[RecognizedText], t: f64) -> Option<&RecognizedText> {
    texts
        .iter()
        .filter(|text| is_scoreboard_candidate(&text.text) && text.is_active_at(t))
        .max_by(|a, b| {
            a.time
                .start
                .total_cmp(&b.time.start)
                .then(a.confidence.total_cmp(&b.confidence))
                .then(a.time.end.total_cmp(&b.time.end))
        })
}

/// Top labels by descending confidence, at most [`MAX_TOP_LABELS`].
fn rank_labels(labels: &[ClassificationLabel]) -> Vec<LabelScore> {
    let mut ranked: Vec<LabelScore> = labels
        .iter()
        .map(|label| LabelScore::new(label.name.clone(), label.confidence))
        .collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked.truncate(MAX_TOP_LABELS);
    ranked
}

/// Builds live snapshots and writes them to the cache.
#[derive(Clone)]
pub struct SnapshotBuilder {
    annotations: Arc<dyn AnnotationStore>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl SnapshotBuilder {
    /// Create a builder over the given stores.
    pub fn new(annotations: Arc<dyn AnnotationStore>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            annotations,
            snapshots,
        }
    }

    /// Build and cache the snapshot for `(video_id, floor(t))`.
    ///
    /// `Ok(None)` means the video has no analysis yet. A durable read
    /// failure or a cache write failure fails the build; nothing partial
    /// is ever persisted.
    pub async fn build(&self, video_id: &VideoId, t: f64) -> EngineResult<Option<ScorePair>> {
        let t = t.max(0.0);

        let Some(analysis) = self.annotations.latest_analysis(video_id).await? else {
            debug!(video_id = %video_id, "No analysis yet, skipping build");
            return Ok(None);
        };

        // No time filter at the query level: legacy rows with degenerate
        // ranges must still reach the in-memory window predicate.
        let detections = self.annotations.object_detections(&analysis.id).await?;
        let texts = self.annotations.recognized_texts(&analysis.id).await?;
        let labels = self.annotations.classification_labels(&analysis.id).await?;

        let mut snapshot = LiveSnapshot::new(video_id.clone(), t.floor() as i64);
        snapshot.player_count = player_count(&detections, t);
        if let Some(reading) = select_scoreboard(&texts, t) {
            snapshot.scoreboard_text = reading.text.clone();
            snapshot.score = extract_score(&reading.text).unwrap_or_default();
        }
        snapshot.top_labels = rank_labels(&labels);
        snapshot.last_updated = Utc::now();

        self.snapshots.write(&snapshot).await?;

        debug!(
            video_id = %video_id,
            t = snapshot.t,
            player_count = snapshot.player_count,
            score = %snapshot.score,
            "Built snapshot"
        );

        Ok(Some(ScorePair {
            score: snapshot.score,
            scoreboard_text: snapshot.scoreboard_text,
        }))
    }
}

#[cfg(test)]
mod tests {
    use pitchside_models::TimeRange;

    use super::*;
    use crate::store::memory::{MemoryAnnotationStore, MemorySnapshotStore};

    fn person(start: f64, end: f64) -> ObjectDetection {
        ObjectDetection::new(PERSON_NAME, 0.9, TimeRange::new(start, end))
    }

    #[test]
    fn test_player_count_is_capped() {
        let detections: Vec<ObjectDetection> = (0..20).map(|_| person(0.0, 30.0)).collect();
        assert_eq!(player_count(&detections, 10.0), MAX_PLAYER_COUNT);
    }

    #[test]
    fn test_player_count_filters() {
        let detections = vec![
            person(0.0, 30.0),
            // Too short
            person(9.0, 10.0),
            // Inactive at t
            person(40.0, 50.0),
            // Not a person
            ObjectDetection::new("ball", 0.99, TimeRange::new(0.0, 30.0)),
        ];
        assert_eq!(player_count(&detections, 10.0), 1);
    }

    #[test]
    fn test_label_ranking() {
        let labels: Vec<ClassificationLabel> = [0.2, 0.9, 0.5, 0.95, 0.1, 0.3, 0.4]
            .iter()
            .enumerate()
            .map(|(i, &c)| ClassificationLabel::new(format!("label-{}", i), c))
            .collect();

        let ranked = rank_labels(&labels);
        let confidences: Vec<f64> = ranked.iter().map(|l| l.confidence).collect();
        assert_eq!(confidences, vec![0.95, 0.9, 0.5, 0.4, 0.3]);
        assert_eq!(ranked[0].name, "label-3");
        assert_eq!(ranked[1].name, "label-1");
    }

    #[test]
    fn test_scoreboard_prefers_latest_reading() {
        let texts = vec![
            RecognizedText::new("ARG 0-1 POR", 0.9, TimeRange::point(10.0)),
            RecognizedText::new("ARG 0-2 POR", 0.7, TimeRange::point(60.0)),
        ];
        let chosen = select_scoreboard(&texts, 90.0).unwrap();
        assert_eq!(chosen.text, "ARG 0-2 POR");
    }

    #[test]
    fn test_scoreboard_tiebreak_confidence_then_end() {
        let texts = vec![
            RecognizedText::new("ARG 1-0 POR", 0.6, TimeRange::new(10.0, 20.0)),
            RecognizedText::new("ARG 1-1 POR", 0.8, TimeRange::new(10.0, 15.0)),
        ];
        let chosen = select_scoreboard(&texts, 12.0).unwrap();
        assert_eq!(chosen.text, "ARG 1-1 POR");

        let texts = vec![
            RecognizedText::new("ARG 2-0 POR", 0.8, TimeRange::new(10.0, 15.0)),
            RecognizedText::new("ARG 2-1 POR", 0.8, TimeRange::new(10.0, 20.0)),
        ];
        let chosen = select_scoreboard(&texts, 12.0).unwrap();
        assert_eq!(chosen.text, "ARG 2-1 POR");
    }

    #[test]
    fn test_scoreboard_ignores_non_candidates() {
        let texts = vec![RecognizedText::new(
            "1st PERIOD",
            0.99,
            TimeRange::new(0.0, 100.0),
        )];
        assert!(select_scoreboard(&texts, 50.0).is_none());
    }

    #[tokio::test]
    async fn test_build_without_analysis_is_none() {
        let annotations = Arc::new(MemoryAnnotationStore::default());
        let snapshots = Arc::new(MemorySnapshotStore::default());
        let builder = SnapshotBuilder::new(annotations, snapshots.clone());

        let result = builder.build(&VideoId::from("vid-1"), 10.0).await.unwrap();
        assert!(result.is_none());
        assert_eq!(snapshots.write_count(), 0);
    }

    #[tokio::test]
    async fn test_build_writes_snapshot() {
        let video_id = VideoId::from("vid-1");
        let mut annotations = MemoryAnnotationStore::analyzed(&video_id);
        annotations.detections = vec![person(0.0, 120.0), person(0.0, 120.0)];
        annotations.texts = vec![RecognizedText::new(
            "ARG 0-2 POR",
            0.9,
            TimeRange::point(30.0),
        )];
        annotations.labels = vec![
            ClassificationLabel::new("football", 0.97),
            ClassificationLabel::new("stadium", 0.80),
        ];

        let snapshots = Arc::new(MemorySnapshotStore::default());
        let builder = SnapshotBuilder::new(Arc::new(annotations), snapshots.clone());

        let pair = builder.build(&video_id, 45.3).await.unwrap().unwrap();
        assert_eq!(pair.score, "0-2");
        assert_eq!(pair.scoreboard_text, "ARG 0-2 POR");

        let snap = snapshots.read(&video_id, 45).await.unwrap().unwrap();
        assert_eq!(snap.t, 45);
        assert_eq!(snap.player_count, 2);
        assert_eq!(snap.score, "0-2");
        assert_eq!(snap.top_labels.len(), 2);
        assert_eq!(snap.top_labels[0].name, "football");
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let video_id = VideoId::from("vid-1");
        let mut annotations = MemoryAnnotationStore::analyzed(&video_id);
        annotations.detections = vec![person(0.0, 60.0)];
        annotations.texts = vec![RecognizedText::new(
            "ARG 1-1 POR",
            0.9,
            TimeRange::point(5.0),
        )];
        annotations.labels = vec![ClassificationLabel::new("football", 0.97)];

        let snapshots = Arc::new(MemorySnapshotStore::default());
        let builder = SnapshotBuilder::new(Arc::new(annotations), snapshots.clone());

        let first_pair = builder.build(&video_id, 10.0).await.unwrap().unwrap();
        let first = snapshots.read(&video_id, 10).await.unwrap().unwrap();
        let second_pair = builder.build(&video_id, 10.0).await.unwrap().unwrap();
        let second = snapshots.read(&video_id, 10).await.unwrap().unwrap();

        assert_eq!(first_pair, second_pair);
        assert_eq!(first.player_count, second.player_count);
        assert_eq!(first.scoreboard_text, second.scoreboard_text);
        assert_eq!(first.score, second.score);
        assert_eq!(first.top_labels, second.top_labels);
        assert_eq!(snapshots.write_count(), 2);
    }

    #[tokio::test]
    async fn test_negative_t_clamps_to_zero() {
        let video_id = VideoId::from("vid-1");
        let annotations = MemoryAnnotationStore::analyzed(&video_id);
        let snapshots = Arc::new(MemorySnapshotStore::default());
        let builder = SnapshotBuilder::new(Arc::new(annotations), snapshots.clone());

        builder.build(&video_id, -3.7).await.unwrap().unwrap();
        assert!(snapshots.read(&video_id, 0).await.unwrap().is_some());
    }
}
