//! Live snapshot models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::video::VideoId;

/// Maximum number of ranked labels kept in a snapshot.
pub const MAX_TOP_LABELS: usize = 5;

/// A ranked classification label entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabelScore {
    /// Label name
    pub name: String,
    /// Classification confidence in [0, 1]
    pub confidence: f64,
}

impl LabelScore {
    /// Create a new label entry.
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// The computed state of a video at a whole-second playback offset.
///
/// One snapshot exists per `(video_id, floor(t))` pair. Snapshots are
/// disposable cache entities: fully rewritten on every build, expired by
/// TTL, and always reconstructible from durable annotation rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LiveSnapshot {
    /// Video this snapshot describes
    pub video_id: VideoId,

    /// Whole-second playback offset (`floor` of the query time)
    pub t: i64,

    /// Count of on-field people active at `t`, capped at a domain ceiling
    pub player_count: u32,

    /// Raw text of the selected scoreboard reading; empty when none
    pub scoreboard_text: String,

    /// Normalized "A-B" score extracted from the scoreboard; empty when
    /// no score could be inferred
    pub score: String,

    /// When this snapshot was built
    pub last_updated: DateTime<Utc>,

    /// Top classification labels, descending by confidence, at most
    /// [`MAX_TOP_LABELS`] entries
    pub top_labels: Vec<LabelScore>,
}

impl LiveSnapshot {
    /// Create an empty snapshot for a key, stamped now.
    pub fn new(video_id: VideoId, t: i64) -> Self {
        Self {
            video_id,
            t,
            player_count: 0,
            scoreboard_text: String::new(),
            score: String::new(),
            last_updated: Utc::now(),
            top_labels: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snap = LiveSnapshot::new(VideoId::from("vid-1"), 42);
        assert_eq!(snap.t, 42);
        assert_eq!(snap.player_count, 0);
        assert!(snap.score.is_empty());
        assert!(snap.top_labels.is_empty());
    }

    #[test]
    fn test_snapshot_serde_roundtrip() {
        let mut snap = LiveSnapshot::new(VideoId::from("vid-1"), 7);
        snap.player_count = 11;
        snap.scoreboard_text = "ARG 0-2 POR".to_string();
        snap.score = "0-2".to_string();
        snap.top_labels = vec![LabelScore::new("football", 0.97)];

        let json = serde_json::to_string(&snap).unwrap();
        let back: LiveSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
