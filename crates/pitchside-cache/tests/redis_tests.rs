//! Redis snapshot cache integration tests.

use pitchside_cache::{CacheConfig, SnapshotCache};
use pitchside_models::{LabelScore, LiveSnapshot, VideoId};

fn test_cache() -> SnapshotCache {
    dotenvy::dotenv().ok();
    SnapshotCache::new(CacheConfig::from_env()).expect("Failed to create cache")
}

fn test_video_id() -> VideoId {
    VideoId::from_string(format!("itest-{}", uuid::Uuid::new_v4()))
}

/// Test write/read round-trip through a live Redis.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_snapshot_roundtrip() {
    let cache = test_cache();
    let video_id = test_video_id();

    let mut snap = LiveSnapshot::new(video_id.clone(), 42);
    snap.player_count = 11;
    snap.scoreboard_text = "ARG 0-2 POR".to_string();
    snap.score = "0-2".to_string();
    snap.top_labels = vec![
        LabelScore::new("football", 0.95),
        LabelScore::new("stadium", 0.90),
    ];

    cache.write(&snap).await.expect("Failed to write");

    let back = cache
        .read(&video_id, 42)
        .await
        .expect("Failed to read")
        .expect("Expected a hit");
    assert_eq!(back, snap);
}

/// Test that a missing key reads as a miss, not an error.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_missing_snapshot_is_none() {
    let cache = test_cache();
    let back = cache
        .read(&test_video_id(), 7)
        .await
        .expect("Failed to read");
    assert!(back.is_none());
}

/// Test that a rewrite fully replaces the previous labels.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_rewrite_replaces_labels() {
    let cache = test_cache();
    let video_id = test_video_id();

    let mut snap = LiveSnapshot::new(video_id.clone(), 5);
    snap.top_labels = vec![
        LabelScore::new("football", 0.95),
        LabelScore::new("grass", 0.40),
    ];
    cache.write(&snap).await.expect("Failed to write");

    snap.top_labels = vec![LabelScore::new("stadium", 0.90)];
    cache.write(&snap).await.expect("Failed to rewrite");

    let back = cache
        .read(&video_id, 5)
        .await
        .expect("Failed to read")
        .expect("Expected a hit");
    assert_eq!(back.top_labels.len(), 1);
    assert_eq!(back.top_labels[0].name, "stadium");
}
