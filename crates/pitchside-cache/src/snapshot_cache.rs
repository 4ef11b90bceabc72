//! Redis snapshot cache.
//!
//! Each snapshot occupies two keys: a hash with the scalar fields and a
//! list with one JSON entry per ranked label. Writes replace both keys in
//! a single MULTI/EXEC pipeline so a reader never observes a half-written
//! snapshot, and both keys expire together. Reads fetch both keys the same
//! way, so a snapshot never mixes fields and labels from different builds.
//! All connections carry connect and per-command timeouts.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use pitchside_models::{LabelScore, LiveSnapshot, VideoId};

use crate::error::{CacheError, CacheResult};

/// Default snapshot TTL in seconds.
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 360;

/// Default connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default per-command timeout in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 2_000;

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL
    pub redis_url: String,
    /// Snapshot time-to-live
    pub snapshot_ttl: Duration,
    /// Bound on establishing a connection
    pub connect_timeout: Duration,
    /// Bound on each command round trip
    pub command_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            snapshot_ttl: Duration::from_secs(DEFAULT_SNAPSHOT_TTL_SECS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            command_timeout: Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS),
        }
    }
}

fn env_millis(name: &str, default: u64) -> Duration {
    Duration::from_millis(
        std::env::var(name)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            snapshot_ttl: Duration::from_secs(
                std::env::var("SNAPSHOT_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SNAPSHOT_TTL_SECS),
            ),
            connect_timeout: env_millis("REDIS_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS),
            command_timeout: env_millis("REDIS_COMMAND_TIMEOUT_MS", DEFAULT_COMMAND_TIMEOUT_MS),
        }
    }
}

/// Hash key for a snapshot's scalar fields.
pub fn snapshot_key(video_id: &VideoId, t: i64) -> String {
    format!("live:video:{}:t:{}", video_id, t)
}

/// List key for a snapshot's ranked labels.
pub fn labels_key(video_id: &VideoId, t: i64) -> String {
    format!("live:video:{}:t:{}:labels", video_id, t)
}

fn snapshot_fields(snapshot: &LiveSnapshot) -> Vec<(&'static str, String)> {
    vec![
        ("video_id", snapshot.video_id.to_string()),
        ("t", snapshot.t.to_string()),
        ("player_count", snapshot.player_count.to_string()),
        ("scoreboard_text", snapshot.scoreboard_text.clone()),
        ("score", snapshot.score.clone()),
        ("last_updated", snapshot.last_updated.to_rfc3339()),
    ]
}

fn snapshot_from_fields(
    fields: &HashMap<String, String>,
    labels: Vec<LabelScore>,
) -> CacheResult<LiveSnapshot> {
    let get = |name: &str| -> CacheResult<&String> {
        fields
            .get(name)
            .ok_or_else(|| CacheError::corrupt_snapshot(format!("missing field: {}", name)))
    };

    let last_updated = DateTime::parse_from_rfc3339(get("last_updated")?)
        .map_err(|e| CacheError::corrupt_snapshot(format!("bad last_updated: {}", e)))?
        .with_timezone(&Utc);

    Ok(LiveSnapshot {
        video_id: VideoId::from_string(get("video_id")?.clone()),
        t: get("t")?
            .parse()
            .map_err(|_| CacheError::corrupt_snapshot("bad t"))?,
        player_count: get("player_count")?
            .parse()
            .map_err(|_| CacheError::corrupt_snapshot("bad player_count"))?,
        scoreboard_text: get("scoreboard_text")?.clone(),
        score: get("score")?.clone(),
        last_updated,
        top_labels: labels,
    })
}

/// Snapshot cache client.
#[derive(Clone)]
pub struct SnapshotCache {
    client: redis::Client,
    config: CacheConfig,
}

impl SnapshotCache {
    /// Create a new snapshot cache.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> CacheResult<Self> {
        Self::new(CacheConfig::from_env())
    }

    /// Snapshot TTL in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.config.snapshot_ttl.as_secs() as i64
    }

    /// Connection with the configured connect and per-command bounds. A
    /// stalled server surfaces as a `Timeout` error instead of a hang.
    async fn connection(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection_with_timeouts(
                self.config.command_timeout,
                self.config.connect_timeout,
            )
            .await
            .map_err(|e| self.classify(e))
    }

    fn classify(&self, e: redis::RedisError) -> CacheError {
        if e.is_timeout() {
            CacheError::Timeout(self.config.command_timeout)
        } else {
            CacheError::Redis(e)
        }
    }

    /// Write a snapshot, replacing any existing entry for its key.
    ///
    /// The delete, hash write, label pushes, and both expiries run as one
    /// atomic pipeline.
    pub async fn write(&self, snapshot: &LiveSnapshot) -> CacheResult<()> {
        let mut conn = self.connection().await?;

        let key = snapshot_key(&snapshot.video_id, snapshot.t);
        let labels = labels_key(&snapshot.video_id, snapshot.t);
        let ttl = self.ttl_secs();

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(&key).del(&labels);
        pipe.hset_multiple(&key, &snapshot_fields(snapshot));
        for label in &snapshot.top_labels {
            pipe.rpush(&labels, serde_json::to_string(label)?);
        }
        pipe.expire(&key, ttl).expire(&labels, ttl);
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| self.classify(e))?;

        debug!(key = %key, labels = snapshot.top_labels.len(), "Wrote snapshot");
        Ok(())
    }

    /// Read a snapshot, or `None` on a cache miss.
    ///
    /// The hash and label list are fetched in one MULTI/EXEC so the pair
    /// always comes from the same build; a rewrite or TTL expiry landing
    /// mid-read can never mix one build's fields with another's labels.
    pub async fn read(&self, video_id: &VideoId, t: i64) -> CacheResult<Option<LiveSnapshot>> {
        let mut conn = self.connection().await?;

        let key = snapshot_key(video_id, t);
        let (fields, raw_labels): (HashMap<String, String>, Vec<String>) = redis::pipe()
            .atomic()
            .hgetall(&key)
            .lrange(labels_key(video_id, t), 0, -1)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.classify(e))?;
        if fields.is_empty() {
            return Ok(None);
        }

        let labels = raw_labels
            .iter()
            .map(|entry| serde_json::from_str(entry))
            .collect::<Result<Vec<LabelScore>, _>>()?;

        Ok(Some(snapshot_from_fields(&fields, labels)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_keys() {
        let video_id = VideoId::from("vid-1");
        assert_eq!(snapshot_key(&video_id, 37), "live:video:vid-1:t:37");
        assert_eq!(labels_key(&video_id, 37), "live:video:vid-1:t:37:labels");
    }

    #[test]
    fn test_default_ttl_and_timeouts() {
        let config = CacheConfig::default();
        assert_eq!(config.snapshot_ttl, Duration::from_secs(360));
        assert_eq!(config.connect_timeout, Duration::from_millis(5_000));
        assert_eq!(config.command_timeout, Duration::from_millis(2_000));
    }

    #[tokio::test]
    async fn test_read_times_out_against_unresponsive_server() {
        // Accepts the connection and never replies, like a wedged server.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let _conn = listener.accept().await;
            std::future::pending::<()>().await
        });

        let config = CacheConfig {
            redis_url: format!("redis://{}", addr),
            connect_timeout: Duration::from_millis(200),
            command_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let cache = SnapshotCache::new(config).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            cache.read(&VideoId::from("vid-1"), 0),
        )
        .await
        .expect("read must give up within its configured bound");

        let err = result.unwrap_err();
        assert!(matches!(err, CacheError::Timeout(_)));
        assert!(err.is_retryable());
        hold.abort();
    }

    #[test]
    fn test_fields_roundtrip() {
        let mut snap = LiveSnapshot::new(VideoId::from("vid-1"), 12);
        snap.player_count = 9;
        snap.scoreboard_text = "ARG 0-2 POR".to_string();
        snap.score = "0-2".to_string();
        snap.top_labels = vec![LabelScore::new("football", 0.95)];

        let fields: HashMap<String, String> = snapshot_fields(&snap)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let back = snapshot_from_fields(&fields, snap.top_labels.clone()).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_missing_field_is_corrupt() {
        let snap = LiveSnapshot::new(VideoId::from("vid-1"), 0);
        let mut fields: HashMap<String, String> = snapshot_fields(&snap)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        fields.remove("player_count");

        let err = snapshot_from_fields(&fields, Vec::new()).unwrap_err();
        assert!(matches!(err, CacheError::CorruptSnapshot(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_empty_fields_encode_as_empty_strings() {
        let snap = LiveSnapshot::new(VideoId::from("vid-1"), 0);
        let fields = snapshot_fields(&snap);
        let score = fields.iter().find(|(k, _)| *k == "score").unwrap();
        assert!(score.1.is_empty());
    }
}
