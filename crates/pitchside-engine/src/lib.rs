//! Live state derivation engine.
//!
//! Given a video and a playback timestamp, derives "what is true right
//! now" from independently time-ranged annotation events: active player
//! count, the current scoreboard reading and its extracted score, and the
//! top classification labels. Derived snapshots live in a TTL cache and
//! are rebuilt from the durable store on a miss (cache-aside).

pub mod builder;
pub mod error;
pub mod prewarm;
pub mod reader;
pub mod scoreboard;
pub mod store;

pub use builder::{ScorePair, SnapshotBuilder};
pub use error::{EngineError, EngineResult};
pub use prewarm::{PrewarmConfig, PrewarmDriver};
pub use reader::SnapshotReader;
pub use scoreboard::{extract_score, is_scoreboard_candidate};
pub use store::{AnnotationStore, SnapshotStore};
