//! Application state.

use std::sync::Arc;

use pitchside_cache::SnapshotCache;
use pitchside_engine::{PrewarmConfig, PrewarmDriver, SnapshotBuilder, SnapshotReader};
use pitchside_firestore::{AnnotationRepository, FirestoreClient};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub firestore: Arc<FirestoreClient>,
    pub cache: Arc<SnapshotCache>,
    pub reader: SnapshotReader,
    pub prewarm: Arc<PrewarmDriver>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let firestore = Arc::new(FirestoreClient::from_env().await?);
        let cache = Arc::new(SnapshotCache::from_env()?);

        let annotations = Arc::new(AnnotationRepository::new((*firestore).clone()));
        let builder = SnapshotBuilder::new(annotations.clone(), cache.clone());
        let reader = SnapshotReader::new(cache.clone(), builder.clone());
        let prewarm = Arc::new(PrewarmDriver::new(
            annotations,
            builder,
            PrewarmConfig::from_env(),
        ));

        Ok(Self {
            config,
            firestore,
            cache,
            reader,
            prewarm,
        })
    }
}
