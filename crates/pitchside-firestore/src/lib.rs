//! Firestore-backed durable store for video annotation data.
//!
//! Talks to the Firestore REST API with gcp_auth credentials, a shared
//! token cache, and retry with exponential backoff. The typed surface
//! lives in [`AnnotationRepository`]; everything else is plumbing.

pub mod annotation_repo;
pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;


pub use annotation_repo::AnnotationRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use retry::RetryConfig;
pub use types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};
