//! Typed repository for annotation data.
//!
//! Collection layout (all root collections):
//! - `videos/{video_id}` — registration record, one per ingested video
//! - `video_analyses/{analysis_id}` — one grouping per completed run
//! - `object_detections`, `recognized_texts`, `classification_labels` —
//!   annotation rows keyed by `analysis_id`
//!
//! Row queries carry no time filter: legacy rows with degenerate time
//! ranges must still reach the in-memory window filter.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use pitchside_models::{
    ClassificationLabel, ObjectDetection, RecognizedText, TimeRange, VideoAnalysis, VideoId,
};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, StructuredQuery, ToFirestoreValue, Value};

const VIDEOS: &str = "videos";
const ANALYSES: &str = "video_analyses";
const OBJECT_DETECTIONS: &str = "object_detections";
const RECOGNIZED_TEXTS: &str = "recognized_texts";
const CLASSIFICATION_LABELS: &str = "classification_labels";

/// Repository over the durable annotation store.
#[derive(Clone)]
pub struct AnnotationRepository {
    client: FirestoreClient,
}

impl AnnotationRepository {
    /// Create a new repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Register a video, inserting only if absent.
    ///
    /// Returns `true` when the record was created, `false` when the video
    /// was already registered. Uniqueness is enforced by the store (the
    /// document id is the video id), so concurrent first-time
    /// registrations cannot race into duplicates.
    pub async fn register_video(&self, video_id: &VideoId) -> FirestoreResult<bool> {
        let mut fields = HashMap::new();
        fields.insert("created_at".to_string(), Utc::now().to_firestore_value());

        match self
            .client
            .create_document(VIDEOS, video_id.as_str(), fields)
            .await
        {
            Ok(_) => {
                info!(video_id = %video_id, "Registered video");
                Ok(true)
            }
            Err(FirestoreError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Record a completed analysis grouping.
    ///
    /// Called by the ingestion side once an annotation run finishes; the
    /// engine only ever reads these.
    pub async fn record_analysis(&self, analysis: &VideoAnalysis) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert(
            "video_id".to_string(),
            analysis.video_id.as_str().to_firestore_value(),
        );
        fields.insert(
            "created_at".to_string(),
            analysis.created_at.to_firestore_value(),
        );

        self.client
            .create_document(ANALYSES, &analysis.id, fields)
            .await?;
        info!(video_id = %analysis.video_id, analysis_id = %analysis.id, "Recorded analysis grouping");
        Ok(())
    }

    /// Most recent analysis grouping for a video, if any.
    pub async fn latest_analysis(
        &self,
        video_id: &VideoId,
    ) -> FirestoreResult<Option<VideoAnalysis>> {
        let docs = self
            .client
            .with_retry("latest_analysis", || {
                let query = StructuredQuery::collection_where_eq(
                    ANALYSES,
                    "video_id",
                    Value::StringValue(video_id.as_str().to_string()),
                )
                .order_by_desc("created_at")
                .with_limit(1);
                self.client.run_query(query)
            })
            .await?;

        match docs.into_iter().next() {
            Some(doc) => Ok(Some(document_to_analysis(&doc)?)),
            None => Ok(None),
        }
    }

    /// All object detection rows for an analysis.
    pub async fn object_detections(
        &self,
        analysis_id: &str,
    ) -> FirestoreResult<Vec<ObjectDetection>> {
        let docs = self.rows_for_analysis(OBJECT_DETECTIONS, analysis_id).await?;
        Ok(parse_rows(docs, OBJECT_DETECTIONS, document_to_detection))
    }

    /// All recognized text rows for an analysis.
    pub async fn recognized_texts(
        &self,
        analysis_id: &str,
    ) -> FirestoreResult<Vec<RecognizedText>> {
        let docs = self.rows_for_analysis(RECOGNIZED_TEXTS, analysis_id).await?;
        Ok(parse_rows(docs, RECOGNIZED_TEXTS, document_to_text))
    }

    /// All classification label rows for an analysis.
    pub async fn classification_labels(
        &self,
        analysis_id: &str,
    ) -> FirestoreResult<Vec<ClassificationLabel>> {
        let docs = self
            .rows_for_analysis(CLASSIFICATION_LABELS, analysis_id)
            .await?;
        Ok(parse_rows(docs, CLASSIFICATION_LABELS, document_to_label))
    }

    async fn rows_for_analysis(
        &self,
        collection: &'static str,
        analysis_id: &str,
    ) -> FirestoreResult<Vec<Document>> {
        self.client
            .with_retry(collection, || {
                let query = StructuredQuery::collection_where_eq(
                    collection,
                    "analysis_id",
                    Value::StringValue(analysis_id.to_string()),
                );
                self.client.run_query(query)
            })
            .await
    }
}

// ============================================================================
// Document Mapping
// ============================================================================

fn parse_rows<T>(
    docs: Vec<Document>,
    collection: &str,
    parse: fn(&Document) -> FirestoreResult<T>,
) -> Vec<T> {
    let mut rows = Vec::with_capacity(docs.len());
    let mut parse_errors = 0u32;

    for doc in &docs {
        match parse(doc) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(
                    collection = %collection,
                    doc_id = doc.doc_id().unwrap_or(""),
                    error = %e,
                    "Failed to parse annotation row"
                );
                parse_errors += 1;
            }
        }
    }

    if parse_errors > 0 {
        warn!(
            collection = %collection,
            parse_errors = parse_errors,
            "Some annotation rows failed to parse"
        );
    }

    rows
}

fn required<T: crate::types::FromFirestoreValue>(
    doc: &Document,
    field: &str,
) -> FirestoreResult<T> {
    doc.get(field).ok_or_else(|| {
        FirestoreError::invalid_response(format!(
            "Missing or malformed field '{}' in {}",
            field,
            doc.name.as_deref().unwrap_or("<unnamed>")
        ))
    })
}

/// A missing `end` means the row is a point event.
fn time_range_from_doc(doc: &Document) -> FirestoreResult<TimeRange> {
    let start: f64 = required(doc, "start")?;
    let end: f64 = doc.get("end").unwrap_or(start);
    Ok(TimeRange::new(start, end))
}

fn document_to_analysis(doc: &Document) -> FirestoreResult<VideoAnalysis> {
    let id = doc
        .doc_id()
        .ok_or_else(|| FirestoreError::invalid_response("Analysis document has no name"))?
        .to_string();
    let video_id: String = required(doc, "video_id")?;
    let created_at: DateTime<Utc> = required(doc, "created_at")?;

    Ok(VideoAnalysis {
        id,
        video_id: VideoId::from(video_id),
        created_at,
    })
}

fn document_to_detection(doc: &Document) -> FirestoreResult<ObjectDetection> {
    Ok(ObjectDetection {
        name: required(doc, "name")?,
        confidence: required(doc, "confidence")?,
        time: time_range_from_doc(doc)?,
        track_id: doc.get("track_id"),
    })
}

fn document_to_text(doc: &Document) -> FirestoreResult<RecognizedText> {
    Ok(RecognizedText {
        text: required(doc, "text")?,
        confidence: required(doc, "confidence")?,
        time: time_range_from_doc(doc)?,
    })
}

fn document_to_label(doc: &Document) -> FirestoreResult<ClassificationLabel> {
    Ok(ClassificationLabel {
        name: required(doc, "name")?,
        confidence: required(doc, "confidence")?,
    })
}
