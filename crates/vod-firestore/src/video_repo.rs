//! Firestore-backed video repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use vod_models::{UploadStatus, VideoId, VideoRecord, VideoStatus};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{PublishedOutput, VideoStore};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

/// Default collection holding video records.
const VIDEOS_COLLECTION: &str = "videos";

/// Repository for video documents.
#[derive(Clone)]
pub struct VideoRepository {
    client: FirestoreClient,
    collection: String,
}

impl VideoRepository {
    /// Create a new video repository on the default collection.
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            client,
            collection: VIDEOS_COLLECTION.to_string(),
        }
    }

    /// Use a non-default collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn create(&self, record: &VideoRecord) -> FirestoreResult<()> {
        let fields = record_to_fields(record);
        self.client
            .create_document(&self.collection, record.video_id.as_str(), fields)
            .await?;
        info!("Created video record: {}", record.video_id);
        Ok(())
    }

    async fn get(&self, id: &VideoId) -> FirestoreResult<Option<VideoRecord>> {
        let doc = self.client.get_document(&self.collection, id.as_str()).await?;
        match doc {
            Some(d) => Ok(Some(document_to_record(&d, id)?)),
            None => Ok(None),
        }
    }

    async fn set_processing(&self, id: &VideoId) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert(
            "status".to_string(),
            VideoStatus::Processing.as_str().to_firestore_value(),
        );
        fields.insert(
            "upload_status".to_string(),
            UploadStatus::Processing.as_str().to_firestore_value(),
        );
        fields.insert("updated_at".to_string(), Utc::now().to_firestore_value());

        self.client
            .update_document(
                &self.collection,
                id.as_str(),
                fields,
                Some(vec![
                    "status".to_string(),
                    "upload_status".to_string(),
                    "updated_at".to_string(),
                ]),
            )
            .await?;
        Ok(())
    }

    async fn publish(&self, id: &VideoId, output: &PublishedOutput) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert(
            "status".to_string(),
            VideoStatus::Published.as_str().to_firestore_value(),
        );
        fields.insert(
            "upload_status".to_string(),
            UploadStatus::Completed.as_str().to_firestore_value(),
        );
        fields.insert(
            "master_playlist_url".to_string(),
            output.master_playlist_url.to_firestore_value(),
        );
        fields.insert(
            "thumbnail_url".to_string(),
            output.thumbnail_url.to_firestore_value(),
        );
        fields.insert(
            "duration_seconds".to_string(),
            output.duration_seconds.to_firestore_value(),
        );
        fields.insert("variants".to_string(), output.variants.to_firestore_value());
        fields.insert("updated_at".to_string(), Utc::now().to_firestore_value());

        self.client
            .update_document(
                &self.collection,
                id.as_str(),
                fields,
                Some(vec![
                    "status".to_string(),
                    "upload_status".to_string(),
                    "master_playlist_url".to_string(),
                    "thumbnail_url".to_string(),
                    "duration_seconds".to_string(),
                    "variants".to_string(),
                    "updated_at".to_string(),
                ]),
            )
            .await?;
        info!("Published video record: {}", id);
        Ok(())
    }

    async fn fail(&self, id: &VideoId, error_message: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert(
            "status".to_string(),
            VideoStatus::Failed.as_str().to_firestore_value(),
        );
        fields.insert(
            "upload_status".to_string(),
            UploadStatus::Failed.as_str().to_firestore_value(),
        );
        fields.insert(
            "error_message".to_string(),
            error_message.to_firestore_value(),
        );
        fields.insert("updated_at".to_string(), Utc::now().to_firestore_value());

        self.client
            .update_document(
                &self.collection,
                id.as_str(),
                fields,
                Some(vec![
                    "status".to_string(),
                    "upload_status".to_string(),
                    "error_message".to_string(),
                    "updated_at".to_string(),
                ]),
            )
            .await?;
        info!("Marked video record failed: {}", id);
        Ok(())
    }

    async fn delete(&self, id: &VideoId) -> FirestoreResult<()> {
        self.client.delete_document(&self.collection, id.as_str()).await
    }
}

/// Serialize a record into Firestore fields. The document ID carries the
/// video ID, so it is not duplicated as a field.
fn record_to_fields(record: &VideoRecord) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("owner_id".to_string(), record.owner_id.to_firestore_value());
    fields.insert("title".to_string(), record.title.to_firestore_value());
    fields.insert(
        "description".to_string(),
        record.description.to_firestore_value(),
    );
    fields.insert(
        "status".to_string(),
        record.status.as_str().to_firestore_value(),
    );
    fields.insert(
        "upload_status".to_string(),
        record.upload_status.as_str().to_firestore_value(),
    );
    if let Some(msg) = &record.error_message {
        fields.insert("error_message".to_string(), msg.to_firestore_value());
    }
    if let Some(url) = &record.master_playlist_url {
        fields.insert("master_playlist_url".to_string(), url.to_firestore_value());
    }
    if let Some(url) = &record.thumbnail_url {
        fields.insert("thumbnail_url".to_string(), url.to_firestore_value());
    }
    if let Some(duration) = record.duration_seconds {
        fields.insert(
            "duration_seconds".to_string(),
            duration.to_firestore_value(),
        );
    }
    fields.insert("variants".to_string(), record.variants.to_firestore_value());
    fields.insert(
        "created_at".to_string(),
        record.created_at.to_firestore_value(),
    );
    fields.insert(
        "updated_at".to_string(),
        record.updated_at.to_firestore_value(),
    );
    fields
}

/// Rebuild a record from a Firestore document.
fn document_to_record(doc: &Document, id: &VideoId) -> FirestoreResult<VideoRecord> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::invalid_response("document has no fields"))?;

    let get_string = |name: &str| -> FirestoreResult<String> {
        fields
            .get(name)
            .and_then(String::from_firestore_value)
            .ok_or_else(|| FirestoreError::invalid_response(format!("missing field: {}", name)))
    };
    let opt_string =
        |name: &str| -> Option<String> { fields.get(name).and_then(String::from_firestore_value) };

    let status: VideoStatus = get_string("status")?
        .parse()
        .map_err(FirestoreError::invalid_response)?;
    let upload_status: UploadStatus = get_string("upload_status")?
        .parse()
        .map_err(FirestoreError::invalid_response)?;

    let now = Utc::now();
    Ok(VideoRecord {
        video_id: id.clone(),
        owner_id: get_string("owner_id")?,
        title: get_string("title")?,
        description: get_string("description")?,
        status,
        upload_status,
        error_message: opt_string("error_message"),
        master_playlist_url: opt_string("master_playlist_url"),
        thumbnail_url: opt_string("thumbnail_url"),
        duration_seconds: fields
            .get("duration_seconds")
            .and_then(f64::from_firestore_value),
        variants: fields
            .get("variants")
            .and_then(Vec::<String>::from_firestore_value)
            .unwrap_or_default(),
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or(now),
        updated_at: fields
            .get("updated_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or(now),
    })
}
