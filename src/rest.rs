//! REST implementation of the persistence interface.
//!
//! Talks to the companion backend's annotation and reading-state endpoints.
//! Runs inside the persistence worker thread, so blocking I/O is fine here.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::time::Duration;

use crate::annotation::{Annotation, AnnotationDraft, AnnotationPatch};
use crate::persistence::{BackendError, DocumentKey, PersistenceBackend};
use crate::reading_state::ReadingState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn annotations_url(&self, key: &DocumentKey) -> String {
        format!(
            "{}/conversations/{}/pdfs/{}/annotations/",
            self.base_url, key.conversation_id, key.document_id
        )
    }

    fn annotation_url(&self, annotation_id: &str) -> String {
        format!("{}/annotations/{}/", self.base_url, annotation_id)
    }

    fn reading_state_url(&self, key: &DocumentKey) -> String {
        format!(
            "{}/conversations/{}/pdfs/{}/reading-state/",
            self.base_url, key.conversation_id, key.document_id
        )
    }

    fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::blocking::Response,
    ) -> Result<T, BackendError> {
        response
            .json()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl PersistenceBackend for RestBackend {
    fn list_annotations(&self, key: &DocumentKey) -> Result<Vec<Annotation>, BackendError> {
        let response = self
            .client
            .get(self.annotations_url(key))
            .send()
            .map_err(|e| BackendError::transport(e.to_string()))?;
        Self::decode(Self::check_status(response)?)
    }

    fn create_annotation(
        &self,
        key: &DocumentKey,
        draft: &AnnotationDraft,
    ) -> Result<Annotation, BackendError> {
        let response = self
            .client
            .post(self.annotations_url(key))
            .json(draft)
            .send()
            .map_err(|e| BackendError::transport(e.to_string()))?;
        Self::decode(Self::check_status(response)?)
    }

    fn update_annotation(
        &self,
        annotation_id: &str,
        patch: &AnnotationPatch,
    ) -> Result<Annotation, BackendError> {
        let response = self
            .client
            .put(self.annotation_url(annotation_id))
            .json(patch)
            .send()
            .map_err(|e| BackendError::transport(e.to_string()))?;
        Self::decode(Self::check_status(response)?)
    }

    fn delete_annotation(&self, annotation_id: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.annotation_url(annotation_id))
            .send()
            .map_err(|e| BackendError::transport(e.to_string()))?;
        // The backend 404s a second delete of the same id; the operation
        // is idempotent, so an already-gone annotation is a success.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(response).map(|_| ())
    }

    fn get_reading_state(&self, key: &DocumentKey) -> Result<ReadingState, BackendError> {
        let response = self
            .client
            .get(self.reading_state_url(key))
            .send()
            .map_err(|e| BackendError::transport(e.to_string()))?;
        // Absent state comes back as defaults from the backend already, but
        // tolerate a 404 from older deployments.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ReadingState::default());
        }
        Self::decode(Self::check_status(response)?)
    }

    fn save_reading_state(
        &self,
        key: &DocumentKey,
        state: &ReadingState,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .put(self.reading_state_url(key))
            .json(state)
            .send()
            .map_err(|e| BackendError::transport(e.to_string()))?;
        Self::check_status(response).map(|_| ())
    }
}
