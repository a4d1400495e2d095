//! Persistence interface and the worker that keeps it off the UI thread.
//!
//! Gesture handling must never wait on the network, so every backend call is
//! queued to a worker thread over flume channels and results come back
//! through `poll_responses` on the next UI tick. A single worker executes
//! requests in issue order; response reordering across requests is accepted
//! (last write wins).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use flume::{Receiver, Sender};

use crate::annotation::{Annotation, AnnotationDraft, AnnotationPatch};
use crate::reading_state::ReadingState;

/// Scope of every persistence call: one document inside one conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub conversation_id: String,
    pub document_id: String,
}

impl DocumentKey {
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            document_id: document_id.into(),
        }
    }
}

/// Errors from persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("decode: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// The logical persistence operations, independent of transport.
pub trait PersistenceBackend: Send + 'static {
    fn list_annotations(&self, key: &DocumentKey) -> Result<Vec<Annotation>, BackendError>;

    fn create_annotation(
        &self,
        key: &DocumentKey,
        draft: &AnnotationDraft,
    ) -> Result<Annotation, BackendError>;

    /// Partial update; absent fields keep their stored value.
    fn update_annotation(
        &self,
        annotation_id: &str,
        patch: &AnnotationPatch,
    ) -> Result<Annotation, BackendError>;

    /// Idempotent: deleting an already-deleted id succeeds.
    fn delete_annotation(&self, annotation_id: &str) -> Result<(), BackendError>;

    /// Falls back to page 1 / 0% / zoom 1.0 when nothing is stored.
    fn get_reading_state(&self, key: &DocumentKey) -> Result<ReadingState, BackendError>;

    /// Upsert.
    fn save_reading_state(
        &self,
        key: &DocumentKey,
        state: &ReadingState,
    ) -> Result<(), BackendError>;
}

/// Unique identifier for in-flight persistence requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to the persistence worker.
#[derive(Debug)]
pub enum PersistRequest {
    ListAnnotations {
        id: RequestId,
        key: DocumentKey,
    },
    CreateAnnotation {
        id: RequestId,
        key: DocumentKey,
        draft: AnnotationDraft,
    },
    UpdateAnnotation {
        id: RequestId,
        annotation_id: String,
        patch: AnnotationPatch,
    },
    DeleteAnnotation {
        id: RequestId,
        annotation_id: String,
    },
    GetReadingState {
        id: RequestId,
        key: DocumentKey,
    },
    SaveReadingState {
        id: RequestId,
        key: DocumentKey,
        state: ReadingState,
    },
    Shutdown,
}

/// Response from the persistence worker.
#[derive(Debug)]
pub enum PersistResponse {
    Annotations {
        id: RequestId,
        annotations: Vec<Annotation>,
    },
    Created {
        id: RequestId,
        annotation: Annotation,
    },
    Updated {
        id: RequestId,
        annotation: Annotation,
    },
    Deleted {
        id: RequestId,
        annotation_id: String,
    },
    ReadingState {
        id: RequestId,
        state: ReadingState,
    },
    Saved {
        id: RequestId,
    },
    Error {
        id: RequestId,
        error: BackendError,
    },
}

impl PersistResponse {
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Annotations { id, .. }
            | Self::Created { id, .. }
            | Self::Updated { id, .. }
            | Self::Deleted { id, .. }
            | Self::ReadingState { id, .. }
            | Self::Saved { id }
            | Self::Error { id, .. } => *id,
        }
    }
}

/// Owns the worker thread and the request/response channels.
pub struct PersistenceService {
    request_tx: Sender<PersistRequest>,
    response_rx: Receiver<PersistResponse>,
    next_request_id: u64,
}

impl PersistenceService {
    /// Spawn the service over the given backend.
    #[must_use]
    pub fn spawn(backend: impl PersistenceBackend) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        // One worker: requests for the same annotation must execute in the
        // order the user's actions completed.
        std::thread::spawn(move || {
            persistence_worker(&backend, &request_rx, &response_tx);
        });

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    pub fn list_annotations(&mut self, key: DocumentKey) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(PersistRequest::ListAnnotations { id, key });
        id
    }

    pub fn create_annotation(&mut self, key: DocumentKey, draft: AnnotationDraft) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(PersistRequest::CreateAnnotation { id, key, draft });
        id
    }

    pub fn update_annotation(&mut self, annotation_id: String, patch: AnnotationPatch) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(PersistRequest::UpdateAnnotation {
            id,
            annotation_id,
            patch,
        });
        id
    }

    pub fn delete_annotation(&mut self, annotation_id: String) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(PersistRequest::DeleteAnnotation { id, annotation_id });
        id
    }

    pub fn get_reading_state(&mut self, key: DocumentKey) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(PersistRequest::GetReadingState { id, key });
        id
    }

    pub fn save_reading_state(&mut self, key: DocumentKey, state: ReadingState) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(PersistRequest::SaveReadingState { id, key, state });
        id
    }

    /// Drain completed responses without blocking.
    pub fn poll_responses(&mut self) -> Vec<PersistResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            responses.push(response);
        }
        responses
    }

    /// Block until the next response arrives. Test helper; the application
    /// path is `poll_responses` from the tick loop.
    pub fn recv_response(&mut self) -> Option<PersistResponse> {
        self.response_rx.recv().ok()
    }

    pub fn shutdown(&self) {
        let _ = self.request_tx.send(PersistRequest::Shutdown);
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for PersistenceService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn persistence_worker<B: PersistenceBackend>(
    backend: &B,
    request_rx: &Receiver<PersistRequest>,
    response_tx: &Sender<PersistResponse>,
) {
    while let Ok(request) = request_rx.recv() {
        let response = match request {
            PersistRequest::ListAnnotations { id, key } => match backend.list_annotations(&key) {
                Ok(annotations) => PersistResponse::Annotations { id, annotations },
                Err(error) => PersistResponse::Error { id, error },
            },
            PersistRequest::CreateAnnotation { id, key, draft } => {
                match backend.create_annotation(&key, &draft) {
                    Ok(annotation) => PersistResponse::Created { id, annotation },
                    Err(error) => PersistResponse::Error { id, error },
                }
            }
            PersistRequest::UpdateAnnotation {
                id,
                annotation_id,
                patch,
            } => match backend.update_annotation(&annotation_id, &patch) {
                Ok(annotation) => PersistResponse::Updated { id, annotation },
                Err(error) => PersistResponse::Error { id, error },
            },
            PersistRequest::DeleteAnnotation { id, annotation_id } => {
                match backend.delete_annotation(&annotation_id) {
                    Ok(()) => PersistResponse::Deleted { id, annotation_id },
                    Err(error) => PersistResponse::Error { id, error },
                }
            }
            PersistRequest::GetReadingState { id, key } => match backend.get_reading_state(&key) {
                Ok(state) => PersistResponse::ReadingState { id, state },
                Err(error) => PersistResponse::Error { id, error },
            },
            PersistRequest::SaveReadingState { id, key, state } => {
                match backend.save_reading_state(&key, &state) {
                    Ok(()) => PersistResponse::Saved { id },
                    Err(error) => PersistResponse::Error { id, error },
                }
            }
            PersistRequest::Shutdown => break,
        };

        if response_tx.send(response).is_err() {
            break;
        }
    }
}

/// In-memory backend for tests and offline use. Assigns sequential ids the
/// way a server would; failure injection covers the optimistic-rollback
/// paths.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: std::sync::Arc<MemoryBackendInner>,
}

#[derive(Default)]
struct MemoryBackendInner {
    annotations: Mutex<HashMap<DocumentKey, Vec<Annotation>>>,
    reading_states: Mutex<HashMap<DocumentKey, ReadingState>>,
    next_id: AtomicU64,
    fail_creates: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_creates(&self, fail: bool) {
        self.inner.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.inner.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.inner.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of what the backend currently stores for a document.
    #[must_use]
    pub fn stored_annotations(&self, key: &DocumentKey) -> Vec<Annotation> {
        self.inner
            .annotations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn stored_reading_state(&self, key: &DocumentKey) -> Option<ReadingState> {
        self.inner
            .reading_states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .copied()
    }

    fn injected(flag: &AtomicBool) -> Result<(), BackendError> {
        if flag.load(Ordering::SeqCst) {
            Err(BackendError::transport("injected failure"))
        } else {
            Ok(())
        }
    }
}

impl PersistenceBackend for MemoryBackend {
    fn list_annotations(&self, key: &DocumentKey) -> Result<Vec<Annotation>, BackendError> {
        Ok(self.stored_annotations(key))
    }

    fn create_annotation(
        &self,
        key: &DocumentKey,
        draft: &AnnotationDraft,
    ) -> Result<Annotation, BackendError> {
        Self::injected(&self.inner.fail_creates)?;

        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let annotation = draft
            .clone()
            .into_annotation(format!("ann-{n}"), chrono::Utc::now());

        self.inner
            .annotations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .push(annotation.clone());

        Ok(annotation)
    }

    fn update_annotation(
        &self,
        annotation_id: &str,
        patch: &AnnotationPatch,
    ) -> Result<Annotation, BackendError> {
        Self::injected(&self.inner.fail_updates)?;

        let mut annotations = self
            .inner
            .annotations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for entries in annotations.values_mut() {
            if let Some(annotation) = entries.iter_mut().find(|a| a.id == annotation_id) {
                patch.apply_to(annotation);
                return Ok(annotation.clone());
            }
        }

        Err(BackendError::Status {
            status: 404,
            detail: format!("annotation {annotation_id} not found"),
        })
    }

    fn delete_annotation(&self, annotation_id: &str) -> Result<(), BackendError> {
        Self::injected(&self.inner.fail_deletes)?;

        let mut annotations = self
            .inner
            .annotations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for entries in annotations.values_mut() {
            entries.retain(|a| a.id != annotation_id);
        }
        // Deleting an unknown id is a success: the call is idempotent.
        Ok(())
    }

    fn get_reading_state(&self, key: &DocumentKey) -> Result<ReadingState, BackendError> {
        Ok(self.stored_reading_state(key).unwrap_or_default())
    }

    fn save_reading_state(
        &self,
        key: &DocumentKey,
        state: &ReadingState,
    ) -> Result<(), BackendError> {
        Self::injected(&self.inner.fail_saves)?;

        self.inner
            .reading_states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.clone(), *state);
        Ok(())
    }
}
