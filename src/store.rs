//! In-memory annotation store with optimistic persistence.
//!
//! The store owns the annotation list for the active document. Mutations
//! apply locally first so the UI responds immediately; the matching backend
//! call is queued to the persistence worker and reconciled when its response
//! arrives. Policy per operation:
//!
//! - create: optimistic insert under a temporary id, replaced by the
//!   persisted entity, rolled back if the backend refuses;
//! - position/geometry/text updates: optimistic, kept on failure (logged);
//! - delete: not optimistic — removed locally only once the backend
//!   confirms, so a failed delete never hides a still-persisted annotation.

use std::collections::HashMap;

use log::{debug, error, warn};

use crate::annotation::{Annotation, AnnotationDraft, AnnotationPatch};
use crate::geometry::PageRect;
use crate::persistence::{
    DocumentKey, PersistResponse, PersistenceService, RequestId,
};

/// What a given in-flight request will do to local state when it resolves.
#[derive(Debug)]
enum PendingMutation {
    List,
    Create { temp_id: String },
    Update { annotation_id: String },
    Delete { annotation_id: String },
}

pub struct AnnotationStore {
    key: DocumentKey,
    annotations: Vec<Annotation>,
    by_page: HashMap<u32, Vec<usize>>,
    pending: HashMap<RequestId, PendingMutation>,
    next_temp_id: u64,
}

impl AnnotationStore {
    #[must_use]
    pub fn new(key: DocumentKey) -> Self {
        Self {
            key,
            annotations: Vec::new(),
            by_page: HashMap::new(),
            pending: HashMap::new(),
            next_temp_id: 1,
        }
    }

    #[must_use]
    pub fn document_key(&self) -> &DocumentKey {
        &self.key
    }

    /// Fetch the persisted annotation list for this document.
    pub fn load(&mut self, service: &mut PersistenceService) {
        let id = service.list_annotations(self.key.clone());
        self.pending.insert(id, PendingMutation::List);
    }

    #[must_use]
    pub fn all(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn get(&self, annotation_id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == annotation_id)
    }

    /// Annotations on a page, in creation order.
    #[must_use]
    pub fn list(&self, page_number: u32) -> Vec<&Annotation> {
        self.by_page
            .get(&page_number)
            .map(|indices| indices.iter().map(|&i| &self.annotations[i]).collect())
            .unwrap_or_default()
    }

    /// True while the entry still carries a client-temporary id.
    #[must_use]
    pub fn is_pending_create(&self, annotation_id: &str) -> bool {
        annotation_id.starts_with("pending-")
    }

    /// Optimistically insert the draft and queue the create call.
    /// Returns the temporary id the entry carries until the backend answers.
    pub fn create(
        &mut self,
        service: &mut PersistenceService,
        draft: AnnotationDraft,
    ) -> anyhow::Result<String> {
        draft.validate()?;

        let temp_id = format!("pending-{}", self.next_temp_id);
        self.next_temp_id += 1;

        let local = draft
            .clone()
            .into_annotation(temp_id.clone(), chrono::Utc::now());
        self.annotations.push(local);
        self.rebuild_index();

        let request = service.create_annotation(self.key.clone(), draft);
        self.pending.insert(
            request,
            PendingMutation::Create {
                temp_id: temp_id.clone(),
            },
        );
        Ok(temp_id)
    }

    pub fn update_position(
        &mut self,
        service: &mut PersistenceService,
        annotation_id: &str,
        x: f32,
        y: f32,
    ) {
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == annotation_id) else {
            warn!("update_position on unknown annotation {annotation_id}");
            return;
        };
        annotation.rect = annotation.rect.moved_to(x, y);
        let rect = annotation.rect;
        self.issue_update(service, annotation_id, AnnotationPatch::position(rect.x, rect.y));
    }

    pub fn update_geometry(
        &mut self,
        service: &mut PersistenceService,
        annotation_id: &str,
        rect: PageRect,
    ) {
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == annotation_id) else {
            warn!("update_geometry on unknown annotation {annotation_id}");
            return;
        };
        annotation.rect = rect.clamped_to_page();
        let rect = annotation.rect;
        self.issue_update(service, annotation_id, AnnotationPatch::geometry(rect));
    }

    pub fn update_text(
        &mut self,
        service: &mut PersistenceService,
        annotation_id: &str,
        text_content: String,
    ) {
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == annotation_id) else {
            warn!("update_text on unknown annotation {annotation_id}");
            return;
        };
        annotation.text_content = Some(text_content.clone());
        self.issue_update(service, annotation_id, AnnotationPatch::text(text_content));
    }

    /// Queue a delete. The local entry stays visible until the backend
    /// confirms; call sites must have obtained explicit user confirmation.
    pub fn delete(&mut self, service: &mut PersistenceService, annotation_id: &str) {
        if self.get(annotation_id).is_none() {
            return;
        }
        if self.is_pending_create(annotation_id) {
            // Never persisted: nothing to delete remotely.
            self.remove_local(annotation_id);
            return;
        }
        let request = service.delete_annotation(annotation_id.to_string());
        self.pending.insert(
            request,
            PendingMutation::Delete {
                annotation_id: annotation_id.to_string(),
            },
        );
    }

    fn issue_update(
        &mut self,
        service: &mut PersistenceService,
        annotation_id: &str,
        patch: AnnotationPatch,
    ) {
        if self.is_pending_create(annotation_id) {
            // The backend has not assigned an id yet; the local edit rides
            // along when the create response is reconciled.
            debug!("deferring update for in-flight create {annotation_id}");
            return;
        }
        let request = service.update_annotation(annotation_id.to_string(), patch);
        self.pending.insert(
            request,
            PendingMutation::Update {
                annotation_id: annotation_id.to_string(),
            },
        );
    }

    /// Route a worker response back into local state. Returns true when the
    /// visible annotation set changed.
    pub fn apply_response(
        &mut self,
        service: &mut PersistenceService,
        response: &PersistResponse,
    ) -> bool {
        let Some(pending) = self.pending.remove(&response.request_id()) else {
            return false;
        };

        match (pending, response) {
            (PendingMutation::List, PersistResponse::Annotations { annotations, .. }) => {
                // Keep optimistic entries that are still waiting for their
                // create round-trip.
                let mut merged = annotations.clone();
                merged.extend(
                    self.annotations
                        .iter()
                        .filter(|a| self.is_pending_create(&a.id))
                        .cloned(),
                );
                self.annotations = merged;
                self.rebuild_index();
                true
            }
            (PendingMutation::Create { temp_id }, PersistResponse::Created { annotation, .. }) => {
                self.reconcile_create(service, &temp_id, annotation.clone());
                true
            }
            (PendingMutation::Create { temp_id }, PersistResponse::Error { error, .. }) => {
                error!("create failed, rolling back {temp_id}: {error}");
                self.remove_local(&temp_id);
                true
            }
            (PendingMutation::Update { .. }, PersistResponse::Updated { .. }) => {
                // Local state is already ahead (last write wins); nothing to
                // apply.
                false
            }
            (PendingMutation::Update { annotation_id }, PersistResponse::Error { error, .. }) => {
                // Optimistic state is kept; the user discovers staleness
                // only on reload.
                error!("update of {annotation_id} failed: {error}");
                false
            }
            (PendingMutation::Delete { .. }, PersistResponse::Deleted { annotation_id, .. }) => {
                self.remove_local(annotation_id);
                true
            }
            (PendingMutation::Delete { annotation_id }, PersistResponse::Error { error, .. }) => {
                error!("delete of {annotation_id} failed, keeping entry: {error}");
                false
            }
            (pending, response) => {
                warn!("mismatched persistence response {response:?} for {pending:?}");
                false
            }
        }
    }

    /// Swap the temporary entry for the persisted one. Edits made while the
    /// create was in flight win over the server copy and are pushed as one
    /// follow-up patch now that an id exists.
    fn reconcile_create(
        &mut self,
        service: &mut PersistenceService,
        temp_id: &str,
        persisted: Annotation,
    ) {
        let Some(local) = self.annotations.iter_mut().find(|a| a.id == temp_id) else {
            // Deleted locally before the create resolved; remove remotely.
            let request = service.delete_annotation(persisted.id.clone());
            self.pending.insert(
                request,
                PendingMutation::Delete {
                    annotation_id: persisted.id,
                },
            );
            return;
        };

        let rect_diverged = local.rect != persisted.rect;
        let text_diverged = local.text_content != persisted.text_content;
        let rect = local.rect;
        let text = local.text_content.clone();

        local.id = persisted.id.clone();
        local.created_at = persisted.created_at;
        self.rebuild_index();

        if rect_diverged {
            self.issue_update(service, &persisted.id, AnnotationPatch::geometry(rect));
        }
        if text_diverged {
            if let Some(text) = text {
                self.issue_update(service, &persisted.id, AnnotationPatch::text(text));
            }
        }
    }

    fn remove_local(&mut self, annotation_id: &str) {
        self.annotations.retain(|a| a.id != annotation_id);
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.by_page.clear();
        for (idx, annotation) in self.annotations.iter().enumerate() {
            self.by_page
                .entry(annotation.page_number)
                .or_default()
                .push(idx);
        }
    }
}
