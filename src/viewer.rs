//! Composition root for one open document.
//!
//! `DocumentViewer` wires the page registry, annotation store, gesture
//! classifier, reading-position tracker, and chat seam together. The host
//! forwards raw input events and calls `tick` from its frame loop; the
//! viewer answers with `ViewerEvent`s for anything the host must render or
//! act on. All collaborators are passed in at construction, nothing is
//! ambient.

use log::{debug, warn};

use crate::annotation::Annotation;
use crate::chat::{ChatComposer, OutgoingPart};
use crate::clock::{Clock, SystemClock};
use crate::coords::{PageLayout, PageRegistry};
use crate::geometry::{PixelPoint, PixelRect};
use crate::gesture::{GestureClassifier, GestureOutcome, GesturePreview, PointerHit, Tool};
use crate::persistence::{DocumentKey, PersistResponse, PersistenceService, RequestId};
use crate::reading_state::{ReadingState, ReadingStateTracker};
use crate::screenshot::{self, PageSurface, ScreenshotPreview};
use crate::store::AnnotationStore;

/// Things the host application must react to.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    /// A screenshot rectangle was committed; the host should gather the
    /// overlapping page surfaces and call `capture_screenshot`.
    ScreenshotSelected { rect: PixelRect },
    /// An annotation entered inline editing (click on a text box, or a
    /// freshly created one).
    EditEntered { annotation_id: String },
    /// The visible annotation set changed; re-render overlays.
    AnnotationsChanged,
    /// The persisted reading position arrived; the host should apply page,
    /// zoom, and scroll (via `percent_to_scroll_top`) once layout is ready.
    ReadingStateLoaded(ReadingState),
}

pub struct DocumentViewer<C: Clock = SystemClock> {
    clock: C,
    service: PersistenceService,
    registry: PageRegistry,
    store: AnnotationStore,
    classifier: GestureClassifier,
    tracker: ReadingStateTracker,
    chat: Box<dyn ChatComposer>,
    editing: Option<String>,
    screenshot: Option<ScreenshotPreview>,
    reading_state_fetch: Option<RequestId>,
    disposed: bool,
}

impl DocumentViewer<SystemClock> {
    #[must_use]
    pub fn new(
        service: PersistenceService,
        key: DocumentKey,
        chat: Box<dyn ChatComposer>,
    ) -> Self {
        Self::with_clock(service, key, chat, SystemClock)
    }
}

impl<C: Clock> DocumentViewer<C> {
    #[must_use]
    pub fn with_clock(
        service: PersistenceService,
        key: DocumentKey,
        chat: Box<dyn ChatComposer>,
        clock: C,
    ) -> Self {
        Self {
            clock,
            service,
            registry: PageRegistry::new(),
            store: AnnotationStore::new(key),
            classifier: GestureClassifier::new(),
            tracker: ReadingStateTracker::new(ReadingState::default()),
            chat,
            editing: None,
            screenshot: None,
            reading_state_fetch: None,
            disposed: false,
        }
    }

    /// Kick off the initial annotation list and reading-state fetch.
    pub fn load(&mut self) {
        self.store.load(&mut self.service);
        let key = self.store.document_key().clone();
        self.reading_state_fetch = Some(self.service.get_reading_state(key));
    }

    // ---- rendering-engine notifications ----

    pub fn page_ready(&mut self, layout: PageLayout) {
        self.registry.upsert(layout);
    }

    pub fn page_removed(&mut self, page_number: u32) {
        self.registry.remove(page_number);
    }

    pub fn set_total_pages(&mut self, total: u32) {
        self.registry.set_total_pages(total);
    }

    #[must_use]
    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    // ---- annotation queries for overlay rendering ----

    #[must_use]
    pub fn annotations_on_page(&self, page_number: u32) -> Vec<&Annotation> {
        self.store.list(page_number)
    }

    #[must_use]
    pub fn editing_annotation(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    // ---- tool & pointer input ----

    pub fn set_tool(&mut self, tool: Tool) {
        self.classifier.set_tool(tool);
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.classifier.tool()
    }

    pub fn on_pointer_down(&mut self, point: PixelPoint, hit: PointerHit) {
        let now = self.clock.now();
        let annotations: Vec<&Annotation> = self.store.all().iter().collect();
        self.classifier
            .pointer_down(now, point, hit, &self.registry, &annotations);
    }

    pub fn on_pointer_move(&mut self, point: PixelPoint) {
        self.classifier.pointer_move(point, &self.registry);
    }

    /// Finish the pointer session and apply whatever it resolved to.
    pub fn on_pointer_up(&mut self) -> Option<ViewerEvent> {
        match self.classifier.pointer_up(self.clock.now()) {
            GestureOutcome::None => None,
            GestureOutcome::EnterEdit { annotation_id } => {
                self.editing = Some(annotation_id.clone());
                Some(ViewerEvent::EditEntered { annotation_id })
            }
            GestureOutcome::CreateAnnotation { draft, enter_edit } => {
                match self.store.create(&mut self.service, draft) {
                    Ok(temp_id) => {
                        if enter_edit {
                            self.editing = Some(temp_id.clone());
                            return Some(ViewerEvent::EditEntered {
                                annotation_id: temp_id,
                            });
                        }
                        Some(ViewerEvent::AnnotationsChanged)
                    }
                    Err(e) => {
                        // Invalid drafts are dropped the same way a
                        // below-threshold gesture is.
                        warn!("discarding annotation draft: {e}");
                        None
                    }
                }
            }
            GestureOutcome::MoveAnnotation { annotation_id, x, y } => {
                self.store
                    .update_position(&mut self.service, &annotation_id, x, y);
                Some(ViewerEvent::AnnotationsChanged)
            }
            GestureOutcome::ResizeAnnotation {
                annotation_id,
                rect,
            } => {
                self.store
                    .update_geometry(&mut self.service, &annotation_id, rect);
                Some(ViewerEvent::AnnotationsChanged)
            }
            GestureOutcome::CaptureScreenshot { rect } => {
                Some(ViewerEvent::ScreenshotSelected { rect })
            }
        }
    }

    /// Pointer-leave or window blur: abandon the session, no commit.
    pub fn on_pointer_cancel(&mut self) {
        self.classifier.cancel();
    }

    #[must_use]
    pub fn gesture_preview(&self) -> Option<GesturePreview> {
        self.classifier.preview()
    }

    // ---- inline text editing ----

    /// Host-initiated edit (context menu, keyboard shortcut). The gesture
    /// path enters editing on its own via `EnterEdit`.
    pub fn begin_text_edit(&mut self, annotation_id: &str) {
        if self.store.get(annotation_id).is_some() {
            self.editing = Some(annotation_id.to_string());
        }
    }

    pub fn commit_text_edit(&mut self, text_content: String) {
        let Some(annotation_id) = self.editing.take() else {
            return;
        };
        self.store
            .update_text(&mut self.service, &annotation_id, text_content);
    }

    pub fn cancel_text_edit(&mut self) {
        self.editing = None;
    }

    /// Delete an annotation. The call site must have shown an explicit
    /// confirmation first; the entry stays visible until the backend
    /// confirms the delete.
    pub fn delete_annotation(&mut self, annotation_id: &str) {
        if self.editing.as_deref() == Some(annotation_id) {
            self.editing = None;
        }
        self.store.delete(&mut self.service, annotation_id);
    }

    // ---- screenshot pipeline ----

    /// Crop the committed rectangle out of the given surfaces and hold the
    /// result as the pending preview. Returns whether a preview exists.
    pub fn capture_screenshot(&mut self, rect: PixelRect, surfaces: &[PageSurface]) -> bool {
        self.screenshot = screenshot::capture(rect, surfaces);
        if self.screenshot.is_none() {
            debug!("screenshot selection missed every page surface");
        }
        self.screenshot.is_some()
    }

    #[must_use]
    pub fn screenshot_preview(&self) -> Option<&ScreenshotPreview> {
        self.screenshot.as_ref()
    }

    pub fn discard_screenshot(&mut self) {
        self.screenshot = None;
    }

    /// Attach the pending screenshot to the outgoing chat message. The host
    /// uploads the PNG first and passes the attachment id it was given.
    pub fn send_screenshot_to_chat(&mut self, attachment_id: String) -> anyhow::Result<()> {
        self.chat.append(OutgoingPart::Image { attachment_id })?;
        self.screenshot = None;
        Ok(())
    }

    /// Append selected text to the outgoing chat message.
    pub fn send_text_to_chat(&mut self, text: String) -> anyhow::Result<()> {
        self.chat.append(OutgoingPart::Text(text))
    }

    // ---- reading position ----

    pub fn on_scroll(&mut self, scroll_top: f32, scroll_height: f32, client_height: f32) {
        let now = self.clock.now();
        self.tracker
            .note_scroll(now, scroll_top, scroll_height, client_height);
    }

    pub fn on_zoom(&mut self, zoom_level: f32) {
        let now = self.clock.now();
        self.tracker.note_zoom(now, zoom_level);
    }

    pub fn on_page_changed(&mut self, current_page: u32) {
        let now = self.clock.now();
        self.tracker.note_page(now, current_page);
    }

    #[must_use]
    pub fn reading_state(&self) -> ReadingState {
        self.tracker.state()
    }

    // ---- frame loop ----

    /// Drain persistence responses and fire any due reading-state save.
    /// Call once per frame (or on a coarse timer).
    pub fn tick(&mut self) -> Vec<ViewerEvent> {
        let mut events = Vec::new();

        for response in self.service.poll_responses() {
            if self.reading_state_fetch == Some(response.request_id()) {
                self.reading_state_fetch = None;
                match response {
                    PersistResponse::ReadingState { state, .. } => {
                        self.tracker.restore(state);
                        events.push(ViewerEvent::ReadingStateLoaded(state));
                    }
                    PersistResponse::Error { error, .. } => {
                        warn!("reading state fetch failed, using defaults: {error}");
                        events.push(ViewerEvent::ReadingStateLoaded(ReadingState::default()));
                    }
                    other => warn!("unexpected reading-state response: {other:?}"),
                }
                continue;
            }

            if self.store.apply_response(&mut self.service, &response) {
                events.push(ViewerEvent::AnnotationsChanged);
            } else if let PersistResponse::Error { error, .. } = response {
                // Reading-state saves are fire-and-forget; a failure is only
                // worth a log line.
                warn!("persistence call failed: {error}");
            }
        }

        if !self.disposed {
            let now = self.clock.now();
            if let Some(state) = self.tracker.flush_due(now) {
                let key = self.store.document_key().clone();
                self.service.save_reading_state(key, state);
            }
        }

        events
    }

    /// Teardown on document unmount: a still-armed debounce timer is
    /// flushed immediately instead of leaking past the view's lifetime.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.classifier.cancel();
        self.screenshot = None;
        if let Some(state) = self.tracker.flush_now() {
            let key = self.store.document_key().clone();
            self.service.save_reading_state(key, state);
        }
    }
}

impl<C: Clock> Drop for DocumentViewer<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}
