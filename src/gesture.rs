//! Pointer-session state machine.
//!
//! A single pointer stream has to resolve into exactly one intent: plain
//! text selection, screenshot selection, annotation creation, drag, resize,
//! or click-to-edit. The classifier is a per-session finite state machine:
//! pointer-down arms a mode, a mode-specific displacement threshold commits
//! it, and pointer-up produces at most one `GestureOutcome` for the
//! coordinator to apply. Below the commit threshold nothing is drawn and
//! nothing mutates, which is what lets an accidental wiggle fall through to
//! ordinary click handling.
//!
//! All timing decisions take an explicit `now`, so the 300 ms press
//! disambiguation is deterministic under test.

use std::time::{Duration, Instant};

use log::debug;

use crate::annotation::{Annotation, AnnotationDraft, AnnotationKind, HighlightColor};
use crate::coords::PageRegistry;
use crate::geometry::{PagePoint, PageRect, PixelPoint, PixelRect, ResizeCorner};

/// Displacement (percentage units) before a creation or resize gesture is
/// treated as intentional.
pub const CREATE_COMMIT_THRESHOLD_PCT: f32 = 0.5;
/// Displacement (percentage units) that turns a press on a text box into a
/// drag regardless of how long the button has been held.
pub const DRAG_THRESHOLD_PCT: f32 = 0.5;
/// Displacement (pixels) before a screenshot rectangle starts drawing.
pub const SCREENSHOT_COMMIT_THRESHOLD_PX: f32 = 5.0;
/// A press shorter than this with no qualifying movement is a click.
pub const CLICK_MAX_DURATION: Duration = Duration::from_millis(300);
/// Committed creations narrower than this are discarded.
pub const MIN_ANNOTATION_WIDTH_PCT: f32 = 1.0;
/// Text boxes additionally need a real height to be usable.
pub const MIN_TEXT_HEIGHT_PCT: f32 = 1.0;
/// Highlights are floored to this height so a flat drag stays visible.
pub const HIGHLIGHT_MIN_HEIGHT_PCT: f32 = 1.5;
/// Screenshot rectangles smaller than this (either side) are ignored.
pub const MIN_SCREENSHOT_SIZE_PX: f32 = 10.0;

/// The editing tool currently selected in the toolbar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Tool {
    /// No tool: clicks select text, edit, or start screenshot rectangles.
    #[default]
    None,
    Highlight(HighlightColor),
    Text,
}

/// What the host reports under the pointer at pointer-down. Resize handles
/// are host-rendered affordances with their own hit geometry, so the
/// classifier cannot derive them from annotation rectangles alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PointerHit {
    #[default]
    Content,
    ResizeHandle {
        annotation_id: String,
        corner: ResizeCorner,
    },
}

/// The mutually exclusive intent a session can arm into.
#[derive(Clone, Debug)]
enum SessionMode {
    CreatingAnnotation {
        page_number: u32,
        anchor: PagePoint,
        current: PagePoint,
    },
    /// A press on an existing text box, not yet disambiguated between
    /// click-to-edit and drag.
    PressOnAnnotation {
        annotation_id: String,
        page_number: u32,
        anchor: PagePoint,
        current: PagePoint,
        origin: PageRect,
        pressed_at: Instant,
    },
    DraggingAnnotation {
        annotation_id: String,
        page_number: u32,
        anchor: PagePoint,
        current: PagePoint,
        origin: PageRect,
    },
    ResizingAnnotation {
        annotation_id: String,
        page_number: u32,
        corner: ResizeCorner,
        anchor: PagePoint,
        current: PagePoint,
        origin: PageRect,
    },
    SelectingScreenshot {
        anchor: PixelPoint,
        current: PixelPoint,
    },
}

#[derive(Debug)]
struct Session {
    mode: SessionMode,
    committed: bool,
}

/// Live preview rectangle for rendering, present only after commit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GesturePreview {
    /// Percent-space rectangle on a page (create, drag, resize).
    Page { page_number: u32, rect: PageRect },
    /// Pixel-space rectangle in the scroll container (screenshot).
    Screen { rect: PixelRect },
}

/// What a finished session asks the coordinator to do.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureOutcome {
    /// Threshold never crossed, or the session was aborted: no side effect.
    None,
    /// A short still click on a text box: enter inline editing.
    EnterEdit { annotation_id: String },
    /// Committed creation drag; `enter_edit` is set for text boxes, which
    /// open their editor immediately after creation.
    CreateAnnotation {
        draft: AnnotationDraft,
        enter_edit: bool,
    },
    MoveAnnotation {
        annotation_id: String,
        x: f32,
        y: f32,
    },
    ResizeAnnotation {
        annotation_id: String,
        rect: PageRect,
    },
    /// Committed screenshot rectangle of at least the minimum size.
    CaptureScreenshot { rect: PixelRect },
}

/// Per-pointer-session intent classifier.
#[derive(Debug, Default)]
pub struct GestureClassifier {
    tool: Tool,
    session: Option<Session>,
}

impl GestureClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Start a session. A pointer-down while a previous session is still
    /// live discards it: the previous pointer-up was never seen.
    pub fn pointer_down(
        &mut self,
        now: Instant,
        point: PixelPoint,
        hit: PointerHit,
        registry: &PageRegistry,
        annotations: &[&Annotation],
    ) {
        if self.session.take().is_some() {
            debug!("pointer down with live session, resetting");
        }

        let mode = match self.tool {
            Tool::Highlight(_) | Tool::Text => Self::arm_creation(point, registry),
            Tool::None => Self::arm_selection(now, point, hit, registry, annotations),
        };

        self.session = mode.map(|mode| Session {
            mode,
            committed: false,
        });
    }

    fn arm_creation(point: PixelPoint, registry: &PageRegistry) -> Option<SessionMode> {
        // No page under the anchor: silently refuse to arm. No entity is
        // created yet either way; that happens on drag-commit.
        let page = registry.page_at(point)?;
        let anchor = page.to_page_percent(point).clamped();
        Some(SessionMode::CreatingAnnotation {
            page_number: page.page_number,
            anchor,
            current: anchor,
        })
    }

    fn arm_selection(
        now: Instant,
        point: PixelPoint,
        hit: PointerHit,
        registry: &PageRegistry,
        annotations: &[&Annotation],
    ) -> Option<SessionMode> {
        if let PointerHit::ResizeHandle {
            annotation_id,
            corner,
        } = hit
        {
            let origin = annotations
                .iter()
                .find(|a| a.id == annotation_id)?
                .rect;
            let page = registry.page_at(point)?;
            let anchor = page.to_page_percent(point);
            return Some(SessionMode::ResizingAnnotation {
                annotation_id,
                page_number: page.page_number,
                corner,
                anchor,
                current: anchor,
                origin,
            });
        }

        if let Some(page) = registry.page_at(point) {
            let at = page.to_page_percent(point);
            // Topmost (most recent) text box wins. Highlights never trap the
            // pointer here: events pass through so the text underneath stays
            // selectable.
            if let Some(target) = annotations
                .iter()
                .rev()
                .find(|a| a.kind == AnnotationKind::Text && a.hit_test(page.page_number, at))
            {
                return Some(SessionMode::PressOnAnnotation {
                    annotation_id: target.id.clone(),
                    page_number: page.page_number,
                    anchor: at,
                    current: at,
                    origin: target.rect,
                    pressed_at: now,
                });
            }
        }

        // Empty space: arm a screenshot rectangle. Native text selection
        // proceeds concurrently and is reconciled after pointer-up.
        Some(SessionMode::SelectingScreenshot {
            anchor: point,
            current: point,
        })
    }

    /// Feed a pointer movement sample.
    pub fn pointer_move(&mut self, point: PixelPoint, registry: &PageRegistry) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match &mut session.mode {
            SessionMode::CreatingAnnotation {
                page_number,
                anchor,
                current,
            } => {
                if let Some(page) = registry.get(*page_number) {
                    *current = page.to_page_percent(point).clamped();
                }
                if !session.committed && anchor.distance_to(*current) >= CREATE_COMMIT_THRESHOLD_PCT
                {
                    session.committed = true;
                }
            }
            SessionMode::PressOnAnnotation {
                annotation_id,
                page_number,
                anchor,
                current,
                origin,
                ..
            } => {
                if let Some(page) = registry.get(*page_number) {
                    *current = page.to_page_percent(point);
                }
                if anchor.distance_to(*current) >= DRAG_THRESHOLD_PCT {
                    // Movement settles the click-vs-drag question early.
                    session.mode = SessionMode::DraggingAnnotation {
                        annotation_id: annotation_id.clone(),
                        page_number: *page_number,
                        anchor: *anchor,
                        current: *current,
                        origin: *origin,
                    };
                    session.committed = true;
                }
            }
            SessionMode::DraggingAnnotation {
                page_number,
                anchor,
                current,
                ..
            } => {
                if let Some(page) = registry.get(*page_number) {
                    *current = page.to_page_percent(point);
                }
                if !session.committed && anchor.distance_to(*current) > 0.0 {
                    session.committed = true;
                }
            }
            SessionMode::ResizingAnnotation {
                page_number,
                anchor,
                current,
                ..
            } => {
                if let Some(page) = registry.get(*page_number) {
                    *current = page.to_page_percent(point);
                }
                if !session.committed && anchor.distance_to(*current) >= CREATE_COMMIT_THRESHOLD_PCT
                {
                    session.committed = true;
                }
            }
            SessionMode::SelectingScreenshot { anchor, current } => {
                *current = point;
                if !session.committed
                    && anchor.distance_to(*current) >= SCREENSHOT_COMMIT_THRESHOLD_PX
                {
                    session.committed = true;
                }
            }
        }
    }

    /// The committed live preview, if any. Uncommitted sessions draw
    /// nothing so tiny accidental movements never flicker.
    #[must_use]
    pub fn preview(&self) -> Option<GesturePreview> {
        let session = self.session.as_ref()?;
        if !session.committed {
            return None;
        }
        Some(match &session.mode {
            SessionMode::CreatingAnnotation {
                page_number,
                anchor,
                current,
            } => GesturePreview::Page {
                page_number: *page_number,
                rect: PageRect::from_corners(*anchor, *current).clamped_to_page(),
            },
            // A press is never committed; it either becomes a drag or ends
            // as a click.
            SessionMode::PressOnAnnotation { .. } => return None,
            SessionMode::DraggingAnnotation {
                page_number,
                anchor,
                current,
                origin,
                ..
            } => GesturePreview::Page {
                page_number: *page_number,
                rect: origin.moved_to(origin.x + (current.x - anchor.x), origin.y + (current.y - anchor.y)),
            },
            SessionMode::ResizingAnnotation {
                page_number,
                corner,
                anchor,
                current,
                origin,
                ..
            } => GesturePreview::Page {
                page_number: *page_number,
                rect: origin.resized_from(*corner, current.x - anchor.x, current.y - anchor.y),
            },
            SessionMode::SelectingScreenshot { anchor, current } => GesturePreview::Screen {
                rect: PixelRect::from_corners(*anchor, *current),
            },
        })
    }

    /// Finish the session and classify it into an outcome.
    pub fn pointer_up(&mut self, now: Instant) -> GestureOutcome {
        let Some(session) = self.session.take() else {
            return GestureOutcome::None;
        };

        match session.mode {
            SessionMode::CreatingAnnotation {
                page_number,
                anchor,
                current,
            } => {
                if !session.committed {
                    return GestureOutcome::None;
                }
                self.finish_creation(page_number, anchor, current)
            }
            SessionMode::PressOnAnnotation {
                annotation_id,
                anchor,
                current,
                origin,
                pressed_at,
                ..
            } => {
                // Never moved past the drag threshold. A quick release is a
                // click into the editor; a long hold is a drag that may have
                // drifted a little.
                if now.duration_since(pressed_at) < CLICK_MAX_DURATION {
                    GestureOutcome::EnterEdit { annotation_id }
                } else {
                    Self::finish_drag(annotation_id, anchor, current, origin)
                }
            }
            SessionMode::DraggingAnnotation {
                annotation_id,
                anchor,
                current,
                origin,
                ..
            } => Self::finish_drag(annotation_id, anchor, current, origin),
            SessionMode::ResizingAnnotation {
                annotation_id,
                corner,
                anchor,
                current,
                origin,
                ..
            } => {
                if !session.committed {
                    return GestureOutcome::None;
                }
                GestureOutcome::ResizeAnnotation {
                    annotation_id,
                    rect: origin.resized_from(corner, current.x - anchor.x, current.y - anchor.y),
                }
            }
            SessionMode::SelectingScreenshot { anchor, current } => {
                let rect = PixelRect::from_corners(anchor, current);
                if !session.committed
                    || rect.width < MIN_SCREENSHOT_SIZE_PX
                    || rect.height < MIN_SCREENSHOT_SIZE_PX
                {
                    return GestureOutcome::None;
                }
                GestureOutcome::CaptureScreenshot { rect }
            }
        }
    }

    fn finish_creation(
        &self,
        page_number: u32,
        anchor: PagePoint,
        current: PagePoint,
    ) -> GestureOutcome {
        let rect = PageRect::from_corners(anchor, current).clamped_to_page();
        if rect.width <= MIN_ANNOTATION_WIDTH_PCT {
            return GestureOutcome::None;
        }

        match self.tool {
            Tool::Highlight(color) => {
                let rect = PageRect {
                    height: rect.height.max(HIGHLIGHT_MIN_HEIGHT_PCT),
                    ..rect
                }
                .clamped_to_page();
                GestureOutcome::CreateAnnotation {
                    draft: AnnotationDraft::highlight(page_number, rect, color),
                    enter_edit: false,
                }
            }
            Tool::Text => {
                if rect.height <= MIN_TEXT_HEIGHT_PCT {
                    return GestureOutcome::None;
                }
                GestureOutcome::CreateAnnotation {
                    draft: AnnotationDraft::text_box(page_number, rect),
                    enter_edit: true,
                }
            }
            // Tool changed mid-session; nothing sensible to create.
            Tool::None => GestureOutcome::None,
        }
    }

    fn finish_drag(
        annotation_id: String,
        anchor: PagePoint,
        current: PagePoint,
        origin: PageRect,
    ) -> GestureOutcome {
        let dx = current.x - anchor.x;
        let dy = current.y - anchor.y;
        if dx == 0.0 && dy == 0.0 {
            return GestureOutcome::None;
        }
        let moved = origin.moved_to(origin.x + dx, origin.y + dy);
        GestureOutcome::MoveAnnotation {
            annotation_id,
            x: moved.x,
            y: moved.y,
        }
    }

    /// Abort the session without committing: pointer-leave, window blur.
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            debug!("pointer session cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationDraft;
    use crate::clock::{Clock, ManualClock};
    use crate::coords::PageLayout;

    /// One 1000x1000 page at the origin: pixels map 10:1 to percent.
    fn registry() -> PageRegistry {
        let mut registry = PageRegistry::new();
        registry.upsert(PageLayout {
            page_number: 1,
            bounds: PixelRect::new(0.0, 0.0, 1000.0, 1000.0),
            native_width: 1000,
            native_height: 1000,
        });
        registry.upsert(PageLayout {
            page_number: 2,
            bounds: PixelRect::new(0.0, 1000.0, 1000.0, 1000.0),
            native_width: 1000,
            native_height: 1000,
        });
        registry
    }

    fn text_annotation(id: &str, page: u32, rect: PageRect) -> Annotation {
        AnnotationDraft::text_box(page, rect).into_annotation(id.into(), chrono::Utc::now())
    }

    fn highlight_annotation(id: &str, page: u32, rect: PageRect) -> Annotation {
        AnnotationDraft::highlight(page, rect, HighlightColor::Yellow)
            .into_annotation(id.into(), chrono::Utc::now())
    }

    #[test]
    fn highlight_drag_creates_with_floored_height() {
        let clock = ManualClock::new();
        let registry = registry();
        let mut classifier = GestureClassifier::new();
        classifier.set_tool(Tool::Highlight(HighlightColor::Yellow));

        // Page 2 spans y 1000..2000: drag (10%,10%) -> (30%,11%).
        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(100.0, 1100.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        classifier.pointer_move(PixelPoint::new(300.0, 1110.0), &registry);

        match classifier.pointer_up(clock.now()) {
            GestureOutcome::CreateAnnotation { draft, enter_edit } => {
                assert!(!enter_edit);
                assert_eq!(draft.page_number, 2);
                assert!((draft.rect.x - 10.0).abs() < 1e-3);
                assert!((draft.rect.y - 10.0).abs() < 1e-3);
                assert!((draft.rect.width - 20.0).abs() < 1e-3);
                assert_eq!(draft.rect.height, HIGHLIGHT_MIN_HEIGHT_PCT);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn sub_threshold_creation_is_a_no_op() {
        let clock = ManualClock::new();
        let registry = registry();
        let mut classifier = GestureClassifier::new();
        classifier.set_tool(Tool::Highlight(HighlightColor::Green));

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(100.0, 100.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        // 0.3 percentage units of travel: below the 0.5 commit threshold.
        classifier.pointer_move(PixelPoint::new(103.0, 100.0), &registry);

        assert_eq!(classifier.preview(), None);
        assert_eq!(classifier.pointer_up(clock.now()), GestureOutcome::None);
    }

    #[test]
    fn narrow_committed_creation_is_discarded() {
        let clock = ManualClock::new();
        let registry = registry();
        let mut classifier = GestureClassifier::new();
        classifier.set_tool(Tool::Highlight(HighlightColor::Green));

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(100.0, 100.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        // Committed (0.9% travel) but final width is below 1%.
        classifier.pointer_move(PixelPoint::new(109.0, 100.0), &registry);
        assert!(classifier.preview().is_some());

        assert_eq!(classifier.pointer_up(clock.now()), GestureOutcome::None);
    }

    #[test]
    fn quick_click_on_text_box_enters_edit() {
        let clock = ManualClock::new();
        let registry = registry();
        let annotation = text_annotation("t-1", 1, PageRect::new(10.0, 10.0, 20.0, 10.0));
        let mut classifier = GestureClassifier::new();

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(150.0, 150.0),
            PointerHit::Content,
            &registry,
            &[&annotation],
        );
        clock.advance(Duration::from_millis(250));

        assert_eq!(
            classifier.pointer_up(clock.now()),
            GestureOutcome::EnterEdit {
                annotation_id: "t-1".into()
            }
        );
    }

    #[test]
    fn long_press_drag_moves_text_box() {
        let clock = ManualClock::new();
        let registry = registry();
        let annotation = text_annotation("t-1", 1, PageRect::new(10.0, 10.0, 20.0, 10.0));
        let mut classifier = GestureClassifier::new();

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(150.0, 150.0),
            PointerHit::Content,
            &registry,
            &[&annotation],
        );
        clock.advance(Duration::from_millis(400));
        // 5% drag to the right.
        classifier.pointer_move(PixelPoint::new(200.0, 150.0), &registry);

        match classifier.pointer_up(clock.now()) {
            GestureOutcome::MoveAnnotation { annotation_id, x, y } => {
                assert_eq!(annotation_id, "t-1");
                assert!((x - 15.0).abs() < 1e-3);
                assert!((y - 10.0).abs() < 1e-3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn slow_still_press_does_not_enter_edit() {
        let clock = ManualClock::new();
        let registry = registry();
        let annotation = text_annotation("t-1", 1, PageRect::new(10.0, 10.0, 20.0, 10.0));
        let mut classifier = GestureClassifier::new();

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(150.0, 150.0),
            PointerHit::Content,
            &registry,
            &[&annotation],
        );
        clock.advance(Duration::from_millis(400));

        // Held past the click window without moving: a drag of zero
        // displacement, which is a no-op.
        assert_eq!(classifier.pointer_up(clock.now()), GestureOutcome::None);
    }

    #[test]
    fn highlights_pass_the_pointer_through() {
        let clock = ManualClock::new();
        let registry = registry();
        let annotation = highlight_annotation("h-1", 1, PageRect::new(10.0, 10.0, 20.0, 10.0));
        let mut classifier = GestureClassifier::new();

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(150.0, 150.0),
            PointerHit::Content,
            &registry,
            &[&annotation],
        );

        // The press armed a screenshot selection, not an annotation drag.
        classifier.pointer_move(PixelPoint::new(400.0, 400.0), &registry);
        assert!(matches!(
            classifier.preview(),
            Some(GesturePreview::Screen { .. })
        ));
    }

    #[test]
    fn resize_from_nw_corner() {
        let clock = ManualClock::new();
        let registry = registry();
        let annotation = text_annotation("t-1", 1, PageRect::new(20.0, 20.0, 40.0, 30.0));
        let mut classifier = GestureClassifier::new();

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(200.0, 200.0),
            PointerHit::ResizeHandle {
                annotation_id: "t-1".into(),
                corner: ResizeCorner::Nw,
            },
            &registry,
            &[&annotation],
        );
        // +5% in both axes.
        classifier.pointer_move(PixelPoint::new(250.0, 250.0), &registry);

        match classifier.pointer_up(clock.now()) {
            GestureOutcome::ResizeAnnotation { annotation_id, rect } => {
                assert_eq!(annotation_id, "t-1");
                assert!((rect.x - 25.0).abs() < 1e-3);
                assert!((rect.y - 25.0).abs() < 1e-3);
                assert!((rect.width - 35.0).abs() < 1e-3);
                assert!((rect.height - 25.0).abs() < 1e-3);
                assert!(rect.is_valid());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn screenshot_selection_commits_and_enforces_minimum() {
        let clock = ManualClock::new();
        let registry = registry();
        let mut classifier = GestureClassifier::new();

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(500.0, 500.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        classifier.pointer_move(PixelPoint::new(530.0, 508.0), &registry);

        // Committed (>5px travel) but only 8px tall: too small to act on.
        assert_eq!(classifier.pointer_up(clock.now()), GestureOutcome::None);

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(500.0, 500.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        classifier.pointer_move(PixelPoint::new(620.0, 580.0), &registry);
        assert_eq!(
            classifier.pointer_up(clock.now()),
            GestureOutcome::CaptureScreenshot {
                rect: PixelRect::new(500.0, 500.0, 120.0, 80.0)
            }
        );
    }

    #[test]
    fn cancel_discards_session() {
        let clock = ManualClock::new();
        let registry = registry();
        let mut classifier = GestureClassifier::new();
        classifier.set_tool(Tool::Text);

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(100.0, 100.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        classifier.pointer_move(PixelPoint::new(400.0, 400.0), &registry);
        classifier.cancel();

        assert!(!classifier.is_active());
        assert_eq!(classifier.pointer_up(clock.now()), GestureOutcome::None);
    }

    #[test]
    fn new_pointer_down_resets_stale_session() {
        let clock = ManualClock::new();
        let registry = registry();
        let mut classifier = GestureClassifier::new();
        classifier.set_tool(Tool::Highlight(HighlightColor::Blue));

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(100.0, 100.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        classifier.pointer_move(PixelPoint::new(500.0, 500.0), &registry);

        // Pointer-up never arrived; a fresh down starts over.
        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(700.0, 700.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        match classifier.preview() {
            None => {}
            other => panic!("stale preview survived: {other:?}"),
        }
    }

    #[test]
    fn creation_off_page_arms_nothing() {
        let clock = ManualClock::new();
        let registry = registry();
        let mut classifier = GestureClassifier::new();
        classifier.set_tool(Tool::Text);

        classifier.pointer_down(
            clock.now(),
            PixelPoint::new(100.0, 5000.0),
            PointerHit::Content,
            &registry,
            &[],
        );
        assert!(!classifier.is_active());
    }
}
