//! End-to-end flows through `DocumentViewer` against the in-memory backend:
//! gesture in, optimistic state, worker round-trip, backend state out.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use pagemark::annotation::HighlightColor;
use pagemark::chat::{ChatComposer, OutgoingPart};
use pagemark::clock::ManualClock;
use pagemark::coords::PageLayout;
use pagemark::geometry::{PixelPoint, PixelRect};
use pagemark::gesture::{PointerHit, Tool};
use pagemark::persistence::{DocumentKey, MemoryBackend, PersistenceService};
use pagemark::screenshot::PageSurface;
use pagemark::viewer::{DocumentViewer, ViewerEvent};

#[derive(Clone, Default)]
struct SharedComposer {
    parts: Rc<RefCell<Vec<OutgoingPart>>>,
}

impl ChatComposer for SharedComposer {
    fn append(&mut self, part: OutgoingPart) -> anyhow::Result<()> {
        self.parts.borrow_mut().push(part);
        Ok(())
    }
}

struct Fixture {
    backend: MemoryBackend,
    clock: ManualClock,
    composer: SharedComposer,
    viewer: DocumentViewer<ManualClock>,
    key: DocumentKey,
}

fn fixture() -> Fixture {
    let backend = MemoryBackend::new();
    let clock = ManualClock::new();
    let composer = SharedComposer::default();
    let key = DocumentKey::new("conv-1", "doc-42");

    let service = PersistenceService::spawn(backend.clone());
    let mut viewer = DocumentViewer::with_clock(
        service,
        key.clone(),
        Box::new(composer.clone()),
        clock.clone(),
    );
    viewer.load();
    // 1000x1400 page displayed 1:1, so 1% of width is 10 px.
    viewer.set_total_pages(1);
    viewer.page_ready(PageLayout {
        page_number: 1,
        bounds: PixelRect::new(0.0, 0.0, 1000.0, 1400.0),
        native_width: 1000,
        native_height: 1400,
    });

    Fixture {
        backend,
        clock,
        composer,
        viewer,
        key,
    }
}

/// Pump `tick` until the predicate holds, giving the worker thread time to
/// answer. Panics if it never does.
fn settle(
    viewer: &mut DocumentViewer<ManualClock>,
    mut done: impl FnMut(&DocumentViewer<ManualClock>, &[ViewerEvent]) -> bool,
) -> Vec<ViewerEvent> {
    let mut events = Vec::new();
    for _ in 0..400 {
        events.extend(viewer.tick());
        if done(viewer, &events) {
            return events;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("worker never settled; events so far: {events:?}");
}

fn drag(
    viewer: &mut DocumentViewer<ManualClock>,
    from: (f32, f32),
    to: (f32, f32),
) -> Option<ViewerEvent> {
    viewer.on_pointer_down(PixelPoint::new(from.0, from.1), PointerHit::Content);
    viewer.on_pointer_move(PixelPoint::new(to.0, to.1));
    viewer.on_pointer_up()
}

#[test]
fn highlight_drag_persists_through_backend() {
    let mut fx = fixture();
    fx.viewer.set_tool(Tool::Highlight(HighlightColor::Yellow));

    // (10%, 10%) -> (30%, 11%) on page 1.
    let event = drag(&mut fx.viewer, (100.0, 140.0), (300.0, 154.0));
    assert_eq!(event, Some(ViewerEvent::AnnotationsChanged));

    // Optimistic entry is visible immediately, under a provisional id.
    let local = fx.viewer.annotations_on_page(1);
    assert_eq!(local.len(), 1);
    assert!(local[0].id.starts_with("pending-"));
    assert!((local[0].rect.x - 10.0).abs() < 0.01);
    assert!((local[0].rect.width - 20.0).abs() < 0.01);

    settle(&mut fx.viewer, |v, _| {
        v.annotations_on_page(1)
            .first()
            .is_some_and(|a| !a.id.starts_with("pending-"))
    });

    let stored = fx.backend.stored_annotations(&fx.key);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].page_number, 1);
    assert_eq!(stored[0].color, Some(HighlightColor::Yellow));
}

#[test]
fn text_box_created_and_edited_before_create_returns() {
    let mut fx = fixture();
    fx.viewer.set_tool(Tool::Text);

    let event = drag(&mut fx.viewer, (100.0, 140.0), (300.0, 420.0));
    let Some(ViewerEvent::EditEntered { annotation_id }) = event else {
        panic!("text creation should enter editing, got {event:?}");
    };
    assert!(annotation_id.starts_with("pending-"));
    assert_eq!(fx.viewer.editing_annotation(), Some(annotation_id.as_str()));

    // Commit text while the create round-trip is still in flight. The edit
    // must ride along once the backend assigns a real id.
    fx.viewer.commit_text_edit("remember this".to_string());
    assert_eq!(fx.viewer.editing_annotation(), None);

    let backend = fx.backend.clone();
    let key = fx.key.clone();
    settle(&mut fx.viewer, |_, _| {
        backend
            .stored_annotations(&key)
            .first()
            .is_some_and(|a| a.text_content.as_deref() == Some("remember this"))
    });
}

#[test]
fn short_click_on_text_box_enters_edit() {
    let mut fx = fixture();
    fx.viewer.set_tool(Tool::Text);
    drag(&mut fx.viewer, (100.0, 140.0), (300.0, 420.0));
    fx.viewer.cancel_text_edit();
    settle(&mut fx.viewer, |v, _| {
        v.annotations_on_page(1)
            .first()
            .is_some_and(|a| !a.id.starts_with("pending-"))
    });
    let id = fx.viewer.annotations_on_page(1)[0].id.clone();

    fx.viewer.set_tool(Tool::None);
    fx.viewer
        .on_pointer_down(PixelPoint::new(200.0, 280.0), PointerHit::Content);
    fx.clock.advance(Duration::from_millis(100));
    let event = fx.viewer.on_pointer_up();

    assert_eq!(event, Some(ViewerEvent::EditEntered { annotation_id: id }));
}

#[test]
fn failed_create_rolls_back_optimistic_entry() {
    let mut fx = fixture();
    fx.backend.fail_creates(true);
    fx.viewer.set_tool(Tool::Highlight(HighlightColor::Green));

    drag(&mut fx.viewer, (100.0, 140.0), (300.0, 154.0));
    assert_eq!(fx.viewer.annotations_on_page(1).len(), 1);

    settle(&mut fx.viewer, |v, _| v.annotations_on_page(1).is_empty());
    assert!(fx.backend.stored_annotations(&fx.key).is_empty());
}

#[test]
fn delete_keeps_entry_until_backend_confirms() {
    let mut fx = fixture();
    fx.viewer.set_tool(Tool::Highlight(HighlightColor::Blue));
    drag(&mut fx.viewer, (100.0, 140.0), (300.0, 154.0));
    settle(&mut fx.viewer, |v, _| {
        v.annotations_on_page(1)
            .first()
            .is_some_and(|a| !a.id.starts_with("pending-"))
    });
    let id = fx.viewer.annotations_on_page(1)[0].id.clone();

    fx.viewer.delete_annotation(&id);
    // Not optimistic: still visible until the round-trip completes.
    assert_eq!(fx.viewer.annotations_on_page(1).len(), 1);

    settle(&mut fx.viewer, |v, _| v.annotations_on_page(1).is_empty());
    assert!(fx.backend.stored_annotations(&fx.key).is_empty());
}

#[test]
fn scroll_saves_once_after_debounce() {
    let mut fx = fixture();

    // A burst of scrolls, last one at 20%.
    fx.viewer.on_scroll(100.0, 1500.0, 100.0);
    fx.viewer.on_scroll(200.0, 1500.0, 100.0);
    fx.viewer.on_scroll(280.0, 1500.0, 100.0);
    fx.clock.advance(Duration::from_millis(500));
    fx.viewer.on_scroll(280.0, 1500.0, 100.0);

    // Quiet period still short of the debounce window.
    fx.clock.advance(Duration::from_millis(1500));
    fx.viewer.tick();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(fx.backend.stored_reading_state(&fx.key), None);

    fx.clock.advance(Duration::from_millis(600));
    let backend = fx.backend.clone();
    let key = fx.key.clone();
    settle(&mut fx.viewer, |_, _| {
        backend.stored_reading_state(&key).is_some()
    });

    let state = fx.backend.stored_reading_state(&fx.key).unwrap();
    assert!((state.scroll_position_percent - 20.0).abs() < 0.01);
}

#[test]
fn dispose_flushes_pending_reading_state() {
    let mut fx = fixture();
    fx.viewer.on_page_changed(7);
    fx.viewer.on_zoom(1.5);

    // No debounce expiry, just teardown.
    fx.viewer.dispose();

    for _ in 0..400 {
        if fx.backend.stored_reading_state(&fx.key).is_some() {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    let state = fx.backend.stored_reading_state(&fx.key).unwrap();
    assert_eq!(state.current_page, 7);
    assert!((state.zoom_level - 1.5).abs() < f32::EPSILON);
}

#[test]
fn screenshot_selection_lands_in_chat() {
    let mut fx = fixture();
    fx.viewer.set_tool(Tool::None);

    let event = drag(&mut fx.viewer, (100.0, 100.0), (300.0, 260.0));
    let Some(ViewerEvent::ScreenshotSelected { rect }) = event else {
        panic!("expected a screenshot selection, got {event:?}");
    };
    assert!((rect.width - 200.0).abs() < 0.01);

    let surfaces = [PageSurface {
        page_number: 1,
        display_bounds: PixelRect::new(0.0, 0.0, 1000.0, 1400.0),
        raster: image::RgbaImage::new(1000, 1400),
    }];
    assert!(fx.viewer.capture_screenshot(rect, &surfaces));

    let preview = fx.viewer.screenshot_preview().unwrap();
    assert_eq!(preview.image.width(), 200);
    assert!(preview.to_png().unwrap().starts_with(&[0x89, b'P', b'N', b'G']));

    fx.viewer
        .send_screenshot_to_chat("att-17".to_string())
        .unwrap();
    assert!(fx.viewer.screenshot_preview().is_none());
    assert_eq!(
        fx.composer.parts.borrow().as_slice(),
        &[OutgoingPart::Image {
            attachment_id: "att-17".to_string()
        }]
    );
}

#[test]
fn selected_text_lands_in_chat() {
    let mut fx = fixture();
    fx.viewer
        .send_text_to_chat("a memorable passage".to_string())
        .unwrap();
    assert_eq!(
        fx.composer.parts.borrow().as_slice(),
        &[OutgoingPart::Text("a memorable passage".to_string())]
    );
}
