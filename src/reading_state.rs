//! Reading position tracking with debounced persistence.
//!
//! Scroll and zoom events arrive at UI rate; only the last event in any
//! 2-second burst is worth saving. The tracker keeps the latest state and a
//! deadline, and the host's tick loop calls `flush_due` to emit the save.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// How long a burst of scroll/zoom events must go quiet before saving.
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(2);

/// Allowed zoom range.
pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;

/// Where the user left off in a document, scoped per conversation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingState {
    pub current_page: u32,
    #[serde(rename = "scroll_position")]
    pub scroll_position_percent: f32,
    pub zoom_level: f32,
}

impl Default for ReadingState {
    fn default() -> Self {
        Self {
            current_page: 1,
            scroll_position_percent: 0.0,
            zoom_level: 1.0,
        }
    }
}

impl ReadingState {
    /// Clamp zoom into range, mapping NaN/Inf back to 1.0.
    #[must_use]
    pub fn clamp_zoom(zoom: f32) -> f32 {
        if !zoom.is_finite() {
            1.0
        } else {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        }
    }
}

/// Normalized scroll position as a percentage of scrollable height.
/// A container that cannot scroll reports 0.
#[must_use]
pub fn scroll_percent(scroll_top: f32, scroll_height: f32, client_height: f32) -> f32 {
    let scrollable = scroll_height - client_height;
    if scrollable <= 0.0 {
        return 0.0;
    }
    (scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
}

/// Convert a stored percentage back into pixels against the current layout.
#[must_use]
pub fn percent_to_scroll_top(percent: f32, scroll_height: f32, client_height: f32) -> f32 {
    let scrollable = (scroll_height - client_height).max(0.0);
    percent.clamp(0.0, 100.0) / 100.0 * scrollable
}

/// Debounced, coalescing reading-position tracker.
#[derive(Debug)]
pub struct ReadingStateTracker {
    state: ReadingState,
    deadline: Option<Instant>,
}

impl ReadingStateTracker {
    #[must_use]
    pub fn new(initial: ReadingState) -> Self {
        Self {
            state: initial,
            deadline: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ReadingState {
        self.state
    }

    /// Replace local state with a freshly fetched one without arming a save.
    /// A no-op once the user has already moved: a slow fetch must not undo
    /// interaction that happened while it was in flight.
    pub fn restore(&mut self, state: ReadingState) {
        if self.deadline.is_some() {
            return;
        }
        self.state = ReadingState {
            zoom_level: ReadingState::clamp_zoom(state.zoom_level),
            ..state
        };
    }

    pub fn note_scroll(
        &mut self,
        now: Instant,
        scroll_top: f32,
        scroll_height: f32,
        client_height: f32,
    ) {
        self.state.scroll_position_percent = scroll_percent(scroll_top, scroll_height, client_height);
        self.arm(now);
    }

    pub fn note_zoom(&mut self, now: Instant, zoom_level: f32) {
        self.state.zoom_level = ReadingState::clamp_zoom(zoom_level);
        self.arm(now);
    }

    pub fn note_page(&mut self, now: Instant, current_page: u32) {
        self.state.current_page = current_page.max(1);
        self.arm(now);
    }

    /// Restart the debounce window. Every qualifying event cancels the
    /// previous timer, so only the last event in a burst survives.
    fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + SAVE_DEBOUNCE);
    }

    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.deadline.is_some()
    }

    /// Emit the coalesced state once the debounce window has elapsed.
    pub fn flush_due(&mut self, now: Instant) -> Option<ReadingState> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(self.state)
            }
            _ => None,
        }
    }

    /// Flush any pending save immediately. Called on teardown so the last
    /// position before unmount is not lost to a still-armed timer.
    pub fn flush_now(&mut self) -> Option<ReadingState> {
        self.deadline.take().map(|_| self.state)
    }
}
