//! Pixel-space and percentage-space geometry primitives.
//!
//! Annotation geometry lives in a percentage coordinate space (0–100 of a
//! page's rendered width/height) so it survives zoom changes. Pixel types
//! are used for raw pointer samples and screenshot rectangles.

use serde::{Deserialize, Serialize};

/// A point in viewport / scroll-container pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two arbitrary corner points.
    #[must_use]
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[must_use]
    pub fn right(self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[must_use]
    pub fn contains(self, point: PixelPoint) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Intersection with another rectangle, `None` when they do not overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        })
    }
}

/// A point in percentage coordinates relative to a page's rendered box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Distance in percentage units, used for gesture commit thresholds.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }
}

/// Corner grabbed during a resize gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeCorner {
    Nw,
    Ne,
    Sw,
    Se,
}

/// A rectangle in percentage coordinates of a single page.
///
/// Invariant once clamped: `0 <= x`, `0 <= y`, `x + width <= 100`,
/// `y + height <= 100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two percentage points.
    #[must_use]
    pub fn from_corners(a: PagePoint, b: PagePoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Clamp position and size so the rectangle stays inside the page.
    ///
    /// Size is capped first, then the origin is shifted back into range, so
    /// a drag past the right edge parks the rectangle flush with the edge.
    #[must_use]
    pub fn clamped_to_page(self) -> Self {
        let width = self.width.clamp(0.0, 100.0);
        let height = self.height.clamp(0.0, 100.0);
        let x = self.x.clamp(0.0, 100.0 - width);
        let y = self.y.clamp(0.0, 100.0 - height);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Move the rectangle without changing its size, keeping it on the page.
    #[must_use]
    pub fn moved_to(self, x: f32, y: f32) -> Self {
        Self { x, y, ..self }.clamped_to_page()
    }

    /// Apply a corner resize: the grabbed corner follows the pointer delta,
    /// the opposite edges stay fixed. The result is clamped to the page and
    /// to a non-negative size.
    #[must_use]
    pub fn resized_from(self, corner: ResizeCorner, dx: f32, dy: f32) -> Self {
        let (mut x, mut y, mut width, mut height) = (self.x, self.y, self.width, self.height);

        match corner {
            ResizeCorner::Nw => {
                x += dx;
                y += dy;
                width -= dx;
                height -= dy;
            }
            ResizeCorner::Ne => {
                y += dy;
                width += dx;
                height -= dy;
            }
            ResizeCorner::Sw => {
                x += dx;
                width -= dx;
                height += dy;
            }
            ResizeCorner::Se => {
                width += dx;
                height += dy;
            }
        }

        // A crossed-over corner collapses to zero size at the fixed edge
        // rather than producing a negative extent.
        if width < 0.0 {
            match corner {
                ResizeCorner::Nw | ResizeCorner::Sw => x = self.x + self.width,
                _ => {}
            }
            width = 0.0;
        }
        if height < 0.0 {
            match corner {
                ResizeCorner::Nw | ResizeCorner::Ne => y = self.y + self.height,
                _ => {}
            }
            height = 0.0;
        }

        Self {
            x,
            y,
            width,
            height,
        }
        .clamped_to_page()
    }

    #[must_use]
    pub fn contains(self, point: PagePoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// True when the invariants hold without further clamping.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x + self.width <= 100.0
            && self.y + self.height <= 100.0
    }
}
