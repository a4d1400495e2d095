//! Page registry and pixel↔percent coordinate mapping.
//!
//! The rendering engine registers every visible page's current bounding box
//! and native raster size here. All lookups go through the registry instead
//! of scanning the rendered tree, which keeps the mapping testable without a
//! real renderer.

use crate::geometry::{PagePoint, PixelPoint, PixelRect};

/// Layout of a single rendered page as reported by the rendering engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    /// 1-based page number.
    pub page_number: u32,
    /// Current rendered bounding box in scroll-container pixels. This is the
    /// post-transform box, so it already reflects the active zoom level.
    pub bounds: PixelRect,
    /// Native raster width in pixels (pre-zoom).
    pub native_width: u32,
    /// Native raster height in pixels (pre-zoom).
    pub native_height: u32,
}

impl PageLayout {
    /// Map a pixel point to percentage coordinates of this page.
    ///
    /// Divides by the live rendered width/height, so the result is stable
    /// across zoom changes. Points outside the page produce values outside
    /// [0, 100]; clamping is the caller's decision.
    #[must_use]
    pub fn to_page_percent(&self, point: PixelPoint) -> PagePoint {
        let width = self.bounds.width.max(f32::EPSILON);
        let height = self.bounds.height.max(f32::EPSILON);
        PagePoint {
            x: (point.x - self.bounds.x) / width * 100.0,
            y: (point.y - self.bounds.y) / height * 100.0,
        }
    }

    /// Map a percentage point back into scroll-container pixels.
    #[must_use]
    pub fn to_pixel(&self, point: PagePoint) -> PixelPoint {
        PixelPoint {
            x: self.bounds.x + point.x / 100.0 * self.bounds.width,
            y: self.bounds.y + point.y / 100.0 * self.bounds.height,
        }
    }

    /// Scale factor from displayed pixels to the native raster.
    #[must_use]
    pub fn display_to_native_scale(&self) -> (f32, f32) {
        (
            self.native_width as f32 / self.bounds.width.max(f32::EPSILON),
            self.native_height as f32 / self.bounds.height.max(f32::EPSILON),
        )
    }
}

/// Registry of visible pages, kept in document order.
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: Vec<PageLayout>,
    total_pages: u32,
}

impl PageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the total page count reported by the rendering engine.
    pub fn set_total_pages(&mut self, total: u32) {
        self.total_pages = total;
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Insert or refresh a page layout, preserving document order.
    pub fn upsert(&mut self, layout: PageLayout) {
        match self
            .pages
            .iter_mut()
            .find(|p| p.page_number == layout.page_number)
        {
            Some(existing) => *existing = layout,
            None => {
                let idx = self
                    .pages
                    .partition_point(|p| p.page_number < layout.page_number);
                self.pages.insert(idx, layout);
            }
        }
    }

    /// Drop a page that scrolled out of the render window.
    pub fn remove(&mut self, page_number: u32) {
        self.pages.retain(|p| p.page_number != page_number);
    }

    #[must_use]
    pub fn get(&self, page_number: u32) -> Option<&PageLayout> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    /// Resolve which page a pixel point falls inside.
    ///
    /// At page boundaries a point can sit over two boxes; the first
    /// containing page in document order wins.
    #[must_use]
    pub fn page_at(&self, point: PixelPoint) -> Option<&PageLayout> {
        self.pages.iter().find(|p| p.bounds.contains(point))
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &PageLayout> {
        self.pages.iter()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
