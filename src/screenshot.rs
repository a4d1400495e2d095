//! Screenshot capture from page raster surfaces.
//!
//! The selection rectangle lives in scroll-container pixels; page rasters
//! are kept at their native resolution. Capture picks the first overlapping
//! page, rescales the intersection into native raster space, and copies the
//! pixels into a fresh image of exactly that size.

use anyhow::{Context, Result};
use image::{GenericImageView, RgbaImage};

use crate::geometry::PixelRect;

/// A page's raster surface as exposed by the rendering engine.
pub struct PageSurface {
    /// 1-based page number.
    pub page_number: u32,
    /// Where the page is currently displayed, in scroll-container pixels
    /// (post-zoom).
    pub display_bounds: PixelRect,
    /// The page bitmap at native resolution.
    pub raster: RgbaImage,
}

/// A captured crop held in memory until it is sent to chat or discarded.
pub struct ScreenshotPreview {
    pub image: RgbaImage,
    pub page_number: u32,
}

impl ScreenshotPreview {
    /// Encode the preview for upload as a chat attachment.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .context("failed to encode screenshot as PNG")?;
        Ok(bytes)
    }
}

/// Crop the selection out of the first page surface it overlaps.
///
/// Returns `None` when the rectangle misses every surface; the caller shows
/// no preview in that case. Never an error: an empty capture is ordinary
/// "changed my mind" input.
#[must_use]
pub fn capture(selection: PixelRect, surfaces: &[PageSurface]) -> Option<ScreenshotPreview> {
    if selection.is_empty() {
        return None;
    }

    let surface = surfaces
        .iter()
        .find(|s| selection.intersect(s.display_bounds).is_some())?;
    let overlap = selection.intersect(surface.display_bounds)?;

    // Rescale the displayed-space intersection into the raster's native
    // pixel space.
    let scale_x = surface.raster.width() as f32 / surface.display_bounds.width.max(f32::EPSILON);
    let scale_y = surface.raster.height() as f32 / surface.display_bounds.height.max(f32::EPSILON);

    let native_x = ((overlap.x - surface.display_bounds.x) * scale_x).floor().max(0.0) as u32;
    let native_y = ((overlap.y - surface.display_bounds.y) * scale_y).floor().max(0.0) as u32;
    let native_w = (overlap.width * scale_x).round() as u32;
    let native_h = (overlap.height * scale_y).round() as u32;

    let native_w = native_w.min(surface.raster.width().saturating_sub(native_x));
    let native_h = native_h.min(surface.raster.height().saturating_sub(native_y));
    if native_w == 0 || native_h == 0 {
        return None;
    }

    let image = surface
        .raster
        .view(native_x, native_y, native_w, native_h)
        .to_image();

    Some(ScreenshotPreview {
        image,
        page_number: surface.page_number,
    })
}
