//! Annotation entities and their wire representation.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::PageRect;

/// What kind of mark the user placed on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// A translucent rectangle over existing page content.
    Highlight,
    /// A free-text box composed by the user.
    Text,
}

/// Highlight palette. Only meaningful for `AnnotationKind::Highlight`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightColor {
    Yellow,
    Green,
    Blue,
    Pink,
}

/// A persisted annotation scoped to one page of one document.
///
/// Geometry is expressed in percentages of the page's rendered size, so it
/// is invariant under zoom. The id is opaque and server-assigned; entries
/// still waiting for their create round-trip carry a client-temporary id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    #[serde(rename = "annotation_type")]
    pub kind: AnnotationKind,
    pub page_number: u32,
    #[serde(flatten)]
    pub rect: PageRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HighlightColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    /// True if a percentage point on the same page falls inside this
    /// annotation's rectangle.
    #[must_use]
    pub fn hit_test(&self, page_number: u32, point: crate::geometry::PagePoint) -> bool {
        self.page_number == page_number && self.rect.contains(point)
    }
}

/// Fields the client supplies when creating an annotation; the backend
/// assigns id and timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDraft {
    #[serde(rename = "annotation_type")]
    pub kind: AnnotationKind,
    pub page_number: u32,
    #[serde(flatten)]
    pub rect: PageRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HighlightColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

impl AnnotationDraft {
    #[must_use]
    pub fn highlight(page_number: u32, rect: PageRect, color: HighlightColor) -> Self {
        Self {
            kind: AnnotationKind::Highlight,
            page_number,
            rect,
            color: Some(color),
            text_content: None,
        }
    }

    /// A text box starts with empty content; the user types into it while it
    /// is in inline-edit mode.
    #[must_use]
    pub fn text_box(page_number: u32, rect: PageRect) -> Self {
        Self {
            kind: AnnotationKind::Text,
            page_number,
            rect,
            color: None,
            text_content: Some(String::new()),
        }
    }

    /// Check geometry invariants and kind/field pairing.
    pub fn validate(&self) -> Result<()> {
        if self.page_number == 0 {
            bail!("page numbers are 1-based");
        }
        if !self.rect.is_valid() {
            bail!(
                "annotation rect out of page bounds: x={} y={} w={} h={}",
                self.rect.x,
                self.rect.y,
                self.rect.width,
                self.rect.height
            );
        }
        match self.kind {
            AnnotationKind::Highlight if self.color.is_none() => {
                bail!("highlight annotation without a color")
            }
            AnnotationKind::Text if self.text_content.is_none() => {
                bail!("text annotation without text content")
            }
            _ => Ok(()),
        }
    }

    /// Materialize the draft into a full entity, used by backends when
    /// assigning identity.
    #[must_use]
    pub fn into_annotation(self, id: String, created_at: DateTime<Utc>) -> Annotation {
        Annotation {
            id,
            kind: self.kind,
            page_number: self.page_number,
            rect: self.rect,
            color: self.color,
            text_content: self.text_content,
            created_at,
        }
    }
}

/// Partial update sent to the backend. Absent fields keep their stored
/// value (partial-update semantics).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

impl AnnotationPatch {
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn geometry(rect: PageRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn text(text_content: String) -> Self {
        Self {
            text_content: Some(text_content),
            ..Self::default()
        }
    }

    /// Apply the patch to a stored annotation, clamping the resulting
    /// geometry back into the page.
    pub fn apply_to(&self, annotation: &mut Annotation) {
        let mut rect = annotation.rect;
        if let Some(x) = self.x {
            rect.x = x;
        }
        if let Some(y) = self.y {
            rect.y = y;
        }
        if let Some(width) = self.width {
            rect.width = width;
        }
        if let Some(height) = self.height {
            rect.height = height;
        }
        annotation.rect = rect.clamped_to_page();
        if let Some(ref text) = self.text_content {
            annotation.text_content = Some(text.clone());
        }
    }
}
