//! Core data types for layout processing.
//!
//! `LayoutItem` and `PageGeometry` describe what the layout-extraction engine
//! hands over; `PositionedElement` is the retained, normalized unit that every
//! later stage works on.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Category tag of a recognized text unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
#[strum(ascii_case_insensitive)]
pub enum Label {
    /// Heading, including numbered clause headings.
    #[strum(
        to_string = "SECTION_HEADER",
        serialize = "section_header",
        serialize = "sectionheader",
        serialize = "section-header"
    )]
    SectionHeader,

    /// Running body text.
    #[strum(to_string = "TEXT", serialize = "text", serialize = "paragraph")]
    Text,

    /// Item of a bulleted or numbered list.
    #[strum(
        to_string = "LIST_ITEM",
        serialize = "list_item",
        serialize = "listitem",
        serialize = "list-item"
    )]
    ListItem,

    /// Table content.
    #[strum(to_string = "TABLE", serialize = "table")]
    Table,

    /// Anything else the layout engine reports (captions, page headers, ...).
    #[strum(to_string = "OTHER", serialize = "other")]
    Other,
}

impl Label {
    /// Parse a layout engine label, mapping unknown categories to [`Label::Other`].
    #[must_use]
    pub fn from_layout(label: &str) -> Self {
        label.trim().parse().unwrap_or(Self::Other)
    }

    /// Whether elements with this label contribute to section text.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::SectionHeader | Self::Text | Self::ListItem)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::from_layout(&value)
    }
}

/// Bounding box of a layout item, top-left origin, in PDF points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub l: f64,
    /// Top edge.
    pub t: f64,
    /// Right edge.
    pub r: f64,
    /// Bottom edge.
    pub b: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(l: f64, t: f64, r: f64, b: f64) -> Self {
        Self { l, t, r, b }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.r - self.l
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        (self.b - self.t).abs()
    }
}

/// One item as reported by the layout engine, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub text: String,
    pub label: Label,
    /// 1-indexed page number, 0 when the item has no provenance.
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

/// A vector rectangle drawn on a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        (self.bottom - self.top).abs()
    }
}

/// Bounding box of a single rendered character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharBox {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CharBox {
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Raw geometry of one page: drawn rectangles and character boxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page: u32,
    #[serde(default)]
    pub rects: Vec<Rect>,
    #[serde(default)]
    pub chars: Vec<CharBox>,
}

/// Everything the layout engine produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub items: Vec<LayoutItem>,
    #[serde(default)]
    pub pages: Vec<PageGeometry>,
}

impl LayoutDocument {
    /// Number of distinct pages referenced by items or geometry.
    #[must_use]
    pub fn page_count(&self) -> usize {
        let mut pages: Vec<u32> = self
            .items
            .iter()
            .map(|item| item.page)
            .chain(self.pages.iter().map(|p| p.page))
            .filter(|&p| p > 0)
            .collect();
        pages.sort_unstable();
        pages.dedup();
        pages.len()
    }
}

/// A retained unit of document content.
///
/// Immutable once built, except for the margin-note flag which is attached by
/// the margin classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedElement {
    pub label: Label,
    pub text: String,
    pub page: u32,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub is_margin_note: bool,
}

impl PositionedElement {
    /// Create an element without geometry.
    #[must_use]
    pub fn new(label: Label, text: impl Into<String>, page: u32) -> Self {
        Self {
            label,
            text: text.into(),
            page,
            level: 0,
            bbox: None,
            is_margin_note: false,
        }
    }

    /// Build an element from a layout item. Returns `None` for blank items.
    #[must_use]
    pub fn from_item(item: &LayoutItem) -> Option<Self> {
        let text = item.text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            label: item.label,
            text: text.to_string(),
            page: item.page,
            level: item.level,
            bbox: item.bbox,
            is_margin_note: false,
        })
    }

    #[must_use]
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    #[must_use]
    pub fn with_margin_note(mut self, is_margin_note: bool) -> Self {
        self.is_margin_note = is_margin_note;
        self
    }

    /// Left edge, if the element carries usable geometry.
    #[must_use]
    pub fn x0(&self) -> Option<f64> {
        self.bbox.map(|b| b.l).filter(|&l| l > 0.0)
    }
}
