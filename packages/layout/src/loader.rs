//! Layout sources and the load stage.
//!
//! The PDF-to-layout conversion is done by an external engine. Its output (items
//! in reading order plus per-page vector geometry) reaches this crate through a
//! [`LayoutSource`]. [`load_elements`] then removes struck text and tags margin
//! notes, producing the element stream the section segmenter consumes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::HeuristicConfig;
use crate::error::{LayoutError, Result};
use crate::margin::tag_margin_notes;
use crate::strikethrough::{detect_struck_fragments, filter_struck};
use crate::types::{LayoutDocument, PositionedElement};

/// Provider of layout documents.
pub trait LayoutSource {
    /// Load the layout of the document at `path`.
    fn load(&self, path: &Path) -> Result<LayoutDocument>;
}

/// Reads a layout document exported as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLayoutSource;

impl JsonLayoutSource {
    /// Parse a layout document from a JSON string.
    pub fn parse(json: &str) -> Result<LayoutDocument> {
        let document: LayoutDocument = serde_json::from_str(json)?;
        validate_document(&document)?;
        Ok(document)
    }
}

impl LayoutSource for JsonLayoutSource {
    fn load(&self, path: &Path) -> Result<LayoutDocument> {
        if !path.exists() {
            return Err(LayoutError::DocumentNotFound(PathBuf::from(path)));
        }
        tracing::info!(path = %path.display(), "reading layout document");
        let json = fs::read_to_string(path)?;
        Self::parse(&json)
    }
}

/// Reject geometry that cannot belong to any page.
fn validate_document(document: &LayoutDocument) -> Result<()> {
    if let Some(page) = document.pages.iter().find(|p| p.page == 0) {
        return Err(LayoutError::InvalidDocument(format!(
            "page geometry must use 1-indexed page numbers (got page {} with {} rects)",
            page.page,
            page.rects.len()
        )));
    }
    Ok(())
}

/// Output of the load stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedDocument {
    pub elements: Vec<PositionedElement>,
    pub struck_fragment_count: usize,
    pub struck_element_count: usize,
    pub margin_note_count: usize,
}

/// Turn a layout document into filtered, margin-tagged elements.
#[must_use]
pub fn load_elements(document: &LayoutDocument, heuristics: &HeuristicConfig) -> LoadedDocument {
    let fragments = detect_struck_fragments(&document.pages, &heuristics.strike);
    if !fragments.is_empty() {
        tracing::info!(
            fragments = fragments.fragment_count(),
            pages = fragments.page_count(),
            "found struck-through fragments"
        );
    }

    let elements: Vec<PositionedElement> = document
        .items
        .iter()
        .filter_map(PositionedElement::from_item)
        .collect();

    let (elements, struck_element_count) = filter_struck(elements, &fragments, &heuristics.strike);
    if struck_element_count > 0 {
        tracing::info!(count = struck_element_count, "filtered struck-through elements");
    }

    let (elements, margin_note_count) = tag_margin_notes(elements, &heuristics.margin);
    if margin_note_count > 0 {
        tracing::info!(count = margin_note_count, "tagged margin notes");
    }

    tracing::info!(count = elements.len(), "loaded elements");

    LoadedDocument {
        elements,
        struck_fragment_count: fragments.fragment_count(),
        struck_element_count,
        margin_note_count,
    }
}
