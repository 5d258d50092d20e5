//! Charter party layout processing.
//!
//! This crate turns the positioned text items produced by a layout-extraction
//! engine into clean, sectioned document content. Everything here is
//! synchronous and CPU-bound; the oracle-facing stages live in
//! `charter-pipeline`.
//!
//! # Example
//!
//! ```
//! use charter_layout::sections::leading_number;
//!
//! assert_eq!(leading_number("12. Cancelling Clause"), Some(12));
//! assert_eq!(leading_number("ADDITIONAL CLAUSES"), None);
//! ```
//!
//! # Architecture
//!
//! - [`types`]: Layout document model (items, page geometry, elements)
//! - [`config`]: Tunable heuristic parameters
//! - [`error`]: Error types and Result alias
//! - [`loader`]: Layout sources and the load stage (strike filter + margin tagging)
//! - [`strikethrough`]: Detection of crossed-out text
//! - [`margin`]: Side-column margin note classification
//! - [`sections`]: Section segmentation by clause numbering restarts

pub mod config;
pub mod error;
pub mod loader;
pub mod margin;
pub mod sections;
pub mod strikethrough;
pub mod types;

pub use config::{HeuristicConfig, MarginConfig, SectionConfig, StrikeConfig};
pub use error::{LayoutError, Result};
pub use loader::{load_elements, JsonLayoutSource, LayoutSource, LoadedDocument};
pub use sections::{discover_sections, Section};
pub use types::{
    BoundingBox, CharBox, Label, LayoutDocument, LayoutItem, PageGeometry, PositionedElement,
    Rect,
};
