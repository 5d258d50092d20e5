//! Section segmentation by clause numbering restarts.
//!
//! Charter parties consist of the printed main clauses followed by one or more
//! riders or addenda, each numbering its clauses from 1 again. A restart
//! (e.g. 43 followed by 1) preceded by an un-numbered title header marks the
//! start of a new section. Both signals are required, so that a renumbered
//! sub-list inside a clause does not split the document.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::SectionConfig;
use crate::types::{Label, PositionedElement};

/// Leading clause number: digits followed by a period.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LEADING_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*\.").expect("valid regex"));

/// A contiguous run of elements forming one logical part of the contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    /// 0-based position in document order.
    pub index: usize,
    pub elements: Vec<PositionedElement>,
    /// Paragraph-joined text of the non-margin textual elements.
    pub text: String,
    /// First page covered by the section, 0 when unknown.
    pub page_start: u32,
    /// Last page covered by the section, 0 when unknown.
    pub page_end: u32,
}

impl Section {
    /// Build a section, deriving its text and page range from `elements`.
    #[must_use]
    pub fn new(title: impl Into<String>, index: usize, elements: Vec<PositionedElement>) -> Self {
        let text = elements_to_text(&elements);
        let pages = || elements.iter().map(|el| el.page).filter(|&p| p > 0);
        let page_start = pages().min().unwrap_or(0);
        let page_end = pages().max().unwrap_or(0);

        Self {
            title: title.into(),
            index,
            text,
            page_start,
            page_end,
            elements,
        }
    }
}

/// Extract the leading clause number of a header ("12. Lien" → 12).
#[must_use]
pub fn leading_number(text: &str) -> Option<u32> {
    LEADING_NUMBER_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether a header starts with a clause number, however large.
#[must_use]
pub fn has_leading_number(text: &str) -> bool {
    LEADING_NUMBER_PATTERN.is_match(text)
}

/// Join element texts with blank lines, skipping margin notes and non-textual labels.
#[must_use]
pub fn elements_to_text(elements: &[PositionedElement]) -> String {
    elements
        .iter()
        .filter(|el| !el.is_margin_note && el.label.is_textual())
        .map(|el| el.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A numbered header: element position and its clause number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberingPoint {
    position: usize,
    number: u32,
}

/// An accepted section start: title text and the title header's position.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Boundary {
    title: String,
    position: usize,
}

fn numbering_points(elements: &[PositionedElement]) -> Vec<NumberingPoint> {
    elements
        .iter()
        .enumerate()
        .filter(|(_, el)| el.label == Label::SectionHeader && !el.is_margin_note)
        .filter_map(|(position, el)| {
            leading_number(&el.text).map(|number| NumberingPoint { position, number })
        })
        .collect()
}

/// Look backwards from `before` for an un-numbered title header.
///
/// Examines at most `title_lookback` elements and never reaches `floor` (the
/// previous numbering point).
fn find_title_header(
    elements: &[PositionedElement],
    before: usize,
    floor: usize,
    config: &SectionConfig,
) -> Option<Boundary> {
    let lower = before.saturating_sub(config.title_lookback).max(floor);

    ((lower + 1)..=before).rev().find_map(|i| {
        let el = &elements[i];
        let is_title = !el.is_margin_note
            && el.label == Label::SectionHeader
            && !has_leading_number(&el.text)
            && el.text.chars().count() > config.min_title_len;

        is_title.then(|| Boundary {
            title: el.text.trim().to_string(),
            position: i,
        })
    })
}

fn detect_boundaries(elements: &[PositionedElement], config: &SectionConfig) -> Vec<Boundary> {
    let points = numbering_points(elements);
    tracing::info!(count = points.len(), "found numbered section headers");

    let mut boundaries = Vec::new();

    for pair in points.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);

        let is_restart = curr.number <= config.max_restart_number && prev.number >= curr.number;
        if !is_restart {
            continue;
        }

        match find_title_header(elements, curr.position - 1, prev.position, config) {
            Some(boundary) => {
                tracing::info!(
                    title = %boundary.title,
                    position = boundary.position,
                    from = prev.number,
                    to = curr.number,
                    "section boundary"
                );
                boundaries.push(boundary);
            }
            None => {
                tracing::debug!(
                    position = curr.position,
                    from = prev.number,
                    to = curr.number,
                    "numbering restart without title header, ignoring"
                );
            }
        }
    }

    boundaries
}

/// Split elements into sections based on clause numbering restarts.
///
/// Elements before the first boundary form the lead section (titled
/// `default_title`), emitted only when non-empty. Section indices are
/// contiguous from 0.
#[must_use]
pub fn discover_sections(elements: &[PositionedElement], config: &SectionConfig) -> Vec<Section> {
    if elements.is_empty() {
        return Vec::new();
    }

    let boundaries = detect_boundaries(elements, config);
    let mut sections = Vec::new();

    let lead_end = boundaries.first().map_or(elements.len(), |b| b.position);
    if lead_end > 0 {
        sections.push(Section::new(
            config.default_title.clone(),
            sections.len(),
            elements[..lead_end].to_vec(),
        ));
    }

    for (k, boundary) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(k + 1)
            .map_or(elements.len(), |next| next.position);
        sections.push(Section::new(
            boundary.title.clone(),
            sections.len(),
            elements[boundary.position..end].to_vec(),
        ));
    }

    for section in &sections {
        tracing::info!(
            index = section.index,
            title = %section.title,
            chars = section.text.len(),
            pages = %format!("{}-{}", section.page_start, section.page_end),
            "section"
        );
    }
    tracing::info!(count = sections.len(), "discovered sections");

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(text: &str) -> PositionedElement {
        PositionedElement::new(Label::SectionHeader, text, 1)
    }

    fn text(text: &str) -> PositionedElement {
        PositionedElement::new(Label::Text, text, 1)
    }

    fn numbered_run(elements: &mut Vec<PositionedElement>, range: std::ops::RangeInclusive<u32>) {
        for n in range {
            elements.push(header(&format!("{n}. Clause heading {n}")));
            elements.push(text(&format!("Body of clause {n}.")));
        }
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("1. Delivery"), Some(1));
        assert_eq!(leading_number("  43 . Arbitration"), Some(43));
        assert_eq!(leading_number("12 Lien"), None);
        assert_eq!(leading_number("Clause 3."), None);
        assert_eq!(leading_number("(a) Sub-clause"), None);
        assert_eq!(leading_number("99999999999. Overflowing"), None);
    }

    #[test]
    fn test_has_leading_number() {
        assert!(has_leading_number("99999999999. Overflowing"));
        assert!(has_leading_number(" 7 . Ice"));
        assert!(!has_leading_number("ADDITIONAL CLAUSES"));
    }

    #[test]
    fn test_overflowing_number_is_not_a_title() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=5);
        elements.push(header("99999999999. Overflowing heading"));
        elements.push(text("Body of an oversized clause number."));
        numbered_run(&mut elements, 1..=2);

        let sections = discover_sections(&elements, &SectionConfig::default());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].elements.len(), elements.len());
    }

    #[test]
    fn test_rider_restart_yields_two_sections() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=43);
        let rider_pos = elements.len();
        elements.push(header("ADDITIONAL CLAUSES"));
        numbered_run(&mut elements, 1..=3);

        let sections = discover_sections(&elements, &SectionConfig::default());

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Main Clauses");
        assert_eq!(sections[0].index, 0);
        assert_eq!(sections[0].elements.len(), rider_pos);
        assert_eq!(sections[1].title, "ADDITIONAL CLAUSES");
        assert_eq!(sections[1].index, 1);
        assert_eq!(sections[1].elements[0].text, "ADDITIONAL CLAUSES");
        assert_eq!(sections[1].elements.len(), elements.len() - rider_pos);
    }

    #[test]
    fn test_custom_default_title() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=3);

        let config = SectionConfig::default().with_default_title("Part II Clauses");
        let sections = discover_sections(&elements, &config);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Part II Clauses");
    }

    #[test]
    fn test_restart_without_title_is_ignored() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=5);
        numbered_run(&mut elements, 1..=2);

        let sections = discover_sections(&elements, &SectionConfig::default());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].elements.len(), elements.len());
    }

    #[test]
    fn test_restart_to_three_is_not_a_restart() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=5);
        elements.push(header("ADDITIONAL CLAUSES"));
        numbered_run(&mut elements, 3..=4);

        let sections = discover_sections(&elements, &SectionConfig::default());
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_short_title_rejected() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=5);
        elements.push(header("RIDER"));
        numbered_run(&mut elements, 1..=2);

        let sections = discover_sections(&elements, &SectionConfig::default());
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_margin_title_rejected() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=5);
        elements.push(header("ADDITIONAL CLAUSES").with_margin_note(true));
        numbered_run(&mut elements, 1..=2);

        let sections = discover_sections(&elements, &SectionConfig::default());
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_title_beyond_lookback_not_found() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=5);
        elements.push(header("ADDITIONAL CLAUSES"));
        for i in 0..10 {
            elements.push(text(&format!("Preamble paragraph {i}")));
        }
        numbered_run(&mut elements, 1..=2);

        let sections = discover_sections(&elements, &SectionConfig::default());
        assert_eq!(sections.len(), 1);

        let wider = SectionConfig::default().with_title_lookback(11);
        assert_eq!(discover_sections(&elements, &wider).len(), 2);
    }

    #[test]
    fn test_multiple_riders() {
        let mut elements = Vec::new();
        numbered_run(&mut elements, 1..=20);
        elements.push(header("RIDER CLAUSES TO M/V OCEAN STAR"));
        numbered_run(&mut elements, 1..=10);
        elements.push(header("ADDENDUM No. 1"));
        numbered_run(&mut elements, 1..=2);

        let sections = discover_sections(&elements, &SectionConfig::default());
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Main Clauses", "RIDER CLAUSES TO M/V OCEAN STAR", "ADDENDUM No. 1"]
        );
        let indices: Vec<_> = sections.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        // Sections partition the element stream.
        let total: usize = sections.iter().map(|s| s.elements.len()).sum();
        assert_eq!(total, elements.len());
    }

    #[test]
    fn test_lead_section_holds_elements_before_title() {
        let mut elements = vec![header("1. Preliminary")];
        elements.push(header("SCHEDULE OF RIDER CLAUSES"));
        numbered_run(&mut elements, 1..=2);

        let sections = discover_sections(&elements, &SectionConfig::default());
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Main Clauses");
        assert_eq!(sections[0].text, "1. Preliminary");
        assert_eq!(sections[1].index, 1);
        assert_eq!(sections[1].elements.len(), 5);
    }

    #[test]
    fn test_no_elements() {
        assert!(discover_sections(&[], &SectionConfig::default()).is_empty());
    }

    #[test]
    fn test_section_text_skips_margin_and_tables() {
        let elements = vec![
            header("1. Delivery"),
            text("The vessel shall be delivered.").with_margin_note(false),
            text("Delivery").with_margin_note(true),
            PositionedElement::new(Label::Table, "| a | b |", 1),
            PositionedElement::new(Label::ListItem, "(a) at the port", 1),
            text("   "),
        ];
        let section = Section::new("Main Clauses", 0, elements);
        assert_eq!(
            section.text,
            "1. Delivery\n\nThe vessel shall be delivered.\n\n(a) at the port"
        );
    }

    #[test]
    fn test_section_page_range() {
        let elements = vec![
            PositionedElement::new(Label::Text, "a", 2),
            PositionedElement::new(Label::Text, "b", 0),
            PositionedElement::new(Label::Text, "c", 4),
        ];
        let section = Section::new("Main Clauses", 0, elements);
        assert_eq!((section.page_start, section.page_end), (2, 4));
    }
}
