//! Margin note classification.
//!
//! Rider clauses and some printed forms carry short annotations in a side
//! column next to the main text ("Cancelling", "Lien", line numbers). They are
//! kept as elements but must not leak into section text. Per page, the main
//! column is the x-offset bin holding the most text; elements that sit
//! entirely left of it are margin notes.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::MarginConfig;
use crate::types::PositionedElement;

/// Find the positions of margin notes in `elements`.
///
/// A page is only classified when it has at least `min_page_elements`
/// positioned elements, and its candidates are only accepted when there are at
/// least `min_candidates` of them. A single stray element is indentation noise,
/// not a margin column.
#[must_use]
pub fn detect_margin_notes(elements: &[PositionedElement], config: &MarginConfig) -> BTreeSet<usize> {
    let mut by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, el) in elements.iter().enumerate() {
        if el.x0().is_some() {
            by_page.entry(el.page).or_default().push(i);
        }
    }

    let mut margin = BTreeSet::new();

    for (page, indices) in by_page {
        if indices.len() < config.min_page_elements {
            continue;
        }

        let Some(main_x) = main_column_x(elements, &indices, config.bucket_size) else {
            continue;
        };

        let candidates: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| is_left_of(&elements[i], main_x))
            .collect();

        if candidates.len() >= config.min_candidates {
            tracing::debug!(page, main_x, count = candidates.len(), "margin column detected");
            margin.extend(candidates);
        }
    }

    margin
}

/// Return a copy of `elements` with `is_margin_note` set on detected margin notes.
#[must_use]
pub fn tag_margin_notes(
    elements: Vec<PositionedElement>,
    config: &MarginConfig,
) -> (Vec<PositionedElement>, usize) {
    let margin = detect_margin_notes(&elements, config);
    let tagged = elements
        .into_iter()
        .enumerate()
        .map(|(i, el)| {
            let flagged = margin.contains(&i);
            el.with_margin_note(flagged)
        })
        .collect();
    (tagged, margin.len())
}

/// Left edge of the bin with the greatest total text length.
///
/// Ties go to the leftmost bin.
fn main_column_x(elements: &[PositionedElement], indices: &[usize], bucket_size: f64) -> Option<f64> {
    let mut bucket_text: BTreeMap<i64, usize> = BTreeMap::new();
    for &i in indices {
        let x0 = elements[i].x0()?;
        let bucket = (x0 / bucket_size).floor() as i64;
        *bucket_text.entry(bucket).or_default() += elements[i].text.chars().count();
    }

    let mut best: Option<(i64, usize)> = None;
    for (bucket, total) in bucket_text {
        if best.map_or(true, |(_, best_total)| total > best_total) {
            best = Some((bucket, total));
        }
    }

    best.map(|(bucket, _)| bucket as f64 * bucket_size)
}

fn is_left_of(el: &PositionedElement, main_x: f64) -> bool {
    match (el.x0(), el.bbox) {
        (Some(x0), Some(bbox)) => x0 < main_x && x0 + bbox.width() < main_x,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Label};

    fn body(text: &str, page: u32) -> PositionedElement {
        PositionedElement::new(Label::Text, text, page)
            .with_bbox(BoundingBox::new(120.0, 0.0, 540.0, 10.0))
    }

    fn note(text: &str, page: u32) -> PositionedElement {
        PositionedElement::new(Label::Text, text, page)
            .with_bbox(BoundingBox::new(30.0, 0.0, 90.0, 10.0))
    }

    fn long_text() -> String {
        "The vessel shall be delivered at the port of loading in every way fitted for the service."
            .to_string()
    }

    #[test]
    fn test_single_stray_element_not_flagged() {
        let elements = vec![
            body(&long_text(), 1),
            note("Lien", 1),
            body(&long_text(), 1),
            body(&long_text(), 1),
        ];
        let margin = detect_margin_notes(&elements, &MarginConfig::default());
        assert!(margin.is_empty());
    }

    #[test]
    fn test_two_candidates_flagged() {
        let elements = vec![
            body(&long_text(), 1),
            note("Lien", 1),
            body(&long_text(), 1),
            note("Cancelling", 1),
        ];
        let margin = detect_margin_notes(&elements, &MarginConfig::default());
        assert_eq!(margin.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_overlapping_element_is_not_margin() {
        // Starts left of the main column but its right edge reaches into it.
        let hanging = PositionedElement::new(Label::Text, "1. Delivery", 1)
            .with_bbox(BoundingBox::new(100.0, 0.0, 400.0, 10.0));
        let elements = vec![
            body(&long_text(), 1),
            hanging.clone(),
            hanging,
            body(&long_text(), 1),
        ];
        assert!(detect_margin_notes(&elements, &MarginConfig::default()).is_empty());
    }

    #[test]
    fn test_small_pages_skipped() {
        let elements = vec![body(&long_text(), 1), note("Lien", 1)];
        assert!(detect_margin_notes(&elements, &MarginConfig::default()).is_empty());
    }

    #[test]
    fn test_pages_classified_independently() {
        let elements = vec![
            body(&long_text(), 1),
            note("Lien", 1),
            note("Cancelling", 1),
            body(&long_text(), 2),
            note("Lien", 2),
            body(&long_text(), 2),
        ];
        let margin = detect_margin_notes(&elements, &MarginConfig::default());
        assert_eq!(margin.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_elements_without_geometry_ignored() {
        let elements = vec![
            body(&long_text(), 1),
            PositionedElement::new(Label::Text, "no bbox", 1),
            PositionedElement::new(Label::Text, "no bbox either", 1),
            body(&long_text(), 1),
        ];
        assert!(detect_margin_notes(&elements, &MarginConfig::default()).is_empty());
    }

    #[test]
    fn test_tag_margin_notes() {
        let elements = vec![
            body(&long_text(), 1),
            note("Lien", 1),
            note("Cancelling", 1),
        ];
        let (tagged, count) = tag_margin_notes(elements, &MarginConfig::default());
        assert_eq!(count, 2);
        assert!(!tagged[0].is_margin_note);
        assert!(tagged[1].is_margin_note);
        assert!(tagged[2].is_margin_note);
    }

    #[test]
    fn test_configurable_threshold() {
        let elements = vec![
            body(&long_text(), 1),
            note("Lien", 1),
            body(&long_text(), 1),
        ];
        let config = MarginConfig::default().with_min_candidates(1);
        assert_eq!(detect_margin_notes(&elements, &config).len(), 1);
    }
}
