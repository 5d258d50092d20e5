//! Detection of struck-through text.
//!
//! Printed charter party forms are amended by crossing out the pre-printed
//! wording. Those strokes survive in the PDF as thin, wide vector rectangles
//! drawn across the characters. Text covered by them is contractually void
//! and is removed before any other stage sees it.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::StrikeConfig;
use crate::types::{CharBox, PageGeometry, PositionedElement, Rect};

/// Struck character runs, grouped by page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StruckFragments {
    by_page: BTreeMap<u32, BTreeSet<String>>,
}

impl StruckFragments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: u32, fragment: impl Into<String>) {
        self.by_page.entry(page).or_default().insert(fragment.into());
    }

    /// Fragments recorded for a page.
    pub fn fragments(&self, page: u32) -> impl Iterator<Item = &str> {
        self.by_page
            .get(&page)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_page.is_empty()
    }

    /// Total number of distinct fragments over all pages.
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.by_page.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.by_page.len()
    }
}

/// Whether a rectangle has the shape of a strike line.
#[must_use]
pub fn is_strike_rect(rect: &Rect, config: &StrikeConfig) -> bool {
    rect.height() < config.max_rect_height && rect.width() > config.min_rect_width
}

/// Whether a strike line at `rect` crosses the middle band of `ch`.
fn crosses_char(rect: &Rect, ch: &CharBox, config: &StrikeConfig) -> bool {
    let height = ch.height();
    let band_top = ch.top + height * config.band_low;
    let band_bottom = ch.top + height * config.band_high;

    (band_top..=band_bottom).contains(&rect.top)
        && ch.x0 >= rect.x0 - config.x_tolerance
        && ch.x1 <= rect.x1 + config.x_tolerance
}

/// Collect the character runs covered by strike lines on every page.
///
/// Pages without strike rectangles contribute nothing.
#[must_use]
pub fn detect_struck_fragments(pages: &[PageGeometry], config: &StrikeConfig) -> StruckFragments {
    let mut struck = StruckFragments::new();

    for page in pages {
        let strike_rects: Vec<&Rect> = page
            .rects
            .iter()
            .filter(|r| is_strike_rect(r, config))
            .collect();
        if strike_rects.is_empty() {
            continue;
        }

        for rect in strike_rects {
            let run: String = page
                .chars
                .iter()
                .filter(|ch| crosses_char(rect, ch, config))
                .map(|ch| ch.text.as_str())
                .collect();

            let run = run.trim();
            if !run.is_empty() {
                struck.insert(page.page, run);
            }
        }
    }

    struck
}

/// Collapse whitespace runs and lowercase.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether more than `overlap_ratio` of `text` is covered by struck fragments
/// of the same page.
#[must_use]
pub fn is_struck(text: &str, page: u32, fragments: &StruckFragments, config: &StrikeConfig) -> bool {
    let mut page_fragments = fragments.fragments(page).peekable();
    if page_fragments.peek().is_none() {
        return false;
    }

    let normalized = normalize(text);
    let matched: usize = page_fragments
        .map(normalize)
        .filter(|frag| frag.chars().count() >= config.min_fragment_len)
        .filter(|frag| normalized.contains(frag.as_str()))
        .map(|frag| frag.chars().count())
        .sum();

    matched as f64 > normalized.chars().count() as f64 * config.overlap_ratio
}

/// Drop struck elements. Returns the retained elements and how many were dropped.
#[must_use]
pub fn filter_struck(
    elements: Vec<PositionedElement>,
    fragments: &StruckFragments,
    config: &StrikeConfig,
) -> (Vec<PositionedElement>, usize) {
    if fragments.is_empty() {
        return (elements, 0);
    }

    let before = elements.len();
    let retained: Vec<PositionedElement> = elements
        .into_iter()
        .filter(|el| {
            let struck = is_struck(&el.text, el.page, fragments, config);
            if struck {
                tracing::debug!(page = el.page, text = %el.text, "dropping struck element");
            }
            !struck
        })
        .collect();
    let dropped = before - retained.len();

    (retained, dropped)
}
