//! Heuristic parameters for the layout stages.
//!
//! The defaults are tuned on printed charter party forms (GENCON, NYPE,
//! ASBATANKVOY and their riders). Documents from other sources may need
//! different values, so every threshold can be overridden from the
//! environment or through the `with_*` builders.

/// Strike rectangles are thinner than this (points).
pub const DEFAULT_MAX_RECT_HEIGHT: f64 = 3.0;

/// Strike rectangles are wider than this (points); shorter marks are decoration.
pub const DEFAULT_MIN_RECT_WIDTH: f64 = 50.0;

/// Horizontal slack when matching characters against a strike rectangle (points).
pub const DEFAULT_X_TOLERANCE: f64 = 2.0;

/// Struck fragments shorter than this (normalized chars) are ignored as noise.
pub const DEFAULT_MIN_FRAGMENT_LEN: usize = 5;

/// An element is struck when matched fragments cover more than this share of it.
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.5;

/// Width of the x-offset bins used to find the main text column (points).
pub const DEFAULT_BUCKET_SIZE: f64 = 10.0;

/// Pages with fewer positioned elements are not classified.
pub const DEFAULT_MIN_PAGE_ELEMENTS: usize = 3;

/// Fewer candidates than this on a page are treated as layout noise.
pub const DEFAULT_MIN_MARGIN_CANDIDATES: usize = 2;

/// Numbering restarts must drop to this number or lower.
pub const DEFAULT_MAX_RESTART_NUMBER: u32 = 2;

/// How many elements to look back for a section title.
pub const DEFAULT_TITLE_LOOKBACK: usize = 10;

/// Section titles must be longer than this (chars).
pub const DEFAULT_MIN_TITLE_LEN: usize = 5;

/// Title of the lead section when no title header precedes it.
pub const DEFAULT_SECTION_TITLE: &str = "Main Clauses";

/// Strikethrough filter parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeConfig {
    pub max_rect_height: f64,
    pub min_rect_width: f64,
    pub x_tolerance: f64,
    /// Lower edge of the vertical band a strike line must cross (share of char height).
    pub band_low: f64,
    /// Upper edge of that band.
    pub band_high: f64,
    pub min_fragment_len: usize,
    pub overlap_ratio: f64,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            max_rect_height: DEFAULT_MAX_RECT_HEIGHT,
            min_rect_width: DEFAULT_MIN_RECT_WIDTH,
            x_tolerance: DEFAULT_X_TOLERANCE,
            band_low: 0.2,
            band_high: 0.8,
            min_fragment_len: DEFAULT_MIN_FRAGMENT_LEN,
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
        }
    }
}

impl StrikeConfig {
    #[must_use]
    pub fn with_overlap_ratio(mut self, ratio: f64) -> Self {
        self.overlap_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_min_fragment_len(mut self, len: usize) -> Self {
        self.min_fragment_len = len;
        self
    }
}

/// Margin classifier parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginConfig {
    pub bucket_size: f64,
    pub min_page_elements: usize,
    pub min_candidates: usize,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            min_page_elements: DEFAULT_MIN_PAGE_ELEMENTS,
            min_candidates: DEFAULT_MIN_MARGIN_CANDIDATES,
        }
    }
}

impl MarginConfig {
    #[must_use]
    pub fn with_min_candidates(mut self, min_candidates: usize) -> Self {
        self.min_candidates = min_candidates;
        self
    }

    #[must_use]
    pub fn with_bucket_size(mut self, bucket_size: f64) -> Self {
        self.bucket_size = bucket_size;
        self
    }
}

/// Section segmenter parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionConfig {
    pub max_restart_number: u32,
    pub title_lookback: usize,
    pub min_title_len: usize,
    pub default_title: String,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            max_restart_number: DEFAULT_MAX_RESTART_NUMBER,
            title_lookback: DEFAULT_TITLE_LOOKBACK,
            min_title_len: DEFAULT_MIN_TITLE_LEN,
            default_title: DEFAULT_SECTION_TITLE.to_string(),
        }
    }
}

impl SectionConfig {
    #[must_use]
    pub fn with_title_lookback(mut self, lookback: usize) -> Self {
        self.title_lookback = lookback;
        self
    }

    #[must_use]
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }
}

/// All layout heuristics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicConfig {
    pub strike: StrikeConfig,
    pub margin: MarginConfig,
    pub sections: SectionConfig,
}

impl HeuristicConfig {
    /// Defaults, overridden by any parsable `CHARTER_*` environment variable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("CHARTER_STRIKE_OVERLAP_RATIO") {
            config.strike.overlap_ratio = v;
        }
        if let Some(v) = env_parse("CHARTER_STRIKE_MIN_FRAGMENT_LEN") {
            config.strike.min_fragment_len = v;
        }
        if let Some(v) = env_parse("CHARTER_MARGIN_MIN_CANDIDATES") {
            config.margin.min_candidates = v;
        }
        if let Some(v) = env_parse("CHARTER_MARGIN_BUCKET_SIZE") {
            config.margin.bucket_size = v;
        }
        if let Some(v) = env_parse("CHARTER_SECTION_TITLE_LOOKBACK") {
            config.sections.title_lookback = v;
        }

        config
    }

    #[must_use]
    pub fn with_strike(mut self, strike: StrikeConfig) -> Self {
        self.strike = strike;
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: MarginConfig) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn with_sections(mut self, sections: SectionConfig) -> Self {
        self.sections = sections;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
