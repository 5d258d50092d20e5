use serde::{Deserialize, Serialize};

/// Clause numbers enumerated for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionClauses {
    pub section_index: usize,
    pub title: String,
    /// Strictly increasing; empty when enumeration failed for the section.
    pub numbers: Vec<u32>,
}

/// Per-section clause numbers, in section order.
///
/// Keyed by section index rather than title so that two sections sharing a
/// title (e.g. two riders both called "ADDITIONAL CLAUSES") stay apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseIndex {
    entries: Vec<SectionClauses>,
}

impl ClauseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section_index: usize, title: impl Into<String>, numbers: Vec<u32>) {
        let title = title.into();
        match self
            .entries
            .iter_mut()
            .find(|e| e.section_index == section_index)
        {
            Some(entry) => {
                entry.title = title;
                entry.numbers = numbers;
            }
            None => self.entries.push(SectionClauses {
                section_index,
                title,
                numbers,
            }),
        }
    }

    /// Numbers for the first section with this title.
    pub fn get(&self, title: &str) -> Option<&[u32]> {
        self.entries
            .iter()
            .find(|e| e.title == title)
            .map(|e| e.numbers.as_slice())
    }

    /// Numbers for a section, empty when the section is unknown.
    pub fn numbers_for(&self, section_index: usize) -> &[u32] {
        self.entries
            .iter()
            .find(|e| e.section_index == section_index)
            .map(|e| e.numbers.as_slice())
            .unwrap_or(&[])
    }

    /// Whether any section has no clause numbers.
    pub fn has_empty(&self) -> bool {
        self.entries.iter().any(|e| e.numbers.is_empty())
    }

    pub fn empty_sections(&self) -> impl Iterator<Item = &SectionClauses> {
        self.entries.iter().filter(|e| e.numbers.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionClauses> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_clauses(&self) -> usize {
        self.entries.iter().map(|e| e.numbers.len()).sum()
    }
}

/// Editorial status the oracle assigns to an extracted clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClauseStatus {
    Agreed,
    Amended,
    Deleted,
    Other(String),
}

impl ClauseStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Agreed => "agreed",
            Self::Amended => "amended",
            Self::Deleted => "deleted",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ClauseStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "agreed" => Self::Agreed,
            "amended" => Self::Amended,
            "deleted" => Self::Deleted,
            _ => Self::Other(value),
        }
    }
}

impl From<ClauseStatus> for String {
    fn from(value: ClauseStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Structured clause record as returned by the oracle in extraction mode.
///
/// Built field by field in `oracle::parse`; only the body is essential.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedClause {
    pub number: Option<serde_json::Value>,
    pub title: String,
    pub text: String,
    pub sub_parts: Vec<String>,
    pub status: Option<ClauseStatus>,
    pub references: Vec<String>,
}

impl ExtractedClause {
    /// The clause number the oracle reported, accepting `12` and `"12"`.
    pub fn reported_number(&self) -> Option<u32> {
        match self.number.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().trim_end_matches('.').parse().ok(),
            _ => None,
        }
    }
}

/// A single extracted clause before final assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawClause {
    pub number: u32,
    pub title: String,
    pub text: String,
    pub section_index: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_parts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClauseStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Set when extraction failed and this is a placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawClause {
    /// Build from an oracle record. The requested `number` wins over the
    /// number the oracle reports.
    pub fn from_extracted(section_index: usize, number: u32, record: ExtractedClause) -> Self {
        Self {
            number,
            title: record.title.trim().to_string(),
            text: record.text,
            section_index,
            sub_parts: record.sub_parts,
            status: record.status,
            references: record.references,
            error: None,
        }
    }

    /// Placeholder for a clause whose extraction failed.
    pub fn stub(section_index: usize, number: u32, error: impl Into<String>) -> Self {
        Self {
            number,
            title: format!("Clause {number}"),
            text: String::new(),
            section_index,
            sub_parts: Vec::new(),
            status: None,
            references: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_stub(&self) -> bool {
        self.error.is_some()
    }
}

/// Final clause record, the externally visible artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    pub title: String,
    pub text: String,
}

/// Token usage tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}
