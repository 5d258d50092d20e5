use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Clause, TokenUsage};
use crate::pipeline::PipelineOutput;

/// Default location of the clause file.
pub const DEFAULT_OUTPUT_PATH: &str = "output/clauses.json";

/// Per-section summary in the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub index: usize,
    pub title: String,
    pub page_start: u32,
    pub page_end: u32,
    pub clause_numbers: Vec<u32>,
}

/// Summary of one pipeline run, written next to the clauses on request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub clause_count: usize,
    pub section_count: usize,
    pub enumeration_attempts: u32,
    pub failed_extractions: usize,
    pub struck_element_count: usize,
    pub margin_note_count: usize,
    pub errors: Vec<String>,
    pub token_usage: TokenUsage,
    pub sections: Vec<SectionReport>,
}

impl RunReport {
    pub fn new(input: &Path, output: &PipelineOutput, elapsed_secs: f64) -> Self {
        let sections = output
            .sections
            .iter()
            .map(|section| SectionReport {
                index: section.index,
                title: section.title.clone(),
                page_start: section.page_start,
                page_end: section.page_end,
                clause_numbers: output.clause_index.numbers_for(section.index).to_vec(),
            })
            .collect();

        Self {
            input: input.to_path_buf(),
            generated_at: Utc::now(),
            elapsed_secs,
            clause_count: output.clauses.len(),
            section_count: output.sections.len(),
            enumeration_attempts: output.enumeration_attempts,
            failed_extractions: output.failed_extractions,
            struck_element_count: output.struck_element_count,
            margin_note_count: output.margin_note_count,
            errors: output.errors.clone(),
            token_usage: output.token_usage,
            sections,
        }
    }
}

/// Write the clause list as pretty-printed JSON.
pub fn write_clauses(path: &Path, clauses: &[Clause]) -> Result<()> {
    StagedFile::stage(path, clauses)?.commit()
}

/// Write the run report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    StagedFile::stage(path, report)?.commit()
}

/// Write the clause file and, optionally, the run report.
///
/// Both files are staged before either is renamed into place, and the clause
/// file lands last. On error neither file is left behind.
pub fn write_outputs(
    clauses_path: &Path,
    clauses: &[Clause],
    report: Option<(&Path, &RunReport)>,
) -> Result<()> {
    let staged_clauses = StagedFile::stage(clauses_path, clauses)?;
    let staged_report = report
        .map(|(path, report)| StagedFile::stage(path, report))
        .transpose()?;

    let committed_report = match staged_report {
        Some(staged) => Some(staged.commit_path()?),
        None => None,
    };

    if let Err(e) = staged_clauses.commit() {
        if let Some(report_path) = committed_report {
            let _ = fs::remove_file(report_path);
        }
        return Err(e);
    }
    Ok(())
}

/// JSON serialized to a temporary sibling file, renamed over the target on
/// commit. Dropping an uncommitted file removes the temporary.
struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn stage<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.json".to_string());
        let staged = Self {
            temp: path.with_file_name(format!(".{file_name}.tmp")),
            target: path.to_path_buf(),
            committed: false,
        };

        {
            let mut file = File::create(&staged.temp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        Ok(staged)
    }

    fn commit(self) -> Result<()> {
        self.commit_path().map(|_| ())
    }

    fn commit_path(mut self) -> Result<PathBuf> {
        // On Windows, rename fails if the destination already exists
        #[cfg(target_os = "windows")]
        if self.target.exists() {
            fs::remove_file(&self.target)?;
        }

        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}
