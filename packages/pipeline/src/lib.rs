//! Charter party clause extraction pipeline.
//!
//! Builds on `charter-layout` (strikethrough filter, margin classifier,
//! section segmenter) and adds the oracle-facing stages: clause enumeration
//! with a bounded whole-stage retry, concurrent per-clause extraction and
//! deterministic assembly into the final clause list.
//!
//! # Example
//!
//! ```
//! use charter_pipeline::assembler::assemble;
//! use charter_pipeline::models::RawClause;
//!
//! // Failure stubs never reach the output
//! let clauses = assemble(&[RawClause::stub(0, 1, "timeout")]);
//! assert!(clauses.is_empty());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Oracle and pipeline configuration
//! - [`error`]: Error types and Result alias
//! - [`models`]: Clause index, raw and final clause records
//! - [`oracle`]: LLM client, prompts and response parsing
//! - [`enumerator`]: Clause enumeration with bounded retry
//! - [`extractor`]: Concurrent clause extraction
//! - [`assembler`]: Ordering and filtering of extracted clauses
//! - [`pipeline`]: Stage orchestration
//! - [`output`]: Clause file and run report
//! - [`cli`]: Command-line interface

pub mod assembler;
pub mod cli;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod extractor;
pub mod models;
pub mod oracle;
pub mod output;
pub mod pipeline;

pub use assembler::assemble;
pub use config::{OracleConfig, PipelineConfig};
pub use enumerator::{ClauseEnumerator, EnumerationAttempt, EnumerationOutcome};
pub use error::{PipelineError, Result};
pub use extractor::{ClauseExtractor, ExtractionOutcome, SectionExtraction};
pub use models::{Clause, ClauseIndex, ClauseStatus, RawClause, TokenUsage};
pub use output::{write_clauses, write_outputs, write_report, RunReport};
pub use pipeline::{ClausePipeline, PipelineOutput};
