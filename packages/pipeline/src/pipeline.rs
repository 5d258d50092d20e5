use std::path::Path;
use std::sync::Arc;

use charter_layout::{discover_sections, load_elements, LayoutDocument, LayoutSource, Section};
use tracing::info;

use crate::assembler::assemble;
use crate::config::{OracleConfig, PipelineConfig};
use crate::enumerator::ClauseEnumerator;
use crate::error::{PipelineError, Result};
use crate::extractor::ClauseExtractor;
use crate::models::{Clause, ClauseIndex, TokenUsage};
use crate::oracle::LlmClient;

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub clauses: Vec<Clause>,
    pub sections: Vec<Section>,
    /// Clause numbers from the last enumeration attempt.
    pub clause_index: ClauseIndex,
    pub enumeration_attempts: u32,
    pub failed_extractions: usize,
    pub struck_element_count: usize,
    pub margin_note_count: usize,
    /// Recovered errors, in the order they happened.
    pub errors: Vec<String>,
    pub token_usage: TokenUsage,
}

/// Runs the five stages over one document.
///
/// Each stage takes its predecessor's output by reference and returns a new
/// value; nothing is shared between stages.
pub struct ClausePipeline<C: LlmClient + 'static> {
    client: Arc<C>,
    oracle: OracleConfig,
    config: PipelineConfig,
}

impl<C: LlmClient + 'static> ClausePipeline<C> {
    pub fn new(client: C, oracle: OracleConfig, config: PipelineConfig) -> Self {
        Self::with_shared_client(Arc::new(client), oracle, config)
    }

    pub fn with_shared_client(client: Arc<C>, oracle: OracleConfig, config: PipelineConfig) -> Self {
        Self {
            client,
            oracle,
            config,
        }
    }

    /// Load a layout document from `path` and run the pipeline over it.
    ///
    /// Fails only when the document cannot be read; oracle problems degrade
    /// the output instead.
    pub async fn run(&self, path: &Path, source: &impl LayoutSource) -> Result<PipelineOutput> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }

        info!(path = %path.display(), "loading layout document");
        let document = source.load(path)?;
        Ok(self.run_document(&document).await)
    }

    /// Run the pipeline over an already loaded layout document.
    pub async fn run_document(&self, document: &LayoutDocument) -> PipelineOutput {
        let heuristics = &self.config.heuristics;

        let loaded = load_elements(document, heuristics);
        let sections = discover_sections(&loaded.elements, &heuristics.sections);
        info!(sections = sections.len(), "sections discovered");

        let enumerator = ClauseEnumerator::new(self.client.as_ref(), &self.oracle);
        let enumeration = enumerator
            .enumerate_with_retry(&sections, self.config.max_enumeration_attempts)
            .await;

        let extractor = ClauseExtractor::new(Arc::clone(&self.client), &self.oracle)
            .with_max_concurrent(self.config.max_concurrent_extractions);
        let extraction = extractor.extract_all(&sections, &enumeration.index).await;

        let clauses = assemble(&extraction.raw_clauses);

        let mut token_usage = enumeration.token_usage;
        token_usage.add(&extraction.token_usage);

        let mut errors = enumeration.errors;
        errors.extend(extraction.errors);

        info!(
            clauses = clauses.len(),
            sections = sections.len(),
            enumeration_attempts = enumeration.attempts,
            failed_extractions = extraction.failed_count,
            input_tokens = token_usage.input_tokens,
            output_tokens = token_usage.output_tokens,
            "pipeline complete"
        );

        PipelineOutput {
            clauses,
            sections,
            clause_index: enumeration.index,
            enumeration_attempts: enumeration.attempts,
            failed_extractions: extraction.failed_count,
            struck_element_count: loaded.struck_element_count,
            margin_note_count: loaded.margin_note_count,
            errors,
            token_usage,
        }
    }
}
