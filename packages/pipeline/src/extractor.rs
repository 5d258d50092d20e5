use std::sync::Arc;

use charter_layout::Section;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::OracleConfig;
use crate::error::{PipelineError, Result};
use crate::models::{ClauseIndex, ExtractedClause, RawClause, TokenUsage};
use crate::oracle::{self, LlmClient, LlmRequest, Message};

/// Clauses extracted from one section, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct SectionExtraction {
    pub raw_clauses: Vec<RawClause>,
    pub failed_count: usize,
    pub errors: Vec<String>,
    pub token_usage: TokenUsage,
}

/// Result of the extraction stage over all sections.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub raw_clauses: Vec<RawClause>,
    pub failed_count: usize,
    pub errors: Vec<String>,
    pub token_usage: TokenUsage,
}

/// Extracts clause records with one oracle call per clause number.
///
/// Sections run one after another; the calls within a section run
/// concurrently, optionally capped by `max_concurrent`.
pub struct ClauseExtractor<C: LlmClient + 'static> {
    client: Arc<C>,
    model: String,
    max_tokens: u32,
    temperature: f64,
    limiter: Option<Arc<Semaphore>>,
}

impl<C: LlmClient + 'static> ClauseExtractor<C> {
    pub fn new(client: Arc<C>, config: &OracleConfig) -> Self {
        Self {
            client,
            model: config.extraction_model.clone(),
            max_tokens: config.extraction_max_tokens,
            temperature: config.temperature,
            limiter: None,
        }
    }

    /// Cap the number of in-flight oracle calls.
    pub fn with_max_concurrent(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
        self
    }

    /// Extract every enumerated clause, section by section in index order.
    /// Sections without clause numbers are skipped.
    pub async fn extract_all(&self, sections: &[Section], index: &ClauseIndex) -> ExtractionOutcome {
        let mut ordered: Vec<&Section> = sections.iter().collect();
        ordered.sort_by_key(|s| s.index);

        let mut outcome = ExtractionOutcome::default();

        for section in ordered {
            let numbers = index.numbers_for(section.index);
            if numbers.is_empty() {
                warn!(section = %section.title, index = section.index, "no clause numbers, skipping section");
                continue;
            }

            let extraction = self.extract_section(section, numbers).await;
            outcome.raw_clauses.extend(extraction.raw_clauses);
            outcome.failed_count += extraction.failed_count;
            outcome.errors.extend(extraction.errors);
            outcome.token_usage.add(&extraction.token_usage);
        }

        info!(
            clauses = outcome.raw_clauses.len(),
            failed = outcome.failed_count,
            "extraction complete"
        );

        outcome
    }

    /// Extract the given clause numbers of one section concurrently and wait
    /// for all of them. A failed call yields a stub for that number only.
    pub async fn extract_section(&self, section: &Section, numbers: &[u32]) -> SectionExtraction {
        info!(section = %section.title, count = numbers.len(), "extracting clauses");

        let system = oracle::build_extraction_system_prompt().to_string();
        let mut tasks = JoinSet::new();

        for (slot, &number) in numbers.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let limiter = self.limiter.clone();
            let request = LlmRequest {
                system: system.clone(),
                messages: vec![Message::user(oracle::build_extraction_prompt(section, number))],
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                model: Some(self.model.clone()),
            };

            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                let (record, usage) = request_clause(client.as_ref(), &request).await;
                (slot, record, usage)
            });
        }

        let mut slots: Vec<Option<RawClause>> = vec![None; numbers.len()];
        let mut extraction = SectionExtraction::default();
        let mut task_failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (slot, record, usage) = match joined {
                Ok(done) => done,
                Err(e) => {
                    task_failures.push(PipelineError::from(e).to_string());
                    continue;
                }
            };
            extraction.token_usage.add(&usage);
            let number = numbers[slot];

            slots[slot] = Some(match record {
                Ok(record) => {
                    if let Some(reported) = record.reported_number() {
                        if reported != number {
                            warn!(
                                section = %section.title,
                                requested = number,
                                reported,
                                "oracle reported a different clause number"
                            );
                        }
                    }
                    debug!(section = %section.title, number, "clause extracted");
                    RawClause::from_extracted(section.index, number, record)
                }
                Err(e) => {
                    error!(section = %section.title, number, error = %e, "clause extraction failed");
                    RawClause::stub(section.index, number, e.to_string())
                }
            });
        }

        // A slot is only left empty when its task panicked or was cancelled.
        let task_failure = task_failures.join("; ");
        for (slot, raw) in slots.into_iter().enumerate() {
            let raw = raw.unwrap_or_else(|| {
                let number = numbers[slot];
                error!(section = %section.title, number, error = %task_failure, "extraction task failed");
                RawClause::stub(section.index, number, task_failure.clone())
            });
            if let Some(e) = &raw.error {
                extraction.failed_count += 1;
                extraction.errors.push(format!(
                    "extraction failed for clause {} of section {} ({:?}): {e}",
                    raw.number, section.index, section.title
                ));
            }
            extraction.raw_clauses.push(raw);
        }

        extraction
    }
}

async fn request_clause<C: LlmClient>(
    client: &C,
    request: &LlmRequest,
) -> (Result<ExtractedClause>, TokenUsage) {
    match client.complete(request).await {
        Ok(response) => (
            oracle::parse_clause_record(&response.content),
            response.usage(),
        ),
        Err(e) => (Err(e), TokenUsage::default()),
    }
}
