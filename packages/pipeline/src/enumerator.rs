use charter_layout::Section;
use tracing::{debug, error, info, warn};

use crate::config::OracleConfig;
use crate::error::{PipelineError, Result};
use crate::models::{ClauseIndex, TokenUsage};
use crate::oracle::{self, LlmClient, LlmRequest, Message};

/// Result of a single pass over all sections.
#[derive(Debug, Clone, Default)]
pub struct EnumerationAttempt {
    pub index: ClauseIndex,
    pub errors: Vec<String>,
    pub token_usage: TokenUsage,
}

/// Result of the enumeration stage after retries.
#[derive(Debug, Clone, Default)]
pub struct EnumerationOutcome {
    /// Index produced by the last attempt. Earlier attempts are discarded.
    pub index: ClauseIndex,
    pub attempts: u32,
    /// Errors from every attempt, prefixed with the attempt number.
    pub errors: Vec<String>,
    pub token_usage: TokenUsage,
}

impl EnumerationOutcome {
    /// Whether every section ended up with at least one clause number.
    pub fn is_complete(&self) -> bool {
        !self.index.has_empty()
    }
}

/// Asks the oracle which top-level clause numbers each section contains.
pub struct ClauseEnumerator<'a, C: LlmClient> {
    client: &'a C,
    config: &'a OracleConfig,
}

impl<'a, C: LlmClient> ClauseEnumerator<'a, C> {
    pub fn new(client: &'a C, config: &'a OracleConfig) -> Self {
        Self { client, config }
    }

    /// Enumerate one section. Oracle failures and invalid answers are errors.
    pub async fn enumerate_section(&self, section: &Section) -> Result<Vec<u32>> {
        let mut usage = TokenUsage::default();
        self.request_numbers(section, &mut usage).await
    }

    /// One pass over all sections, in order.
    ///
    /// Never fails: a section whose enumeration fails gets an empty list and
    /// the error is recorded.
    pub async fn enumerate_all(&self, sections: &[Section]) -> EnumerationAttempt {
        let mut attempt = EnumerationAttempt::default();

        for section in sections {
            info!(section = %section.title, index = section.index, "enumerating clauses");

            match self.request_numbers(section, &mut attempt.token_usage).await {
                Ok(numbers) => {
                    info!(
                        section = %section.title,
                        count = numbers.len(),
                        numbers = ?numbers,
                        "clauses enumerated"
                    );
                    attempt.index.insert(section.index, &section.title, numbers);
                }
                Err(PipelineError::InvalidEnumeration(issue)) => {
                    let message = format!(
                        "enumeration invalid for section {} ({:?}): {issue}",
                        section.index, section.title
                    );
                    warn!(section = %section.title, index = section.index, issue = %issue, "enumeration invalid");
                    attempt.errors.push(message);
                    attempt.index.insert(section.index, &section.title, Vec::new());
                }
                Err(e) => {
                    let message = format!(
                        "enumeration failed for section {} ({:?}): {e}",
                        section.index, section.title
                    );
                    error!(section = %section.title, index = section.index, error = %e, "enumeration failed");
                    attempt.errors.push(message);
                    attempt.index.insert(section.index, &section.title, Vec::new());
                }
            }
        }

        attempt
    }

    /// Run whole-stage passes until no section is empty or `max_attempts`
    /// passes have run. Each retry re-enumerates every section from scratch.
    pub async fn enumerate_with_retry(
        &self,
        sections: &[Section],
        max_attempts: u32,
    ) -> EnumerationOutcome {
        let max_attempts = max_attempts.max(1);
        let mut errors = Vec::new();
        let mut token_usage = TokenUsage::default();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let attempt = self.enumerate_all(sections).await;

            token_usage.add(&attempt.token_usage);
            errors.extend(
                attempt
                    .errors
                    .into_iter()
                    .map(|e| format!("attempt {attempts}: {e}")),
            );

            let empty = attempt.index.empty_sections().count();
            if empty == 0 {
                info!(
                    attempts,
                    sections = attempt.index.len(),
                    clauses = attempt.index.total_clauses(),
                    "enumeration complete"
                );
            } else if attempts < max_attempts {
                warn!(
                    attempt = attempts,
                    max_attempts,
                    empty_sections = empty,
                    "retrying enumeration for all sections"
                );
                continue;
            } else {
                warn!(
                    attempts,
                    empty_sections = empty,
                    "enumeration still incomplete after max attempts, proceeding with partial results"
                );
            }

            return EnumerationOutcome {
                index: attempt.index,
                attempts,
                errors,
                token_usage,
            };
        }
    }

    async fn request_numbers(&self, section: &Section, usage: &mut TokenUsage) -> Result<Vec<u32>> {
        let request = LlmRequest {
            system: oracle::build_enumeration_system_prompt().to_string(),
            messages: vec![Message::user(oracle::build_enumeration_prompt(section))],
            max_tokens: self.config.enumeration_max_tokens,
            temperature: self.config.temperature,
            model: Some(self.config.enumeration_model.clone()),
        };

        let response = self.client.complete(&request).await?;
        usage.add(&response.usage());
        debug!(section = %section.title, response = %response.content, "enumeration response");

        Ok(oracle::parse_clause_numbers(&response.content)?)
    }
}
