use charter_layout::HeuristicConfig;

use crate::error::{PipelineError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ENUMERATION_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_EXTRACTION_MODEL: &str = "claude-sonnet-4-6";
pub const DEFAULT_MAX_ENUMERATION_ATTEMPTS: u32 = 3;

/// Configuration for the text oracle.
///
/// NOTE: Debug is implemented by hand so that `api_key` stays redacted.
#[derive(Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub enumeration_model: String,
    pub extraction_model: String,
    pub enumeration_max_tokens: u32,
    pub extraction_max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("enumeration_model", &self.enumeration_model)
            .field("extraction_model", &self.extraction_model)
            .field("enumeration_max_tokens", &self.enumeration_max_tokens)
            .field("extraction_max_tokens", &self.extraction_max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OracleConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .map_err(|_| PipelineError::Config("ANTHROPIC_API_KEY not set".into()))?;

        let api_base_url =
            std::env::var("LLM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());

        let enumeration_model = std::env::var("CHARTER_ENUMERATION_MODEL")
            .unwrap_or_else(|_| DEFAULT_ENUMERATION_MODEL.into());

        let extraction_model = std::env::var("CHARTER_EXTRACTION_MODEL")
            .unwrap_or_else(|_| DEFAULT_EXTRACTION_MODEL.into());

        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        Ok(Self {
            api_key,
            api_base_url,
            enumeration_model,
            extraction_model,
            enumeration_max_tokens: 256,
            extraction_max_tokens: 2048,
            temperature: 0.0,
            timeout_secs,
        })
    }

    /// Create a config builder for testing.
    pub fn builder(api_key: impl Into<String>) -> OracleConfigBuilder {
        OracleConfigBuilder {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            enumeration_model: DEFAULT_ENUMERATION_MODEL.into(),
            extraction_model: DEFAULT_EXTRACTION_MODEL.into(),
            enumeration_max_tokens: 256,
            extraction_max_tokens: 2048,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Builder for constructing `OracleConfig` in tests.
pub struct OracleConfigBuilder {
    api_key: String,
    api_base_url: String,
    enumeration_model: String,
    extraction_model: String,
    enumeration_max_tokens: u32,
    extraction_max_tokens: u32,
    temperature: f64,
    timeout_secs: u64,
}

impl OracleConfigBuilder {
    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn enumeration_model(mut self, model: impl Into<String>) -> Self {
        self.enumeration_model = model.into();
        self
    }

    pub fn extraction_model(mut self, model: impl Into<String>) -> Self {
        self.extraction_model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> OracleConfig {
        OracleConfig {
            api_key: self.api_key,
            api_base_url: self.api_base_url,
            enumeration_model: self.enumeration_model,
            extraction_model: self.extraction_model,
            enumeration_max_tokens: self.enumeration_max_tokens,
            extraction_max_tokens: self.extraction_max_tokens,
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on whole-stage enumeration attempts.
    pub max_enumeration_attempts: u32,
    /// Ceiling on in-flight extraction calls per section; `None` means one call
    /// per enumerated clause, all at once.
    pub max_concurrent_extractions: Option<usize>,
    pub heuristics: HeuristicConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_enumeration_attempts: DEFAULT_MAX_ENUMERATION_ATTEMPTS,
            max_concurrent_extractions: None,
            heuristics: HeuristicConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let max_enumeration_attempts = std::env::var("CHARTER_MAX_ENUMERATION_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &u32| n > 0)
            .unwrap_or(DEFAULT_MAX_ENUMERATION_ATTEMPTS);

        let max_concurrent_extractions = std::env::var("CHARTER_MAX_CONCURRENT_EXTRACTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0);

        Self {
            max_enumeration_attempts,
            max_concurrent_extractions,
            heuristics: HeuristicConfig::from_env(),
        }
    }

    pub fn with_max_enumeration_attempts(mut self, attempts: u32) -> Self {
        self.max_enumeration_attempts = attempts.max(1);
        self
    }

    pub fn with_max_concurrent_extractions(mut self, limit: usize) -> Self {
        self.max_concurrent_extractions = Some(limit.max(1));
        self
    }

    pub fn with_heuristics(mut self, heuristics: HeuristicConfig) -> Self {
        self.heuristics = heuristics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = OracleConfig::builder("key").build();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.enumeration_model, DEFAULT_ENUMERATION_MODEL);
        assert_eq!(config.extraction_model, DEFAULT_EXTRACTION_MODEL);
        assert_eq!(config.enumeration_max_tokens, 256);
        assert_eq!(config.extraction_max_tokens, 2048);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = OracleConfig::builder("sk-ant-secret").build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_enumeration_attempts, 3);
        assert!(config.max_concurrent_extractions.is_none());
    }

    #[test]
    fn test_pipeline_config_floors() {
        let config = PipelineConfig::default()
            .with_max_enumeration_attempts(0)
            .with_max_concurrent_extractions(0);
        assert_eq!(config.max_enumeration_attempts, 1);
        assert_eq!(config.max_concurrent_extractions, Some(1));
    }
}
