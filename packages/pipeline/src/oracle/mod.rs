mod client;
mod parse;
mod prompt;

pub use client::{AnthropicClient, LlmClient, LlmRequest, LlmResponse, Message, Role};
#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::{text_response, MockLlmClient};
pub use parse::{
    extract_json_payload, parse_clause_numbers, parse_clause_record, validate_clause_numbers,
    EnumerationIssue,
};
pub use prompt::{
    build_enumeration_prompt, build_enumeration_system_prompt, build_extraction_prompt,
    build_extraction_system_prompt,
};
