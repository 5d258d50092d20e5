use charter_pipeline::oracle::{AnthropicClient, LlmClient, LlmRequest, Message};
use charter_pipeline::{ClausePipeline, OracleConfig, PipelineConfig, PipelineError};
use charter_layout::{JsonLayoutSource, LayoutDocument};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn anthropic_response(content: &str) -> serde_json::Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [
            {
                "type": "text",
                "text": content
            }
        ],
        "model": "claude-sonnet-4-6",
        "usage": {
            "input_tokens": 500,
            "output_tokens": 300
        }
    })
}

fn request(model: Option<&str>) -> LlmRequest {
    LlmRequest {
        system: "You are reading a maritime charter party.".into(),
        messages: vec![Message::user("List the clause numbers.")],
        max_tokens: 256,
        temperature: 0.0,
        model: model.map(str::to_string),
    }
}

fn config(server: &MockServer) -> OracleConfig {
    OracleConfig::builder("test-key")
        .api_base_url(server.uri())
        .build()
}

#[tokio::test]
async fn test_successful_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response("[1, 2, 3]")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AnthropicClient::new(&config(&mock_server)).expect("client creation");
    let response = client.complete(&request(None)).await.expect("completion");

    assert_eq!(response.content, "[1, 2, 3]");
    assert_eq!(response.input_tokens, 500);
    assert_eq!(response.output_tokens, 300);
}

#[tokio::test]
async fn test_model_override_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "model": "claude-haiku-4-5-20251001",
            "max_tokens": 256
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response("[1]")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AnthropicClient::new(&config(&mock_server)).expect("client creation");
    let response = client
        .complete(&request(Some("claude-haiku-4-5-20251001")))
        .await
        .expect("completion");
    assert_eq!(response.content, "[1]");
}

#[tokio::test]
async fn test_default_model_is_extraction_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"model": "claude-sonnet-4-6"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response("{}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AnthropicClient::new(&config(&mock_server)).expect("client creation");
    client.complete(&request(None)).await.expect("completion");
}

#[tokio::test]
async fn test_api_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    let error_resp = json!({
        "error": {
            "type": "invalid_request_error",
            "message": "Invalid model specified"
        }
    });

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(&error_resp))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AnthropicClient::new(&config(&mock_server)).expect("client creation");
    let err = client
        .complete(&request(None))
        .await
        .expect_err("should be an error");

    match err {
        PipelineError::LlmApiError { status, message } => {
            assert_eq!(status, 400);
            assert!(
                message.contains("Invalid model"),
                "Error should contain API message: {message}"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response("[4, 5]")))
        .mount(&mock_server)
        .await;

    let client = AnthropicClient::new(&config(&mock_server)).expect("client creation");
    let response = client.complete(&request(None)).await.expect("completion");
    assert_eq!(response.content, "[4, 5]");
}

#[tokio::test]
async fn test_pipeline_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"model": "claude-haiku-4-5-20251001"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response("```json\n[1]\n```")))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"model": "claude-sonnet-4-6"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response(
            r#"{"number": 1, "title": "Shipbroker", "text": "Messrs. Nordic Chartering AS, Oslo."}"#,
        )))
        .mount(&mock_server)
        .await;

    let document: LayoutDocument = JsonLayoutSource::parse(
        r#"{"items": [
            {"text": "1. Shipbroker", "label": "section_header", "page": 1},
            {"text": "Messrs. Nordic Chartering AS, Oslo.", "label": "text", "page": 1}
        ]}"#,
    )
    .expect("layout parse");

    let oracle = config(&mock_server);
    let client = AnthropicClient::new(&oracle).expect("client creation");
    let pipeline = ClausePipeline::new(client, oracle, PipelineConfig::default());

    let output = pipeline.run_document(&document).await;
    assert_eq!(output.clauses.len(), 1);
    assert_eq!(output.clauses[0].id, "1");
    assert_eq!(output.clauses[0].title, "Shipbroker");
    assert_eq!(output.token_usage.input_tokens, 1000);
}
