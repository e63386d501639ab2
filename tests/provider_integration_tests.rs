use threadline::inference::{
    GeminiProvider, GenerateRequest, ProviderError, StreamChunk, TextStreamProvider,
};
use tokio::sync::mpsc;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Collects all text fragments from a stream, stopping at Done.
async fn collect_fragments(mut receiver: mpsc::Receiver<StreamChunk>) -> Vec<String> {
    let mut fragments = Vec::new();
    while let Some(chunk) = receiver.recv().await {
        match chunk {
            StreamChunk::Text(s) => fragments.push(s),
            StreamChunk::Done => break,
        }
    }
    fragments
}

fn test_request(model: &'static str) -> GenerateRequest<'static> {
    GenerateRequest {
        prompt: "Hello",
        model,
    }
}

// ============================================================================
// Gemini Provider Tests
// ============================================================================

#[tokio::test]
async fn test_gemini_successful_streaming() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}],\"role\":\"model\"}}]}

data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" world\"}],\"role\":\"model\"},\"finishReason\":\"STOP\"}]}
";

    Mock::given(method("POST"))
        .and(path("/models/test-model:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = GeminiProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_generate(test_request("test-model"), tx).await;

    assert!(result.is_ok());

    let fragments = collect_fragments(rx).await;
    assert_eq!(fragments, vec!["Hello", " world"]);
}

#[tokio::test]
async fn test_gemini_multi_part_event_concatenates() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"},{\"text\":\"lo\"}],\"role\":\"model\"}}]}
";

    Mock::given(method("POST"))
        .and(path("/models/test-model:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = GeminiProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_generate(test_request("test-model"), tx).await;

    assert!(result.is_ok());
    assert_eq!(collect_fragments(rx).await, vec!["Hello"]);
}

#[tokio::test]
async fn test_gemini_api_error_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/test-model:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let provider = GeminiProvider::new("invalid-key".to_string(), Some(mock_server.uri()));

    let (tx, _rx) = mpsc::channel(100);
    let result = provider.stream_generate(test_request("test-model"), tx).await;

    assert!(matches!(result, Err(ProviderError::Api { status: 401, .. })));
}

#[tokio::test]
async fn test_gemini_missing_api_key_is_config_error() {
    let provider = GeminiProvider::new(String::new(), Some("http://localhost:0".to_string()));

    let (tx, _rx) = mpsc::channel(100);
    let result = provider.stream_generate(test_request("test-model"), tx).await;

    assert!(matches!(result, Err(ProviderError::Config(_))));
}

#[tokio::test]
async fn test_gemini_channel_closed_error() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}],\"role\":\"model\"}}]}

data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" world\"}],\"role\":\"model\"}}]}
";

    Mock::given(method("POST"))
        .and(path("/models/test-model:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = GeminiProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let (tx, rx) = mpsc::channel(1);
    // Drop receiver immediately to simulate a torn-down consumer
    drop(rx);

    let result = provider.stream_generate(test_request("test-model"), tx).await;

    assert!(matches!(result, Err(ProviderError::ChannelClosed)));
}

#[tokio::test]
async fn test_gemini_tolerates_malformed_sse_lines() {
    let mock_server = MockServer::start().await;

    // A keep-alive, a broken JSON line, and a normal delta
    let sse_response = "\
: keep-alive

data: {not valid json

data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Text\"}],\"role\":\"model\"}}]}
";

    Mock::given(method("POST"))
        .and(path("/models/test-model:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = GeminiProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_generate(test_request("test-model"), tx).await;

    assert!(result.is_ok());
    assert_eq!(collect_fragments(rx).await, vec!["Text"]);
}

#[tokio::test]
async fn test_gemini_empty_stream_completes_cleanly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/test-model:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&mock_server)
        .await;

    let provider = GeminiProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_generate(test_request("test-model"), tx).await;

    assert!(result.is_ok());
    assert!(collect_fragments(rx).await.is_empty());
}
