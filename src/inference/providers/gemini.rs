//! Google generative-language provider (`:streamGenerateContent` with SSE).
//!
//! The endpoint emits `data: {json}` lines, one `GenerateContentResponse`
//! per event; each carries zero or more candidate text parts. There is no
//! `event:` line and no `[DONE]` marker — the stream simply ends after the
//! final chunk.

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::inference::{GenerateRequest, ProviderError, StreamChunk, TextStreamProvider};

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Serialize, Debug, Clone)]
struct RequestPart {
    text: String,
}

#[derive(Serialize, Debug, Clone)]
struct ContentEntry {
    role: &'static str,
    parts: Vec<RequestPart>,
}

/// The request body for `streamGenerateContent`.
#[derive(Serialize, Debug)]
struct GenerateContentRequest {
    contents: Vec<ContentEntry>,
}

impl GenerateContentRequest {
    fn single_turn(prompt: &str) -> Self {
        Self {
            contents: vec![ContentEntry {
                role: "user",
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

/// One streamed `GenerateContentResponse` event.
#[derive(Deserialize, Debug)]
struct StreamResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl StreamResponse {
    /// Concatenated text of every candidate part in this event.
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect()
    }

    fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .iter()
            .find_map(|c| c.finish_reason.as_deref())
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Provider for the Google generative-language streaming API.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider.
    ///
    /// # Arguments
    /// * `api_key` - Gemini API key
    /// * `base_url` - Optional custom base URL (defaults to the public API)
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            client: reqwest::Client::new(),
        }
    }

    /// Sends a streaming generation request and returns the raw response.
    async fn send_request(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::Response, ProviderError> {
        let json_body = serde_json::to_string(request)
            .map_err(|e| ProviderError::Parse(format!("request serialization failed: {e}")))?;
        debug!("Gemini request body: {} bytes", json_body.len());

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .body(json_body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        debug!("Gemini response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Gemini API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: err_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl TextStreamProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn stream_generate(
        &self,
        request: GenerateRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Config("Gemini API key is not set".to_string()));
        }

        let body = GenerateContentRequest::single_turn(request.prompt);
        info!(
            "Gemini streamGenerateContent request: model={}, prompt_len={}",
            request.model,
            request.prompt.len()
        );

        let response = self.send_request(request.model, &body).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut chunk_count = 0usize;
        let mut total_content_len = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ProviderError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Process complete lines from buffer
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].to_string();
                buffer.drain(..pos + 1);

                let line = line.trim();
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };

                let event: StreamResponse = match serde_json::from_str(data) {
                    Ok(event) => event,
                    Err(e) => {
                        // Tolerate odd lines (keep-alives, partial proxies)
                        debug!("Skipping unparseable SSE data ({e}): {data}");
                        continue;
                    }
                };

                let text = event.text();
                if !text.is_empty() {
                    chunk_count += 1;
                    total_content_len += text.len();
                    debug!(
                        "Sending Text chunk (len={}, total={})",
                        text.len(),
                        total_content_len
                    );
                    if sender.send(StreamChunk::Text(text)).await.is_err() {
                        warn!("Text chunk send failed: receiver dropped");
                        return Err(ProviderError::ChannelClosed);
                    }
                }

                if let Some(reason) = event.finish_reason() {
                    debug!("Candidate finished: {}", reason);
                }
            }
        }

        info!(
            "Stream complete: {} chunks, {} content bytes",
            chunk_count, total_content_len
        );
        if sender.send(StreamChunk::Done).await.is_err() {
            warn!("Done send failed: receiver dropped");
            return Err(ProviderError::ChannelClosed);
        }
        Ok(())
    }
}
