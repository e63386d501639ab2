//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::chat::ChatSession;
use crate::core::config::ResolvedConfig;
use crate::inference::{GenerateRequest, ProviderError, StreamChunk, TextStreamProvider};

/// A provider that plays back a scripted fragment sequence.
///
/// Optionally fails after a given number of fragments, or hangs forever
/// after the script (for cancellation tests). Records every prompt it is
/// asked to answer.
pub struct ScriptedProvider {
    fragments: Vec<String>,
    fail_after: Option<usize>,
    hang_after_fragments: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            fail_after: None,
            hang_after_fragments: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sends the first `n` fragments, then fails with a network error.
    pub fn failing_after(fragments: &[&str], n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new(fragments)
        }
    }

    /// Sends all fragments, then never completes.
    pub fn hanging_after(fragments: &[&str]) -> Self {
        Self {
            hang_after_fragments: true,
            ..Self::new(fragments)
        }
    }

    /// Shared record of every prompt submitted to this provider.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl TextStreamProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_generate(
        &self,
        request: GenerateRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());

        for (i, fragment) in self.fragments.iter().enumerate() {
            if self.fail_after == Some(i) {
                return Err(ProviderError::Network("scripted failure".to_string()));
            }
            sender
                .send(StreamChunk::Text(fragment.clone()))
                .await
                .map_err(|_| ProviderError::ChannelClosed)?;
        }

        if self.fail_after == Some(self.fragments.len()) {
            return Err(ProviderError::Network("scripted failure".to_string()));
        }

        if self.hang_after_fragments {
            futures::future::pending::<()>().await;
        }

        sender
            .send(StreamChunk::Done)
            .await
            .map_err(|_| ProviderError::ChannelClosed)?;
        Ok(())
    }
}

/// Resolved config with fixed test values.
pub fn test_config() -> ResolvedConfig {
    ResolvedConfig {
        model_name: "test-model".to_string(),
        system_preamble: "You are a test assistant.".to_string(),
        gemini_api_key: Some("test-key".to_string()),
        gemini_base_url: "http://localhost:0".to_string(),
    }
}

/// Creates a test ChatSession backed by the given scripted provider.
pub fn test_session(provider: ScriptedProvider) -> ChatSession {
    ChatSession::new(Arc::new(provider), &test_config())
}
