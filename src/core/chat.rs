//! # Chat Session
//!
//! Orchestration over the store: validates input, appends the user turn,
//! and drives a provider stream into a single AI message, fragment by
//! fragment.
//!
//! All state mutation happens on the caller's task, sequentially; the only
//! suspension points are the initial request submission and awaiting the
//! next fragment. The provider runs on a spawned task and talks back over
//! a bounded mpsc channel, so an in-flight stream can be aborted through
//! [`StreamControl`] without tearing down the session.

use std::sync::{Arc, Mutex};

use log::{error, info};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::core::config::ResolvedConfig;
use crate::core::message::MessageDraft;
use crate::core::store::ChatStore;
use crate::inference::{
    GenerateRequest, GeminiProvider, ProviderError, StreamChunk, TextStreamProvider,
};

/// Shown in place of a reply when streaming fails. Replaces any partially
/// streamed text.
pub const ERROR_REPLY: &str = "Error: Could not process your request.";

/// Capacity of the fragment channel between provider task and session.
const CHUNK_CHANNEL_SIZE: usize = 64;

/// Strips markdown emphasis markers from one fragment.
///
/// Literal substitution, applied per fragment: `**` pairs first, then
/// remaining `*`. A marker split across two fragments is not recognized —
/// the transform never buffers across fragment boundaries.
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace('*', "")
}

/// Cancel handle for the in-flight stream, shareable outside the session.
///
/// Cloning is cheap; `cancel` aborts the provider task (if one is active),
/// which ends the fragment stream. Partially streamed text is kept and the
/// session's exit path still clears the loading flag and stream target.
#[derive(Clone, Default)]
pub struct StreamControl {
    inner: Arc<Mutex<Option<AbortHandle>>>,
}

impl StreamControl {
    pub fn cancel(&self) {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            info!("Cancelling in-flight stream");
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn arm(&self, handle: AbortHandle) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    fn disarm(&self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }
}

/// One chat session: the store plus the provider that answers it.
///
/// Constructed at session start and passed by reference to UI bindings.
/// The store is public for reading; mutation still goes through the
/// store's own methods.
pub struct ChatSession {
    pub store: ChatStore,
    provider: Arc<dyn TextStreamProvider>,
    model_name: String,
    system_preamble: String,
    control: StreamControl,
}

impl ChatSession {
    pub fn new(provider: Arc<dyn TextStreamProvider>, config: &ResolvedConfig) -> Self {
        Self {
            store: ChatStore::new(),
            provider,
            model_name: config.model_name.clone(),
            system_preamble: config.system_preamble.clone(),
            control: StreamControl::default(),
        }
    }

    /// Builds a session backed by the Gemini provider from resolved config.
    /// Fails if no API key was configured.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, ProviderError> {
        let api_key = config.gemini_api_key.clone().ok_or_else(|| {
            ProviderError::Config(
                "Gemini API key must be set (config file or GEMINI_API_KEY env var)".to_string(),
            )
        })?;
        let provider = Arc::new(GeminiProvider::new(
            api_key,
            Some(config.gemini_base_url.clone()),
        ));
        Ok(Self::new(provider, config))
    }

    /// Handle for cancelling the in-flight stream from outside the session
    /// (e.g. a stop button). Safe to hold across requests.
    pub fn stream_control(&self) -> StreamControl {
        self.control.clone()
    }

    /// Submits the current input box contents.
    ///
    /// No-op when the input is empty or whitespace-only; the emptiness
    /// check trims, but the original untrimmed text is what gets sent.
    /// Clears the input field before submitting.
    pub async fn send_message(&mut self) {
        let text = self.store.input().to_string();
        if text.trim().is_empty() {
            return;
        }
        self.store.set_input(String::new());
        self.respond(&text, None).await;
    }

    /// Submits `text` as a fresh user turn and streams the AI answer.
    pub async fn handle_ai_response(&mut self, text: &str) {
        self.respond(text, None).await;
    }

    /// Submits `text` as a reply under `parent_id` and streams the AI answer.
    pub async fn reply_to_message(&mut self, parent_id: &str, text: &str) {
        self.respond(text, Some(parent_id)).await;
    }

    async fn respond(&mut self, text: &str, parent_id: Option<&str>) {
        if text.trim().is_empty() {
            return;
        }

        let mut draft = MessageDraft::user(text);
        draft.parent_id = parent_id.map(str::to_string);
        let user_id = self.store.add_message(draft).id.clone();
        self.store.set_loading(true);

        if let Err(e) = self.stream_ai_reply(text).await {
            // stream_ai_reply converts provider failures in place, so the
            // only way here is a panicked provider task.
            error!("Streaming handler failed: {e}");
            self.store
                .add_message(MessageDraft::ai(ERROR_REPLY).with_parent(user_id));
            self.store.set_loading(false);
        }
    }

    /// Streams one AI reply into a fresh message.
    ///
    /// Provider errors are absorbed here: the target's text is replaced
    /// with [`ERROR_REPLY`] and `Ok(())` is returned. Cancellation keeps
    /// whatever text arrived. Both the loading flag and the stream target
    /// are cleared on every exit path.
    async fn stream_ai_reply(&mut self, prompt: &str) -> Result<(), tokio::task::JoinError> {
        let target = self.store.begin_stream();
        let (tx, mut rx) = mpsc::channel::<StreamChunk>(CHUNK_CHANNEL_SIZE);

        let provider = Arc::clone(&self.provider);
        let full_prompt = format!("{}\n\n{}", self.system_preamble, prompt);
        let model = self.model_name.clone();

        let handle = tokio::spawn(async move {
            let request = GenerateRequest {
                prompt: &full_prompt,
                model: &model,
            };
            provider.stream_generate(request, tx).await
        });
        self.control.arm(handle.abort_handle());

        while let Some(chunk) = rx.recv().await {
            match chunk {
                StreamChunk::Text(text) => {
                    let cleaned = strip_emphasis(&text);
                    self.store.append_stream_text(&target, &cleaned);
                }
                StreamChunk::Done => break,
            }
        }

        // Sender dropped or Done received; collect the provider's outcome.
        let outcome = handle.await;
        self.control.disarm();

        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Stream failed: {e}");
                self.store.replace_stream_text(&target, ERROR_REPLY);
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                info!("Stream cancelled; keeping partial text");
                Ok(())
            }
            Err(e) => Err(e),
        };

        self.store.set_loading(false);
        self.store.finish_stream(&target);
        result
    }
}
