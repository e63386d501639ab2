use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

/// Errors that can occur during provider operations.
/// Variants carry enough info to determine retryability (future use).
#[derive(Debug)]
pub enum ProviderError {
    /// Provider misconfigured (missing API key, bad URL). Not retryable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// API returned an error response. Retryable if status >= 500 or 429.
    Api { status: u16, message: String },
    /// Failed to parse the provider's response. Not retryable.
    Parse(String),
    /// The mpsc channel was closed (consumer dropped the receiver). Not retryable.
    ChannelClosed,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ProviderError::Parse(msg) => write!(f, "parse error: {msg}"),
            ProviderError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Everything a provider needs to fulfill one generation request.
/// `prompt` is the full text to submit, system preamble already applied.
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
}

/// One unit of streamed output from the model.
#[derive(Debug)]
pub enum StreamChunk {
    /// A text fragment, delivered in generation order.
    Text(String),
    /// The source signalled normal completion. Nothing follows.
    Done,
}

/// An ordered, asynchronous producer of response text.
///
/// Implementations send fragments over the channel strictly in the order
/// the upstream source yields them, then `Done`. Cancellation is the
/// caller's concern: aborting the task running `stream_generate` stops
/// the stream, and the dropped sender ends the consumer's receive loop.
#[async_trait]
pub trait TextStreamProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Streams a generation for the given request, sending chunks to the
    /// provided channel.
    async fn stream_generate(
        &self,
        request: GenerateRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError>;
}
