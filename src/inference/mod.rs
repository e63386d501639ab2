pub mod provider;
pub mod providers;

pub use provider::{GenerateRequest, ProviderError, StreamChunk, TextStreamProvider};
pub use providers::GeminiProvider;
