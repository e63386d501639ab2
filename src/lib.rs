//! # Threadline
//!
//! UI-agnostic chat conversation state: a flat, append-only message list,
//! a derived reply-tree view, and incremental streaming of AI responses
//! into a single in-progress message.
//!
//! The crate owns no UI and no persistence. A frontend constructs a
//! [`core::chat::ChatSession`] at startup, drives it from its event
//! handlers, and reads the [`core::store::ChatStore`] to render.

pub mod core;
pub mod inference;
pub mod logging;

#[cfg(test)]
pub mod test_support;
