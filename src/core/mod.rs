//! # Core Conversation Logic
//!
//! This module contains Threadline's business state. It knows nothing about
//! any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • message (data model) │
//!                    │  • store (flat state)   │
//!                    │  • thread (reply tree)  │
//!                    │  • chat (orchestration) │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    Web     │      │    TUI     │      │   Tests    │
//!     │  Adapter   │      │  Adapter   │      │            │
//!     │ (external) │      │ (external) │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: `Message`, `MessageDraft`, `MessageNode` — the data model
//! - [`store`]: `ChatStore` — the flat message list plus UI flags
//! - [`thread`]: `build_message_tree` — flat list → reply forest
//! - [`chat`]: `ChatSession` — send/reply orchestration and streaming
//! - [`config`]: settings with defaults → file → env override hierarchy

pub mod chat;
pub mod config;
pub mod message;
pub mod store;
pub mod thread;
