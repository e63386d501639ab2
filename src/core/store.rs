//! # Chat Store
//!
//! The flat conversation state for one session. This is an explicitly owned
//! object — construct it (usually via `ChatSession`), pass it by reference,
//! no globals.
//!
//! ```text
//! ChatStore
//! ├── messages: Vec<Message>        // insertion order, append-only
//! ├── input: String                 // input box contents
//! ├── is_loading: bool              // waiting for a response
//! ├── is_focused: bool              // input box focus flag
//! ├── show_modal: bool              // modal overlay flag
//! ├── latest_ai_message_id          // last AI turn, for reply chaining
//! └── current_stream                // active streaming target, if any
//! ```
//!
//! All mutation goes through the store's own methods. The only message ever
//! edited after creation is the active streaming target, and only through
//! the [`StreamTarget`] handle returned by [`ChatStore::begin_stream`] —
//! a stale handle from a superseded stream can never write into a newer
//! stream's message.

use log::{debug, warn};

use crate::core::message::{Message, MessageDraft, Sender};

/// Handle for one streaming invocation, tied to the message receiving text.
///
/// Each call to [`ChatStore::begin_stream`] mints a new handle; appends are
/// keyed by it rather than by a shared "currently streaming" slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    message_id: String,
}

impl StreamTarget {
    /// The id of the message this stream writes into.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

#[derive(Debug, Default)]
pub struct ChatStore {
    messages: Vec<Message>,
    input: String,
    is_loading: bool,
    is_focused: bool,
    show_modal: bool,
    latest_ai_message_id: Option<String>,
    current_stream: Option<StreamTarget>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full message sequence, in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Looks up a message by id.
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_focused(&self) -> bool {
        self.is_focused
    }

    pub fn show_modal(&self) -> bool {
        self.show_modal
    }

    /// Id of the most recently appended AI message, if any.
    pub fn latest_ai_message_id(&self) -> Option<&str> {
        self.latest_ai_message_id.as_deref()
    }

    /// The active streaming target, if a stream is in flight.
    pub fn current_stream(&self) -> Option<&StreamTarget> {
        self.current_stream.as_ref()
    }

    /// Fills the draft's missing fields, appends the message, and returns
    /// the fully populated record.
    ///
    /// When the appended message is AI-authored, the "latest AI message"
    /// tracker is updated so the next AI turn chains under this one.
    /// User messages never touch the tracker.
    pub fn add_message(&mut self, draft: MessageDraft) -> &Message {
        let message = draft.into_message();
        debug!(
            "add_message: id={} sender={:?} parent={:?}",
            message.id, message.sender, message.parent_id
        );
        if message.sender == Sender::Ai {
            self.latest_ai_message_id = Some(message.id.clone());
        }
        self.messages.push(message);
        self.messages.last().expect("just pushed")
    }

    pub fn set_input(&mut self, input: String) {
        self.input = input;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.is_focused = focused;
    }

    pub fn set_show_modal(&mut self, show: bool) {
        self.show_modal = show;
    }

    /// Starts a new streaming target: appends an empty AI message parented
    /// to the previous AI turn and returns the handle for it.
    ///
    /// The parent is read before the append, so consecutive AI turns chain
    /// to each other rather than to the intervening user message.
    pub fn begin_stream(&mut self) -> StreamTarget {
        let mut draft = MessageDraft::ai("");
        draft.parent_id = self.latest_ai_message_id.clone();
        let message = self.add_message(draft);
        let target = StreamTarget {
            message_id: message.id.clone(),
        };
        self.current_stream = Some(target.clone());
        target
    }

    /// Appends already-cleaned text to the handle's message, preserving
    /// previously accumulated text. One call per fragment, applied in
    /// arrival order.
    pub fn append_stream_text(&mut self, target: &StreamTarget, text: &str) {
        match self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.id == target.message_id)
        {
            Some(message) => message.text.push_str(text),
            None => warn!(
                "append_stream_text: no message with id {}",
                target.message_id
            ),
        }
    }

    /// Replaces the handle's message text wholesale, discarding anything
    /// streamed so far. Used on stream failure.
    pub fn replace_stream_text(&mut self, target: &StreamTarget, text: &str) {
        match self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.id == target.message_id)
        {
            Some(message) => message.text = text.to_string(),
            None => warn!(
                "replace_stream_text: no message with id {}",
                target.message_id
            ),
        }
    }

    /// Clears the active-stream slot, but only if it still belongs to this
    /// handle. A stream that was superseded cannot clobber its successor.
    pub fn finish_stream(&mut self, target: &StreamTarget) {
        if self.current_stream.as_ref() == Some(target) {
            self.current_stream = None;
        }
    }
}
