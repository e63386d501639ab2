//! The conversation data model: one flat record per turn, plus the
//! transient tree node used by the reply-forest view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Sender {
    #[serde(rename = "user")]
    #[default]
    User,
    #[serde(rename = "ai")]
    Ai,
}

/// One conversational turn.
///
/// `text` is the only field mutated after creation, and only through the
/// store's streaming accumulation path. `parent_id` back-references another
/// message's `id`; `None` means the message is a thread root. Field names
/// serialize in camelCase to match the shape UI layers consume.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub parent_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_code: bool,
}

/// A partially specified message handed to [`ChatStore::add_message`].
///
/// Every field is optional; anything missing is filled at append time:
/// a fresh UUID v4 id, empty text, `Sender::User`, no parent, the current
/// time, and `is_code = false`.
///
/// [`ChatStore::add_message`]: crate::core::store::ChatStore::add_message
#[derive(Debug, Clone, Default)]
pub struct MessageDraft {
    pub id: Option<String>,
    pub text: Option<String>,
    pub sender: Option<Sender>,
    pub parent_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_code: Option<bool>,
}

impl MessageDraft {
    /// Draft for a user-authored message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            sender: Some(Sender::User),
            ..Self::default()
        }
    }

    /// Draft for an AI-authored message.
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            sender: Some(Sender::Ai),
            ..Self::default()
        }
    }

    /// Sets the parent back-reference.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Fills every missing field and produces the final record.
    pub fn into_message(self) -> Message {
        Message {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            text: self.text.unwrap_or_default(),
            sender: self.sender.unwrap_or_default(),
            parent_id: self.parent_id,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            is_code: self.is_code.unwrap_or(false),
        }
    }
}

/// A message plus its ordered replies. Built on demand by
/// [`build_message_tree`]; never stored.
///
/// [`build_message_tree`]: crate::core::thread::build_message_tree
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MessageNode {
    pub message: Message,
    pub children: Vec<MessageNode>,
}
