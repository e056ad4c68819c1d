//! Chat transport capability.
//!
//! The conversation and the alert loop only talk to users through
//! [`Messenger`]; the Telegram adapter is one implementation, the test
//! recorder another.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BotResult;
use crate::models::{ChatId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Inline choice buttons attached to a prompt, one inner vec per row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    #[cfg(test)]
    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|button| button.payload.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    Text(String),
    Button(String),
}

/// One event received from a chat user.
///
/// `sender` owns whatever the event creates; replies go to `chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub sender: UserId,
    pub chat: ChatId,
    pub payload: InboundPayload,
}

impl Inbound {
    /// Text typed in the sender's private chat.
    pub fn text(sender: UserId, text: impl Into<String>) -> Self {
        Self {
            sender,
            chat: sender,
            payload: InboundPayload::Text(text.into()),
        }
    }

    /// Button pressed in the sender's private chat.
    pub fn button(sender: UserId, payload: impl Into<String>) -> Self {
        Self {
            sender,
            chat: sender,
            payload: InboundPayload::Button(payload.into()),
        }
    }

    pub fn in_chat(mut self, chat: ChatId) -> Self {
        self.chat = chat;
        self
    }
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, recipient: ChatId, text: &str, keyboard: Option<&Keyboard>) -> BotResult<()>;

    /// Replace the text (and buttons) of the last prompt sent to `recipient`.
    async fn edit_last_prompt(
        &self,
        recipient: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> BotResult<()>;
}
