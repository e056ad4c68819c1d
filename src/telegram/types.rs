//! Bot API payloads. Only the fields the bot reads or writes are modelled.

use serde::{Deserialize, Serialize};

use crate::messenger::{Inbound, Keyboard};
use crate::models::{ChatId, UserId};

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// What the poller extracted from one update.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEvent {
    pub inbound: Inbound,
    /// Set for button presses, which must be acknowledged.
    pub callback_id: Option<String>,
    /// Message the pressed button belongs to.
    pub prompt_message_id: Option<i64>,
}

impl Update {
    /// `None` for updates the bot does not react to (edits, channel posts, media).
    ///
    /// The user who acted owns the event; replies go to the chat it came from.
    pub fn into_event(self) -> Option<IncomingEvent> {
        if let Some(query) = self.callback_query {
            let data = query.data?;
            let sender = query.from.id;
            let (chat, prompt_message_id) = match query.message {
                Some(message) => (message.chat.id, Some(message.message_id)),
                None => (sender, None),
            };
            return Some(IncomingEvent {
                inbound: Inbound::button(sender, data).in_chat(chat),
                callback_id: Some(query.id),
                prompt_message_id,
            });
        }

        let message = self.message?;
        let sender = message.from?.id;
        Some(IncomingEvent {
            inbound: Inbound::text(sender, message.text?).in_chat(message.chat.id),
            callback_id: None,
            prompt_message_id: None,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            inline_keyboard: keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton {
                            text: button.label.clone(),
                            callback_data: button.payload.clone(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: [&'static str; 2],
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
}
