use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use crate::error::{BotError, BotResult};
use crate::messenger::{Keyboard, Messenger};
use crate::models::ChatId;

use super::types::{
    AnswerCallbackQuery, ApiResponse, EditMessageText, GetUpdates, Message, SendMessage, Update,
};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bot API client. Remembers the last prompt shown to each chat so button
/// answers can replace it in place.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    last_prompts: Mutex<HashMap<ChatId, i64>>,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_api_url(DEFAULT_API_URL, token)
    }

    pub fn with_api_url(api_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            last_prompts: Mutex::new(HashMap::new()),
        }
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message", "callback_query"],
        };
        let wait = Duration::from_secs(timeout_secs) + REQUEST_TIMEOUT;
        self.call("getUpdates", &params, wait).await
    }

    pub async fn answer_callback(&self, callback_query_id: &str) -> Result<()> {
        let params = AnswerCallbackQuery { callback_query_id };
        let _: bool = self
            .call("answerCallbackQuery", &params, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Record the message a pressed button belongs to as the chat's current prompt.
    pub async fn remember_prompt(&self, chat: ChatId, message_id: i64) {
        self.last_prompts.lock().await.insert(chat, message_id);
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<Message> {
        let params = SendMessage {
            chat_id: chat,
            text,
            reply_markup: keyboard.map(Into::into),
        };
        let message: Message = self.call("sendMessage", &params, REQUEST_TIMEOUT).await?;

        if keyboard.is_some() {
            self.remember_prompt(chat, message.message_id).await;
        }
        Ok(message)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let params = EditMessageText {
            chat_id: chat,
            message_id,
            text,
            reply_markup: keyboard.map(Into::into),
        };
        // The API answers with the edited message, or `true` for inline messages.
        let _: serde_json::Value = self
            .call("editMessageText", &params, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Duration) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(params)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?;

        let status = response.status();
        let body: ApiResponse<R> = response
            .json()
            .await
            .with_context(|| format!("failed to decode {method} response ({status})"))?;

        if !body.ok {
            bail!(
                "{method} rejected ({status}): {}",
                body.description.unwrap_or_else(|| "no description".to_string())
            );
        }
        body.result
            .ok_or_else(|| anyhow!("{method} response carried no result"))
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, recipient: ChatId, text: &str, keyboard: Option<&Keyboard>) -> BotResult<()> {
        self.send_message(recipient, text, keyboard)
            .await
            .map(|_| ())
            .map_err(|err| BotError::delivery(recipient, format!("{err:#}")))
    }

    async fn edit_last_prompt(
        &self,
        recipient: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> BotResult<()> {
        let last = self.last_prompts.lock().await.get(&recipient).copied();

        if let Some(message_id) = last {
            match self.edit_message(recipient, message_id, text, keyboard).await {
                Ok(()) => {
                    if keyboard.is_none() {
                        self.last_prompts.lock().await.remove(&recipient);
                    }
                    return Ok(());
                }
                Err(err) => {
                    log_debug!("edit of prompt {message_id} for {recipient} failed, sending instead: {err:#}");
                }
            }
        }

        self.send(recipient, text, keyboard).await
    }
}
