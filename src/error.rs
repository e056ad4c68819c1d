//! Errors that cross the capability seams (device, storage, chat transport).
//!
//! Infrastructure internals use `anyhow` and are folded into these variants at
//! the boundary. Invalid user input and foreign-owner deletes are not errors:
//! the collector re-prompts and the store reports `false`.

use thiserror::Error;

use crate::models::ChatId;

#[derive(Debug, Error)]
pub enum BotError {
    /// The backing medium of the notification store could not serve the request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The sensor device failed to produce a line. Never fatal for readers.
    #[error("device read failed: {0}")]
    DeviceRead(String),

    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: ChatId, reason: String },
}

impl BotError {
    pub fn storage(err: anyhow::Error) -> Self {
        BotError::StorageUnavailable(format!("{err:#}"))
    }

    pub fn delivery(recipient: ChatId, err: impl std::fmt::Display) -> Self {
        BotError::Delivery {
            recipient,
            reason: err.to_string(),
        }
    }
}

pub type BotResult<T> = Result<T, BotError>;
