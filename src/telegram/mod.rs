//! Telegram Bot API transport: long polling in, `Messenger` out.

pub mod api;
pub mod poller;
pub mod types;

pub use api::TelegramClient;
pub use poller::poll_updates;
