pub mod condition;
pub mod reading;

pub use condition::{Condition, Parameter};
pub use reading::Reading;

/// Chat identity supplied by the transport; doubles as the notification owner.
pub type UserId = i64;

/// Conversation a reply goes to. Equal to the user id in private chats.
pub type ChatId = i64;

/// Store-generated notification key.
pub type NotificationId = i64;
