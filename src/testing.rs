//! In-crate fakes for the capability traits.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicI64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;

use crate::db::{NewNotification, Notification, NotificationStore};
use crate::error::{BotError, BotResult};
use crate::messenger::{Keyboard, Messenger};
use crate::models::{ChatId, NotificationId, UserId};
use crate::sensing::SensorSource;

#[derive(Default)]
struct Script {
    lines: VecDeque<BotResult<Vec<u8>>>,
    reads: usize,
    discards: usize,
}

/// Sensor source replaying queued lines; reports a timeout once the queue is empty.
///
/// Clones share the same script so tests can inspect it after boxing.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_lines(&self, lines: &[&str]) {
        let mut script = self.script.lock().unwrap();
        for line in lines {
            script.lines.push_back(Ok(format!("{line}\r\n").into_bytes()));
        }
    }

    pub fn push_error(&self, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .lines
            .push_back(Err(BotError::DeviceRead(reason.to_string())));
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().lines.len()
    }

    pub fn reads(&self) -> usize {
        self.script.lock().unwrap().reads
    }

    pub fn discard_calls(&self) -> usize {
        self.script.lock().unwrap().discards
    }
}

impl SensorSource for ScriptedSource {
    fn discard_buffered(&mut self) -> BotResult<()> {
        self.script.lock().unwrap().discards += 1;
        Ok(())
    }

    fn read_line(&mut self) -> BotResult<Option<Vec<u8>>> {
        let mut script = self.script.lock().unwrap();
        script.reads += 1;
        match script.lines.pop_front() {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }
}

/// Notification store kept in a vector, with a switch to simulate an outage.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Notification> {
        self.records.lock().unwrap().clone()
    }

    fn check(&self) -> BotResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BotError::StorageUnavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, notification: NewNotification) -> BotResult<NotificationId> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records.lock().unwrap().push(notification.with_id(id));
        Ok(id)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> BotResult<Vec<Notification>> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> BotResult<Vec<Notification>> {
        self.check()?;
        Ok(self.all())
    }

    async fn delete_by_owner_and_id(
        &self,
        owner_id: UserId,
        id: NotificationId,
    ) -> BotResult<bool> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|n| !(n.id == id && n.owner_id == owner_id));
        Ok(records.len() != before)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message {
        to: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        to: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
}

impl Sent {
    pub fn recipient(&self) -> ChatId {
        match self {
            Sent::Message { to, .. } | Sent::Edit { to, .. } => *to,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Sent::Message { text, .. } | Sent::Edit { text, .. } => text,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Sent::Message { keyboard, .. } | Sent::Edit { keyboard, .. } => keyboard.as_ref(),
        }
    }
}

/// Messenger that records outbound traffic; selected recipients fail delivery.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<Vec<ChatId>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: ChatId) {
        self.failing.lock().unwrap().push(recipient);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Sent> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn to(&self, recipient: ChatId) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| s.recipient() == recipient)
            .collect()
    }

    fn deliver(&self, entry: Sent) -> BotResult<()> {
        let recipient = entry.recipient();
        if self.failing.lock().unwrap().contains(&recipient) {
            return Err(BotError::delivery(recipient, "recipient blocked the bot"));
        }
        self.sent.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, recipient: ChatId, text: &str, keyboard: Option<&Keyboard>) -> BotResult<()> {
        self.deliver(Sent::Message {
            to: recipient,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
    }

    async fn edit_last_prompt(
        &self,
        recipient: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> BotResult<()> {
        self.deliver(Sent::Edit {
            to: recipient,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
    }
}
