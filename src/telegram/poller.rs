use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::SendError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;

use crate::conversation::InputCollector;
use crate::models::ChatId;

use super::api::TelegramClient;
use super::types::IncomingEvent;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const LONG_POLL_SECS: u64 = 30;
const RETRY_BACKOFF: Duration = Duration::from_secs(5);
/// A lane with nothing queued for this long shuts its worker down.
const LANE_IDLE: Duration = Duration::from_secs(60);

/// Fetch updates until cancelled. Each chat gets its own lane, so events from
/// one chat are handled in arrival order while other chats proceed.
pub async fn poll_updates(
    client: Arc<TelegramClient>,
    collector: Arc<InputCollector>,
    cancel_token: CancellationToken,
) {
    let mut offset: Option<i64> = None;
    let handler_client = client.clone();
    let mut lanes = UpdateLanes::new(move |event: IncomingEvent| {
        deliver(handler_client.clone(), collector.clone(), event)
    });
    log_info!("polling for chat updates");

    loop {
        let batch = tokio::select! {
            result = client.get_updates(offset, LONG_POLL_SECS) => result,
            _ = cancel_token.cancelled() => break,
        };

        let updates = match batch {
            Ok(updates) => updates,
            Err(err) => {
                log_warn!("getUpdates failed, retrying in {}s: {err:#}", RETRY_BACKOFF.as_secs());
                tokio::select! {
                    _ = tokio::time::sleep(RETRY_BACKOFF) => continue,
                    _ = cancel_token.cancelled() => break,
                }
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            if let Some(event) = update.into_event() {
                lanes.route(event);
            }
        }
    }

    lanes.drain().await;
    log_info!("update polling stopped");
}

/// The button is acknowledged only after the collector has applied it, so a
/// user cannot press the next button before the previous one took effect.
async fn deliver(client: Arc<TelegramClient>, collector: Arc<InputCollector>, event: IncomingEvent) {
    let chat = event.inbound.chat;

    if let Some(message_id) = event.prompt_message_id {
        client.remember_prompt(chat, message_id).await;
    }

    if let Err(err) = collector.handle(event.inbound).await {
        log_warn!("reply to chat {chat} failed: {err}");
    }

    if let Some(callback_id) = &event.callback_id {
        if let Err(err) = client.answer_callback(callback_id).await {
            log_warn!("failed to acknowledge button press in chat {chat}: {err:#}");
        }
    }
}

struct Lane {
    tx: UnboundedSender<IncomingEvent>,
    worker: JoinHandle<()>,
}

/// Per-chat FIFO queues, each drained by one worker task.
pub struct UpdateLanes<H> {
    lanes: HashMap<ChatId, Lane>,
    handler: Arc<H>,
}

impl<H, Fut> UpdateLanes<H>
where
    H: Fn(IncomingEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    pub fn new(handler: H) -> Self {
        Self {
            lanes: HashMap::new(),
            handler: Arc::new(handler),
        }
    }

    /// Queue the event behind everything already routed for its chat.
    pub fn route(&mut self, event: IncomingEvent) {
        let chat = event.inbound.chat;

        let event = match self.lanes.get(&chat) {
            Some(lane) => match lane.tx.send(event) {
                Ok(()) => return,
                Err(SendError(event)) => event,
            },
            None => event,
        };

        // The old worker went idle and closed its queue. It may still be
        // finishing queued events, so the new worker waits for it first.
        let previous = self.lanes.remove(&chat).map(|lane| lane.worker);
        self.lanes.retain(|_, lane| !lane.worker.is_finished());

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_lane(chat, previous, event, rx, self.handler.clone()));
        self.lanes.insert(chat, Lane { tx, worker });
    }

    /// Close every lane and wait until all queued events are handled.
    pub async fn drain(&mut self) {
        for (chat, lane) in self.lanes.drain() {
            drop(lane.tx);
            if let Err(err) = lane.worker.await {
                log_warn!("update lane for chat {chat} ended abnormally: {err}");
            }
        }
    }

    #[cfg(test)]
    fn open_lanes(&self) -> usize {
        self.lanes.len()
    }
}

async fn run_lane<H, Fut>(
    chat: ChatId,
    previous: Option<JoinHandle<()>>,
    first: IncomingEvent,
    mut rx: UnboundedReceiver<IncomingEvent>,
    handler: Arc<H>,
) where
    H: Fn(IncomingEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if let Some(previous) = previous {
        if let Err(err) = previous.await {
            log_warn!("update lane for chat {chat} ended abnormally: {err}");
        }
    }

    handler(first).await;
    loop {
        match timeout(LANE_IDLE, rx.recv()).await {
            Ok(Some(event)) => handler(event).await,
            Ok(None) => break,
            Err(_) => {
                rx.close();
                while let Ok(event) = rx.try_recv() {
                    handler(event).await;
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;

    use super::*;
    use crate::conversation::state::Step;
    use crate::conversation::Peer;
    use crate::messenger::{Inbound, InboundPayload};
    use crate::sensing::{RefreshPolicy, SensorCache};
    use crate::testing::{MemoryStore, RecordingMessenger, ScriptedSource};

    fn event(inbound: Inbound) -> IncomingEvent {
        IncomingEvent {
            inbound,
            callback_id: None,
            prompt_message_id: None,
        }
    }

    fn collector() -> Arc<InputCollector> {
        let cache = Arc::new(SensorCache::new(
            Box::new(ScriptedSource::new()),
            RefreshPolicy::default(),
        ));
        Arc::new(InputCollector::new(
            cache,
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingMessenger::new()),
        ))
    }

    type Log = Arc<std::sync::Mutex<Vec<(ChatId, String)>>>;

    /// Handler that records each event, sleeping first when the text is "slow".
    fn recording(log: Log) -> impl Fn(IncomingEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        move |event: IncomingEvent| {
            let log = log.clone();
            let future: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
                let text = match event.inbound.payload {
                    InboundPayload::Text(text) | InboundPayload::Button(text) => text,
                };
                if text == "slow" {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                log.lock().unwrap().push((event.inbound.chat, text));
            });
            future
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn button_press_is_applied_after_the_command_before_it() {
        for _ in 0..200 {
            let collector = collector();
            let handler_collector = collector.clone();
            let mut lanes = UpdateLanes::new(move |event: IncomingEvent| {
                let collector = handler_collector.clone();
                async move {
                    collector.handle(event.inbound).await.unwrap();
                }
            });

            lanes.route(event(Inbound::text(1, "/setnotification")));
            lanes.route(event(Inbound::button(1, "temperature")));
            lanes.drain().await;

            let session = collector.session_of(Peer::private(1)).await;
            assert_eq!(session.step, Step::WaitingCondition);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn chats_are_ordered_but_independent() {
        let log: Log = Default::default();
        let mut lanes = UpdateLanes::new(recording(log.clone()));

        lanes.route(event(Inbound::text(1, "slow")));
        lanes.route(event(Inbound::text(1, "fast")));
        lanes.route(event(Inbound::text(2, "other")));
        assert_eq!(lanes.open_lanes(), 2);
        lanes.drain().await;

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                (2, "other".to_string()),
                (1, "slow".to_string()),
                (1, "fast".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn idle_lane_is_replaced_on_the_next_event() {
        let log: Log = Default::default();
        let mut lanes = UpdateLanes::new(recording(log.clone()));

        lanes.route(event(Inbound::text(1, "first")));
        tokio::time::sleep(LANE_IDLE * 2).await;
        lanes.route(event(Inbound::text(1, "second")));
        lanes.drain().await;

        let texts: Vec<String> = log.lock().unwrap().iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }
}
