use std::{collections::HashMap, fmt, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::db::NotificationStore;
use crate::error::BotResult;
use crate::messenger::{Inbound, InboundPayload, Keyboard, Messenger};
use crate::models::{ChatId, Condition, Parameter, UserId};
use crate::sensing::SensorCache;

use super::commands::Command;
use super::prompts::{self, BACK_PAYLOAD};
use super::state::{Session, Step};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// How a prompt reaches the user: button presses rewrite the prompt they
/// came from, typed replies get a fresh message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Send,
    Edit,
}

/// A user talking in one chat. Records belong to `owner`; replies go to `chat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Peer {
    pub owner: UserId,
    pub chat: ChatId,
}

impl Peer {
    #[cfg(test)]
    pub fn private(owner: UserId) -> Self {
        Self { owner, chat: owner }
    }
}

impl From<&Inbound> for Peer {
    fn from(inbound: &Inbound) -> Self {
        Self {
            owner: inbound.sender,
            chat: inbound.chat,
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.owner == self.chat {
            write!(f, "user {}", self.owner)
        } else {
            write!(f, "user {} in chat {}", self.owner, self.chat)
        }
    }
}

/// Drives the notification dialogs, one session per user and chat.
///
/// Events for the same session are applied one at a time; other sessions
/// proceed independently. Arrival order is the caller's job. Idle sessions
/// are dropped from the map.
pub struct InputCollector {
    sessions: Mutex<HashMap<Peer, Arc<Mutex<Session>>>>,
    cache: Arc<SensorCache>,
    store: Arc<dyn NotificationStore>,
    messenger: Arc<dyn Messenger>,
}

impl InputCollector {
    pub fn new(
        cache: Arc<SensorCache>,
        store: Arc<dyn NotificationStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            cache,
            store,
            messenger,
        }
    }

    /// Apply one inbound event. Errors are delivery failures of the replies;
    /// the session transition has already happened by then.
    pub async fn handle(&self, inbound: Inbound) -> BotResult<()> {
        let peer = Peer::from(&inbound);
        let session = self.session_for(peer).await;

        let result = {
            let mut guard = session.lock().await;
            self.dispatch(peer, &mut guard, inbound.payload).await
        };

        self.release(peer, session).await;
        result
    }

    #[cfg(test)]
    pub async fn session_of(&self, peer: Peer) -> Session {
        let entry = self.sessions.lock().await.get(&peer).cloned();
        match entry {
            Some(session) => session.lock().await.clone(),
            None => Session::new(),
        }
    }

    #[cfg(test)]
    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn session_for(&self, peer: Peer) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(peer)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Drop the entry once it is idle and no other event for the session holds it.
    async fn release(&self, peer: Peer, session: Arc<Mutex<Session>>) {
        let mut sessions = self.sessions.lock().await;
        let Some(entry) = sessions.get(&peer) else {
            return;
        };
        if !Arc::ptr_eq(entry, &session) || Arc::strong_count(&session) > 2 {
            return;
        }
        let idle = session
            .try_lock()
            .map(|guard| guard.is_idle())
            .unwrap_or(false);
        if idle {
            sessions.remove(&peer);
        }
    }

    async fn dispatch(
        &self,
        peer: Peer,
        session: &mut Session,
        payload: InboundPayload,
    ) -> BotResult<()> {
        match payload {
            InboundPayload::Text(text) => match Command::parse(&text) {
                Some(command) => self.run_command(peer, session, command).await,
                None => self.on_text(peer, session, text.trim()).await,
            },
            InboundPayload::Button(payload) => self.on_button(peer, session, payload.trim()).await,
        }
    }

    async fn run_command(
        &self,
        peer: Peer,
        session: &mut Session,
        command: Command,
    ) -> BotResult<()> {
        log_debug!("{peer} sent {command:?} in {:?}", session.step);

        match command {
            Command::Start => self.send(peer, prompts::GREETING, None).await,
            Command::Temperature => self.report_current(peer, Parameter::Temperature).await,
            Command::Humidity => self.report_current(peer, Parameter::Humidity).await,
            Command::Notifications => self.list_notifications(peer).await,
            Command::SetNotification => {
                session.begin_set();
                self.respond(
                    peer,
                    Reply::Send,
                    prompts::PARAMETER_PROMPT,
                    Some(&prompts::parameter_keyboard()),
                )
                .await
            }
            Command::DeleteNotification => self.start_delete(peer, session).await,
            Command::Cancel => {
                if session.is_idle() {
                    self.send(peer, prompts::NOTHING_TO_CANCEL, None).await
                } else {
                    session.reset();
                    self.send(peer, prompts::CANCELLED, None).await
                }
            }
        }
    }

    async fn on_text(&self, peer: Peer, session: &mut Session, text: &str) -> BotResult<()> {
        match session.step {
            Step::Idle => self.send(peer, prompts::HELP_HINT, None).await,
            Step::WaitingParameter => {
                self.on_parameter_choice(peer, session, &text.to_lowercase(), Reply::Send)
                    .await
            }
            Step::WaitingCondition => {
                self.on_condition_choice(peer, session, &text.to_lowercase(), Reply::Send)
                    .await
            }
            Step::WaitingValue => match parse_threshold(text) {
                Some(threshold) => self.commit(peer, session, threshold).await,
                None => self.send(peer, prompts::INVALID_VALUE, None).await,
            },
            Step::WaitingDeleteIndex { .. } => self.on_delete_index(peer, session, text).await,
        }
    }

    async fn on_button(&self, peer: Peer, session: &mut Session, payload: &str) -> BotResult<()> {
        match session.step {
            Step::WaitingParameter => {
                self.on_parameter_choice(peer, session, payload, Reply::Edit)
                    .await
            }
            Step::WaitingCondition => {
                self.on_condition_choice(peer, session, payload, Reply::Edit)
                    .await
            }
            _ => self.send(peer, prompts::STALE_BUTTON, None).await,
        }
    }

    async fn on_parameter_choice(
        &self,
        peer: Peer,
        session: &mut Session,
        token: &str,
        reply: Reply,
    ) -> BotResult<()> {
        let keyboard = prompts::parameter_keyboard();
        if token == BACK_PAYLOAD {
            return self
                .respond(peer, reply, prompts::PARAMETER_PROMPT, Some(&keyboard))
                .await;
        }

        match Parameter::from_token(token) {
            Some(parameter) => {
                session.choose_parameter(parameter);
                self.respond(
                    peer,
                    reply,
                    prompts::CONDITION_PROMPT,
                    Some(&prompts::condition_keyboard()),
                )
                .await
            }
            None => self.send(peer, prompts::CHOOSE_OPTION, Some(&keyboard)).await,
        }
    }

    async fn on_condition_choice(
        &self,
        peer: Peer,
        session: &mut Session,
        token: &str,
        reply: Reply,
    ) -> BotResult<()> {
        if token == BACK_PAYLOAD {
            session.back_to_parameter();
            return self
                .respond(
                    peer,
                    reply,
                    prompts::PARAMETER_PROMPT,
                    Some(&prompts::parameter_keyboard()),
                )
                .await;
        }

        let condition = Condition::from_token(token).or_else(|| {
            Condition::ALL
                .into_iter()
                .find(|condition| condition.symbol() == token)
        });

        match condition {
            Some(condition) => {
                session.choose_condition(condition);
                self.respond(peer, reply, prompts::VALUE_PROMPT, None).await
            }
            None => {
                self.send(
                    peer,
                    prompts::CHOOSE_OPTION,
                    Some(&prompts::condition_keyboard()),
                )
                .await
            }
        }
    }

    async fn commit(&self, peer: Peer, session: &mut Session, threshold: f64) -> BotResult<()> {
        let draft = session.draft;
        session.reset();

        let Some(record) = draft.complete(peer.owner, threshold, Utc::now()) else {
            log_error!("{peer} reached the value step with an incomplete draft");
            return self.send(peer, prompts::GENERIC_FAILURE, None).await;
        };

        match self.store.insert(record.clone()).await {
            Ok(id) => {
                log_info!("{peer} created notification {id}");
                let saved = record.with_id(id);
                self.send(peer, &prompts::notification_saved(&saved), None)
                    .await
            }
            Err(err) => {
                log_error!("failed to save notification for {peer}: {err}");
                self.send(peer, prompts::GENERIC_FAILURE, None).await
            }
        }
    }

    async fn start_delete(&self, peer: Peer, session: &mut Session) -> BotResult<()> {
        match self.store.list_by_owner(peer.owner).await {
            Ok(notifications) if notifications.is_empty() => {
                session.reset();
                self.send(peer, prompts::NO_NOTIFICATIONS_TO_DELETE, None)
                    .await
            }
            Ok(notifications) => {
                session.begin_delete(notifications.iter().map(|n| n.id).collect());
                let text = format!(
                    "{}\n\n{}",
                    prompts::notification_list(prompts::LIST_HEADER, &notifications),
                    prompts::DELETE_PROMPT
                );
                self.send(peer, &text, None).await
            }
            Err(err) => {
                log_error!("failed to list notifications for {peer}: {err}");
                session.reset();
                self.send(peer, prompts::GENERIC_FAILURE, None).await
            }
        }
    }

    async fn on_delete_index(&self, peer: Peer, session: &mut Session, text: &str) -> BotResult<()> {
        let selected = text
            .parse::<usize>()
            .ok()
            .and_then(|index| session.selected_for_delete(index));
        let Some(id) = selected else {
            return self.send(peer, prompts::INVALID_INDEX, None).await;
        };

        match self.store.delete_by_owner_and_id(peer.owner, id).await {
            Ok(true) => {
                log_info!("{peer} deleted notification {id}");
                session.reset();
                self.send(peer, prompts::DELETED, None).await
            }
            Ok(false) => self.send(peer, prompts::NOT_FOUND, None).await,
            Err(err) => {
                log_error!("failed to delete notification {id} for {peer}: {err}");
                session.reset();
                self.send(peer, prompts::GENERIC_FAILURE, None).await
            }
        }
    }

    async fn report_current(&self, peer: Peer, parameter: Parameter) -> BotResult<()> {
        let reading = self.cache.read().await;
        let text = prompts::current_value(parameter, reading.value_of(parameter));
        self.send(peer, &text, None).await
    }

    async fn list_notifications(&self, peer: Peer) -> BotResult<()> {
        match self.store.list_by_owner(peer.owner).await {
            Ok(notifications) if notifications.is_empty() => {
                self.send(peer, prompts::NO_NOTIFICATIONS, None).await
            }
            Ok(notifications) => {
                let text = prompts::notification_list(prompts::LIST_HEADER, &notifications);
                self.send(peer, &text, None).await
            }
            Err(err) => {
                log_error!("failed to list notifications for {peer}: {err}");
                self.send(peer, prompts::GENERIC_FAILURE, None).await
            }
        }
    }

    async fn send(&self, peer: Peer, text: &str, keyboard: Option<&Keyboard>) -> BotResult<()> {
        self.messenger.send(peer.chat, text, keyboard).await
    }

    async fn respond(
        &self,
        peer: Peer,
        reply: Reply,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> BotResult<()> {
        match reply {
            Reply::Send => self.messenger.send(peer.chat, text, keyboard).await,
            Reply::Edit => self.messenger.edit_last_prompt(peer.chat, text, keyboard).await,
        }
    }
}

fn parse_threshold(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewNotification;
    use crate::sensing::RefreshPolicy;
    use crate::testing::{MemoryStore, RecordingMessenger, ScriptedSource, Sent};

    struct Fixture {
        collector: InputCollector,
        store: Arc<MemoryStore>,
        messenger: Arc<RecordingMessenger>,
    }

    fn fixture(lines: &[&str]) -> Fixture {
        let source = ScriptedSource::new();
        source.push_lines(lines);
        let cache = Arc::new(SensorCache::new(Box::new(source), RefreshPolicy::default()));
        let store = Arc::new(MemoryStore::new());
        let messenger = Arc::new(RecordingMessenger::new());
        Fixture {
            collector: InputCollector::new(cache, store.clone(), messenger.clone()),
            store,
            messenger,
        }
    }

    impl Fixture {
        async fn text(&self, user: UserId, text: &str) {
            self.collector.handle(Inbound::text(user, text)).await.unwrap();
        }

        async fn press(&self, user: UserId, payload: &str) {
            self.collector
                .handle(Inbound::button(user, payload))
                .await
                .unwrap();
        }

        async fn step(&self, user: UserId) -> Step {
            self.collector.session_of(Peer::private(user)).await.step
        }

        fn last_text(&self) -> String {
            self.messenger.last().unwrap().text().to_string()
        }

        async fn seed(&self, owner_id: UserId, parameter: Parameter, threshold: f64) {
            self.store
                .insert(NewNotification {
                    owner_id,
                    parameter,
                    condition: Condition::Greater,
                    threshold,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn button_flow_creates_a_notification() {
        let f = fixture(&[]);

        f.text(1, "/setnotification").await;
        let Some(Sent::Message { text, keyboard, .. }) = f.messenger.last() else {
            panic!("expected a new message");
        };
        assert_eq!(text, prompts::PARAMETER_PROMPT);
        let payloads: Vec<String> = keyboard.unwrap().payloads().map(String::from).collect();
        assert_eq!(payloads, vec!["temperature", "humidity"]);

        f.press(1, "temperature").await;
        let Some(Sent::Edit { text, keyboard, .. }) = f.messenger.last() else {
            panic!("expected an edited prompt");
        };
        assert_eq!(text, prompts::CONDITION_PROMPT);
        let payloads: Vec<String> = keyboard.unwrap().payloads().map(String::from).collect();
        assert_eq!(payloads, vec!["less", "equal", "greater", "back"]);

        f.press(1, "greater").await;
        assert!(matches!(f.messenger.last(), Some(Sent::Edit { .. })));
        assert_eq!(f.last_text(), prompts::VALUE_PROMPT);
        assert_eq!(f.step(1).await, Step::WaitingValue);

        f.text(1, "25").await;
        assert_eq!(f.last_text(), "Notification set: Temperature greater than 25");

        let stored = f.store.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].owner_id, 1);
        assert_eq!(stored[0].parameter, Parameter::Temperature);
        assert_eq!(stored[0].condition, Condition::Greater);
        assert_eq!(stored[0].threshold, 25.0);
        assert_eq!(f.step(1).await, Step::Idle);
        assert_eq!(f.collector.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn typed_choices_are_accepted() {
        let f = fixture(&[]);

        f.text(2, "/setnotification").await;
        f.text(2, "Humidity").await;
        assert!(matches!(f.messenger.last(), Some(Sent::Message { .. })));
        f.text(2, "<").await;
        f.text(2, "35.5").await;

        let stored = f.store.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].parameter, Parameter::Humidity);
        assert_eq!(stored[0].condition, Condition::Less);
        assert_eq!(stored[0].threshold, 35.5);
    }

    #[tokio::test]
    async fn back_returns_to_parameter_choice() {
        let f = fixture(&[]);

        f.text(1, "/setnotification").await;
        f.press(1, "humidity").await;
        f.press(1, "back").await;

        assert_eq!(f.step(1).await, Step::WaitingParameter);
        assert_eq!(f.last_text(), prompts::PARAMETER_PROMPT);
        assert!(f.collector.session_of(Peer::private(1)).await.draft.condition.is_none());

        f.press(1, "temperature").await;
        f.press(1, "equal").await;
        f.text(1, "21").await;
        assert_eq!(f.store.all()[0].parameter, Parameter::Temperature);
    }

    #[tokio::test]
    async fn invalid_threshold_reprompts() {
        let f = fixture(&[]);

        f.text(1, "/setnotification").await;
        f.press(1, "temperature").await;
        f.press(1, "less").await;

        for bad in ["abc", "", "NaN", "inf"] {
            f.text(1, bad).await;
            assert_eq!(f.last_text(), prompts::INVALID_VALUE);
            assert_eq!(f.step(1).await, Step::WaitingValue);
        }
        assert!(f.store.all().is_empty());
    }

    #[tokio::test]
    async fn unexpected_choice_keeps_state() {
        let f = fixture(&[]);

        f.text(1, "/setnotification").await;
        f.press(1, "pressure").await;
        assert_eq!(f.last_text(), prompts::CHOOSE_OPTION);
        assert_eq!(f.step(1).await, Step::WaitingParameter);

        f.press(1, "humidity").await;
        f.text(1, "maybe").await;
        assert_eq!(f.last_text(), prompts::CHOOSE_OPTION);
        assert_eq!(f.step(1).await, Step::WaitingCondition);
    }

    #[tokio::test]
    async fn restarting_discards_the_draft() {
        let f = fixture(&[]);

        f.text(1, "/setnotification").await;
        f.press(1, "temperature").await;
        f.press(1, "greater").await;
        f.text(1, "/setnotification").await;

        let session = f.collector.session_of(Peer::private(1)).await;
        assert_eq!(session.step, Step::WaitingParameter);
        assert!(session.draft.parameter.is_none());
    }

    #[tokio::test]
    async fn read_only_commands_leave_the_flow_untouched() {
        let f = fixture(&["T:21.5"]);

        f.text(1, "/setnotification").await;
        f.press(1, "temperature").await;
        f.press(1, "less").await;

        f.text(1, "/temperature").await;
        assert_eq!(f.last_text(), "Current temperature: 21.5");
        f.text(1, "/humidity").await;
        assert_eq!(f.last_text(), "No humidity data yet.");
        f.text(1, "/notifications").await;
        assert_eq!(f.last_text(), prompts::NO_NOTIFICATIONS);

        assert_eq!(f.step(1).await, Step::WaitingValue);
        f.text(1, "18").await;
        assert_eq!(f.store.all().len(), 1);
    }

    #[tokio::test]
    async fn cancel_resets_only_active_flows() {
        let f = fixture(&[]);

        f.text(1, "/cancel").await;
        assert_eq!(f.last_text(), prompts::NOTHING_TO_CANCEL);

        f.text(1, "/setnotification").await;
        f.press(1, "humidity").await;
        f.text(1, "/cancel").await;
        assert_eq!(f.last_text(), prompts::CANCELLED);
        assert_eq!(f.step(1).await, Step::Idle);
        assert_eq!(f.collector.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn idle_text_and_stale_buttons_get_hints() {
        let f = fixture(&[]);

        f.text(1, "hello").await;
        assert_eq!(f.last_text(), prompts::HELP_HINT);

        f.press(1, "temperature").await;
        assert_eq!(f.last_text(), prompts::STALE_BUTTON);
        assert_eq!(f.step(1).await, Step::Idle);
    }

    #[tokio::test]
    async fn notifications_lists_only_own_records() {
        let f = fixture(&[]);
        f.seed(1, Parameter::Temperature, 25.0).await;
        f.seed(2, Parameter::Humidity, 40.0).await;
        f.seed(1, Parameter::Humidity, 60.0).await;

        f.text(1, "/notifications").await;

        assert_eq!(
            f.last_text(),
            "Your active notifications:\n\
             (1) Temperature greater than 25\n\
             (2) Humidity greater than 60"
        );
    }

    #[tokio::test]
    async fn delete_flow_removes_the_selected_record() {
        let f = fixture(&[]);
        f.seed(1, Parameter::Temperature, 25.0).await;
        f.seed(1, Parameter::Humidity, 60.0).await;

        f.text(1, "/deletenotification").await;
        assert!(f.last_text().contains("(2) Humidity greater than 60"));
        assert!(f.last_text().ends_with(prompts::DELETE_PROMPT));
        assert!(matches!(f.step(1).await, Step::WaitingDeleteIndex { .. }));

        f.text(1, "2").await;
        assert_eq!(f.last_text(), prompts::DELETED);
        assert_eq!(f.step(1).await, Step::Idle);

        let remaining = f.store.all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].parameter, Parameter::Temperature);
    }

    #[tokio::test]
    async fn delete_with_nothing_stored_stays_idle() {
        let f = fixture(&[]);

        f.text(1, "/deletenotification").await;

        assert_eq!(f.last_text(), prompts::NO_NOTIFICATIONS_TO_DELETE);
        assert_eq!(f.step(1).await, Step::Idle);
    }

    #[tokio::test]
    async fn delete_rejects_bad_indexes() {
        let f = fixture(&[]);
        f.seed(1, Parameter::Temperature, 25.0).await;

        f.text(1, "/deletenotification").await;
        for bad in ["0", "2", "-1", "first"] {
            f.text(1, bad).await;
            assert_eq!(f.last_text(), prompts::INVALID_INDEX);
        }
        assert!(matches!(f.step(1).await, Step::WaitingDeleteIndex { .. }));
        assert_eq!(f.store.all().len(), 1);
    }

    #[tokio::test]
    async fn vanished_record_reports_not_found() {
        let f = fixture(&[]);
        f.seed(1, Parameter::Temperature, 25.0).await;

        f.text(1, "/deletenotification").await;
        let id = f.store.all()[0].id;
        f.store.delete_by_owner_and_id(1, id).await.unwrap();

        f.text(1, "1").await;
        assert_eq!(f.last_text(), prompts::NOT_FOUND);
        assert!(matches!(f.step(1).await, Step::WaitingDeleteIndex { .. }));
    }

    #[tokio::test]
    async fn storage_failure_on_save_returns_to_idle() {
        let f = fixture(&[]);

        f.text(1, "/setnotification").await;
        f.press(1, "temperature").await;
        f.press(1, "greater").await;
        f.store.set_unavailable(true);
        f.text(1, "30").await;

        assert_eq!(f.last_text(), prompts::GENERIC_FAILURE);
        assert_eq!(f.step(1).await, Step::Idle);
        f.store.set_unavailable(false);
        assert!(f.store.all().is_empty());
    }

    #[tokio::test]
    async fn sessions_are_independent_per_user() {
        let f = fixture(&[]);

        f.text(1, "/setnotification").await;
        f.press(1, "humidity").await;
        f.text(2, "/setnotification").await;

        assert_eq!(f.step(1).await, Step::WaitingCondition);
        assert_eq!(f.step(2).await, Step::WaitingParameter);
        assert_eq!(f.collector.active_sessions().await, 2);
        assert_eq!(f.messenger.to(2).len(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_returned_to_the_caller() {
        let f = fixture(&[]);
        f.messenger.fail_for(3);

        let result = f.collector.handle(Inbound::text(3, "/setnotification")).await;

        assert!(result.is_err());
        assert_eq!(f.step(3).await, Step::WaitingParameter);
    }

    #[tokio::test]
    async fn group_dialogs_reply_to_the_group_and_store_for_the_sender() {
        let f = fixture(&[]);
        let peer = Peer { owner: 7, chat: -100 };

        f.collector
            .handle(Inbound::text(7, "/setnotification").in_chat(-100))
            .await
            .unwrap();
        for payload in ["temperature", "greater"] {
            f.collector
                .handle(Inbound::button(7, payload).in_chat(-100))
                .await
                .unwrap();
        }
        f.collector
            .handle(Inbound::text(7, "30").in_chat(-100))
            .await
            .unwrap();

        assert!(f.messenger.to(7).is_empty());
        assert_eq!(f.messenger.to(-100).len(), f.messenger.sent().len());
        assert_eq!(f.last_text(), "Notification set: Temperature greater than 30");
        assert_eq!(f.collector.session_of(peer).await.step, Step::Idle);

        let stored = f.store.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].owner_id, 7);
    }

    #[tokio::test]
    async fn private_and_group_dialogs_do_not_share_a_session() {
        let f = fixture(&[]);

        f.text(7, "/setnotification").await;
        f.press(7, "humidity").await;
        f.collector
            .handle(Inbound::text(7, "/setnotification").in_chat(-100))
            .await
            .unwrap();

        let group = Peer { owner: 7, chat: -100 };
        assert_eq!(f.step(7).await, Step::WaitingCondition);
        assert_eq!(f.collector.session_of(group).await.step, Step::WaitingParameter);
        assert_eq!(f.collector.active_sessions().await, 2);
    }
}
