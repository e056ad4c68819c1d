use std::sync::Arc;

use crate::db::{Notification, NotificationStore};
use crate::messenger::Messenger;
use crate::sensing::SensorCache;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub evaluated: usize,
    /// Matches delivered to their owner.
    pub fired: usize,
    /// Matches whose delivery failed.
    pub failed: usize,
    /// The store could not be read; nothing was evaluated.
    pub skipped: bool,
}

pub fn format_alert(notification: &Notification, current: f64) -> String {
    format!("Notification triggered: {notification} (current value: {current})")
}

/// Matches every stored notification against the cached reading.
///
/// There is no acknowledgement: a condition that stays true fires again on
/// every pass.
pub struct ConditionEngine {
    cache: Arc<SensorCache>,
    store: Arc<dyn NotificationStore>,
    messenger: Arc<dyn Messenger>,
}

impl ConditionEngine {
    pub fn new(
        cache: Arc<SensorCache>,
        store: Arc<dyn NotificationStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            cache,
            store,
            messenger,
        }
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let reading = self.cache.read().await;

        let active = match self.store.list_active().await {
            Ok(active) => active,
            Err(err) => {
                log_error!("alert cycle skipped, cannot list notifications: {err}");
                return CycleReport {
                    skipped: true,
                    ..CycleReport::default()
                };
            }
        };

        let mut report = CycleReport {
            evaluated: active.len(),
            ..CycleReport::default()
        };

        for notification in &active {
            let Some(current) = reading.value_of(notification.parameter) else {
                continue;
            };
            if !notification.matches(current) {
                continue;
            }

            let text = format_alert(notification, current);
            match self.messenger.send(notification.owner_id, &text, None).await {
                Ok(()) => {
                    log_debug!(
                        "notification {} fired for user {}",
                        notification.id,
                        notification.owner_id
                    );
                    report.fired += 1;
                }
                Err(err) => {
                    log_error!(
                        "failed to deliver notification {} to user {}: {err}",
                        notification.id,
                        notification.owner_id
                    );
                    report.failed += 1;
                }
            }
        }

        log_info!(
            "alert cycle: evaluated={} fired={} failed={}",
            report.evaluated,
            report.fired,
            report.failed
        );
        report
    }
}
