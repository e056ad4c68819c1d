use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::engine::ConditionEngine;

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Evaluate notifications every `period` until cancelled.
///
/// The first pass runs immediately. Cancellation is only observed between
/// passes; a pass in flight always completes.
pub async fn alert_loop(
    engine: Arc<ConditionEngine>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("alert loop started (period {}s)", period.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.run_cycle().await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("alert loop shutting down");
                break;
            }
        }
    }
}
