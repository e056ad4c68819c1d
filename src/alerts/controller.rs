use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::engine::ConditionEngine;
use super::loop_worker::alert_loop;

/// Owns the background alert loop task.
pub struct AlertController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl AlertController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the loop with a child of `parent`, so process shutdown also stops it.
    pub fn start(
        &mut self,
        engine: Arc<ConditionEngine>,
        period: Duration,
        parent: &CancellationToken,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("alert loop already running");
        }

        let cancel_token = parent.child_token();
        let handle = tokio::spawn(alert_loop(engine, period, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("Alert loop scheduled every {}s", period.as_secs());
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("alert loop task failed to join")
        } else {
            Ok(())
        }
    }
}

impl Default for AlertController {
    fn default() -> Self {
        Self::new()
    }
}
