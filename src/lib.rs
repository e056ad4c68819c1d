mod alerts;
mod conversation;
mod db;
mod error;
mod messenger;
mod models;
mod sensing;
mod settings;
mod telegram;
mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use alerts::{AlertController, ConditionEngine};
use conversation::InputCollector;
use db::Database;
use sensing::{discover_device, DeviceLineReader, SensorCache, SensorSource, SimulatedSource};
use settings::Config;
use telegram::{poll_updates, TelegramClient};

const ENABLE_LOGS: bool = true;

/// Long-lived services shared by the alert loop and the update poller.
struct AppState {
    config: Config,
    cache: Arc<SensorCache>,
    db: Arc<Database>,
    telegram: Arc<TelegramClient>,
}

impl AppState {
    fn build(config: Config) -> Result<Self> {
        let token = config.require_token()?.to_string();
        let db = Database::new(config.database_path.clone())?;
        log_info!("notifications stored in {}", db.path().display());

        let source = open_sensor_source(&config)?;
        let cache = SensorCache::new(source, config.refresh_policy());

        Ok(Self {
            cache: Arc::new(cache),
            db: Arc::new(db),
            telegram: Arc::new(TelegramClient::new(&token)),
            config,
        })
    }

    fn engine(&self) -> Arc<ConditionEngine> {
        Arc::new(ConditionEngine::new(
            self.cache.clone(),
            self.db.clone(),
            self.telegram.clone(),
        ))
    }

    fn collector(&self) -> Arc<InputCollector> {
        Arc::new(InputCollector::new(
            self.cache.clone(),
            self.db.clone(),
            self.telegram.clone(),
        ))
    }
}

/// Simulation when asked for, otherwise the configured or discovered
/// device. Falls back to simulation when nothing is plugged in.
fn open_sensor_source(config: &Config) -> Result<Box<dyn SensorSource>> {
    if config.simulate_sensors {
        log_info!("using simulated sensor readings");
        return Ok(Box::new(SimulatedSource::new()));
    }

    let path = match &config.device_path {
        Some(path) => Some(path.clone()),
        None => discover_device(),
    };

    match path {
        Some(path) => {
            let reader = DeviceLineReader::open(&path, config.read_timeout())?;
            Ok(Box::new(reader))
        }
        None => {
            log_warn!("no sensor device found; falling back to simulated readings");
            Ok(Box::new(SimulatedSource::new()))
        }
    }
}

pub async fn run() -> Result<()> {
    utils::init_logging();
    log_info!("sensorbot starting up...");

    let config = Config::load()?;
    let state = AppState::build(config)?;

    let root_token = CancellationToken::new();
    let mut alert_controller = AlertController::new();
    alert_controller.start(state.engine(), state.config.check_interval(), &root_token)?;

    let poller = tokio::spawn(poll_updates(
        state.telegram.clone(),
        state.collector(),
        root_token.child_token(),
    ));

    match tokio::signal::ctrl_c().await {
        Ok(()) => log_info!("shutdown requested"),
        Err(err) => log_error!("failed to listen for ctrl-c, shutting down: {err}"),
    }

    root_token.cancel();
    alert_controller.stop().await?;
    poller.await.context("update poller failed to join")?;

    log_info!("sensorbot stopped");
    Ok(())
}
