use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{Duration, Instant};

use crate::models::Reading;

use super::source::SensorSource;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// How a reported value of exactly zero is treated when merging a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroPolicy {
    /// Any observed value replaces the cached one, zero included.
    Observed,
    /// Zero counts as "not observed" and keeps the previous value.
    TreatZeroAsAbsent,
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub zero_policy: ZeroPolicy,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            zero_policy: ZeroPolicy::Observed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorLine {
    Temperature(f64),
    Humidity(f64),
}

/// Classify one raw device line. Noise, partial lines and bad encodings yield `None`.
pub fn parse_line(bytes: &[u8]) -> Option<SensorLine> {
    let text = std::str::from_utf8(bytes).ok()?.trim();
    let (prefix, rest) = (text.get(..2)?, text.get(2..)?);
    let value: f64 = rest.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    match prefix {
        "T:" => Some(SensorLine::Temperature(value)),
        "H:" => Some(SensorLine::Humidity(value)),
        _ => None,
    }
}

/// Values seen during a single refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observation {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub attempts: u32,
}

impl Observation {
    fn record(&mut self, line: SensorLine) {
        match line {
            SensorLine::Temperature(value) => self.temperature = Some(value),
            SensorLine::Humidity(value) => self.humidity = Some(value),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some()
    }

    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none()
    }
}

/// One bounded poll of the device: flush stale lines, then read until both
/// fields are seen or the attempt budget runs out.
pub fn run_refresh_cycle(source: &mut dyn SensorSource, max_attempts: u32) -> Observation {
    if let Err(err) = source.discard_buffered() {
        log_debug!("discarding buffered sensor lines failed: {err}");
    }

    let mut observation = Observation::default();
    for _ in 0..max_attempts {
        observation.attempts += 1;
        match source.read_line() {
            Ok(Some(bytes)) => {
                if let Some(line) = parse_line(&bytes) {
                    observation.record(line);
                }
            }
            Ok(None) => {}
            Err(err) => log_debug!("sensor read attempt {} failed: {err}", observation.attempts),
        }

        if observation.is_complete() {
            break;
        }
    }
    observation
}

fn merge(previous: Option<f64>, observed: Option<f64>, policy: ZeroPolicy) -> Option<f64> {
    match observed {
        Some(value) if policy == ZeroPolicy::TreatZeroAsAbsent && value == 0.0 => previous,
        Some(value) => Some(value),
        None => previous,
    }
}

struct CacheState {
    last: Reading,
    last_refresh_at: Option<Instant>,
}

/// Debounced view of the sensor board.
///
/// `read` only touches the device when the cached pair is older than the
/// refresh interval. The state lock is held across the whole
/// refresh-and-publish step, so concurrent stale readers trigger one poll.
pub struct SensorCache {
    source: Arc<Mutex<Box<dyn SensorSource>>>,
    state: AsyncMutex<CacheState>,
    policy: RefreshPolicy,
}

impl SensorCache {
    pub fn new(source: Box<dyn SensorSource>, policy: RefreshPolicy) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            state: AsyncMutex::new(CacheState {
                last: Reading::empty(Utc::now()),
                last_refresh_at: None,
            }),
            policy,
        }
    }

    /// Current best reading. Never fails; a dead device yields stale or absent values.
    pub async fn read(&self) -> Reading {
        let mut state = self.state.lock().await;

        let stale = state
            .last_refresh_at
            .map_or(true, |at| at.elapsed() >= self.policy.interval);
        if !stale {
            return state.last;
        }

        let observation = self.poll_device().await;

        if observation.is_empty() {
            log_info!(
                "sensor refresh observed nothing in {} attempts; keeping cached values",
                observation.attempts
            );
        } else {
            let zero_policy = self.policy.zero_policy;
            state.last = Reading {
                temperature: merge(state.last.temperature, observation.temperature, zero_policy),
                humidity: merge(state.last.humidity, observation.humidity, zero_policy),
                observed_at: Utc::now(),
            };
            log_info!(
                "sensor refresh: temperature={:?} humidity={:?} ({} attempts)",
                observation.temperature,
                observation.humidity,
                observation.attempts
            );
        }

        state.last_refresh_at = Some(Instant::now());
        state.last
    }

    #[cfg(test)]
    pub async fn last_refresh_at(&self) -> Option<Instant> {
        self.state.lock().await.last_refresh_at
    }

    async fn poll_device(&self) -> Observation {
        let source = Arc::clone(&self.source);
        let max_attempts = self.policy.max_attempts;

        let result = tokio::task::spawn_blocking(move || {
            let mut guard = source.lock().unwrap_or_else(PoisonError::into_inner);
            run_refresh_cycle(guard.as_mut(), max_attempts)
        })
        .await;

        match result {
            Ok(observation) => observation,
            Err(err) => {
                log_error!("sensor refresh worker failed: {err}");
                Observation::default()
            }
        }
    }
}
