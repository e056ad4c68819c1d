use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

use crate::sensing::{RefreshPolicy, ZeroPolicy};

const CONFIG_PATH_VAR: &str = "SENSORBOT_CONFIG";

/// Runtime configuration.
///
/// Loaded from an optional JSON file named by `SENSORBOT_CONFIG`, then
/// overridden field by field from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub token: Option<String>,
    /// Serial device path. Discovered under `/dev/serial/by-id` when unset.
    pub device_path: Option<PathBuf>,
    pub database_path: PathBuf,
    pub check_interval_secs: u64,
    pub refresh_interval_secs: u64,
    pub sensor_max_attempts: u32,
    pub sensor_read_timeout_ms: u64,
    pub simulate_sensors: bool,
    /// Legacy behaviour: a reported `0.0` leaves the cached value untouched.
    pub zero_is_absent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            device_path: None,
            database_path: PathBuf::from("sensorbot.sqlite3"),
            check_interval_secs: 60,
            refresh_interval_secs: 60,
            sensor_max_attempts: 10,
            sensor_read_timeout_ms: 1000,
            simulate_sensors: false,
            zero_is_absent: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self> {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config in {}", path.display()))
    }

    /// Apply `KEY=value` overrides from any lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TOKEN") {
            self.token = Some(token);
        }
        if let Some(port) = lookup("PORT") {
            self.device_path = Some(PathBuf::from(port));
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("CHECK_INTERVAL") {
            self.check_interval_secs = parse_number("CHECK_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("REFRESH_INTERVAL") {
            self.refresh_interval_secs = parse_number("REFRESH_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("SENSOR_MAX_ATTEMPTS") {
            self.sensor_max_attempts = parse_number("SENSOR_MAX_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = lookup("SENSOR_READ_TIMEOUT_MS") {
            self.sensor_read_timeout_ms = parse_number("SENSOR_READ_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("SIMULATE_SENSORS") {
            self.simulate_sensors = parse_flag(&raw);
        }
        if let Some(raw) = lookup("ZERO_IS_ABSENT") {
            self.zero_is_absent = parse_flag(&raw);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            bail!("CHECK_INTERVAL must be greater than zero");
        }
        if self.refresh_interval_secs == 0 {
            bail!("REFRESH_INTERVAL must be greater than zero");
        }
        if self.sensor_max_attempts == 0 {
            bail!("SENSOR_MAX_ATTEMPTS must be greater than zero");
        }
        Ok(())
    }

    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => bail!("TOKEN is required to connect to the chat transport"),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor_read_timeout_ms)
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            interval: Duration::from_secs(self.refresh_interval_secs),
            max_attempts: self.sensor_max_attempts,
            zero_policy: if self.zero_is_absent {
                ZeroPolicy::TreatZeroAsAbsent
            } else {
                ZeroPolicy::Observed
            },
        }
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
}

fn parse_flag(raw: &str) -> bool {
    raw == "1" || raw.eq_ignore_ascii_case("true")
}
