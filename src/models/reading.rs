use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Parameter;

/// Last known pair of environmental values published by the sensor cache.
///
/// A field is `None` until the device has reported it at least once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    pub fn empty(observed_at: DateTime<Utc>) -> Self {
        Self {
            temperature: None,
            humidity: None,
            observed_at,
        }
    }

    pub fn value_of(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Humidity => self.humidity,
        }
    }
}
