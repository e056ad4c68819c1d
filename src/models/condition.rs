use std::fmt;

use serde::{Deserialize, Serialize};

/// Which environmental reading a notification watches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    Temperature,
    Humidity,
}

impl Parameter {
    pub const ALL: [Parameter; 2] = [Parameter::Temperature, Parameter::Humidity];

    /// Token used both in the database and as a button payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Humidity => "humidity",
        }
    }

    pub fn from_token(value: &str) -> Option<Self> {
        match value {
            "temperature" => Some(Parameter::Temperature),
            "humidity" => Some(Parameter::Humidity),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::Humidity => "Humidity",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Comparison applied between the current reading and the threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Less,
    Equal,
    Greater,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::Less, Condition::Equal, Condition::Greater];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Less => "less",
            Condition::Equal => "equal",
            Condition::Greater => "greater",
        }
    }

    pub fn from_token(value: &str) -> Option<Self> {
        match value {
            "less" => Some(Condition::Less),
            "equal" => Some(Condition::Equal),
            "greater" => Some(Condition::Greater),
            _ => None,
        }
    }

    /// Short symbol shown on the choice buttons.
    pub fn symbol(&self) -> &'static str {
        match self {
            Condition::Less => "<",
            Condition::Equal => "=",
            Condition::Greater => ">",
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Condition::Less => "less than",
            Condition::Equal => "equal to",
            Condition::Greater => "greater than",
        }
    }

    /// Exact comparison, `Equal` included: no epsilon is applied, so an
    /// equality condition only fires when the device reports the very value.
    #[allow(clippy::float_cmp)]
    pub fn holds(&self, current: f64, threshold: f64) -> bool {
        match self {
            Condition::Less => current < threshold,
            Condition::Equal => current == threshold,
            Condition::Greater => current > threshold,
        }
    }
}
