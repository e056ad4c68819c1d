use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{Condition, Parameter};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_parameter(value: &str) -> Result<Parameter> {
    Parameter::from_token(value).ok_or_else(|| anyhow!("unknown parameter '{value}'"))
}

pub fn parse_condition(value: &str) -> Result<Condition> {
    Condition::from_token(value).ok_or_else(|| anyhow!("unknown condition '{value}'"))
}
