//! Notification data model.
//!
//! A notification is fully formed before it reaches the store: the
//! conversation only builds a `NewNotification` once parameter, condition
//! and threshold are all known.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Condition, NotificationId, Parameter, UserId};

/// A persisted threshold condition owned by one chat user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub owner_id: UserId,
    pub parameter: Parameter,
    pub condition: Condition,
    pub threshold: f64,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn matches(&self, current: f64) -> bool {
        self.condition.holds(current, self.threshold)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.parameter.label(),
            self.condition.phrase(),
            self.threshold
        )
    }
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub owner_id: UserId,
    pub parameter: Parameter,
    pub condition: Condition,
    pub threshold: f64,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn with_id(self, id: NotificationId) -> Notification {
        Notification {
            id,
            owner_id: self.owner_id,
            parameter: self.parameter,
            condition: self.condition,
            threshold: self.threshold,
            created_at: self.created_at,
        }
    }
}
