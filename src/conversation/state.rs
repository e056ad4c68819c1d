use chrono::{DateTime, Utc};

use crate::db::NewNotification;
use crate::models::{Condition, NotificationId, Parameter, UserId};

/// Where a chat user currently is in a multi-step flow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Step {
    #[default]
    Idle,
    WaitingParameter,
    WaitingCondition,
    WaitingValue,
    /// 1-based selection over the ids captured when the flow started.
    WaitingDeleteIndex { snapshot: Vec<NotificationId> },
}

/// Choices collected so far while building a notification.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConversationDraft {
    pub parameter: Option<Parameter>,
    pub condition: Option<Condition>,
}

impl ConversationDraft {
    /// A full record, or `None` while any choice is still missing.
    pub fn complete(
        &self,
        owner_id: UserId,
        threshold: f64,
        created_at: DateTime<Utc>,
    ) -> Option<NewNotification> {
        Some(NewNotification {
            owner_id,
            parameter: self.parameter?,
            condition: self.condition?,
            threshold,
            created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub step: Step,
    pub draft: ConversationDraft,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.step == Step::Idle
    }

    /// Start building a notification, replacing whatever was in progress.
    pub fn begin_set(&mut self) {
        *self = Self {
            step: Step::WaitingParameter,
            draft: ConversationDraft::default(),
        };
    }

    pub fn choose_parameter(&mut self, parameter: Parameter) {
        self.draft.parameter = Some(parameter);
        self.draft.condition = None;
        self.step = Step::WaitingCondition;
    }

    pub fn choose_condition(&mut self, condition: Condition) {
        self.draft.condition = Some(condition);
        self.step = Step::WaitingValue;
    }

    pub fn back_to_parameter(&mut self) {
        self.draft.condition = None;
        self.step = Step::WaitingParameter;
    }

    pub fn begin_delete(&mut self, snapshot: Vec<NotificationId>) {
        *self = Self {
            step: Step::WaitingDeleteIndex { snapshot },
            draft: ConversationDraft::default(),
        };
    }

    /// Id behind a 1-based index of the delete snapshot.
    pub fn selected_for_delete(&self, index: usize) -> Option<NotificationId> {
        match &self.step {
            Step::WaitingDeleteIndex { snapshot } if index >= 1 => snapshot.get(index - 1).copied(),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
