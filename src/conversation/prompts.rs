use crate::db::Notification;
use crate::messenger::{Button, Keyboard};
use crate::models::{Condition, Parameter};

pub const BACK_PAYLOAD: &str = "back";

pub const GREETING: &str = "Hi! This bot shows temperature and humidity from the sensors in real time \
and notifies you when a reading crosses a threshold you set.\n\n\
/temperature - current temperature\n\
/humidity - current humidity\n\
/notifications - your active notifications\n\
/setnotification - set a notification\n\
/deletenotification - delete a notification\n\
/cancel - cancel the current operation";
pub const HELP_HINT: &str = "Use /setnotification to create a notification or /notifications to list yours.";
pub const PARAMETER_PROMPT: &str = "Choose a parameter for the notification:";
pub const CONDITION_PROMPT: &str = "Choose a condition:";
pub const VALUE_PROMPT: &str = "Enter a numeric value:";
pub const INVALID_VALUE: &str = "Please enter a valid number.";
pub const CHOOSE_OPTION: &str = "Please choose one of the offered options.";
pub const STALE_BUTTON: &str = "That button is no longer active.";
pub const LIST_HEADER: &str = "Your active notifications:";
pub const NO_NOTIFICATIONS: &str = "You have no active notifications.";
pub const NO_NOTIFICATIONS_TO_DELETE: &str = "You have no active notifications to delete.";
pub const DELETE_PROMPT: &str = "Enter the number of the notification to delete:";
pub const INVALID_INDEX: &str = "Please enter a valid notification number.";
pub const NOT_FOUND: &str = "Notification with that number was not found.";
pub const DELETED: &str = "Notification deleted.";
pub const NOTHING_TO_CANCEL: &str = "No operation is in progress.";
pub const CANCELLED: &str = "Operation cancelled.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

pub fn current_value(parameter: Parameter, value: Option<f64>) -> String {
    let name = parameter.as_str();
    match value {
        Some(value) => format!("Current {name}: {value}"),
        None => format!("No {name} data yet."),
    }
}

pub fn notification_saved(notification: &Notification) -> String {
    format!("Notification set: {notification}")
}

pub fn notification_list(header: &str, notifications: &[Notification]) -> String {
    let mut lines = Vec::with_capacity(notifications.len() + 1);
    lines.push(header.to_string());
    for (index, notification) in notifications.iter().enumerate() {
        lines.push(format!("({}) {notification}", index + 1));
    }
    lines.join("\n")
}

pub fn parameter_keyboard() -> Keyboard {
    Keyboard::new(
        Parameter::ALL
            .iter()
            .map(|parameter| vec![Button::new(parameter.label(), parameter.as_str())])
            .collect(),
    )
}

pub fn condition_keyboard() -> Keyboard {
    let choices = Condition::ALL
        .iter()
        .map(|condition| Button::new(condition.symbol(), condition.as_str()))
        .collect();
    Keyboard::new(vec![choices, vec![Button::new("Back", BACK_PAYLOAD)]])
}
