/// Slash commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Temperature,
    Humidity,
    Notifications,
    SetNotification,
    DeleteNotification,
    Cancel,
}

impl Command {
    /// Parse `/name` or `/name@BotName`, ignoring trailing arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "temperature" => Some(Command::Temperature),
            "humidity" => Some(Command::Humidity),
            "notifications" => Some(Command::Notifications),
            "setnotification" => Some(Command::SetNotification),
            "deletenotification" => Some(Command::DeleteNotification),
            "cancel" => Some(Command::Cancel),
            _ => None,
        }
    }
}
