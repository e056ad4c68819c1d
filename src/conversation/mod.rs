pub mod collector;
pub mod commands;
pub mod prompts;
pub mod state;

pub use collector::{InputCollector, Peer};
