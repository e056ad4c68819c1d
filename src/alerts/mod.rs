pub mod controller;
pub mod engine;
pub mod loop_worker;

pub use controller::AlertController;
pub use engine::ConditionEngine;
