pub mod cache;
pub mod source;

pub use cache::{RefreshPolicy, SensorCache, ZeroPolicy};
pub use source::{discover_device, DeviceLineReader, SensorSource, SimulatedSource};
