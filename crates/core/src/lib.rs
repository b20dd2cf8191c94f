#![forbid(unsafe_code)]

pub mod blank;
pub mod daily_goal;
pub mod grading;
pub mod model;
pub mod pool;
pub mod progress;
pub mod selection;
pub mod settings;
pub mod time;

pub use settings::{EngineSettings, SettingsError};
pub use time::Clock;
