pub mod config;
pub mod error;
pub mod scheduler;
pub mod types;

pub use config::BotConfig;
pub use error::{BotError, Result};
