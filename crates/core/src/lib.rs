pub mod command;
pub mod config;
pub mod error;

pub use command::{Command, CommandOutcome, ExtractMode, WaitCondition};
pub use config::CacheConfig;
pub use error::{Error, Result};
