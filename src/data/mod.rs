pub mod config;
pub mod expansion;
pub mod time;
pub mod types;
pub mod validation;

pub use config::{Command, OutputFormat, OutputOptions, Parameters, Step, TimezoneOverride};
pub use expansion::*;
pub use types::*;
pub use validation::*;
