pub mod config;
pub mod line;
pub mod poem;
pub mod stats;

pub use config::{
    Config, DatabaseConfig, EventsConfig, LoggingConfig, ServerConfig, SlackConfig,
};
pub use line::{HaikuLine, LinePosition, Scope, SyllableCount};
pub use poem::{Poem, PoemLine};
pub use stats::HaikuStats;
