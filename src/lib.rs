//! Haikubot - Collaborative Slack Haiku Bot
//!
//! Members of a Slack workspace contribute lines of five or seven syllables,
//! and the bot composes random 5-7-5 haikus from the shared pool on demand,
//! optionally constrained to a topic or a single author.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Lines, poems, stats, and repository ports
//! - **Service Layer** (`services`): Composition, command dispatch, event workers
//! - **Infrastructure Layer** (`infrastructure`): SQLite storage, Slack API, HTTP server

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, HaikuLine, HaikuStats, LinePosition, Poem, PoemLine, Scope, SyllableCount,
};
pub use domain::ports::{LineRepository, PoemRepository, SampleFilter};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::database::{DatabaseConnection, LineRepositoryImpl, PoemRepositoryImpl};
pub use infrastructure::slack::{SlackContext, SlackResponse};
pub use services::{
    BlameTracker, CommandHandler, EventQueue, PoemComposer, Sampler, StatsAggregator,
};

/// Crate version reported by the `version` command and the status endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
