pub mod blame;
pub mod commands;
pub mod composer;
pub mod event_queue;
pub mod sampler;
pub mod stats;

pub use blame::BlameTracker;
pub use commands::CommandHandler;
pub use composer::PoemComposer;
pub use event_queue::EventQueue;
pub use sampler::Sampler;
pub use stats::StatsAggregator;
