//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces the infrastructure adapters implement:
//! - `LineRepository`: storage of contributed lines plus the raw random
//!   sampling primitive
//! - `PoemRepository`: storage of composed poem snapshots
//!
//! These contracts keep the composition engine independent of the concrete
//! store.

pub mod line_repository;
pub mod poem_repository;

pub use line_repository::{LineRepository, LineTally, SampleFilter};
pub use poem_repository::PoemRepository;
