//! Random candidate sampling over the line repository.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use rand::seq::SliceRandom;

use crate::domain::models::HaikuLine;
use crate::domain::ports::{LineRepository, SampleFilter};

/// Draws random candidate lines matching a filter set.
///
/// The underlying repository primitive is allowed to return duplicate rows
/// for a requested count, so the dedup-then-shuffle contract is enforced
/// here, once, rather than at every call site. Callers rely on
/// order-independence, not on any draw order from the primitive.
pub struct Sampler {
    lines: Arc<dyn LineRepository>,
}

impl Sampler {
    pub fn new(lines: Arc<dyn LineRepository>) -> Self {
        Self { lines }
    }

    /// Sample up to `n` distinct lines matching `filter`, in random order.
    /// Fewer than `n` are returned when the corpus is too small.
    pub async fn sample(&self, filter: &SampleFilter, n: usize) -> Result<Vec<HaikuLine>> {
        let drawn = self.lines.sample(filter, n).await?;

        let mut seen = HashSet::new();
        let mut lines: Vec<HaikuLine> = drawn
            .into_iter()
            .filter(|line| seen.insert(line.id))
            .collect();
        lines.shuffle(&mut rand::thread_rng());

        Ok(lines)
    }
}
