//! Corpus statistics aggregation.

use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::HaikuStats;
use crate::domain::ports::{LineRepository, PoemRepository};

/// Combines line tallies and poem counts into one stats snapshot.
pub struct StatsAggregator {
    lines: Arc<dyn LineRepository>,
    poems: Arc<dyn PoemRepository>,
}

impl StatsAggregator {
    pub fn new(lines: Arc<dyn LineRepository>, poems: Arc<dyn PoemRepository>) -> Self {
        Self { lines, poems }
    }

    /// Stats for a team. With `user_id`, line counts are restricted to that
    /// user's contributions and the poem count becomes "poems containing at
    /// least one of their lines". An empty corpus yields all zeros.
    pub async fn stats(&self, team_id: &str, user_id: Option<&str>) -> Result<HaikuStats> {
        let tally = self.lines.tally(team_id, user_id).await?;
        let total_poems = self.poems.count(team_id, user_id).await?;

        Ok(HaikuStats {
            five_syllable_lines: tally.fives,
            seven_syllable_lines: tally.sevens,
            total_poems,
            unique_owners: tally.unique_owners,
        })
    }
}
