//! Attribution for the most recent poem in a channel.

use std::sync::Arc;

use anyhow::Result;

use crate::domain::ports::PoemRepository;

/// Looks up who contributed the lines of the latest poem in a channel.
pub struct BlameTracker {
    poems: Arc<dyn PoemRepository>,
}

impl BlameTracker {
    pub fn new(poems: Arc<dyn PoemRepository>) -> Self {
        Self { poems }
    }

    /// Owners of the latest poem's lines in poem order, duplicates
    /// preserved. `None` when the channel has no poems yet.
    pub async fn latest_authors(
        &self,
        team_id: &str,
        channel_id: &str,
    ) -> Result<Option<Vec<String>>> {
        let poem = self.poems.latest(team_id, channel_id).await?;
        Ok(poem.map(|poem| poem.owners().into_iter().map(String::from).collect()))
    }
}
