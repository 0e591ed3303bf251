use crate::domain::models::Poem;
use anyhow::Result;
use async_trait::async_trait;

/// Repository trait for composed poem snapshots.
///
/// Poems are written once by the composer and never updated afterwards,
/// except for the claim operation's advisory owner rewrite.
#[async_trait]
pub trait PoemRepository: Send + Sync {
    /// Persist a composed poem and its three line snapshots.
    async fn insert(&self, poem: &Poem) -> Result<()>;

    /// The most recently created poem for a (team, channel) scope.
    async fn latest(&self, team_id: &str, channel_id: &str) -> Result<Option<Poem>>;

    /// Count poems for a team. With `contributor`, counts poems containing
    /// at least one line owned by that user.
    async fn count(&self, team_id: &str, contributor: Option<&str>) -> Result<i64>;
}
