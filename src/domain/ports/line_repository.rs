use crate::domain::models::{HaikuLine, LinePosition, SyllableCount};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Filters applied when drawing random candidate lines.
#[derive(Debug, Clone)]
pub struct SampleFilter {
    pub syllables: SyllableCount,
    pub team_id: String,
    /// Restrict to lines contributed by this user.
    pub owner: Option<String>,
    /// Case-insensitive pattern matched against line text. Patterns that
    /// fail to compile are matched literally (escaped) instead of erroring.
    pub search: Option<String>,
    /// Lines to remove from consideration (already chosen in an earlier pass).
    pub exclude_ids: Vec<Uuid>,
    /// Skip lines whose position constraint equals this value. Lines with
    /// no constraint always qualify.
    pub exclude_position: Option<LinePosition>,
}

impl SampleFilter {
    pub fn new(syllables: SyllableCount, team_id: impl Into<String>) -> Self {
        Self {
            syllables,
            team_id: team_id.into(),
            owner: None,
            search: None,
            exclude_ids: Vec::new(),
            exclude_position: None,
        }
    }

    pub fn owner(mut self, owner: Option<&str>) -> Self {
        self.owner = owner.map(String::from);
        self
    }

    pub fn search(mut self, search: Option<&str>) -> Self {
        self.search = search.map(String::from);
        self
    }

    pub fn exclude_ids(mut self, ids: Vec<Uuid>) -> Self {
        self.exclude_ids = ids;
        self
    }

    pub fn exclude_position(mut self, position: LinePosition) -> Self {
        self.exclude_position = Some(position);
        self
    }
}

/// Per-team line counts used for stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineTally {
    pub fives: i64,
    pub sevens: i64,
    pub unique_owners: i64,
}

/// Repository trait for contributed haiku lines.
#[async_trait]
pub trait LineRepository: Send + Sync {
    /// Insert a line. Re-adding an identical (text, syllables, team) key is
    /// a no-op success, not an error.
    async fn add(&self, line: &HaikuLine) -> Result<()>;

    /// Exact lookup by (text, syllables, team).
    async fn find(
        &self,
        text: &str,
        syllables: SyllableCount,
        team_id: &str,
    ) -> Result<Option<HaikuLine>>;

    /// Delete all rows matching the key (text may collide across channels
    /// within a team). Returns the number of rows deleted.
    async fn remove(&self, text: &str, syllables: SyllableCount, team_id: &str) -> Result<u64>;

    /// Reassign ownership of the line matching the key, then best-effort
    /// rewrite the owner embedded in every persisted poem snapshot in the
    /// team that still references the line id. The propagation is advisory;
    /// its failure never fails the claim. Returns false when no line
    /// matches the key.
    async fn claim(
        &self,
        text: &str,
        syllables: SyllableCount,
        team_id: &str,
        new_owner: &str,
    ) -> Result<bool>;

    /// Draw up to `n` random lines matching the filter. This is the raw
    /// sampling primitive: callers must not rely on order, and the contract
    /// permits duplicate entries (the Sampler deduplicates).
    async fn sample(&self, filter: &SampleFilter, n: usize) -> Result<Vec<HaikuLine>>;

    /// Tally five/seven counts and distinct owners for a team, optionally
    /// restricted to one owner.
    async fn tally(&self, team_id: &str, owner: Option<&str>) -> Result<LineTally>;
}
