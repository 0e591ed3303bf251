//! Contributed haiku lines and their constraints.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The (team, channel) a Slack request or line belongs to. Lines are shared
/// across a whole team; the channel is kept for provenance and for scoping
/// poems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub team_id: String,
    pub channel_id: String,
}

impl Scope {
    pub fn new(team_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// The two admissible line lengths. A haiku is Five / Seven / Five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyllableCount {
    Five,
    Seven,
}

impl SyllableCount {
    pub fn count(self) -> i64 {
        match self {
            Self::Five => 5,
            Self::Seven => 7,
        }
    }

    pub fn from_count(count: i64) -> Option<Self> {
        match count {
            5 => Some(Self::Five),
            7 => Some(Self::Seven),
            _ => None,
        }
    }
}

/// Optional placement constraint for five-syllable lines: some lines only
/// work as the opening of a poem, some only as the closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinePosition {
    First,
    Last,
}

impl LinePosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }

    pub fn value_of(value: &str) -> Option<Self> {
        match value {
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

/// A single remembered line of five or seven syllables.
#[derive(Debug, Clone)]
pub struct HaikuLine {
    pub id: Uuid,
    pub text: String,
    pub syllables: SyllableCount,
    /// User id of the contributor (reassignable via claim).
    pub owner: String,
    pub scope: Scope,
    pub position: Option<LinePosition>,
    pub created: DateTime<Utc>,
}

impl HaikuLine {
    pub fn new(
        text: impl Into<String>,
        syllables: SyllableCount,
        owner: impl Into<String>,
        scope: Scope,
        position: Option<LinePosition>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            syllables,
            owner: owner.into(),
            scope,
            position,
            created: Utc::now(),
        }
    }

    /// Position constraints only make sense for five-syllable lines, which
    /// occupy the first and last slots of a poem.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            bail!("line text must not be empty");
        }
        if self.syllables == SyllableCount::Seven && self.position.is_some() {
            bail!("seven-syllable lines cannot carry a position constraint");
        }
        Ok(())
    }
}
