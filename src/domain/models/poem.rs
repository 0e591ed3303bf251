//! Composed poems and their line snapshots.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{HaikuLine, Scope};

/// Snapshot of a line as it appeared in a poem. The text is denormalized so
/// the poem stays intact even if the source line is later removed; the owner
/// is kept current when a line is claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoemLine {
    pub line_id: Uuid,
    pub text: String,
    pub owner: String,
}

impl PoemLine {
    fn snapshot(line: &HaikuLine) -> Self {
        Self {
            line_id: line.id,
            text: line.text.clone(),
            owner: line.owner.clone(),
        }
    }
}

/// A composed 5-7-5 poem, scoped to the (team, channel) it was generated in.
#[derive(Debug, Clone)]
pub struct Poem {
    pub id: Uuid,
    pub lines: [PoemLine; 3],
    pub scope: Scope,
    pub created: DateTime<Utc>,
}

impl Poem {
    pub fn from_lines(first: &HaikuLine, seven: &HaikuLine, last: &HaikuLine, scope: Scope) -> Self {
        Self {
            id: Uuid::new_v4(),
            lines: [
                PoemLine::snapshot(first),
                PoemLine::snapshot(seven),
                PoemLine::snapshot(last),
            ],
            scope,
            created: Utc::now(),
        }
    }

    /// The poem as displayed, one line per row.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Owners of the three lines, in poem order (duplicates preserved).
    pub fn owners(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.owner.as_str()).collect()
    }
}
