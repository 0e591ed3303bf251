//! Constrained random poem composition.
//!
//! Produces a 5-7-5 poem that genuinely reflects the request's constraints
//! whenever possible, degrading instead of failing outright when constraints
//! are too narrow, while never silently ignoring a search term the caller
//! cared about.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use crate::domain::models::{HaikuLine, LinePosition, Poem, Scope, SyllableCount};
use crate::domain::ports::{PoemRepository, SampleFilter};
use crate::services::sampler::Sampler;

/// Candidates drawn per five-syllable pass.
const FIVES_SAMPLE_SIZE: usize = 4;

struct FivesPick {
    first: HaikuLine,
    last: HaikuLine,
    /// Whether a chosen five came from the genuinely search-matched draw.
    matched_search: bool,
}

struct SevenPick {
    line: HaikuLine,
    matched_search: bool,
}

/// Orchestrates the five-syllable pair pass and the seven-syllable pass,
/// resolves position constraints, and persists the resulting poem.
pub struct PoemComposer {
    sampler: Sampler,
    poems: Arc<dyn PoemRepository>,
}

impl PoemComposer {
    pub fn new(sampler: Sampler, poems: Arc<dyn PoemRepository>) -> Self {
        Self { sampler, poems }
    }

    /// Compose a random poem for the scope, optionally constrained to one
    /// author and/or a search term. Returns `Ok(None)` when the constraints
    /// cannot be satisfied.
    ///
    /// When a search term was supplied, at least one of the two passes must
    /// have genuinely matched it; requiring both (or either pass in
    /// isolation) would change observable behavior, so this rule is exact.
    pub async fn generate(
        &self,
        scope: &Scope,
        owner: Option<&str>,
        search_term: Option<&str>,
    ) -> Result<Option<Poem>> {
        let Some(fives) = self.pick_fives(&scope.team_id, owner, search_term).await? else {
            return Ok(None);
        };
        let Some(seven) = self.pick_seven(&scope.team_id, owner, search_term).await? else {
            return Ok(None);
        };

        if search_term.is_some() && !fives.matched_search && !seven.matched_search {
            return Ok(None);
        }

        let poem = Poem::from_lines(&fives.first, &seven.line, &fives.last, scope.clone());

        // Returning the composed poem matters more than storing it; a
        // persistence failure is logged, not surfaced.
        if let Err(e) = self.poems.insert(&poem).await {
            warn!(
                team_id = %scope.team_id,
                channel_id = %scope.channel_id,
                "failed to persist composed poem: {e}"
            );
        }

        Ok(Some(poem))
    }

    /// Five-syllable pass: choose the first and last lines, honoring
    /// position constraints and preferring search-matched candidates.
    async fn pick_fives(
        &self,
        team_id: &str,
        owner: Option<&str>,
        search_term: Option<&str>,
    ) -> Result<Option<FivesPick>> {
        let base = SampleFilter::new(SyllableCount::Five, team_id).owner(owner);

        let mut pool = self
            .sampler
            .sample(&base.clone().search(search_term), FIVES_SAMPLE_SIZE)
            .await?;
        // The genuinely search-matched draw; identical to the pool when no
        // search term was given.
        let mut matched = pool.clone();

        if pool.len() < 2 {
            if search_term.is_some() {
                // Widen by dropping the search term; the owner filter stays.
                let exclude: Vec<Uuid> = pool.iter().map(|line| line.id).collect();
                let widened = base.clone().exclude_ids(exclude);
                pool.extend(self.sampler.sample(&widened, FIVES_SAMPLE_SIZE).await?);
            }
            if pool.len() < 2 {
                return Ok(None);
            }
        }

        let first = match Self::pick_preferred(&matched, &pool, LinePosition::Last) {
            Some(line) => line,
            None => {
                let relaxed = base.clone().exclude_position(LinePosition::Last);
                match self.sampler.sample(&relaxed, 1).await?.into_iter().next() {
                    Some(line) => line,
                    None => return Ok(None),
                }
            }
        };
        let first_matched = matched.iter().any(|line| line.id == first.id);
        matched.retain(|line| line.id != first.id);
        pool.retain(|line| line.id != first.id);

        let last = match Self::pick_preferred(&matched, &pool, LinePosition::First) {
            Some(line) => line,
            None => {
                let relaxed = base
                    .clone()
                    .exclude_position(LinePosition::First)
                    .exclude_ids(vec![first.id]);
                match self.sampler.sample(&relaxed, 1).await?.into_iter().next() {
                    Some(line) => line,
                    None => return Ok(None),
                }
            }
        };
        let last_matched = matched.iter().any(|line| line.id == last.id);

        Ok(Some(FivesPick {
            first,
            last,
            matched_search: search_term.is_none() || first_matched || last_matched,
        }))
    }

    /// Seven-syllable pass: one candidate, falling back to an unconstrained
    /// draw when the search term matches nothing.
    async fn pick_seven(
        &self,
        team_id: &str,
        owner: Option<&str>,
        search_term: Option<&str>,
    ) -> Result<Option<SevenPick>> {
        let base = SampleFilter::new(SyllableCount::Seven, team_id).owner(owner);

        if let Some(line) = self
            .sampler
            .sample(&base.clone().search(search_term), 1)
            .await?
            .into_iter()
            .next()
        {
            return Ok(Some(SevenPick {
                line,
                matched_search: true,
            }));
        }

        if search_term.is_some() {
            if let Some(line) = self.sampler.sample(&base, 1).await?.into_iter().next() {
                return Ok(Some(SevenPick {
                    line,
                    matched_search: false,
                }));
            }
        }

        Ok(None)
    }

    /// Prefer a search-matched line without the excluded constraint, then
    /// any drawn candidate without it.
    fn pick_preferred(
        matched: &[HaikuLine],
        pool: &[HaikuLine],
        excluded: LinePosition,
    ) -> Option<HaikuLine> {
        matched
            .iter()
            .find(|line| line.position != Some(excluded))
            .or_else(|| pool.iter().find(|line| line.position != Some(excluded)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, position: Option<LinePosition>) -> HaikuLine {
        HaikuLine::new(
            text,
            SyllableCount::Five,
            "U1",
            Scope::new("T1", "C1"),
            position,
        )
    }

    #[test]
    fn test_pick_preferred_skips_excluded_constraint() {
        let last_only = line("splash breaks the silence", Some(LinePosition::Last));
        let free = line("ancient pond sits still", None);
        let pool = vec![last_only.clone(), free.clone()];

        let picked = PoemComposer::pick_preferred(&[], &pool, LinePosition::Last).unwrap();
        assert_eq!(picked.id, free.id);

        assert!(PoemComposer::pick_preferred(&[], &[last_only], LinePosition::Last).is_none());
    }

    #[test]
    fn test_pick_preferred_prefers_matched_set() {
        let matched = line("mountain air so thin", None);
        let fallback = line("ancient pond sits still", None);

        let picked = PoemComposer::pick_preferred(
            &[matched.clone()],
            &[fallback, matched.clone()],
            LinePosition::Last,
        )
        .unwrap();
        assert_eq!(picked.id, matched.id);
    }
}
