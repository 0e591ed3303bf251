use crate::domain::models::{HaikuLine, LinePosition, Scope, SyllableCount};
use crate::domain::ports::{LineRepository, LineTally, SampleFilter};
use crate::infrastructure::database::utils::parse_datetime;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::IteratorRandom;
use regex::{Regex, RegexBuilder};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::warn;
use uuid::Uuid;

/// SQLite implementation of `LineRepository` using sqlx.
pub struct LineRepositoryImpl {
    pool: SqlitePool,
}

impl LineRepositoryImpl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<HaikuLine> {
        let id: String = row.get("id");
        let syllables: i64 = row.get("syllables");
        let position: Option<String> = row.get("position");
        let created: String = row.get("created");

        Ok(HaikuLine {
            id: Uuid::parse_str(&id).context("invalid line id")?,
            text: row.get("text"),
            syllables: SyllableCount::from_count(syllables)
                .with_context(|| format!("invalid syllable count in store: {syllables}"))?,
            owner: row.get("user_id"),
            scope: Scope {
                team_id: row.get("team_id"),
                channel_id: row.get("channel_id"),
            },
            position: position.as_deref().and_then(LinePosition::value_of),
            created: parse_datetime(&created).context("failed to parse created")?,
        })
    }
}

/// Compile a user-supplied search term as a case-insensitive pattern,
/// falling back to the escaped literal when it is not a valid pattern.
fn compile_search(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
        })
        .context("failed to compile search pattern")
}

#[async_trait]
impl LineRepository for LineRepositoryImpl {
    async fn add(&self, line: &HaikuLine) -> Result<()> {
        let id = line.id.to_string();
        let syllables = line.syllables.count();
        let position = line.position.map(|p| p.as_str());
        let created = line.created.to_rfc3339();

        // ON CONFLICT makes re-adding an existing key an atomic no-op.
        sqlx::query(
            r#"
            INSERT INTO lines (id, text, syllables, user_id, channel_id, team_id, position, created)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (text, syllables, team_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(&line.text)
        .bind(syllables)
        .bind(&line.owner)
        .bind(&line.scope.channel_id)
        .bind(&line.scope.team_id)
        .bind(position)
        .bind(&created)
        .execute(&self.pool)
        .await
        .context("failed to insert line")?;

        Ok(())
    }

    async fn find(
        &self,
        text: &str,
        syllables: SyllableCount,
        team_id: &str,
    ) -> Result<Option<HaikuLine>> {
        let row = sqlx::query(
            r#"
            SELECT id, text, syllables, user_id, channel_id, team_id, position, created
            FROM lines
            WHERE text = ? AND syllables = ? AND team_id = ?
            LIMIT 1
            "#,
        )
        .bind(text)
        .bind(syllables.count())
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to query line")?;

        row.as_ref().map(Self::row_to_line).transpose()
    }

    async fn remove(&self, text: &str, syllables: SyllableCount, team_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM lines WHERE text = ? AND syllables = ? AND team_id = ?")
            .bind(text)
            .bind(syllables.count())
            .bind(team_id)
            .execute(&self.pool)
            .await
            .context("failed to delete lines")?;

        Ok(result.rows_affected())
    }

    async fn claim(
        &self,
        text: &str,
        syllables: SyllableCount,
        team_id: &str,
        new_owner: &str,
    ) -> Result<bool> {
        let Some(line) = self.find(text, syllables, team_id).await? else {
            return Ok(false);
        };

        let line_id = line.id.to_string();
        let result = sqlx::query("UPDATE lines SET user_id = ? WHERE id = ?")
            .bind(new_owner)
            .bind(&line_id)
            .execute(&self.pool)
            .await
            .context("failed to reassign line owner")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        // Advisory follow-up: rewrite the owner embedded in past poem
        // snapshots that still reference this line. Failure never fails
        // the claim.
        let propagation = sqlx::query(
            r#"
            UPDATE poem_lines SET user_id = ?
            WHERE line_id = ? AND poem_id IN (SELECT id FROM poems WHERE team_id = ?)
            "#,
        )
        .bind(new_owner)
        .bind(&line_id)
        .bind(team_id)
        .execute(&self.pool)
        .await;

        if let Err(e) = propagation {
            warn!(team_id, line_id, "failed to propagate claim into poem snapshots: {e}");
        }

        Ok(true)
    }

    async fn sample(&self, filter: &SampleFilter, n: usize) -> Result<Vec<HaikuLine>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, text, syllables, user_id, channel_id, team_id, position, created FROM lines WHERE syllables = ",
        );
        qb.push_bind(filter.syllables.count());
        qb.push(" AND team_id = ");
        qb.push_bind(&filter.team_id);

        if let Some(owner) = &filter.owner {
            qb.push(" AND user_id = ");
            qb.push_bind(owner);
        }

        if !filter.exclude_ids.is_empty() {
            qb.push(" AND id NOT IN (");
            {
                let mut separated = qb.separated(", ");
                for id in &filter.exclude_ids {
                    separated.push_bind(id.to_string());
                }
            }
            qb.push(")");
        }

        if let Some(position) = filter.exclude_position {
            // Lines without a constraint always qualify.
            qb.push(" AND (position IS NULL OR position != ");
            qb.push_bind(position.as_str());
            qb.push(")");
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("failed to sample lines")?;

        let mut lines = rows
            .iter()
            .map(Self::row_to_line)
            .collect::<Result<Vec<_>>>()?;

        if let Some(pattern) = &filter.search {
            let search = compile_search(pattern)?;
            lines.retain(|line| search.is_match(&line.text));
        }

        Ok(lines.into_iter().choose_multiple(&mut rand::thread_rng(), n))
    }

    async fn tally(&self, team_id: &str, owner: Option<&str>) -> Result<LineTally> {
        let sql_base = r#"
            SELECT
                COALESCE(SUM(CASE WHEN syllables = 5 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN syllables = 7 THEN 1 ELSE 0 END), 0),
                COUNT(DISTINCT user_id)
            FROM lines
            WHERE team_id = ?
        "#;

        let (fives, sevens, unique_owners): (i64, i64, i64) = if let Some(owner) = owner {
            sqlx::query_as(&format!("{sql_base} AND user_id = ?"))
                .bind(team_id)
                .bind(owner)
                .fetch_one(&self.pool)
                .await
                .context("failed to tally lines for owner")?
        } else {
            sqlx::query_as(sql_base)
                .bind(team_id)
                .fetch_one(&self.pool)
                .await
                .context("failed to tally lines")?
        };

        Ok(LineTally {
            fives,
            sevens,
            unique_owners,
        })
    }
}
