use crate::domain::models::{Poem, PoemLine, Scope};
use crate::domain::ports::PoemRepository;
use crate::infrastructure::database::utils::parse_datetime;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// SQLite implementation of `PoemRepository` using sqlx.
pub struct PoemRepositoryImpl {
    pool: SqlitePool,
}

impl PoemRepositoryImpl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PoemRepository for PoemRepositoryImpl {
    async fn insert(&self, poem: &Poem) -> Result<()> {
        let poem_id = poem.id.to_string();
        let created = poem.created.to_rfc3339();

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query("INSERT INTO poems (id, team_id, channel_id, created) VALUES (?, ?, ?, ?)")
            .bind(&poem_id)
            .bind(&poem.scope.team_id)
            .bind(&poem.scope.channel_id)
            .bind(&created)
            .execute(&mut *tx)
            .await
            .context("failed to insert poem")?;

        for (index, line) in poem.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO poem_lines (poem_id, line_index, line_id, text, user_id)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&poem_id)
            .bind(index as i64)
            .bind(line.line_id.to_string())
            .bind(&line.text)
            .bind(&line.owner)
            .execute(&mut *tx)
            .await
            .context("failed to insert poem line")?;
        }

        tx.commit().await.context("failed to commit poem")?;
        Ok(())
    }

    async fn latest(&self, team_id: &str, channel_id: &str) -> Result<Option<Poem>> {
        let row = sqlx::query(
            r#"
            SELECT id, team_id, channel_id, created
            FROM poems
            WHERE team_id = ? AND channel_id = ?
            ORDER BY created DESC
            LIMIT 1
            "#,
        )
        .bind(team_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to query latest poem")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let poem_id: String = row.get("id");
        let created: String = row.get("created");

        let line_rows = sqlx::query(
            r#"
            SELECT line_id, text, user_id
            FROM poem_lines
            WHERE poem_id = ?
            ORDER BY line_index
            "#,
        )
        .bind(&poem_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to query poem lines")?;

        let lines = line_rows
            .iter()
            .map(|line_row| {
                let line_id: String = line_row.get("line_id");
                Ok(PoemLine {
                    line_id: Uuid::parse_str(&line_id).context("invalid line id")?,
                    text: line_row.get("text"),
                    owner: line_row.get("user_id"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let lines: [PoemLine; 3] = lines
            .try_into()
            .map_err(|_| anyhow!("poem {poem_id} does not have exactly 3 lines"))?;

        Ok(Some(Poem {
            id: Uuid::parse_str(&poem_id).context("invalid poem id")?,
            lines,
            scope: Scope {
                team_id: row.get("team_id"),
                channel_id: row.get("channel_id"),
            },
            created: parse_datetime(&created).context("failed to parse created")?,
        }))
    }

    async fn count(&self, team_id: &str, contributor: Option<&str>) -> Result<i64> {
        let (count,): (i64,) = if let Some(contributor) = contributor {
            sqlx::query_as(
                r#"
                SELECT COUNT(DISTINCT poems.id)
                FROM poems
                JOIN poem_lines ON poem_lines.poem_id = poems.id
                WHERE poems.team_id = ? AND poem_lines.user_id = ?
                "#,
            )
            .bind(team_id)
            .bind(contributor)
            .fetch_one(&self.pool)
            .await
            .context("failed to count poems for contributor")?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM poems WHERE team_id = ?")
                .bind(team_id)
                .fetch_one(&self.pool)
                .await
                .context("failed to count poems")?
        };

        Ok(count)
    }
}
