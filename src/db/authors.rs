//! Authors repository with race-safe name deduplication

use sqlx::SqlitePool;

pub struct AuthorsRepository {
    pool: SqlitePool,
}

impl AuthorsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up an author by exact name, inserting the row on first use.
    ///
    /// Two concurrent calls with the same new name race on the UNIQUE
    /// constraint; ON CONFLICT DO NOTHING makes the loser fall through to the
    /// final re-read instead of surfacing a store error, so both callers see
    /// the same id.
    pub async fn resolve_or_create(&self, full_name: &str) -> sqlx::Result<i64> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM authors WHERE full_name = ?")
                .bind(full_name)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(id) = existing {
            return Ok(id);
        }

        sqlx::query("INSERT INTO authors (full_name) VALUES (?) ON CONFLICT(full_name) DO NOTHING")
            .bind(full_name)
            .execute(&self.pool)
            .await?;

        sqlx::query_scalar("SELECT id FROM authors WHERE full_name = ?")
            .bind(full_name)
            .fetch_one(&self.pool)
            .await
    }
}
