//! Books repository: reads are denormalized, joined with the author name

use serde::Serialize;
use sqlx::SqlitePool;

/// Book record as returned to callers, joined with its author's name
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_year: i64,
    pub genre: String,
    pub created_at: String,
}

/// Input for creating a book; the author must already be resolved to an id
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub author_id: i64,
    pub published_year: i64,
    pub genre: String,
}

/// Input for a partial update; absent fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub published_year: Option<i64>,
    pub genre: Option<String>,
}

/// Validated list parameters.
///
/// `sort_col` comes from the service-level allow-list, never from raw input.
#[derive(Debug, Clone)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    pub sort_col: &'static str,
    pub sort_desc: bool,
    pub limit: i64,
    pub offset: i64,
}

const SELECT_BOOK: &str = "SELECT b.id, b.title, a.full_name AS author, b.published_year, b.genre, b.created_at \
     FROM books b JOIN authors a ON a.id = b.author_id";

pub struct BooksRepository {
    pool: SqlitePool,
}

impl BooksRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a book and return its assigned id directly from the insert
    pub async fn create(&self, book: CreateBook) -> sqlx::Result<i64> {
        sqlx::query_scalar(
            r#"
            INSERT INTO books (title, author_id, published_year, genre, created_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.published_year)
        .bind(&book.genre)
        .fetch_one(&self.pool)
        .await
    }

    /// Get a book by id, joined with its author
    pub async fn get(&self, id: i64) -> sqlx::Result<Option<BookRecord>> {
        let sql = format!("{SELECT_BOOK} WHERE b.id = ?");
        sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await
    }

    /// True if a book with this id exists
    pub async fn exists(&self, id: i64) -> sqlx::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Apply a partial update; returns false if the id does not exist
    pub async fn update(&self, id: i64, update: UpdateBook) -> sqlx::Result<bool> {
        let mut sets: Vec<&str> = Vec::new();
        if update.title.is_some() {
            sets.push("title = ?");
        }
        if update.author_id.is_some() {
            sets.push("author_id = ?");
        }
        if update.published_year.is_some() {
            sets.push("published_year = ?");
        }
        if update.genre.is_some() {
            sets.push("genre = ?");
        }
        if sets.is_empty() {
            return self.exists(id).await;
        }

        let sql = format!("UPDATE books SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(title) = &update.title {
            query = query.bind(title);
        }
        if let Some(author_id) = update.author_id {
            query = query.bind(author_id);
        }
        if let Some(year) = update.published_year {
            query = query.bind(year);
        }
        if let Some(genre) = &update.genre {
            query = query.bind(genre);
        }

        let result = query.bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a book; returns false if the id does not exist
    pub async fn delete(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List books with substring filters, year range, sorting and pagination.
    ///
    /// SQLite LIKE is case-insensitive for ASCII, matching the intended
    /// case-insensitive substring filters.
    pub async fn list(&self, q: &BookQuery) -> sqlx::Result<Vec<BookRecord>> {
        let mut clauses: Vec<&str> = Vec::new();
        if q.title.is_some() {
            clauses.push("b.title LIKE ?");
        }
        if q.author.is_some() {
            clauses.push("a.full_name LIKE ?");
        }
        if q.genre.is_some() {
            clauses.push("b.genre LIKE ?");
        }
        if q.year_from.is_some() {
            clauses.push("b.published_year >= ?");
        }
        if q.year_to.is_some() {
            clauses.push("b.published_year <= ?");
        }

        let mut sql = String::from(SELECT_BOOK);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(q.sort_col);
        sql.push_str(if q.sort_desc { " DESC" } else { " ASC" });
        sql.push_str(" LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as(&sql);
        if let Some(title) = &q.title {
            query = query.bind(format!("%{title}%"));
        }
        if let Some(author) = &q.author {
            query = query.bind(format!("%{author}%"));
        }
        if let Some(genre) = &q.genre {
            query = query.bind(format!("%{genre}%"));
        }
        if let Some(year_from) = q.year_from {
            query = query.bind(year_from);
        }
        if let Some(year_to) = q.year_to {
            query = query.bind(year_to);
        }

        query.bind(q.limit).bind(q.offset).fetch_all(&self.pool).await
    }
}
