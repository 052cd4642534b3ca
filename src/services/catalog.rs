//! Book catalog operations: field validation, author resolution, CRUD and
//! listing.
//!
//! Validation runs at every entry point (create, update, bulk import)
//! independently; the store is never trusted to enforce field rules.

use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::db::{BookQuery, BookRecord, CreateBook, Database, UpdateBook};
use crate::error::{ApiError, ApiResult};

/// Fixed set of permitted book genres, canonical spellings
pub const GENRES: [&str; 4] = ["Fiction", "Non-fiction", "Science", "History"];

pub const MIN_PUBLISHED_YEAR: i64 = 1800;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Upper bound for published_year
pub fn current_year() -> i64 {
    Utc::now().year() as i64
}

/// Match a genre case-insensitively and return its canonical spelling.
///
/// One policy for every entry point: direct create/update and bulk import
/// all accept any casing and persist the canonical form.
pub fn canonical_genre(input: &str) -> Option<&'static str> {
    let trimmed = input.trim();
    GENRES.iter().find(|g| g.eq_ignore_ascii_case(trimmed)).copied()
}

pub(crate) fn genre_error() -> String {
    let mut names = GENRES.to_vec();
    names.sort_unstable();
    format!("genre must be one of: {}", names.join(", "))
}

/// Check the published year against the allowed range
pub fn validate_published_year(year: i64) -> Result<(), String> {
    let max = current_year();
    if year < MIN_PUBLISHED_YEAR || year > max {
        return Err(format!(
            "published_year must be between {MIN_PUBLISHED_YEAR} and {max}"
        ));
    }
    Ok(())
}

/// Resolve an author name to a stable id, creating the row on first use.
///
/// Deduplication key is the trimmed name; an empty name is rejected before
/// the store is touched.
pub async fn resolve_author(db: &Database, full_name: &str) -> ApiResult<i64> {
    let name = full_name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Author name cannot be empty".into()));
    }
    Ok(db.authors().resolve_or_create(name).await?)
}

/// Input for creating a book
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookInput {
    pub title: String,
    pub author: String,
    pub published_year: i64,
    pub genre: String,
}

/// Input for a partial book update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_year: Option<i64>,
    pub genre: Option<String>,
}

/// List parameters as received from the query string
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookListParams {
    pub page: i64,
    pub page_size: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    pub sort_by: String,
    pub sort_order: String,
}

impl Default for BookListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            title: None,
            author: None,
            genre: None,
            year_from: None,
            year_to: None,
            sort_by: "title".to_string(),
            sort_order: "asc".to_string(),
        }
    }
}

/// Validate input, resolve the author, insert, and return the stored record
pub async fn create_book(db: &Database, input: CreateBookInput) -> ApiResult<BookRecord> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    validate_published_year(input.published_year).map_err(ApiError::Validation)?;
    let genre = canonical_genre(&input.genre).ok_or_else(|| ApiError::Validation(genre_error()))?;

    let author_id = resolve_author(db, &input.author).await?;

    let books = db.books();
    let id = books
        .create(CreateBook {
            title,
            author_id,
            published_year: input.published_year,
            genre: genre.to_string(),
        })
        .await?;

    books
        .get(id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Failed to load created book {id}")))
}

/// Apply a partial update; supplied fields are validated, absent fields are
/// left untouched
pub async fn update_book(db: &Database, id: i64, input: UpdateBookInput) -> ApiResult<BookRecord> {
    let books = db.books();
    if !books.exists(id).await? {
        return Err(ApiError::NotFound("Book not found".into()));
    }

    let mut update = UpdateBook::default();

    if let Some(title) = &input.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(ApiError::Validation("title cannot be empty".into()));
        }
        update.title = Some(title.to_string());
    }
    if let Some(year) = input.published_year {
        validate_published_year(year).map_err(ApiError::Validation)?;
        update.published_year = Some(year);
    }
    if let Some(genre) = &input.genre {
        let genre = canonical_genre(genre).ok_or_else(|| ApiError::Validation(genre_error()))?;
        update.genre = Some(genre.to_string());
    }
    if let Some(author) = &input.author {
        update.author_id = Some(resolve_author(db, author).await?);
    }

    books.update(id, update).await?;
    get_book(db, id).await
}

/// Fetch a single book by id
pub async fn get_book(db: &Database, id: i64) -> ApiResult<BookRecord> {
    db.books()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".into()))
}

/// Delete a book by id; orphaned authors are deliberately left in place
pub async fn delete_book(db: &Database, id: i64) -> ApiResult<()> {
    if !db.books().delete(id).await? {
        return Err(ApiError::NotFound("Book not found".into()));
    }
    Ok(())
}

/// List books with filters, sorting and 1-indexed pagination
pub async fn list_books(db: &Database, params: BookListParams) -> ApiResult<Vec<BookRecord>> {
    if params.page < 1 {
        return Err(ApiError::Validation("page must be >= 1".into()));
    }
    if params.page_size < 1 || params.page_size > MAX_PAGE_SIZE {
        return Err(ApiError::Validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let sort_col = match params.sort_by.as_str() {
        "title" => "b.title",
        "author" => "a.full_name",
        "published_year" => "b.published_year",
        _ => {
            return Err(ApiError::Validation(
                "sort_by must be one of: title, author, published_year".into(),
            ));
        }
    };

    let sort_desc = match params.sort_order.to_ascii_lowercase().as_str() {
        "asc" => false,
        "desc" => true,
        _ => {
            return Err(ApiError::Validation(
                "sort_order must be 'asc' or 'desc'".into(),
            ));
        }
    };

    let query = BookQuery {
        title: params.title,
        author: params.author,
        genre: params.genre,
        year_from: params.year_from,
        year_to: params.year_to,
        sort_col,
        sort_desc,
        limit: params.page_size,
        offset: (params.page - 1) * params.page_size,
    };

    Ok(db.books().list(&query).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_matching_is_case_insensitive_and_canonicalizing() {
        assert_eq!(canonical_genre("Fiction"), Some("Fiction"));
        assert_eq!(canonical_genre("fiction"), Some("Fiction"));
        assert_eq!(canonical_genre("NON-FICTION"), Some("Non-fiction"));
        assert_eq!(canonical_genre("  history "), Some("History"));
        assert_eq!(canonical_genre("Poetry"), None);
        assert_eq!(canonical_genre(""), None);
    }

    #[test]
    fn published_year_bounds_are_inclusive() {
        assert!(validate_published_year(1799).is_err());
        assert!(validate_published_year(1800).is_ok());
        assert!(validate_published_year(current_year()).is_ok());
        assert!(validate_published_year(current_year() + 1).is_err());
    }
}
