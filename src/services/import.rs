//! Bulk import of book records from CSV or JSON payloads.
//!
//! Rows are validated independently: a bad row is reported by its 1-indexed
//! position and the batch keeps going. Each successful row is inserted and
//! committed on its own, so rows imported before an infrastructure failure
//! stay durable.

use serde::Serialize;
use serde_json::Value;

use crate::db::{CreateBook, Database};
use crate::error::{ApiError, ApiResult};
use crate::services::catalog::{
    canonical_genre, genre_error, resolve_author, validate_published_year,
};

/// A row that failed validation or insertion
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub error: String,
}

/// Import result: rows inserted plus per-row failures, in row order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub errors: Vec<RowError>,
}

/// A row that passed validation
#[derive(Debug, PartialEq, Eq)]
struct ValidRow {
    title: String,
    author: String,
    published_year: i64,
    genre: &'static str,
}

/// Import books from an uploaded file; the declared filename picks the format
pub async fn bulk_import(db: &Database, filename: &str, bytes: &[u8]) -> ApiResult<ImportOutcome> {
    let lower = filename.to_ascii_lowercase();
    let rows = if lower.ends_with(".csv") {
        parse_csv(bytes)?
    } else if lower.ends_with(".json") {
        parse_json(bytes)?
    } else {
        return Err(ApiError::Validation(
            "Unsupported file type. Use .csv or .json".into(),
        ));
    };

    let books = db.books();
    let mut outcome = ImportOutcome::default();

    for (idx, raw) in &rows {
        let valid = match validate_row(raw) {
            Ok(valid) => valid,
            Err(error) => {
                outcome.errors.push(RowError { row: *idx, error });
                continue;
            }
        };

        // Store failures are also recorded per row; the batch never aborts
        let inserted = async {
            let author_id = resolve_author(db, &valid.author).await?;
            books
                .create(CreateBook {
                    title: valid.title.clone(),
                    author_id,
                    published_year: valid.published_year,
                    genre: valid.genre.to_string(),
                })
                .await?;
            Ok::<_, ApiError>(())
        }
        .await;

        match inserted {
            Ok(()) => outcome.inserted += 1,
            Err(err) => outcome.errors.push(RowError {
                row: *idx,
                error: err.to_string(),
            }),
        }
    }

    tracing::info!(
        inserted = outcome.inserted,
        failed = outcome.errors.len(),
        "bulk import finished"
    );
    Ok(outcome)
}

/// Parse CSV with header-driven field extraction into 1-indexed row objects
fn parse_csv(bytes: &[u8]) -> ApiResult<Vec<(usize, Value)>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| ApiError::Validation(format!("Invalid CSV: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ApiError::Validation(format!("Invalid CSV: {e}")))?;
        let mut row = serde_json::Map::new();
        for (name, field) in headers.iter().zip(record.iter()) {
            row.insert(name.to_string(), Value::String(field.to_string()));
        }
        rows.push((idx + 1, Value::Object(row)));
    }
    Ok(rows)
}

/// Parse JSON; the top level must be an array or the whole operation fails
/// before any row is processed
fn parse_json(bytes: &[u8]) -> ApiResult<Vec<(usize, Value)>> {
    let data: Value = serde_json::from_slice(bytes)
        .map_err(|e| ApiError::Validation(format!("Invalid JSON: {e}")))?;

    match data {
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| (idx + 1, item))
            .collect()),
        _ => Err(ApiError::Validation(
            "JSON must be an array of book objects".into(),
        )),
    }
}

/// Validate one raw row.
///
/// published_year given as a string is coerced only when it is purely digit
/// characters; anything else fails validation rather than being dropped.
fn validate_row(raw: &Value) -> Result<ValidRow, String> {
    let obj = raw.as_object().ok_or_else(|| "row must be an object".to_string())?;

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    let author = obj
        .get("author")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    if title.is_empty() {
        return Err("title is required".to_string());
    }
    if author.is_empty() {
        return Err("author is required".to_string());
    }

    let published_year = match obj.get("published_year") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| "published_year must be an integer".to_string())?,
        Some(Value::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => s
            .parse::<i64>()
            .map_err(|_| "published_year must be an integer".to_string())?,
        _ => return Err("published_year must be an integer".to_string()),
    };
    validate_published_year(published_year)?;

    let genre = obj
        .get("genre")
        .and_then(Value::as_str)
        .and_then(canonical_genre)
        .ok_or_else(genre_error)?;

    Ok(ValidRow {
        title,
        author,
        published_year,
        genre,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_with_digit_string_year_is_coerced() {
        let row = json!({"title": "A", "author": "B", "published_year": "2020", "genre": "Fiction"});
        let valid = validate_row(&row).unwrap();
        assert_eq!(valid.published_year, 2020);
        assert_eq!(valid.genre, "Fiction");
    }

    #[test]
    fn row_with_non_digit_year_string_is_rejected() {
        let row =
            json!({"title": "A", "author": "B", "published_year": "Year2020", "genre": "Fiction"});
        assert_eq!(
            validate_row(&row).unwrap_err(),
            "published_year must be an integer"
        );
    }

    #[test]
    fn row_with_float_year_is_rejected() {
        let row = json!({"title": "A", "author": "B", "published_year": 1999.5, "genre": "Fiction"});
        assert!(validate_row(&row).is_err());
    }

    #[test]
    fn row_year_out_of_range_is_rejected() {
        let row = json!({"title": "A", "author": "B", "published_year": 1799, "genre": "Fiction"});
        assert!(validate_row(&row).unwrap_err().starts_with("published_year must be between 1800"));
    }

    #[test]
    fn row_missing_fields_reports_first_failure() {
        let row = json!({"author": "B", "published_year": 1999, "genre": "Fiction"});
        assert_eq!(validate_row(&row).unwrap_err(), "title is required");

        let row = json!({"title": "A", "published_year": 1999, "genre": "Fiction"});
        assert_eq!(validate_row(&row).unwrap_err(), "author is required");
    }

    #[test]
    fn row_with_unknown_genre_is_rejected() {
        let row = json!({"title": "A", "author": "B", "published_year": 1999, "genre": "Poetry"});
        assert_eq!(
            validate_row(&row).unwrap_err(),
            "genre must be one of: Fiction, History, Non-fiction, Science"
        );
    }

    #[test]
    fn non_object_row_is_rejected() {
        assert_eq!(validate_row(&json!("whoops")).unwrap_err(), "row must be an object");
    }

    #[test]
    fn json_top_level_must_be_an_array() {
        assert!(parse_json(br#"{"title": "A"}"#).is_err());
        assert!(parse_json(b"not json at all").is_err());
        assert_eq!(parse_json(b"[]").unwrap().len(), 0);
    }

    #[test]
    fn csv_rows_are_keyed_by_header() {
        let rows = parse_csv(b"title,author,published_year,genre\nBook1,Author1,2020,Fiction")
            .unwrap();
        assert_eq!(rows.len(), 1);
        let (idx, row) = &rows[0];
        assert_eq!(*idx, 1);
        assert_eq!(row["title"], "Book1");
        assert_eq!(row["published_year"], "2020");
    }

    #[test]
    fn empty_csv_yields_zero_rows() {
        assert_eq!(parse_csv(b"").unwrap().len(), 0);
    }

    #[test]
    fn short_csv_record_fails_row_validation() {
        let rows = parse_csv(b"title,author,published_year,genre\nBook1,Author1").unwrap();
        assert_eq!(validate_row(&rows[0].1).unwrap_err(), "published_year must be an integer");
    }
}
