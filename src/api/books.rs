//! Book catalog endpoints and the bulk-import upload

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use super::require_user;
use crate::db::BookRecord;
use crate::error::{ApiError, ApiResult};
use crate::services::catalog::{self, BookListParams, CreateBookInput, UpdateBookInput};
use crate::services::import::{self, ImportOutcome};
use crate::AppState;

/// Add a new book; requires authentication
async fn create_book(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<CreateBookInput>,
) -> ApiResult<(StatusCode, Json<BookRecord>)> {
    require_user(&state, bearer.as_ref()).await?;
    let book = catalog::create_book(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// List books with filtering, sorting and pagination
async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> ApiResult<Json<Vec<BookRecord>>> {
    let books = catalog::list_books(&state.db, params).await?;
    Ok(Json(books))
}

/// Get a single book by id
async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> ApiResult<Json<BookRecord>> {
    let book = catalog::get_book(&state.db, book_id).await?;
    Ok(Json(book))
}

/// Update an existing book; only supplied fields are modified
async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<UpdateBookInput>,
) -> ApiResult<Json<BookRecord>> {
    require_user(&state, bearer.as_ref()).await?;
    let book = catalog::update_book(&state.db, book_id, body).await?;
    Ok(Json(book))
}

/// Delete a book by id
async fn delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> ApiResult<StatusCode> {
    require_user(&state, bearer.as_ref()).await?;
    catalog::delete_book(&state.db, book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk import books from an uploaded .csv or .json file
async fn bulk_import_books(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ImportOutcome>)> {
    require_user(&state, bearer.as_ref()).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file: {e}")))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        ApiError::Validation("No file provided. Use multipart field name 'file'.".into())
    })?;

    let outcome = import::bulk_import(&state.db, &filename, &bytes).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/bulk-import", post(bulk_import_books))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
}
