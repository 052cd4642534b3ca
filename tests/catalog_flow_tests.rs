//! Book catalog CRUD and listing tests against an in-memory database

mod common;

use assert_matches::assert_matches;
use bookstack::error::ApiError;
use bookstack::services::catalog::{
    self, current_year, BookListParams, CreateBookInput, UpdateBookInput,
};
use pretty_assertions::assert_eq;

use common::test_db;

fn book(title: &str, author: &str, year: i64, genre: &str) -> CreateBookInput {
    CreateBookInput {
        title: title.to_string(),
        author: author.to_string(),
        published_year: year,
        genre: genre.to_string(),
    }
}

async fn author_count(db: &bookstack::db::Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM authors")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn create_and_fetch_roundtrip() {
    let db = test_db().await;

    let created = catalog::create_book(&db, book("Dune", "Frank Herbert", 1965, "Fiction"))
        .await
        .unwrap();
    assert_eq!(created.title, "Dune");
    assert_eq!(created.author, "Frank Herbert");
    assert_eq!(created.published_year, 1965);
    assert!(!created.created_at.is_empty());

    let fetched = catalog::get_book(&db, created.id).await.unwrap();
    assert_eq!(fetched.title, "Dune");
    assert_eq!(fetched.author, "Frank Herbert");
}

#[tokio::test]
async fn same_author_name_creates_one_author_row() {
    let db = test_db().await;

    catalog::create_book(&db, book("Dune", "Frank Herbert", 1965, "Fiction"))
        .await
        .unwrap();
    // name is trimmed before dedup
    catalog::create_book(&db, book("Dune Messiah", "  Frank Herbert ", 1969, "Fiction"))
        .await
        .unwrap();

    assert_eq!(author_count(&db).await, 1);
}

#[tokio::test]
async fn genre_is_canonicalized_case_insensitively() {
    let db = test_db().await;

    let created = catalog::create_book(&db, book("Dune", "Frank Herbert", 1965, "fiction"))
        .await
        .unwrap();
    assert_eq!(created.genre, "Fiction");

    let err = catalog::create_book(&db, book("Dune", "Frank Herbert", 1965, "Poetry"))
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Validation(_));
}

#[tokio::test]
async fn published_year_is_validated_on_create_and_update() {
    let db = test_db().await;

    let err = catalog::create_book(&db, book("Old", "Nobody", 1799, "Fiction"))
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Validation(_));

    let err = catalog::create_book(&db, book("Future", "Nobody", current_year() + 1, "Fiction"))
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Validation(_));

    let created = catalog::create_book(&db, book("Dune", "Frank Herbert", 1965, "Fiction"))
        .await
        .unwrap();
    let err = catalog::update_book(
        &db,
        created.id,
        UpdateBookInput {
            published_year: Some(1799),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, ApiError::Validation(_));
}

#[tokio::test]
async fn empty_author_name_is_rejected() {
    let db = test_db().await;
    let err = catalog::create_book(&db, book("Dune", "   ", 1965, "Fiction"))
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Validation(_));
    assert_eq!(author_count(&db).await, 0);
}

#[tokio::test]
async fn update_touches_only_supplied_fields() {
    let db = test_db().await;
    let created = catalog::create_book(&db, book("Dune", "Frank Herbert", 1965, "Fiction"))
        .await
        .unwrap();

    let updated = catalog::update_book(
        &db,
        created.id,
        UpdateBookInput {
            published_year: Some(1966),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.published_year, 1966);
    assert_eq!(updated.title, "Dune");
    assert_eq!(updated.author, "Frank Herbert");

    let updated = catalog::update_book(
        &db,
        created.id,
        UpdateBookInput {
            author: Some("F. Herbert".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.author, "F. Herbert");
    assert_eq!(author_count(&db).await, 2);

    let err = catalog::update_book(&db, 9999, UpdateBookInput::default())
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::NotFound(_));
}

#[tokio::test]
async fn delete_reports_not_found_for_missing_ids() {
    let db = test_db().await;

    assert_matches!(
        catalog::delete_book(&db, 42).await.unwrap_err(),
        ApiError::NotFound(_)
    );

    let created = catalog::create_book(&db, book("Dune", "Frank Herbert", 1965, "Fiction"))
        .await
        .unwrap();
    catalog::delete_book(&db, created.id).await.unwrap();

    assert_matches!(
        catalog::get_book(&db, created.id).await.unwrap_err(),
        ApiError::NotFound(_)
    );
    assert_matches!(
        catalog::delete_book(&db, created.id).await.unwrap_err(),
        ApiError::NotFound(_)
    );

    // deleting the only book leaves its author behind on purpose
    assert_eq!(author_count(&db).await, 1);
}

#[tokio::test]
async fn list_filters_sorts_and_paginates() {
    let db = test_db().await;
    for input in [
        book("Dune", "Frank Herbert", 1965, "Fiction"),
        book("A Brief History of Time", "Stephen Hawking", 1988, "Science"),
        book("The Hobbit", "J.R.R. Tolkien", 1937, "Fiction"),
    ] {
        catalog::create_book(&db, input).await.unwrap();
    }

    // substring filters are case-insensitive
    let hits = catalog::list_books(
        &db,
        BookListParams {
            title: Some("dune".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Dune");

    let hits = catalog::list_books(
        &db,
        BookListParams {
            author: Some("tolkien".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hits.len(), 1);

    let hits = catalog::list_books(
        &db,
        BookListParams {
            genre: Some("Science".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "A Brief History of Time");

    // inclusive year range
    let hits = catalog::list_books(
        &db,
        BookListParams {
            year_from: Some(1965),
            year_to: Some(1988),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hits.len(), 2);

    let hits = catalog::list_books(
        &db,
        BookListParams {
            sort_by: "published_year".to_string(),
            sort_order: "desc".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hits[0].published_year, 1988);

    // 1-indexed pagination: page 2 of size 1, sorted by title ascending
    let hits = catalog::list_books(
        &db,
        BookListParams {
            page: 2,
            page_size: 1,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Dune");
}

#[tokio::test]
async fn list_rejects_bad_parameters() {
    let db = test_db().await;

    for params in [
        BookListParams {
            sort_by: "id".to_string(),
            ..Default::default()
        },
        BookListParams {
            sort_order: "sideways".to_string(),
            ..Default::default()
        },
        BookListParams {
            page: 0,
            ..Default::default()
        },
        BookListParams {
            page_size: 101,
            ..Default::default()
        },
    ] {
        assert_matches!(
            catalog::list_books(&db, params).await.unwrap_err(),
            ApiError::Validation(_)
        );
    }
}
