//! Book Service - catalogue reads, book creation and descriptive edits
//!
//! Copy counters are owned by the borrowing service; the only write here that
//! touches them sets them up when a book enters the catalogue.
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use crate::domain::{CirculationError, Resource};
use crate::models::book::{self, BookUpdate, Column, Entity as BookEntity, NewBook};

/// Which column a search query is matched against
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    All,
    Title,
    Author,
    Isbn,
    Description,
}

/// Filter parameters for listing books
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookFilter {
    /// Case-insensitive substring
    pub q: Option<String>,
    /// Restricts `q` to one column; every searchable column by default
    #[serde(default)]
    pub field: SearchField,
    pub category: Option<String>,
}

/// List books ordered by title
pub async fn list_books(
    db: &DatabaseConnection,
    filter: BookFilter,
) -> Result<Vec<book::Model>, CirculationError> {
    tracing::debug!(
        "List books - Filters: q={:?}, field={:?}, category={:?}",
        filter.q,
        filter.field,
        filter.category
    );

    let mut query = BookEntity::find();

    if let Some(q) = filter.q.as_deref().map(str::trim)
        && !q.is_empty()
    {
        let cond = match filter.field {
            SearchField::All => Condition::any()
                .add(Column::Title.contains(q))
                .add(Column::Author.contains(q))
                .add(Column::Isbn.contains(q))
                .add(Column::Description.contains(q)),
            SearchField::Title => Condition::all().add(Column::Title.contains(q)),
            SearchField::Author => Condition::all().add(Column::Author.contains(q)),
            SearchField::Isbn => Condition::all().add(Column::Isbn.contains(q)),
            SearchField::Description => Condition::all().add(Column::Description.contains(q)),
        };
        query = query.filter(cond);
    }

    if let Some(category) = filter.category.as_deref()
        && !category.is_empty()
        && category != "all"
    {
        query = query.filter(Column::Category.eq(category));
    }

    let books = query.order_by_asc(Column::Title).all(db).await?;
    Ok(books)
}

pub async fn get_book(db: &DatabaseConnection, id: i32) -> Result<book::Model, CirculationError> {
    BookEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(CirculationError::NotFound(Resource::Book))
}

/// Add a book with every copy on the shelf
pub async fn create_book(
    db: &DatabaseConnection,
    input: NewBook,
) -> Result<book::Model, CirculationError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(CirculationError::Validation(
            "title must not be empty".to_string(),
        ));
    }
    if input.total_copies < 1 {
        return Err(CirculationError::Validation(
            "total copies must be at least 1".to_string(),
        ));
    }

    let now = Utc::now();
    let new_book = book::ActiveModel {
        title: Set(title.to_owned()),
        author: Set(input.author.trim().to_owned()),
        isbn: Set(input.isbn),
        category: Set(input.category),
        description: Set(input.description),
        cover_image_url: Set(input.cover_image_url.filter(|url| !url.is_empty())),
        total_copies: Set(input.total_copies),
        available_copies: Set(input.total_copies),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let saved = new_book.insert(db).await?;
    tracing::info!(book_id = saved.id, title = %saved.title, "Book added to catalogue");
    Ok(saved)
}

/// Reject an edit before anything is written
pub fn validate_update(update: &BookUpdate) -> Result<(), CirculationError> {
    if update.title.trim().is_empty() {
        return Err(CirculationError::Validation(
            "title must not be empty".to_string(),
        ));
    }
    if let Some(total) = update.total_copies
        && total < 1
    {
        return Err(CirculationError::Validation(
            "total copies must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Overwrite the descriptive fields of a book. Copy counters are left alone.
pub async fn update_book(
    db: &DatabaseConnection,
    id: i32,
    update: BookUpdate,
) -> Result<book::Model, CirculationError> {
    validate_update(&update)?;

    let existing = get_book(db, id).await?;
    let mut active: book::ActiveModel = existing.into();
    active.title = Set(update.title.trim().to_owned());
    active.author = Set(update.author.trim().to_owned());
    active.isbn = Set(update.isbn.filter(|isbn| !isbn.is_empty()));
    active.category = Set(update.category.filter(|category| !category.is_empty()));
    active.description = Set(update.description.filter(|d| !d.is_empty()));
    active.cover_image_url = Set(update.cover_image_url.filter(|url| !url.is_empty()));
    active.updated_at = Set(Utc::now());

    let saved = active.update(db).await?;
    tracing::info!(book_id = saved.id, title = %saved.title, "Book details updated");
    Ok(saved)
}

/// Count books in the catalogue
pub async fn count_books(db: &DatabaseConnection) -> Result<u64, CirculationError> {
    Ok(BookEntity::find().count(db).await?)
}
