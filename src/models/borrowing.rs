use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::circulation::is_overdue;
use crate::domain::{BorrowingStatus, CirculationError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "borrowings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub book_id: i32,
    pub member_id: String,
    pub borrowed_date: DateTimeUtc,
    pub due_date: DateTimeUtc,
    pub returned_date: Option<DateTimeUtc>,
    pub status: String, // 'borrowed', 'returned'
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Book,
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Member,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A borrowing row checked at the store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: i32,
    pub book_id: i32,
    pub member_id: String,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: BorrowingStatus,
}

impl TryFrom<Model> for Borrowing {
    type Error = CirculationError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status: BorrowingStatus = model.status.parse()?;

        // A returned borrowing always carries its return date and vice versa.
        if (status == BorrowingStatus::Returned) != model.returned_date.is_some() {
            return Err(CirculationError::Store(format!(
                "borrowing {} is '{}' with returned_date {:?}",
                model.id, model.status, model.returned_date
            )));
        }

        Ok(Self {
            id: model.id,
            book_id: model.book_id,
            member_id: model.member_id,
            borrowed_date: model.borrowed_date,
            due_date: model.due_date,
            returned_date: model.returned_date,
            status,
        })
    }
}

impl Borrowing {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        is_overdue(self.status, self.due_date, now)
    }
}

/// Borrowing enriched with the book it refers to
#[derive(Debug, Clone, Serialize)]
pub struct BorrowingDetails {
    #[serde(flatten)]
    pub borrowing: Borrowing,
    pub is_overdue: bool,
    pub book_title: String,
    pub book_author: String,
    pub cover_image_url: Option<String>,
}

impl BorrowingDetails {
    pub fn new(
        borrowing: Borrowing,
        book: Option<super::book::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        let is_overdue = borrowing.is_overdue(now);
        let (book_title, book_author, cover_image_url) = match book {
            Some(book) => (book.title, book.author, book.cover_image_url),
            None => ("Unknown".to_string(), "Unknown".to_string(), None),
        };

        Self {
            borrowing,
            is_overdue,
            book_title,
            book_author,
            cover_image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(status: &str, returned_date: Option<DateTimeUtc>) -> Model {
        let now = Utc::now();
        Model {
            id: 7,
            book_id: 1,
            member_id: "member-a".to_string(),
            borrowed_date: now,
            due_date: now + Duration::days(14),
            returned_date,
            status: status.to_string(),
        }
    }

    #[test]
    fn accepts_consistent_rows() {
        let borrowing = Borrowing::try_from(row("borrowed", None)).unwrap();
        assert_eq!(borrowing.status, BorrowingStatus::Borrowed);

        let borrowing = Borrowing::try_from(row("returned", Some(Utc::now()))).unwrap();
        assert_eq!(borrowing.status, BorrowingStatus::Returned);
    }

    #[test]
    fn rejects_unknown_status() {
        let err = Borrowing::try_from(row("lost", None)).unwrap_err();
        assert!(matches!(err, CirculationError::Store(_)));
    }

    #[test]
    fn rejects_returned_without_date() {
        assert!(Borrowing::try_from(row("returned", None)).is_err());
        assert!(Borrowing::try_from(row("borrowed", Some(Utc::now()))).is_err());
    }

    #[test]
    fn details_fall_back_when_book_is_missing() {
        let borrowing = Borrowing::try_from(row("borrowed", None)).unwrap();
        let details = BorrowingDetails::new(borrowing, None, Utc::now());
        assert_eq!(details.book_title, "Unknown");
        assert!(!details.is_overdue);
    }
}
