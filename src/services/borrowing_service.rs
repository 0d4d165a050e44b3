//! Borrowing Service - copy counts and borrowing state transitions
//!
//! `borrow` and `return_book` each write a borrowing row and move the book's
//! available-copy counter. Both writes share one transaction and the counter
//! only moves through conditional updates, so concurrent callers can never
//! push it outside `0..=total_copies`.
//!
//! Every transaction opens with its conditional write. SQLite then queues
//! concurrent writers on the database lock instead of failing them on a
//! stale read snapshot.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use crate::domain::circulation::{DEFAULT_LOAN_PERIOD_DAYS, due_date, recount_available};
use crate::domain::{BorrowingStatus, CirculationError, CopyReductionPolicy, Resource};
use crate::infrastructure::config::Config;
use crate::models::Borrowing;
use crate::models::book::{self, Entity as BookEntity};
use crate::models::borrowing::{self, Entity as BorrowingEntity};
use crate::models::member::Entity as MemberEntity;

/// Compare-and-set attempts for a copy-count edit before giving up
const MAX_COPY_UPDATE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct BorrowingService {
    db: DatabaseConnection,
    loan_period_days: i64,
    reduction_policy: CopyReductionPolicy,
}

impl BorrowingService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            reduction_policy: CopyReductionPolicy::default(),
        }
    }

    pub fn from_config(db: DatabaseConnection, config: &Config) -> Self {
        Self::new(db)
            .with_loan_period_days(config.loan_period_days)
            .with_reduction_policy(config.copy_reduction_policy)
    }

    pub fn with_loan_period_days(mut self, days: i64) -> Self {
        self.loan_period_days = days;
        self
    }

    pub fn with_reduction_policy(mut self, policy: CopyReductionPolicy) -> Self {
        self.reduction_policy = policy;
        self
    }

    /// Lend one copy of `book_id` to `member_id`.
    ///
    /// Checks run in a fixed order: caller identity, book existence, copies
    /// left, then an existing open borrowing by the same member.
    pub async fn borrow(
        &self,
        book_id: i32,
        member_id: Option<&str>,
    ) -> Result<Borrowing, CirculationError> {
        let member_id = member_id.ok_or(CirculationError::Unauthenticated)?;
        if MemberEntity::find_by_id(member_id.to_owned())
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(CirculationError::Unauthenticated);
        }

        let now = Utc::now();
        let due = due_date(now, self.loan_period_days)?;

        let txn = self.db.begin().await?;

        if !take_copy(&txn, book_id, now).await? {
            return match BookEntity::find_by_id(book_id).one(&txn).await? {
                None => Err(CirculationError::NotFound(Resource::Book)),
                Some(_) => {
                    tracing::debug!(book_id, member_id, "No copy left on the shelf");
                    Err(CirculationError::Unavailable)
                }
            };
        }

        // Dropping the transaction puts the copy back
        if count_open_borrowings(&txn, book_id, Some(member_id)).await? > 0 {
            return Err(CirculationError::AlreadyBorrowed);
        }

        let saved = insert_open_borrowing(&txn, book_id, member_id, now, due).await?;

        txn.commit().await?;

        tracing::info!(
            borrowing_id = saved.id,
            book_id,
            member_id,
            due_date = %saved.due_date,
            "Book borrowed"
        );

        Borrowing::try_from(saved)
    }

    /// Close an open borrowing and put its copy back on the shelf.
    pub async fn return_book(&self, borrowing_id: i32) -> Result<Borrowing, CirculationError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let closed = BorrowingEntity::update_many()
            .col_expr(
                borrowing::Column::Status,
                Expr::value(BorrowingStatus::Returned.as_str()),
            )
            .col_expr(borrowing::Column::ReturnedDate, Expr::value(now))
            .filter(borrowing::Column::Id.eq(borrowing_id))
            .filter(borrowing::Column::Status.eq(BorrowingStatus::Borrowed.as_str()))
            .exec(&txn)
            .await?;

        let record = BorrowingEntity::find_by_id(borrowing_id)
            .one(&txn)
            .await?
            .ok_or(CirculationError::NotFound(Resource::Borrowing))?;

        if closed.rows_affected == 0 {
            return Err(already_returned(borrowing_id));
        }

        let current = Borrowing::try_from(record)?;

        // Give the copy back, never beyond the owned total
        let restored = BookEntity::update_many()
            .col_expr(
                book::Column::AvailableCopies,
                Expr::col(book::Column::AvailableCopies).add(1),
            )
            .col_expr(book::Column::UpdatedAt, Expr::value(now))
            .filter(book::Column::Id.eq(current.book_id))
            .filter(
                Expr::col(book::Column::AvailableCopies).lt(Expr::col(book::Column::TotalCopies)),
            )
            .exec(&txn)
            .await?;

        if restored.rows_affected == 0 {
            tracing::warn!(
                borrowing_id,
                book_id = current.book_id,
                "Available copies already at total, increment clamped"
            );
        }

        txn.commit().await?;

        tracing::info!(borrowing_id, book_id = current.book_id, "Book returned");

        Ok(current)
    }

    /// Change how many copies the library owns, shifting the shelf count by
    /// the same delta.
    pub async fn update_book_copies(
        &self,
        book_id: i32,
        new_total_copies: i32,
    ) -> Result<book::Model, CirculationError> {
        if new_total_copies < 1 {
            return Err(CirculationError::Validation(
                "total copies must be at least 1".to_string(),
            ));
        }

        for attempt in 1..=MAX_COPY_UPDATE_ATTEMPTS {
            let current = BookEntity::find_by_id(book_id)
                .one(&self.db)
                .await?
                .ok_or(CirculationError::NotFound(Resource::Book))?;

            let new_available = recount_available(
                current.total_copies,
                current.available_copies,
                new_total_copies,
                self.reduction_policy,
            )?;

            let on_loan = current.total_copies - current.available_copies;
            if on_loan > new_total_copies {
                tracing::warn!(
                    book_id,
                    on_loan,
                    new_total_copies,
                    "More copies on loan than the new total, available copies floored at 0"
                );
            }

            let now = Utc::now();

            // Write only if nobody moved the counters since we read them
            let result = BookEntity::update_many()
                .col_expr(book::Column::TotalCopies, Expr::value(new_total_copies))
                .col_expr(book::Column::AvailableCopies, Expr::value(new_available))
                .col_expr(book::Column::UpdatedAt, Expr::value(now))
                .filter(book::Column::Id.eq(book_id))
                .filter(book::Column::TotalCopies.eq(current.total_copies))
                .filter(book::Column::AvailableCopies.eq(current.available_copies))
                .exec(&self.db)
                .await?;

            if result.rows_affected == 1 {
                tracing::info!(
                    book_id,
                    total_copies = new_total_copies,
                    available_copies = new_available,
                    "Book copies updated"
                );
                return Ok(book::Model {
                    total_copies: new_total_copies,
                    available_copies: new_available,
                    updated_at: now,
                    ..current
                });
            }

            tracing::warn!(book_id, attempt, "Copy counters changed concurrently, retrying");
        }

        Err(CirculationError::Conflict(format!(
            "book {} kept changing, copy count not updated",
            book_id
        )))
    }

    /// Remove a book that nobody currently holds.
    pub async fn delete_book(&self, book_id: i32) -> Result<(), CirculationError> {
        let open_borrowings = Query::select()
            .expr(Expr::val(1))
            .from(BorrowingEntity)
            .and_where(
                Expr::col((BorrowingEntity, borrowing::Column::BookId))
                    .equals((BookEntity, book::Column::Id)),
            )
            .and_where(
                Expr::col((BorrowingEntity, borrowing::Column::Status))
                    .eq(BorrowingStatus::Borrowed.as_str()),
            )
            .to_owned();

        // Single statement, so a borrow cannot slip in between check and delete
        let result = BookEntity::delete_many()
            .filter(book::Column::Id.eq(book_id))
            .filter(Expr::exists(open_borrowings).not())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let open = count_open_borrowings(&self.db, book_id, None).await?;
            if open > 0 {
                return Err(CirculationError::Conflict(format!(
                    "cannot delete: {} active borrowings exist",
                    open
                )));
            }
            return Err(CirculationError::NotFound(Resource::Book));
        }

        tracing::info!(book_id, "Book deleted");
        Ok(())
    }

    /// Whether `member_id` currently holds a copy of `book_id`
    pub async fn is_borrowed_by(
        &self,
        book_id: i32,
        member_id: &str,
    ) -> Result<bool, CirculationError> {
        Ok(count_open_borrowings(&self.db, book_id, Some(member_id)).await? > 0)
    }

    pub async fn find_borrowing(&self, borrowing_id: i32) -> Result<Borrowing, CirculationError> {
        let record = BorrowingEntity::find_by_id(borrowing_id)
            .one(&self.db)
            .await?
            .ok_or(CirculationError::NotFound(Resource::Borrowing))?;
        Borrowing::try_from(record)
    }

    /// Borrowings past their due date that are still out, oldest first
    pub async fn overdue_borrowings(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Borrowing>, CirculationError> {
        BorrowingEntity::find()
            .filter(borrowing::Column::Status.eq(BorrowingStatus::Borrowed.as_str()))
            .filter(borrowing::Column::DueDate.lt(now))
            .order_by_asc(borrowing::Column::DueDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Borrowing::try_from)
            .collect()
    }
}

/// Take one copy off the shelf if any is left. Returns whether a copy was taken.
async fn take_copy<C>(conn: &C, book_id: i32, now: DateTime<Utc>) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let taken = BookEntity::update_many()
        .col_expr(
            book::Column::AvailableCopies,
            Expr::col(book::Column::AvailableCopies).sub(1),
        )
        .col_expr(book::Column::UpdatedAt, Expr::value(now))
        .filter(book::Column::Id.eq(book_id))
        .filter(book::Column::AvailableCopies.gt(0))
        .exec(conn)
        .await?;

    Ok(taken.rows_affected == 1)
}

/// Insert the open borrowing row. A second open row for the same pair is
/// refused by `idx_borrowings_open_pair`.
async fn insert_open_borrowing<C>(
    conn: &C,
    book_id: i32,
    member_id: &str,
    borrowed_at: DateTime<Utc>,
    due: DateTime<Utc>,
) -> Result<borrowing::Model, CirculationError>
where
    C: ConnectionTrait,
{
    let record = borrowing::ActiveModel {
        book_id: Set(book_id),
        member_id: Set(member_id.to_owned()),
        borrowed_date: Set(borrowed_at),
        due_date: Set(due),
        returned_date: Set(None),
        status: Set(BorrowingStatus::Borrowed.as_str().to_owned()),
        ..Default::default()
    };

    match record.insert(conn).await {
        Ok(saved) => Ok(saved),
        Err(e) if is_unique_violation(&e) => Err(CirculationError::AlreadyBorrowed),
        Err(e) => Err(e.into()),
    }
}

async fn count_open_borrowings<C>(
    conn: &C,
    book_id: i32,
    member_id: Option<&str>,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = BorrowingEntity::find()
        .filter(borrowing::Column::BookId.eq(book_id))
        .filter(borrowing::Column::Status.eq(BorrowingStatus::Borrowed.as_str()));

    if let Some(member_id) = member_id {
        query = query.filter(borrowing::Column::MemberId.eq(member_id));
    }

    query.count(conn).await
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn already_returned(borrowing_id: i32) -> CirculationError {
    CirculationError::InvalidState(format!("borrowing {} is already returned", borrowing_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::book::NewBook;
    use crate::models::member::NewMember;
    use crate::services::{book_service, member_service};

    async fn setup() -> (BorrowingService, i32) {
        let db = db::init_db("sqlite::memory:").await.unwrap();
        member_service::register_member(
            &db,
            "member-a",
            NewMember {
                full_name: "Member A".to_string(),
                email: "a@example.com".to_string(),
            },
        )
        .await
        .unwrap();
        let book = book_service::create_book(
            &db,
            NewBook {
                title: "Indexed".to_string(),
                author: "Test Author".to_string(),
                isbn: None,
                category: None,
                description: None,
                cover_image_url: None,
                total_copies: 2,
            },
        )
        .await
        .unwrap();
        (BorrowingService::new(db), book.id)
    }

    #[tokio::test]
    async fn second_open_row_is_refused_and_rolled_back() {
        let (service, book_id) = setup().await;
        service.borrow(book_id, Some("member-a")).await.unwrap();

        let now = Utc::now();
        let due = due_date(now, DEFAULT_LOAN_PERIOD_DAYS).unwrap();

        let txn = service.db.begin().await.unwrap();
        assert!(take_copy(&txn, book_id, now).await.unwrap());
        let err = insert_open_borrowing(&txn, book_id, "member-a", now, due)
            .await
            .unwrap_err();
        assert_eq!(err, CirculationError::AlreadyBorrowed);
        txn.rollback().await.unwrap();

        let book = BookEntity::find_by_id(book_id)
            .one(&service.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(book.available_copies, 1);
        assert_eq!(
            count_open_borrowings(&service.db, book_id, None)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn take_copy_stops_at_zero() {
        let (service, book_id) = setup().await;
        let now = Utc::now();

        assert!(take_copy(&service.db, book_id, now).await.unwrap());
        assert!(take_copy(&service.db, book_id, now).await.unwrap());
        assert!(!take_copy(&service.db, book_id, now).await.unwrap());
        assert!(!take_copy(&service.db, 9999, now).await.unwrap());
    }
}
