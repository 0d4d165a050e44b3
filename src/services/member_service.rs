//! Member Service - profiles, borrowing lists and dashboard figures

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use serde::Serialize;

use crate::domain::{BorrowingStatus, CirculationError, Resource};
use crate::models::book::Entity as BookEntity;
use crate::models::borrowing::{self, Entity as BorrowingEntity};
use crate::models::member::{self, Entity as MemberEntity, NewMember, ProfileUpdate};
use crate::models::{Borrowing, BorrowingDetails};
use crate::services::book_service;

/// Figures shown on a member's dashboard
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MemberStats {
    pub total_books: u64,
    pub currently_borrowed: u64,
    pub total_borrowings: u64,
}

/// Create the member record for an authenticated identity.
/// Registering an id twice returns the existing record.
pub async fn register_member(
    db: &DatabaseConnection,
    member_id: &str,
    input: NewMember,
) -> Result<member::Model, CirculationError> {
    if let Some(existing) = MemberEntity::find_by_id(member_id.to_owned()).one(db).await? {
        return Ok(existing);
    }

    if input.full_name.trim().is_empty() || !input.email.contains('@') {
        return Err(CirculationError::Validation(
            "a full name and a valid email are required".to_string(),
        ));
    }

    let new_member = member::ActiveModel {
        id: Set(member_id.to_owned()),
        full_name: Set(input.full_name.trim().to_owned()),
        email: Set(input.email.trim().to_owned()),
        phone: Set(None),
        address: Set(None),
        membership_type: Set("standard".to_owned()),
        created_at: Set(Utc::now()),
    };

    let saved = new_member.insert(db).await?;
    tracing::info!(member_id, "Member registered");
    Ok(saved)
}

pub async fn get_member(
    db: &DatabaseConnection,
    member_id: &str,
) -> Result<member::Model, CirculationError> {
    MemberEntity::find_by_id(member_id.to_owned())
        .one(db)
        .await?
        .ok_or(CirculationError::NotFound(Resource::Member))
}

pub async fn update_profile(
    db: &DatabaseConnection,
    member_id: &str,
    update: ProfileUpdate,
) -> Result<member::Model, CirculationError> {
    if update.full_name.trim().is_empty() {
        return Err(CirculationError::Validation(
            "full name must not be empty".to_string(),
        ));
    }

    let existing = get_member(db, member_id).await?;
    let mut active: member::ActiveModel = existing.into();
    active.full_name = Set(update.full_name.trim().to_owned());
    active.phone = Set(update.phone.filter(|p| !p.is_empty()));
    active.address = Set(update.address.filter(|a| !a.is_empty()));

    Ok(active.update(db).await?)
}

/// Borrowings the member still holds, soonest due first
pub async fn current_borrowings(
    db: &DatabaseConnection,
    member_id: &str,
) -> Result<Vec<BorrowingDetails>, CirculationError> {
    let query = BorrowingEntity::find()
        .filter(borrowing::Column::MemberId.eq(member_id))
        .filter(borrowing::Column::Status.eq(BorrowingStatus::Borrowed.as_str()))
        .order_by_asc(borrowing::Column::DueDate)
        .order_by_asc(borrowing::Column::Id);

    with_books(db, query).await
}

/// Every borrowing of the member, most recent first
pub async fn borrowing_history(
    db: &DatabaseConnection,
    member_id: &str,
) -> Result<Vec<BorrowingDetails>, CirculationError> {
    let query = BorrowingEntity::find()
        .filter(borrowing::Column::MemberId.eq(member_id))
        .order_by_desc(borrowing::Column::BorrowedDate)
        .order_by_desc(borrowing::Column::Id);

    with_books(db, query).await
}

pub async fn stats(
    db: &DatabaseConnection,
    member_id: &str,
) -> Result<MemberStats, CirculationError> {
    let total_books = book_service::count_books(db).await?;

    let currently_borrowed = BorrowingEntity::find()
        .filter(borrowing::Column::MemberId.eq(member_id))
        .filter(borrowing::Column::Status.eq(BorrowingStatus::Borrowed.as_str()))
        .count(db)
        .await?;

    let total_borrowings = BorrowingEntity::find()
        .filter(borrowing::Column::MemberId.eq(member_id))
        .count(db)
        .await?;

    Ok(MemberStats {
        total_books,
        currently_borrowed,
        total_borrowings,
    })
}

async fn with_books(
    db: &DatabaseConnection,
    query: Select<BorrowingEntity>,
) -> Result<Vec<BorrowingDetails>, CirculationError> {
    let now = Utc::now();
    let rows = query.find_also_related(BookEntity).all(db).await?;

    rows.into_iter()
        .map(|(record, book)| {
            Borrowing::try_from(record).map(|b| BorrowingDetails::new(b, book, now))
        })
        .collect()
}
