use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    /// Copies the library owns.
    pub total_copies: i32,
    /// Copies on the shelf right now. Always within `0..=total_copies`;
    /// only the borrowing service writes it.
    pub available_copies: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::borrowing::Entity")]
    Borrowings,
}

impl Related<super::borrowing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Borrowings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Input for adding a book to the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    #[serde(default = "default_total_copies")]
    pub total_copies: i32,
}

fn default_total_copies() -> i32 {
    1
}

/// Administrative edit of a catalogued book. `total_copies`, when present,
/// goes through the copy recount rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub total_copies: Option<i32>,
}
