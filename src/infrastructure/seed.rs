use sea_orm::*;

use crate::models::book::{self, NewBook};
use crate::models::member::NewMember;
use crate::services::{book_service, member_service};

pub const DEMO_MEMBER_ID: &str = "demo-member";

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Demo member (registration is idempotent)
    member_service::register_member(
        db,
        DEMO_MEMBER_ID,
        NewMember {
            full_name: "Demo Member".to_owned(),
            email: "demo@example.com".to_owned(),
        },
    )
    .await
    .map_err(|e| DbErr::Custom(e.to_string()))?;

    // 2. Books, only into an empty catalogue
    if book::Entity::find().count(db).await? > 0 {
        tracing::info!("Catalogue not empty, skipping demo books");
        return Ok(());
    }

    let books = vec![
        ("The Hobbit", "J.R.R. Tolkien", "9780547928227", "Fantasy", 3),
        ("Foundation", "Isaac Asimov", "9780553293357", "Science Fiction", 2),
        ("Dune", "Frank Herbert", "9780441172719", "Science Fiction", 1),
    ];

    for (title, author, isbn, category, copies) in books {
        book_service::create_book(
            db,
            NewBook {
                title: title.to_owned(),
                author: author.to_owned(),
                isbn: Some(isbn.to_owned()),
                category: Some(category.to_owned()),
                description: None,
                cover_image_url: None,
                total_copies: copies,
            },
        )
        .await
        .map_err(|e| DbErr::Custom(e.to_string()))?;
    }

    Ok(())
}
