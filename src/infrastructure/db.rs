use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

const MAX_CONNECTIONS: u32 = 10;

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);

    // Every pooled connection to an in-memory database must see the same data
    if database_url.contains(":memory:") {
        options.max_connections(1);
    } else {
        options.max_connections(MAX_CONNECTIONS);
    }

    let db = Database::connect(options).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn execute(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        sql.to_owned(),
    ))
    .await?;
    Ok(())
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Create books table
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            isbn TEXT,
            category TEXT,
            description TEXT,
            cover_image_url TEXT,
            total_copies INTEGER NOT NULL DEFAULT 1 CHECK (total_copies >= 0),
            available_copies INTEGER NOT NULL DEFAULT 1
                CHECK (available_copies >= 0 AND available_copies <= total_copies),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .await?;

    // Create members table (ids come from the authentication provider)
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            address TEXT,
            membership_type TEXT NOT NULL DEFAULT 'standard',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .await?;

    // Create borrowings table
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS borrowings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL,
            member_id TEXT NOT NULL,
            borrowed_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            returned_date TEXT,
            status TEXT NOT NULL DEFAULT 'borrowed'
                CHECK (status IN ('borrowed', 'returned')),
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY (member_id) REFERENCES members(id) ON DELETE CASCADE
        )
        "#,
    )
    .await?;

    // One open borrowing per (book, member)
    execute(
        db,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_borrowings_open_pair
        ON borrowings(book_id, member_id) WHERE status = 'borrowed'
        "#,
    )
    .await?;

    execute(
        db,
        "CREATE INDEX IF NOT EXISTS idx_borrowings_member_id ON borrowings(member_id)",
    )
    .await?;
    execute(
        db,
        "CREATE INDEX IF NOT EXISTS idx_borrowings_book_status ON borrowings(book_id, status)",
    )
    .await?;
    execute(
        db,
        "CREATE INDEX IF NOT EXISTS idx_books_title ON books(title)",
    )
    .await?;

    Ok(())
}
