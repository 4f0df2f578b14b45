//! Database module for SQLite persistence using SeaORM

pub mod entities;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;

/// Initialize database connection and create tables
pub async fn init_database(db_path: &Path) -> Result<DatabaseConnection, DbErr> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    tracing::info!("Connecting to database: {}", db_url);

    let db = Database::connect(&db_url).await?;

    create_tables(&db).await?;

    Ok(db)
}

async fn execute(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string()))
        .await?;
    Ok(())
}

/// Create all tables if they don't exist
async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Physical assets, one row per CDN public ID
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS physical_assets (
            public_id TEXT PRIMARY KEY,
            resource_type TEXT NOT NULL DEFAULT 'image',
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .await?;

    // Placeholder links. No foreign key: asset deletion removes links explicitly
    // inside the same transaction.
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS placeholder_links (
            placeholder_id TEXT PRIMARY KEY,
            public_id TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"CREATE INDEX IF NOT EXISTS idx_placeholder_links_public ON placeholder_links(public_id)"#,
    )
    .await?;

    // Discovered placeholders (duplicates allowed across page/section)
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS logical_placeholders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            placeholder_id TEXT NOT NULL,
            area TEXT NOT NULL,
            page TEXT NOT NULL,
            section TEXT NOT NULL,
            dimensions TEXT,
            description TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE(placeholder_id, page, section)
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"CREATE INDEX IF NOT EXISTS idx_logical_placeholders_id ON logical_placeholders(placeholder_id)"#,
    )
    .await?;

    tracing::info!("Database tables initialized");
    Ok(())
}
