use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .context("parse DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(pool)
}

/// Create both tables if absent and backfill columns older databases may
/// lack. Safe to run on every startup.
pub async fn init_schema(db: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS usuarios (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            credential TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('fiel', 'paroquiano')),
            church TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS eventos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            date TEXT NOT NULL,
            time TEXT,
            kind TEXT,
            location TEXT,
            organizer TEXT,
            notes TEXT,
            church TEXT,
            user_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    add_missing_columns(db).await
}

/// `CREATE TABLE IF NOT EXISTS` leaves pre-existing tables untouched, so
/// the tenancy columns are probed and added individually.
async fn add_missing_columns(db: &SqlitePool) -> sqlx::Result<()> {
    let wanted: [(&str, &str); 2] = [
        ("church", "ALTER TABLE eventos ADD COLUMN church TEXT"),
        (
            "user_id",
            "ALTER TABLE eventos ADD COLUMN user_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL",
        ),
    ];
    for (column, ddl) in wanted {
        let present: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('eventos') WHERE name = ?1")
                .bind(column)
                .fetch_one(db)
                .await?;
        if present == 0 {
            tracing::info!(column, "adding missing column to eventos");
            sqlx::query(ddl).execute(db).await?;
        }
    }
    Ok(())
}

/// In-memory pool sharing a single connection, initialized through the
/// production schema path.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("connect in-memory sqlite");
    init_schema(&pool).await.expect("init schema");
    pool
}
