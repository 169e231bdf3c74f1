use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the item schema. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            title TEXT,
            description TEXT,
            image_url TEXT,
            category TEXT NOT NULL,
            date TEXT,
            location TEXT,
            kind TEXT NOT NULL CHECK (kind IN ('lost', 'found', 'recovered')),
            user_id TEXT,
            secret_question TEXT,
            secret_answer TEXT,
            created_at TEXT,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_category ON items(category)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_kind ON items(kind)")
        .execute(pool)
        .await?;

    tracing::debug!("item schema up to date");

    Ok(())
}
