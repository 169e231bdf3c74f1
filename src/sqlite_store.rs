//! SQLite-backed [`ItemStore`] implementation.
//!
//! Items live in the `items` table created by [`crate::migrate`]. Listing
//! orders by `rowid`, which is insertion order, so match ties resolve the
//! same way they do for the in-memory store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use finditnow_core::models::{Classification, Item};
use finditnow_core::store::ItemStore;

const ITEM_COLUMNS: &str = "id, title, description, image_url, category, date, location, kind, \
     user_id, secret_question, secret_answer, created_at, updated_at";

/// SQLite implementation of the [`ItemStore`] trait.
#[derive(Clone)]
pub struct SqliteItemStore {
    pool: SqlitePool,
}

impl SqliteItemStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn format_ts(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|dt| dt.to_rfc3339())
}

fn parse_ts(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("invalid stored timestamp: {}", s))
    })
    .transpose()
}

fn row_to_item(row: &SqliteRow) -> Result<Item> {
    let kind: String = row.get("kind");
    Ok(Item {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        category: row.get("category"),
        date: row.get("date"),
        location: row.get("location"),
        kind: kind.parse::<Classification>()?,
        user_id: row.get("user_id"),
        secret_question: row.get("secret_question"),
        secret_answer: row.get("secret_answer"),
        created_at: parse_ts(row.get("created_at"))?,
        updated_at: parse_ts(row.get("updated_at"))?,
    })
}

fn insert_query(item: &Item) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(
        r#"
        INSERT INTO items (id, title, description, image_url, category, date, location,
                           kind, user_id, secret_question, secret_answer,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.title)
    .bind(&item.description)
    .bind(&item.image_url)
    .bind(&item.category)
    .bind(&item.date)
    .bind(&item.location)
    .bind(item.kind.as_str())
    .bind(&item.user_id)
    .bind(&item.secret_question)
    .bind(&item.secret_answer)
    .bind(format_ts(item.created_at))
    .bind(format_ts(item.updated_at))
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn list_items(&self) -> Result<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM items ORDER BY rowid ASC",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let row = sqlx::query(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn insert_item(&self, item: &Item) -> Result<()> {
        insert_query(item)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert item {}", item.id))?;

        Ok(())
    }

    async fn insert_items(&self, items: &[Item]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            insert_query(item)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert item {}", item.id))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_item(&self, item: &Item) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items SET
                title = ?, description = ?, image_url = ?, category = ?, date = ?,
                location = ?, kind = ?, user_id = ?, secret_question = ?,
                secret_answer = ?, created_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(&item.category)
        .bind(&item.date)
        .bind(&item.location)
        .bind(item.kind.as_str())
        .bind(&item.user_id)
        .bind(&item.secret_question)
        .bind(&item.secret_answer)
        .bind(format_ts(item.created_at))
        .bind(format_ts(item.updated_at))
        .bind(&item.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_item(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
