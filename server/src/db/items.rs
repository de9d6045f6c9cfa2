//! Queries against the items table.
//!
//! Writes go through plain SQL; the table's trigger publishes every change on
//! `item_changes`, so nothing here talks to WebSocket clients directly.

use chrono::NaiveDateTime;
use plank_engine::{NewRecord, Record, RecordId};
use sqlx::{PgPool, Row};

/// A stored item row.
#[derive(Debug)]
pub struct ItemRow {
    pub id: i64,
    pub name: String,
    pub value: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ItemRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            value: row.try_get("value")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<ItemRow> for Record {
    fn from(row: ItemRow) -> Self {
        Record {
            id: row.id,
            name: row.name,
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, name, value, created_at, updated_at";

/// All items, newest first.
pub async fn list_items(pool: &PgPool) -> Result<Vec<Record>, sqlx::Error> {
    let rows: Vec<ItemRow> = sqlx::query_as(&format!(
        "SELECT {} FROM items ORDER BY created_at DESC, id DESC",
        COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Record::from).collect())
}

pub async fn get_item(pool: &PgPool, id: RecordId) -> Result<Option<Record>, sqlx::Error> {
    let row: Option<ItemRow> =
        sqlx::query_as(&format!("SELECT {} FROM items WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(Record::from))
}

/// Insert an item; the database assigns id and timestamps.
pub async fn create_item(pool: &PgPool, item: &NewRecord) -> Result<Record, sqlx::Error> {
    let row: ItemRow = sqlx::query_as(&format!(
        "INSERT INTO items (name, value) VALUES ($1, $2) RETURNING {}",
        COLUMNS
    ))
    .bind(&item.name)
    .bind(item.value)
    .fetch_one(pool)
    .await?;

    tracing::debug!(id = row.id, name = %row.name, "Item created");

    Ok(row.into())
}

/// Overwrite name and value. `None` when no such item exists.
pub async fn update_item(
    pool: &PgPool,
    id: RecordId,
    item: &NewRecord,
) -> Result<Option<Record>, sqlx::Error> {
    let row: Option<ItemRow> = sqlx::query_as(&format!(
        "UPDATE items SET name = $1, value = $2 WHERE id = $3 RETURNING {}",
        COLUMNS
    ))
    .bind(&item.name)
    .bind(item.value)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Record::from))
}

/// Returns whether a row was removed.
pub async fn delete_item(pool: &PgPool, id: RecordId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
