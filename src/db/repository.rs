//! Record store for the local backend.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::ResourceKind;

/// One change of a [`Repository::apply`] batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite {
    Insert(ResourceKind, Value),
    Update(ResourceKind, Value),
    Delete(ResourceKind, String),
}

/// Database repository for all record operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All records of a resource in creation order.
    pub async fn list_records(&self, kind: ResourceKind) -> Result<Vec<Value>, AppError> {
        let rows = sqlx::query(
            "SELECT body FROM records WHERE resource = ? ORDER BY created_at, rowid",
        )
        .bind(kind.route())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Get a record by id.
    pub async fn get_record(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>, AppError> {
        let row = sqlx::query("SELECT body FROM records WHERE resource = ? AND id = ?")
            .bind(kind.route())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    pub async fn count_records(&self, kind: ResourceKind) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM records WHERE resource = ?")
            .bind(kind.route())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Insert a new record. The body must carry its `id`.
    pub async fn insert_record(&self, kind: ResourceKind, body: &Value) -> Result<(), AppError> {
        self.apply(&[RecordWrite::Insert(kind, body.clone())]).await
    }

    /// Replace the body of an existing record.
    pub async fn update_record(&self, kind: ResourceKind, body: &Value) -> Result<(), AppError> {
        self.apply(&[RecordWrite::Update(kind, body.clone())]).await
    }

    /// Replace several bodies of one resource atomically.
    pub async fn update_records(&self, kind: ResourceKind, bodies: &[Value]) -> Result<(), AppError> {
        let writes: Vec<RecordWrite> = bodies
            .iter()
            .map(|body| RecordWrite::Update(kind, body.clone()))
            .collect();
        self.apply(&writes).await
    }

    /// Delete a record.
    pub async fn delete_record(&self, kind: ResourceKind, id: &str) -> Result<(), AppError> {
        self.apply(&[RecordWrite::Delete(kind, id.to_string())]).await
    }

    /// Run every write in one transaction. Nothing is kept if any write fails.
    pub async fn apply(&self, writes: &[RecordWrite]) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for write in writes {
            match write {
                RecordWrite::Insert(kind, body) => {
                    let id = record_id(body)?;
                    let json = serde_json::to_string(body)?;
                    sqlx::query(
                        "INSERT INTO records (resource, id, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(kind.route())
                    .bind(id)
                    .bind(&json)
                    .bind(&now)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await?;
                }
                RecordWrite::Update(kind, body) => {
                    let id = record_id(body)?;
                    let json = serde_json::to_string(body)?;
                    let result = sqlx::query(
                        "UPDATE records SET body = ?, updated_at = ? WHERE resource = ? AND id = ?",
                    )
                    .bind(&json)
                    .bind(&now)
                    .bind(kind.route())
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(AppError::NotFound(format!("{} {} not found", kind.label(), id)));
                    }
                }
                RecordWrite::Delete(kind, id) => {
                    let result = sqlx::query("DELETE FROM records WHERE resource = ? AND id = ?")
                        .bind(kind.route())
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;

                    if result.rows_affected() == 0 {
                        return Err(AppError::NotFound(format!("{} {} not found", kind.label(), id)));
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

fn record_id(body: &Value) -> Result<&str, AppError> {
    body.get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Internal("Record body has no id".to_string()))
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Value, AppError> {
    let body: String = row.get("body");
    Ok(serde_json::from_str(&body)?)
}
