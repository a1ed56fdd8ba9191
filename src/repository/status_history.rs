//! Append-only status history tables of documents

use sqlx::{postgres::PgRow, Executor, Postgres, Row};

use super::scan::{named_ref, scan_all};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::document::StatusHistoryEntry,
};

/// A `<kind>_status_history` table keyed by its owner column
#[derive(Debug, Clone, Copy)]
pub struct StatusHistory {
    table: &'static str,
    owner_column: &'static str,
}

pub const INSTRUCTION_HISTORY: StatusHistory =
    StatusHistory::new("instruction_status_history", "instruction_id");
pub const REPORT_HISTORY: StatusHistory = StatusHistory::new("report_status_history", "report_id");
pub const LEGAL_DOCUMENT_HISTORY: StatusHistory =
    StatusHistory::new("legal_document_status_history", "legal_document_id");

impl StatusHistory {
    pub const fn new(table: &'static str, owner_column: &'static str) -> Self {
        Self { table, owner_column }
    }

    /// Record a transition that has already been applied to the owner row
    pub async fn append<'e, E>(
        &self,
        executor: E,
        owner_id: i64,
        from_status_id: Option<i64>,
        to_status_id: i64,
        changed_by: i64,
        comment: Option<&str>,
    ) -> AppResult<i64>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {} ({}, from_status_id, to_status_id, changed_by, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
            self.table, self.owner_column
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(owner_id)
            .bind(from_status_id)
            .bind(to_status_id)
            .bind(changed_by)
            .bind(comment)
            .fetch_one(executor)
            .await
            .op("append status history")
    }

    /// Full history of an owner, most recent first
    pub async fn list<'e, E>(&self, executor: E, owner_id: i64) -> AppResult<Vec<StatusHistoryEntry>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT h.id, h.changed_by, h.changed_at, h.comment,
                   fs.id AS from_status_id, fs.name AS from_status_name,
                   ts.id AS to_status_id, ts.name AS to_status_name
            FROM {table} h
            LEFT JOIN document_status fs ON fs.id = h.from_status_id
            LEFT JOIN document_status ts ON ts.id = h.to_status_id
            WHERE h.{owner} = $1
            ORDER BY h.changed_at DESC, h.id DESC
            "#,
            table = self.table,
            owner = self.owner_column,
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(executor)
            .await
            .op("list status history")?;
        scan_all(&rows, scan_entry).op("scan status history")
    }

    /// Replace the comment of the owner's most recent history entry
    pub async fn update_latest_comment<'e, E>(&self, executor: E, owner_id: i64, comment: Option<&str>) -> AppResult<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE {table} SET comment = $1
            WHERE id = (
                SELECT id FROM {table} WHERE {owner} = $2
                ORDER BY changed_at DESC, id DESC
                LIMIT 1
            )
            "#,
            table = self.table,
            owner = self.owner_column,
        );
        let result = sqlx::query(&sql)
            .bind(comment)
            .bind(owner_id)
            .execute(executor)
            .await
            .op("update status history comment")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No status history for document {}",
                owner_id
            )));
        }
        Ok(())
    }
}

fn scan_entry(row: &PgRow) -> Result<StatusHistoryEntry, sqlx::Error> {
    Ok(StatusHistoryEntry {
        id: row.try_get("id")?,
        from_status: named_ref(row, "from_status_id", "from_status_name")?,
        to_status: named_ref(row, "to_status_id", "to_status_name")?,
        changed_by: row.try_get("changed_by")?,
        changed_at: row.try_get("changed_at")?,
        comment: row.try_get("comment")?,
    })
}
