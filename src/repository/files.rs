//! File metadata and per-entity file link tables

use std::collections::HashMap;

use sqlx::{postgres::PgRow, Executor, PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::common::{CreateFile, FileInfo},
};

const FILE_COLUMNS: &str =
    "f.id, f.file_name, f.object_key, f.mime_type, f.size_bytes, f.uploaded_by, f.created_at";

/// A many-to-many table linking one entity type to `files`
#[derive(Debug, Clone, Copy)]
pub struct FileLinks {
    table: &'static str,
    owner_column: &'static str,
}

pub const SHUTDOWN_FILES: FileLinks = FileLinks::new("shutdown_file_links", "shutdown_id");
pub const INCIDENT_FILES: FileLinks = FileLinks::new("incident_file_links", "incident_id");
pub const VISIT_FILES: FileLinks = FileLinks::new("visit_file_links", "visit_id");
pub const INVESTMENT_FILES: FileLinks = FileLinks::new("investment_file_links", "investment_id");
pub const INSTRUCTION_FILES: FileLinks = FileLinks::new("instruction_file_links", "instruction_id");
pub const REPORT_FILES: FileLinks = FileLinks::new("report_file_links", "report_id");
pub const LEGAL_DOCUMENT_FILES: FileLinks =
    FileLinks::new("legal_document_file_links", "legal_document_id");

impl FileLinks {
    pub const fn new(table: &'static str, owner_column: &'static str) -> Self {
        Self { table, owner_column }
    }

    /// Link files to an owner; links that already exist are left untouched
    pub async fn link<'e, E>(&self, executor: E, owner_id: i64, file_ids: &[i64]) -> AppResult<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if file_ids.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {} ({}, file_id) SELECT $1, UNNEST($2::bigint[]) ON CONFLICT DO NOTHING",
            self.table, self.owner_column
        );
        sqlx::query(&sql)
            .bind(owner_id)
            .bind(file_ids)
            .execute(executor)
            .await
            .op("link files")?;
        Ok(())
    }

    /// Remove every file link of an owner
    pub async fn unlink_all<'e, E>(&self, executor: E, owner_id: i64) -> AppResult<u64>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM {} WHERE {} = $1", self.table, self.owner_column);
        let result = sqlx::query(&sql)
            .bind(owner_id)
            .execute(executor)
            .await
            .op("unlink files")?;
        Ok(result.rows_affected())
    }

    /// Replace the owner's links with exactly `file_ids`
    pub async fn replace(&self, conn: &mut PgConnection, owner_id: i64, file_ids: &[i64]) -> AppResult<()> {
        self.unlink_all(&mut *conn, owner_id).await?;
        self.link(&mut *conn, owner_id, file_ids).await
    }

    /// Files linked to one owner, newest first
    pub async fn load<'e, E>(&self, executor: E, owner_id: i64) -> AppResult<Vec<FileInfo>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM files f JOIN {} l ON l.file_id = f.id WHERE l.{} = $1 ORDER BY f.created_at DESC, f.id DESC",
            FILE_COLUMNS, self.table, self.owner_column
        );
        sqlx::query_as::<_, FileInfo>(&sql)
            .bind(owner_id)
            .fetch_all(executor)
            .await
            .op("load files")
    }

    /// Files for several owners at once, grouped by owner id, newest first
    pub async fn load_many<'e, E>(&self, executor: E, owner_ids: &[i64]) -> AppResult<HashMap<i64, Vec<FileInfo>>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut grouped: HashMap<i64, Vec<FileInfo>> = HashMap::new();
        if owner_ids.is_empty() {
            return Ok(grouped);
        }

        let sql = format!(
            "SELECT l.{owner} AS owner_id, {cols} FROM files f JOIN {table} l ON l.file_id = f.id \
             WHERE l.{owner} = ANY($1) ORDER BY f.created_at DESC, f.id DESC",
            owner = self.owner_column,
            cols = FILE_COLUMNS,
            table = self.table,
        );
        let rows = sqlx::query(&sql)
            .bind(owner_ids)
            .fetch_all(executor)
            .await
            .op("load files")?;

        for row in &rows {
            let owner_id: i64 = row.try_get("owner_id").op("scan file link")?;
            let file = scan_file(row).op("scan file link")?;
            grouped.entry(owner_id).or_default().push(file);
        }
        Ok(grouped)
    }
}

fn scan_file(row: &PgRow) -> Result<FileInfo, sqlx::Error> {
    Ok(FileInfo {
        id: row.try_get("id")?,
        file_name: row.try_get("file_name")?,
        object_key: row.try_get("object_key")?,
        mime_type: row.try_get("mime_type")?,
        size_bytes: row.try_get("size_bytes")?,
        uploaded_by: row.try_get("uploaded_by")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Repository for the `files` metadata table
#[derive(Clone)]
pub struct FilesRepository {
    pool: Pool<Postgres>,
}

impl FilesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Register metadata of an uploaded object
    pub async fn create(&self, data: &CreateFile, uploaded_by: i64) -> AppResult<FileInfo> {
        let file = sqlx::query_as::<_, FileInfo>(
            r#"
            INSERT INTO files (file_name, object_key, mime_type, size_bytes, uploaded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, file_name, object_key, mime_type, size_bytes, uploaded_by, created_at
            "#,
        )
        .bind(&data.file_name)
        .bind(&data.object_key)
        .bind(&data.mime_type)
        .bind(data.size_bytes)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await
        .op("create file")?;

        tracing::debug!(file_id = file.id, object_key = %file.object_key, "File metadata stored");
        Ok(file)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<FileInfo> {
        let sql = format!("SELECT {} FROM files f WHERE f.id = $1", FILE_COLUMNS);
        sqlx::query_as::<_, FileInfo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get file")?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }

    /// Delete metadata; link rows go with it through `ON DELETE CASCADE`
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .op("delete file")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("File {} not found", id)));
        }
        Ok(())
    }
}
