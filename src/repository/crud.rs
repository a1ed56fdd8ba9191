//! Execution helpers for the single-table update and delete paths

use sqlx::{Pool, Postgres};

use super::sql::UpdateBuilder;
use crate::error::{AppError, AppResult, DbResultExt};

/// Delete one row by id from a fixed table; zero rows is `NotFound`
pub(crate) async fn delete_by_id(
    pool: &Pool<Postgres>,
    table: &'static str,
    label: &str,
    operation: &'static str,
    id: i64,
) -> AppResult<()> {
    let sql = format!("DELETE FROM {} WHERE id = $1", table);
    let result = sqlx::query(&sql).bind(id).execute(pool).await.op(operation)?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("{} {} not found", label, id)));
    }
    Ok(())
}

/// Execute a built UPDATE; an empty request is a no-op, zero rows is `NotFound`
pub(crate) async fn apply_update(
    pool: &Pool<Postgres>,
    update: UpdateBuilder<'_>,
    label: &str,
    operation: &'static str,
    id: i64,
) -> AppResult<()> {
    if update.is_empty() {
        return Ok(());
    }
    let mut query = update.where_key("id", id);
    let result = query.build().execute(pool).await.op(operation)?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("{} {} not found", label, id)));
    }
    Ok(())
}
