//! Idle water discharges repository

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgConnection, Pool, Postgres, Row};

use super::{
    scan::{named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::idle_discharge::{
        calculate_flow_rate, CreateIdleDischarge, IdleDischarge, IdleDischargeQuery, UpdateIdleDischarge,
    },
};

const DISCHARGE_SELECT: &str = r#"
    SELECT d.id, d.start_time, d.end_time, d.flow_rate_m3_s, d.reason, d.created_by,
           d.approved_by, d.approved_at, d.is_ongoing, d.total_volume_m3, d.created_at,
           o.id AS organization_id, o.name AS organization_name
    FROM v_idle_water_discharges_with_volume d
    LEFT JOIN organizations o ON o.id = d.organization_id
"#;

/// Column values of a discharge row about to be inserted
pub(crate) struct NewDischarge<'a> {
    pub organization_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub flow_rate_m3_s: f64,
    pub reason: Option<&'a str>,
    pub created_by: i64,
}

/// Insert a discharge on an open connection or transaction
pub(crate) async fn insert_discharge(conn: &mut PgConnection, new: NewDischarge<'_>) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO idle_water_discharges (organization_id, start_time, end_time, flow_rate_m3_s, reason, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(new.organization_id)
    .bind(new.start_time)
    .bind(new.end_time)
    .bind(new.flow_rate_m3_s)
    .bind(new.reason)
    .bind(new.created_by)
    .fetch_one(conn)
    .await
    .op("add idle discharge")
}

fn scan_discharge(row: &PgRow) -> Result<IdleDischarge, sqlx::Error> {
    Ok(IdleDischarge {
        id: row.try_get("id")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        flow_rate_m3_s: row.try_get("flow_rate_m3_s")?,
        reason: row.try_get("reason")?,
        created_by: row.try_get("created_by")?,
        approved_by: row.try_get("approved_by")?,
        approved_at: row.try_get("approved_at")?,
        is_ongoing: row.try_get("is_ongoing")?,
        total_volume_m3: row.try_get("total_volume_m3")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct IdleDischargesRepository {
    pool: Pool<Postgres>,
}

impl IdleDischargesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a standalone discharge, deriving its flow rate from the volume
    pub async fn create(&self, data: &CreateIdleDischarge, created_by: i64) -> AppResult<i64> {
        let flow_rate = calculate_flow_rate(data.start_time, data.end_time, data.volume_thousand_m3)?;

        let mut conn = self.pool.acquire().await.op("acquire connection")?;
        let id = insert_discharge(
            &mut conn,
            NewDischarge {
                organization_id: data.organization_id,
                start_time: data.start_time,
                end_time: data.end_time,
                flow_rate_m3_s: flow_rate,
                reason: data.reason.as_deref(),
                created_by,
            },
        )
        .await?;

        tracing::debug!(discharge_id = id, flow_rate, "Idle discharge created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<IdleDischarge> {
        let query = format!("{} WHERE d.id = $1", DISCHARGE_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get idle discharge")?
            .ok_or_else(|| AppError::NotFound(format!("Idle discharge {} not found", id)))?;
        scan_discharge(&row).op("scan idle discharge")
    }

    /// List discharges with optional filters, newest first
    pub async fn list(&self, query: &IdleDischargeQuery) -> AppResult<Vec<IdleDischarge>> {
        let mut filter = FilterBuilder::new(DISCHARGE_SELECT);
        filter
            .eq("d.organization_id", query.organization_id)
            .gte("d.start_time", query.start_from)
            .lte("d.start_time", query.start_to)
            .eq("d.is_ongoing", query.ongoing)
            .condition(query.approved == Some(true), "d.approved_at IS NOT NULL")
            .condition(query.approved == Some(false), "d.approved_at IS NULL")
            .order_by("d.start_time DESC, d.id DESC");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list idle discharges")?;
        scan_all(&rows, scan_discharge).op("scan idle discharge")
    }

    /// Update a discharge; a supplied volume re-derives the flow rate over the resolved window
    pub async fn update(&self, id: i64, data: &UpdateIdleDischarge) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin edit idle discharge")?;

        let (current_start, current_end): (DateTime<Utc>, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT start_time, end_time FROM idle_water_discharges WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .op("lock idle discharge")?
        .ok_or_else(|| AppError::NotFound(format!("Idle discharge {} not found", id)))?;

        let flow_rate = match data.volume_thousand_m3 {
            Some(volume) => Some(calculate_flow_rate(
                data.start_time.unwrap_or(current_start),
                data.end_time.or(current_end),
                volume,
            )?),
            None => None,
        };

        let mut update = UpdateBuilder::new("idle_water_discharges");
        update
            .set("organization_id", data.organization_id)
            .set("start_time", data.start_time)
            .set("end_time", data.end_time)
            .set("flow_rate_m3_s", flow_rate)
            .set("reason", data.reason.as_deref());
        if update.is_empty() {
            return Ok(());
        }

        let mut query = update.where_key("id", id);
        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .op("edit idle discharge")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Idle discharge {} not found", id)));
        }

        tx.commit().await.op("commit edit idle discharge")?;
        Ok(())
    }

    /// Record the approval; a discharge is approved at most once
    pub async fn approve(&self, id: i64, approved_by: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE idle_water_discharges
            SET approved_by = $1, approved_at = NOW()
            WHERE id = $2 AND approved_at IS NULL
            "#,
        )
        .bind(approved_by)
        .bind(id)
        .execute(&self.pool)
        .await
        .op("approve idle discharge")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Idle discharge {} not found or already approved",
                id
            )));
        }
        Ok(())
    }

    /// Delete a discharge; a shutdown pointing to it loses the link
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM idle_water_discharges WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .op("delete idle discharge")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Idle discharge {} not found", id)));
        }
        Ok(())
    }
}
