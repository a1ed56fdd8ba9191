//! Shutdowns repository.
//!
//! A shutdown may own one idle water discharge. Create, edit and delete keep
//! both rows consistent inside a single transaction; the discharge flow rate
//! is always re-derived from the volume supplied with the request.

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    files::SHUTDOWN_FILES,
    idle_discharges::{insert_discharge, NewDischarge},
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::{
        idle_discharge::{calculate_flow_rate, IdleDischargeSummary},
        shutdown::{CreateShutdown, Shutdown, ShutdownDetails, ShutdownQuery, UpdateShutdown},
    },
};

const SHUTDOWN_SELECT: &str = r#"
    SELECT s.id, s.start_time, s.end_time, s.reason, s.generation_loss_mwh,
           s.created_by, s.created_at, s.updated_at,
           o.id AS organization_id, o.name AS organization_name,
           c.id AS reporter_id, c.fio AS reporter_fio,
           d.id AS discharge_id, d.flow_rate_m3_s AS discharge_flow_rate,
           d.total_volume_m3 AS discharge_total_volume, d.is_ongoing AS discharge_is_ongoing
    FROM shutdowns s
    LEFT JOIN organizations o ON o.id = s.organization_id
    LEFT JOIN contacts c ON c.id = s.reported_by_contact_id
    LEFT JOIN v_idle_water_discharges_with_volume d ON d.id = s.idle_discharge_id
"#;

fn scan_shutdown(row: &PgRow) -> Result<ShutdownDetails, sqlx::Error> {
    let idle_discharge = match row.try_get::<Option<i64>, _>("discharge_id")? {
        Some(id) => Some(IdleDischargeSummary {
            id,
            flow_rate_m3_s: row.try_get("discharge_flow_rate")?,
            total_volume_m3: row.try_get("discharge_total_volume")?,
            is_ongoing: row.try_get("discharge_is_ongoing")?,
        }),
        None => None,
    };

    Ok(ShutdownDetails {
        id: row.try_get("id")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        reason: row.try_get("reason")?,
        generation_loss_mwh: row.try_get("generation_loss_mwh")?,
        reported_by: contact_ref(row, "reporter_id", "reporter_fio")?,
        idle_discharge,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        files: Vec::new(),
    })
}

#[derive(Clone)]
pub struct ShutdownsRepository {
    pool: Pool<Postgres>,
}

impl ShutdownsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a shutdown with its discharge summary and files
    pub async fn get_by_id(&self, id: i64) -> AppResult<ShutdownDetails> {
        let query = format!("{} WHERE s.id = $1", SHUTDOWN_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get shutdown")?
            .ok_or_else(|| AppError::NotFound(format!("Shutdown {} not found", id)))?;

        let mut shutdown = scan_shutdown(&row).op("scan shutdown")?;
        shutdown.files = SHUTDOWN_FILES.load(&self.pool, id).await?;
        Ok(shutdown)
    }

    /// List shutdowns with optional filters, most recent first
    pub async fn list(&self, query: &ShutdownQuery) -> AppResult<Vec<ShutdownDetails>> {
        let mut filter = FilterBuilder::new(SHUTDOWN_SELECT);
        filter
            .eq("s.organization_id", query.organization_id)
            .gte("s.start_time", query.start_from)
            .lte("s.start_time", query.start_to)
            .condition(query.ongoing_only, "s.end_time IS NULL")
            .order_by("s.start_time DESC, s.id DESC");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list shutdowns")?;
        let mut shutdowns = scan_all(&rows, scan_shutdown).op("scan shutdown")?;

        let ids: Vec<i64> = shutdowns.iter().map(|s| s.id).collect();
        let mut files = SHUTDOWN_FILES.load_many(&self.pool, &ids).await?;
        for shutdown in &mut shutdowns {
            shutdown.files = files.remove(&shutdown.id).unwrap_or_default();
        }
        Ok(shutdowns)
    }

    /// Create a shutdown, and its idle discharge when a volume is supplied
    #[tracing::instrument(skip(self, data), fields(organization_id = data.organization_id))]
    pub async fn create(&self, data: &CreateShutdown, created_by: i64) -> AppResult<i64> {
        // Reject an underivable flow rate before anything is written
        let flow_rate = match data.idle_discharge_volume {
            Some(volume) => Some(calculate_flow_rate(data.start_time, data.end_time, volume)?),
            None => None,
        };

        let mut tx = self.pool.begin().await.op("begin add shutdown")?;

        let idle_discharge_id = match flow_rate {
            Some(flow_rate_m3_s) => Some(
                insert_discharge(
                    &mut *tx,
                    NewDischarge {
                        organization_id: data.organization_id,
                        start_time: data.start_time,
                        end_time: data.end_time,
                        flow_rate_m3_s,
                        reason: data.reason.as_deref(),
                        created_by,
                    },
                )
                .await?,
            ),
            None => None,
        };

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO shutdowns (
                organization_id, start_time, end_time, reason, generation_loss_mwh,
                reported_by_contact_id, idle_discharge_id, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(data.organization_id)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(&data.reason)
        .bind(data.generation_loss_mwh)
        .bind(data.reported_by_contact_id)
        .bind(idle_discharge_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .op("add shutdown")?;

        SHUTDOWN_FILES.link(&mut *tx, id, &data.file_ids).await?;

        tx.commit().await.op("commit add shutdown")?;

        tracing::info!(shutdown_id = id, ?idle_discharge_id, "Shutdown created");
        Ok(id)
    }

    /// Edit a shutdown and reconcile its idle discharge.
    ///
    /// The shutdown row is locked first so concurrent edits see a consistent
    /// discharge link.
    #[tracing::instrument(skip(self, data))]
    pub async fn update(&self, id: i64, data: &UpdateShutdown) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin edit shutdown")?;

        let current = sqlx::query_as::<_, Shutdown>("SELECT * FROM shutdowns WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .op("lock shutdown")?
            .ok_or_else(|| AppError::NotFound(format!("Shutdown {} not found", id)))?;

        let start_time = data.start_time.unwrap_or(current.start_time);
        let end_time = data.end_time.or(current.end_time);

        // Some(link) when the shutdown's idle_discharge_id has to be rewritten
        let mut new_link: Option<Option<i64>> = None;

        match (data.idle_discharge_volume, current.idle_discharge_id) {
            (Some(volume), linked) => {
                if end_time.is_none() {
                    return Err(AppError::Validation(
                        "an end time is required to compute the idle discharge flow rate".to_string(),
                    ));
                }
                let flow_rate = calculate_flow_rate(start_time, end_time, volume)?;

                match linked {
                    Some(discharge_id) => {
                        let result = sqlx::query(
                            r#"
                            UPDATE idle_water_discharges
                            SET start_time = $1, end_time = $2, flow_rate_m3_s = $3
                            WHERE id = $4
                            "#,
                        )
                        .bind(start_time)
                        .bind(end_time)
                        .bind(flow_rate)
                        .bind(discharge_id)
                        .execute(&mut *tx)
                        .await
                        .op("edit idle discharge")?;
                        if result.rows_affected() == 0 {
                            return Err(AppError::NotFound(format!(
                                "Idle discharge {} not found",
                                discharge_id
                            )));
                        }
                        tracing::debug!(discharge_id, flow_rate, "Idle discharge updated in place");
                    }
                    None if volume > 0.0 => {
                        let discharge_id = insert_discharge(
                            &mut *tx,
                            NewDischarge {
                                organization_id: data.organization_id.unwrap_or(current.organization_id),
                                start_time,
                                end_time,
                                flow_rate_m3_s: flow_rate,
                                reason: data.reason.as_deref().or(current.reason.as_deref()),
                                created_by: current.created_by,
                            },
                        )
                        .await?;
                        tracing::debug!(discharge_id, flow_rate, "Idle discharge attached");
                        new_link = Some(Some(discharge_id));
                    }
                    None => {}
                }
            }
            (None, Some(discharge_id)) => {
                sqlx::query("DELETE FROM idle_water_discharges WHERE id = $1")
                    .bind(discharge_id)
                    .execute(&mut *tx)
                    .await
                    .op("delete idle discharge")?;
                tracing::debug!(discharge_id, "Idle discharge detached and deleted");
                new_link = Some(None);
            }
            (None, None) => {}
        }

        let mut update = UpdateBuilder::new("shutdowns");
        update
            .set("organization_id", data.organization_id)
            .set("start_time", data.start_time)
            .set_nullable("end_time", data.end_time)
            .set("reason", data.reason.as_deref())
            .set_nullable("generation_loss_mwh", data.generation_loss_mwh)
            .set("reported_by_contact_id", data.reported_by_contact_id);
        if let Some(link) = new_link {
            update.set_nullable("idle_discharge_id", link);
        }
        update.touch("updated_at");

        let mut query = update.where_key("id", id);
        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .op("edit shutdown")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Shutdown {} not found", id)));
        }

        if let Some(file_ids) = &data.file_ids {
            SHUTDOWN_FILES.replace(&mut *tx, id, file_ids).await?;
        }

        tx.commit().await.op("commit edit shutdown")?;
        Ok(())
    }

    /// Delete a shutdown together with its idle discharge
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin delete shutdown")?;

        let idle_discharge_id = sqlx::query_scalar::<_, Option<i64>>(
            "DELETE FROM shutdowns WHERE id = $1 RETURNING idle_discharge_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .op("delete shutdown")?
        .ok_or_else(|| AppError::NotFound(format!("Shutdown {} not found", id)))?;

        if let Some(discharge_id) = idle_discharge_id {
            sqlx::query("DELETE FROM idle_water_discharges WHERE id = $1")
                .bind(discharge_id)
                .execute(&mut *tx)
                .await
                .op("delete idle discharge")?;
        }

        tx.commit().await.op("commit delete shutdown")?;

        tracing::info!(shutdown_id = id, ?idle_discharge_id, "Shutdown deleted");
        Ok(())
    }
}
