//! Reservoirs repository: reference data, level/volume curve, daily data,
//! snow cover and device summaries

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::{apply_update, delete_by_id},
    scan::{named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::reservoir::{
        CreateDeviceSummary, CreateIndicatorHeight, CreateReservoir, DeviceSummary, IndicatorHeight, Modsnow,
        PatchDeviceSummary, Reservoir, ReservoirData, ReservoirDataQuery, UpdateReservoir, UpsertModsnow,
        UpsertReservoirData,
    },
};

const RESERVOIR_SELECT: &str = r#"
    SELECT r.id, r.name, r.normal_level_m, r.dead_level_m, r.full_volume_mln_m3,
           r.created_at, r.updated_at,
           o.id AS organization_id, o.name AS organization_name
    FROM reservoirs r
    LEFT JOIN organizations o ON o.id = r.organization_id
"#;

fn scan_reservoir(row: &PgRow) -> Result<Reservoir, sqlx::Error> {
    Ok(Reservoir {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        normal_level_m: row.try_get("normal_level_m")?,
        dead_level_m: row.try_get("dead_level_m")?,
        full_volume_mln_m3: row.try_get("full_volume_mln_m3")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[derive(Clone)]
pub struct ReservoirsRepository {
    pool: Pool<Postgres>,
}

impl ReservoirsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // Reservoirs

    pub async fn create(&self, data: &CreateReservoir) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO reservoirs (name, organization_id, normal_level_m, dead_level_m, full_volume_mln_m3)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&data.name)
        .bind(data.organization_id)
        .bind(data.normal_level_m)
        .bind(data.dead_level_m)
        .bind(data.full_volume_mln_m3)
        .fetch_one(&self.pool)
        .await
        .op("create reservoir")
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Reservoir> {
        let query = format!("{} WHERE r.id = $1", RESERVOIR_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get reservoir")?
            .ok_or_else(|| AppError::NotFound(format!("Reservoir {} not found", id)))?;
        scan_reservoir(&row).op("scan reservoir")
    }

    pub async fn list(&self, organization_id: Option<i64>) -> AppResult<Vec<Reservoir>> {
        let mut filter = FilterBuilder::new(RESERVOIR_SELECT);
        filter.eq("r.organization_id", organization_id).order_by("r.name");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list reservoirs")?;
        scan_all(&rows, scan_reservoir).op("scan reservoir")
    }

    pub async fn update(&self, id: i64, data: &UpdateReservoir) -> AppResult<()> {
        let mut update = UpdateBuilder::new("reservoirs");
        update
            .set("name", data.name.as_deref())
            .set("organization_id", data.organization_id)
            .set("normal_level_m", data.normal_level_m)
            .set("dead_level_m", data.dead_level_m)
            .set("full_volume_mln_m3", data.full_volume_mln_m3)
            .touch("updated_at");
        apply_update(&self.pool, update, "Reservoir", "update reservoir", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "reservoirs", "Reservoir", "delete reservoir", id).await
    }

    // Level/volume curve

    pub async fn add_indicator_height(
        &self,
        reservoir_id: i64,
        data: &CreateIndicatorHeight,
    ) -> AppResult<IndicatorHeight> {
        sqlx::query_as::<_, IndicatorHeight>(
            r#"
            INSERT INTO indicator_height (reservoir_id, level_m, volume_mln_m3)
            VALUES ($1, $2, $3)
            RETURNING id, reservoir_id, level_m, volume_mln_m3
            "#,
        )
        .bind(reservoir_id)
        .bind(data.level_m)
        .bind(data.volume_mln_m3)
        .fetch_one(&self.pool)
        .await
        .op("add indicator height")
    }

    /// Curve points ordered by level
    pub async fn list_indicator_heights(&self, reservoir_id: i64) -> AppResult<Vec<IndicatorHeight>> {
        sqlx::query_as::<_, IndicatorHeight>(
            r#"
            SELECT id, reservoir_id, level_m, volume_mln_m3
            FROM indicator_height
            WHERE reservoir_id = $1
            ORDER BY level_m
            "#,
        )
        .bind(reservoir_id)
        .fetch_all(&self.pool)
        .await
        .op("list indicator heights")
    }

    /// Volume of the curve point at or immediately below `level_m`
    pub async fn volume_at_level(&self, reservoir_id: i64, level_m: f64) -> AppResult<f64> {
        sqlx::query_scalar::<_, f64>(
            r#"
            SELECT volume_mln_m3
            FROM indicator_height
            WHERE reservoir_id = $1 AND level_m <= $2
            ORDER BY level_m DESC
            LIMIT 1
            "#,
        )
        .bind(reservoir_id)
        .bind(level_m)
        .fetch_optional(&self.pool)
        .await
        .op("volume at level")?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No curve point at or below {} m for reservoir {}",
                level_m, reservoir_id
            ))
        })
    }

    // Daily data

    /// Insert or replace daily rows; the whole batch is written or nothing is
    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn upsert_data(&self, rows: &[UpsertReservoirData]) -> AppResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.op("begin upsert reservoir data")?;
        let mut written = 0;

        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO reservoir_data (reservoir_id, data_date, level_m, volume_mln_m3, inflow_m3_s, outflow_m3_s)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (reservoir_id, data_date) DO UPDATE
                SET level_m = EXCLUDED.level_m,
                    volume_mln_m3 = EXCLUDED.volume_mln_m3,
                    inflow_m3_s = EXCLUDED.inflow_m3_s,
                    outflow_m3_s = EXCLUDED.outflow_m3_s,
                    updated_at = NOW()
                "#,
            )
            .bind(row.reservoir_id)
            .bind(row.data_date)
            .bind(row.level_m)
            .bind(row.volume_mln_m3)
            .bind(row.inflow_m3_s)
            .bind(row.outflow_m3_s)
            .execute(&mut *tx)
            .await
            .op("upsert reservoir data")?;
            written += result.rows_affected();
        }

        tx.commit().await.op("commit upsert reservoir data")?;
        tracing::info!(written, "Reservoir data upserted");
        Ok(written)
    }

    pub async fn list_data(&self, query: &ReservoirDataQuery) -> AppResult<Vec<ReservoirData>> {
        let mut filter = FilterBuilder::new("SELECT * FROM reservoir_data rd");
        filter
            .eq("rd.reservoir_id", query.reservoir_id)
            .gte("rd.data_date", query.date_from)
            .lte("rd.data_date", query.date_to)
            .order_by("rd.data_date, rd.reservoir_id");

        filter
            .into_query()
            .build_query_as::<ReservoirData>()
            .fetch_all(&self.pool)
            .await
            .op("list reservoir data")
    }

    // Snow cover

    pub async fn upsert_modsnow(&self, data: &UpsertModsnow) -> AppResult<Modsnow> {
        sqlx::query_as::<_, Modsnow>(
            r#"
            INSERT INTO modsnow (reservoir_id, date, cover_percent, snow_water_equivalent_mm)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (reservoir_id, date) DO UPDATE
            SET cover_percent = EXCLUDED.cover_percent,
                snow_water_equivalent_mm = EXCLUDED.snow_water_equivalent_mm
            RETURNING id, reservoir_id, date, cover_percent, snow_water_equivalent_mm
            "#,
        )
        .bind(data.reservoir_id)
        .bind(data.date)
        .bind(data.cover_percent)
        .bind(data.snow_water_equivalent_mm)
        .fetch_one(&self.pool)
        .await
        .op("upsert modsnow")
    }

    pub async fn list_modsnow(&self, query: &ReservoirDataQuery) -> AppResult<Vec<Modsnow>> {
        let mut filter = FilterBuilder::new(
            "SELECT m.id, m.reservoir_id, m.date, m.cover_percent, m.snow_water_equivalent_mm FROM modsnow m",
        );
        filter
            .eq("m.reservoir_id", query.reservoir_id)
            .gte("m.date", query.date_from)
            .lte("m.date", query.date_to)
            .order_by("m.date, m.reservoir_id");

        filter
            .into_query()
            .build_query_as::<Modsnow>()
            .fetch_all(&self.pool)
            .await
            .op("list modsnow")
    }

    // Device summaries

    pub async fn list_device_summary(&self, reservoir_id: Option<i64>) -> AppResult<Vec<DeviceSummary>> {
        let mut filter = FilterBuilder::new("SELECT * FROM reservoir_device_summary s");
        filter
            .eq("s.reservoir_id", reservoir_id)
            .order_by("s.reservoir_id, s.device_type");

        filter
            .into_query()
            .build_query_as::<DeviceSummary>()
            .fetch_all(&self.pool)
            .await
            .op("list device summary")
    }

    pub async fn create_device_summary(&self, data: &CreateDeviceSummary) -> AppResult<DeviceSummary> {
        sqlx::query_as::<_, DeviceSummary>(
            r#"
            INSERT INTO reservoir_device_summary (reservoir_id, device_type, total_count, working_count, faulty_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.reservoir_id)
        .bind(&data.device_type)
        .bind(data.total_count)
        .bind(data.working_count)
        .bind(data.faulty_count)
        .fetch_one(&self.pool)
        .await
        .op("create device summary")
    }

    /// Apply several patches atomically; a patch that matches no row aborts the batch
    #[tracing::instrument(skip(self, patches), fields(patches = patches.len()))]
    pub async fn patch_device_summary(&self, patches: &[PatchDeviceSummary]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin patch device summary")?;

        for patch in patches {
            let mut update = UpdateBuilder::new("reservoir_device_summary");
            update
                .set("device_type", patch.device_type.as_deref())
                .set("total_count", patch.total_count)
                .set("working_count", patch.working_count)
                .set("faulty_count", patch.faulty_count)
                .touch("updated_at");

            let mut query = update.where_key("id", patch.id);
            let result = query
                .build()
                .execute(&mut *tx)
                .await
                .op("patch device summary")?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Device summary {} not found", patch.id)));
            }
        }

        tx.commit().await.op("commit patch device summary")?;
        tracing::info!("Device summary batch applied");
        Ok(())
    }
}
