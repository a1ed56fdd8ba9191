//! Receptions repository

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::{apply_update, delete_by_id},
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::{
        enums::ReceptionStatus,
        reception::{CreateReception, Reception, ReceptionQuery, UpdateReception},
    },
};

const RECEPTION_SELECT: &str = r#"
    SELECT r.id, r.visitor_name, r.topic, r.scheduled_at, r.status, r.notes,
           r.created_by, r.created_at, r.updated_at,
           c.id AS host_id, c.fio AS host_fio,
           o.id AS organization_id, o.name AS organization_name
    FROM receptions r
    LEFT JOIN contacts c ON c.id = r.host_contact_id
    LEFT JOIN organizations o ON o.id = r.organization_id
"#;

fn scan_reception(row: &PgRow) -> Result<Reception, sqlx::Error> {
    Ok(Reception {
        id: row.try_get("id")?,
        visitor_name: row.try_get("visitor_name")?,
        topic: row.try_get("topic")?,
        scheduled_at: row.try_get("scheduled_at")?,
        status: row.try_get("status")?,
        host: contact_ref(row, "host_id", "host_fio")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        notes: row.try_get("notes")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[derive(Clone)]
pub struct ReceptionsRepository {
    pool: Pool<Postgres>,
}

impl ReceptionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateReception, created_by: i64) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO receptions (visitor_name, topic, scheduled_at, status,
                                    host_contact_id, organization_id, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&data.visitor_name)
        .bind(&data.topic)
        .bind(data.scheduled_at)
        .bind(data.status.unwrap_or(ReceptionStatus::Scheduled))
        .bind(data.host_contact_id)
        .bind(data.organization_id)
        .bind(&data.notes)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .op("create reception")
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Reception> {
        let query = format!("{} WHERE r.id = $1", RECEPTION_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get reception")?
            .ok_or_else(|| AppError::NotFound(format!("Reception {} not found", id)))?;
        scan_reception(&row).op("scan reception")
    }

    /// Receptions in a time window, earliest first
    pub async fn list(&self, query: &ReceptionQuery) -> AppResult<Vec<Reception>> {
        let mut filter = FilterBuilder::new(RECEPTION_SELECT);
        filter
            .gte("r.scheduled_at", query.date_from)
            .lte("r.scheduled_at", query.date_to)
            .eq("r.status", query.status)
            .eq("r.host_contact_id", query.host_contact_id)
            .order_by("r.scheduled_at, r.id");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list receptions")?;
        scan_all(&rows, scan_reception).op("scan reception")
    }

    pub async fn update(&self, id: i64, data: &UpdateReception) -> AppResult<()> {
        let mut update = UpdateBuilder::new("receptions");
        update
            .set("visitor_name", data.visitor_name.as_deref())
            .set("topic", data.topic.as_deref())
            .set("scheduled_at", data.scheduled_at)
            .set("status", data.status)
            .set("host_contact_id", data.host_contact_id)
            .set("organization_id", data.organization_id)
            .set("notes", data.notes.as_deref())
            .touch("updated_at");
        apply_update(&self.pool, update, "Reception", "update reception", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "receptions", "Reception", "delete reception", id).await
    }
}
