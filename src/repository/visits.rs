//! Visits repository

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::delete_by_id,
    files::VISIT_FILES,
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::visit::{CreateVisit, UpdateVisit, VisitDetails, VisitQuery},
};

const VISIT_SELECT: &str = r#"
    SELECT v.id, v.visit_date, v.visitor, v.purpose, v.created_by, v.created_at, v.updated_at,
           o.id AS organization_id, o.name AS organization_name,
           c.id AS responsible_id, c.fio AS responsible_fio
    FROM visits v
    LEFT JOIN organizations o ON o.id = v.organization_id
    LEFT JOIN contacts c ON c.id = v.responsible_contact_id
"#;

fn scan_visit(row: &PgRow) -> Result<VisitDetails, sqlx::Error> {
    Ok(VisitDetails {
        id: row.try_get("id")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        visit_date: row.try_get("visit_date")?,
        visitor: row.try_get("visitor")?,
        purpose: row.try_get("purpose")?,
        responsible: contact_ref(row, "responsible_id", "responsible_fio")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        files: Vec::new(),
    })
}

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateVisit, created_by: i64) -> AppResult<i64> {
        let mut tx = self.pool.begin().await.op("begin create visit")?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO visits (organization_id, visit_date, visitor, purpose,
                                responsible_contact_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(data.organization_id)
        .bind(data.visit_date)
        .bind(&data.visitor)
        .bind(&data.purpose)
        .bind(data.responsible_contact_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .op("create visit")?;

        VISIT_FILES.link(&mut *tx, id, &data.file_ids).await?;

        tx.commit().await.op("commit create visit")?;
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<VisitDetails> {
        let query = format!("{} WHERE v.id = $1", VISIT_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get visit")?
            .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", id)))?;

        let mut visit = scan_visit(&row).op("scan visit")?;
        visit.files = VISIT_FILES.load(&self.pool, id).await?;
        Ok(visit)
    }

    pub async fn list(&self, query: &VisitQuery) -> AppResult<Vec<VisitDetails>> {
        let mut filter = FilterBuilder::new(VISIT_SELECT);
        filter
            .eq("v.organization_id", query.organization_id)
            .gte("v.visit_date", query.date_from)
            .lte("v.visit_date", query.date_to)
            .order_by("v.visit_date DESC, v.id DESC");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list visits")?;
        let mut visits = scan_all(&rows, scan_visit).op("scan visit")?;

        let ids: Vec<i64> = visits.iter().map(|v| v.id).collect();
        let mut files = VISIT_FILES.load_many(&self.pool, &ids).await?;
        for visit in &mut visits {
            visit.files = files.remove(&visit.id).unwrap_or_default();
        }
        Ok(visits)
    }

    pub async fn update(&self, id: i64, data: &UpdateVisit) -> AppResult<()> {
        let mut update = UpdateBuilder::new("visits");
        update
            .set("organization_id", data.organization_id)
            .set("visit_date", data.visit_date)
            .set("visitor", data.visitor.as_deref())
            .set("purpose", data.purpose.as_deref())
            .set("responsible_contact_id", data.responsible_contact_id)
            .touch("updated_at");
        if update.is_empty() && data.file_ids.is_none() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.op("begin update visit")?;

        let mut query = update.where_key("id", id);
        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .op("update visit")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Visit {} not found", id)));
        }

        if let Some(file_ids) = &data.file_ids {
            VISIT_FILES.replace(&mut *tx, id, file_ids).await?;
        }

        tx.commit().await.op("commit update visit")?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "visits", "Visit", "delete visit", id).await
    }

    pub async fn attach_files(&self, id: i64, file_ids: &[i64]) -> AppResult<()> {
        VISIT_FILES.link(&self.pool, id, file_ids).await
    }

    pub async fn detach_files(&self, id: i64) -> AppResult<u64> {
        VISIT_FILES.unlink_all(&self.pool, id).await
    }
}
