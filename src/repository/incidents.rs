//! Incidents repository

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::delete_by_id,
    files::INCIDENT_FILES,
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::incident::{CreateIncident, IncidentDetails, IncidentQuery, UpdateIncident},
};

const INCIDENT_SELECT: &str = r#"
    SELECT i.id, i.incident_time, i.description, i.consequences, i.measures_taken,
           i.created_by, i.created_at, i.updated_at,
           o.id AS organization_id, o.name AS organization_name,
           c.id AS reporter_id, c.fio AS reporter_fio
    FROM incidents i
    LEFT JOIN organizations o ON o.id = i.organization_id
    LEFT JOIN contacts c ON c.id = i.reported_by_contact_id
"#;

fn scan_incident(row: &PgRow) -> Result<IncidentDetails, sqlx::Error> {
    Ok(IncidentDetails {
        id: row.try_get("id")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        incident_time: row.try_get("incident_time")?,
        description: row.try_get("description")?,
        consequences: row.try_get("consequences")?,
        measures_taken: row.try_get("measures_taken")?,
        reported_by: contact_ref(row, "reporter_id", "reporter_fio")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        files: Vec::new(),
    })
}

#[derive(Clone)]
pub struct IncidentsRepository {
    pool: Pool<Postgres>,
}

impl IncidentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create an incident and attach its files
    pub async fn create(&self, data: &CreateIncident, created_by: i64) -> AppResult<i64> {
        let mut tx = self.pool.begin().await.op("begin create incident")?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO incidents (organization_id, incident_time, description, consequences,
                                   measures_taken, reported_by_contact_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(data.organization_id)
        .bind(data.incident_time)
        .bind(&data.description)
        .bind(&data.consequences)
        .bind(&data.measures_taken)
        .bind(data.reported_by_contact_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .op("create incident")?;

        INCIDENT_FILES.link(&mut *tx, id, &data.file_ids).await?;

        tx.commit().await.op("commit create incident")?;
        tracing::debug!(incident_id = id, files = data.file_ids.len(), "Incident created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<IncidentDetails> {
        let query = format!("{} WHERE i.id = $1", INCIDENT_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get incident")?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;

        let mut incident = scan_incident(&row).op("scan incident")?;
        incident.files = INCIDENT_FILES.load(&self.pool, id).await?;
        Ok(incident)
    }

    /// Incidents, most recent first
    pub async fn list(&self, query: &IncidentQuery) -> AppResult<Vec<IncidentDetails>> {
        let mut filter = FilterBuilder::new(INCIDENT_SELECT);
        filter
            .eq("i.organization_id", query.organization_id)
            .gte("i.incident_time", query.date_from)
            .lte("i.incident_time", query.date_to)
            .order_by("i.incident_time DESC, i.id DESC");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list incidents")?;
        let mut incidents = scan_all(&rows, scan_incident).op("scan incident")?;

        let ids: Vec<i64> = incidents.iter().map(|i| i.id).collect();
        let mut files = INCIDENT_FILES.load_many(&self.pool, &ids).await?;
        for incident in &mut incidents {
            incident.files = files.remove(&incident.id).unwrap_or_default();
        }
        Ok(incidents)
    }

    /// Update present fields; `file_ids` replaces the attachments
    pub async fn update(&self, id: i64, data: &UpdateIncident) -> AppResult<()> {
        let mut update = UpdateBuilder::new("incidents");
        update
            .set("organization_id", data.organization_id)
            .set("incident_time", data.incident_time)
            .set("description", data.description.as_deref())
            .set("consequences", data.consequences.as_deref())
            .set("measures_taken", data.measures_taken.as_deref())
            .set("reported_by_contact_id", data.reported_by_contact_id)
            .touch("updated_at");
        if update.is_empty() && data.file_ids.is_none() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.op("begin update incident")?;

        let mut query = update.where_key("id", id);
        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .op("update incident")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Incident {} not found", id)));
        }

        if let Some(file_ids) = &data.file_ids {
            INCIDENT_FILES.replace(&mut *tx, id, file_ids).await?;
        }

        tx.commit().await.op("commit update incident")?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "incidents", "Incident", "delete incident", id).await
    }

    pub async fn attach_files(&self, id: i64, file_ids: &[i64]) -> AppResult<()> {
        INCIDENT_FILES.link(&self.pool, id, file_ids).await
    }

    pub async fn detach_files(&self, id: i64) -> AppResult<u64> {
        INCIDENT_FILES.unlink_all(&self.pool, id).await
    }
}
