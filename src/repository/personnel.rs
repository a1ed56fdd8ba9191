//! Personnel records repository with documents and transfers

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::{apply_update, delete_by_id},
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::{
        common::FileInfo,
        enums::PersonnelStatus,
        personnel::{
            CreatePersonnelDocument, CreatePersonnelRecord, CreatePersonnelTransfer, PersonnelDocument,
            PersonnelQuery, PersonnelRecord, PersonnelTransfer, UpdatePersonnelRecord,
        },
    },
};

const RECORD_SELECT: &str = r#"
    SELECT r.id, r.personnel_number, r.hire_date, r.termination_date, r.status,
           r.created_at, r.updated_at,
           c.id AS contact_id, c.fio AS contact_fio,
           d.id AS department_id, d.name AS department_name,
           p.id AS position_id, p.name AS position_name
    FROM personnel_records r
    LEFT JOIN contacts c ON c.id = r.contact_id
    LEFT JOIN departments d ON d.id = r.department_id
    LEFT JOIN positions p ON p.id = r.position_id
"#;

fn scan_record(row: &PgRow) -> Result<PersonnelRecord, sqlx::Error> {
    Ok(PersonnelRecord {
        id: row.try_get("id")?,
        contact: contact_ref(row, "contact_id", "contact_fio")?,
        department: named_ref(row, "department_id", "department_name")?,
        position: named_ref(row, "position_id", "position_name")?,
        personnel_number: row.try_get("personnel_number")?,
        hire_date: row.try_get("hire_date")?,
        termination_date: row.try_get("termination_date")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn scan_document(row: &PgRow) -> Result<PersonnelDocument, sqlx::Error> {
    let file = match row.try_get::<Option<i64>, _>("file_id")? {
        Some(id) => Some(FileInfo {
            id,
            file_name: row.try_get("file_name")?,
            object_key: row.try_get("object_key")?,
            mime_type: row.try_get("mime_type")?,
            size_bytes: row.try_get("size_bytes")?,
            uploaded_by: row.try_get("uploaded_by")?,
            created_at: row.try_get("file_created_at")?,
        }),
        None => None,
    };

    Ok(PersonnelDocument {
        id: row.try_get("id")?,
        personnel_record_id: row.try_get("personnel_record_id")?,
        document_type: row.try_get("document_type")?,
        title: row.try_get("title")?,
        issued_at: row.try_get("issued_at")?,
        file,
        created_at: row.try_get("created_at")?,
    })
}

fn scan_transfer(row: &PgRow) -> Result<PersonnelTransfer, sqlx::Error> {
    Ok(PersonnelTransfer {
        id: row.try_get("id")?,
        personnel_record_id: row.try_get("personnel_record_id")?,
        from_department: named_ref(row, "from_department_id", "from_department_name")?,
        to_department: named_ref(row, "to_department_id", "to_department_name")?,
        from_position: named_ref(row, "from_position_id", "from_position_name")?,
        to_position: named_ref(row, "to_position_id", "to_position_name")?,
        transfer_date: row.try_get("transfer_date")?,
        reason: row.try_get("reason")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct PersonnelRepository {
    pool: Pool<Postgres>,
}

impl PersonnelRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreatePersonnelRecord) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO personnel_records (contact_id, department_id, position_id, personnel_number, hire_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(data.contact_id)
        .bind(data.department_id)
        .bind(data.position_id)
        .bind(&data.personnel_number)
        .bind(data.hire_date)
        .bind(data.status.unwrap_or(PersonnelStatus::Active))
        .fetch_one(&self.pool)
        .await
        .op("create personnel record")?;

        tracing::debug!(personnel_record_id = id, "Personnel record created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<PersonnelRecord> {
        let query = format!("{} WHERE r.id = $1", RECORD_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get personnel record")?
            .ok_or_else(|| AppError::NotFound(format!("Personnel record {} not found", id)))?;
        scan_record(&row).op("scan personnel record")
    }

    pub async fn list(&self, query: &PersonnelQuery) -> AppResult<Vec<PersonnelRecord>> {
        let mut filter = FilterBuilder::new(RECORD_SELECT);
        filter
            .eq("r.department_id", query.department_id)
            .eq("r.status", query.status)
            .search(&["c.fio", "r.personnel_number"], query.search.as_deref())
            .order_by("c.fio, r.id")
            .paginate(query.page, query.per_page);

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list personnel records")?;
        scan_all(&rows, scan_record).op("scan personnel record")
    }

    pub async fn update(&self, id: i64, data: &UpdatePersonnelRecord) -> AppResult<()> {
        let mut update = UpdateBuilder::new("personnel_records");
        update
            .set("department_id", data.department_id)
            .set("position_id", data.position_id)
            .set("personnel_number", data.personnel_number.as_deref())
            .set("hire_date", data.hire_date)
            .set("termination_date", data.termination_date)
            .set("status", data.status)
            .touch("updated_at");
        apply_update(&self.pool, update, "Personnel record", "update personnel record", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "personnel_records", "Personnel record", "delete personnel record", id).await
    }

    // Documents

    pub async fn add_document(&self, record_id: i64, data: &CreatePersonnelDocument) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO personnel_documents (personnel_record_id, document_type, title, issued_at, file_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(record_id)
        .bind(&data.document_type)
        .bind(&data.title)
        .bind(data.issued_at)
        .bind(data.file_id)
        .fetch_one(&self.pool)
        .await
        .op("add personnel document")
    }

    pub async fn list_documents(&self, record_id: i64) -> AppResult<Vec<PersonnelDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT pd.id, pd.personnel_record_id, pd.document_type, pd.title, pd.issued_at, pd.created_at,
                   f.id AS file_id, f.file_name, f.object_key, f.mime_type, f.size_bytes,
                   f.uploaded_by, f.created_at AS file_created_at
            FROM personnel_documents pd
            LEFT JOIN files f ON f.id = pd.file_id
            WHERE pd.personnel_record_id = $1
            ORDER BY pd.created_at DESC, pd.id DESC
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .op("list personnel documents")?;
        scan_all(&rows, scan_document).op("scan personnel document")
    }

    pub async fn delete_document(&self, document_id: i64) -> AppResult<()> {
        delete_by_id(
            &self.pool,
            "personnel_documents",
            "Personnel document",
            "delete personnel document",
            document_id,
        )
        .await
    }

    // Transfers

    /// Record a transfer and move the employee in one transaction
    #[tracing::instrument(skip(self, data))]
    pub async fn transfer(&self, record_id: i64, data: &CreatePersonnelTransfer, created_by: i64) -> AppResult<i64> {
        if data.to_department_id.is_none() && data.to_position_id.is_none() {
            return Err(AppError::Validation(
                "a transfer needs a target department or position".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.op("begin personnel transfer")?;

        let (from_department_id, from_position_id): (Option<i64>, Option<i64>) = sqlx::query_as(
            "SELECT department_id, position_id FROM personnel_records WHERE id = $1 FOR UPDATE",
        )
        .bind(record_id)
        .fetch_optional(&mut *tx)
        .await
        .op("lock personnel record")?
        .ok_or_else(|| AppError::NotFound(format!("Personnel record {} not found", record_id)))?;

        let to_department_id = data.to_department_id.or(from_department_id);
        let to_position_id = data.to_position_id.or(from_position_id);

        let transfer_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO personnel_transfers (personnel_record_id, from_department_id, to_department_id,
                                             from_position_id, to_position_id, transfer_date, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(record_id)
        .bind(from_department_id)
        .bind(to_department_id)
        .bind(from_position_id)
        .bind(to_position_id)
        .bind(data.transfer_date)
        .bind(&data.reason)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .op("insert personnel transfer")?;

        sqlx::query(
            r#"
            UPDATE personnel_records
            SET department_id = $1, position_id = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(to_department_id)
        .bind(to_position_id)
        .bind(record_id)
        .execute(&mut *tx)
        .await
        .op("move personnel record")?;

        tx.commit().await.op("commit personnel transfer")?;

        tracing::info!(
            personnel_record_id = record_id,
            transfer_id,
            ?to_department_id,
            ?to_position_id,
            "Employee transferred"
        );
        Ok(transfer_id)
    }

    /// Transfer history of an employee, latest first
    pub async fn list_transfers(&self, record_id: i64) -> AppResult<Vec<PersonnelTransfer>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.personnel_record_id, t.transfer_date, t.reason, t.created_by, t.created_at,
                   fd.id AS from_department_id, fd.name AS from_department_name,
                   td.id AS to_department_id, td.name AS to_department_name,
                   fp.id AS from_position_id, fp.name AS from_position_name,
                   tp.id AS to_position_id, tp.name AS to_position_name
            FROM personnel_transfers t
            LEFT JOIN departments fd ON fd.id = t.from_department_id
            LEFT JOIN departments td ON td.id = t.to_department_id
            LEFT JOIN positions fp ON fp.id = t.from_position_id
            LEFT JOIN positions tp ON tp.id = t.to_position_id
            WHERE t.personnel_record_id = $1
            ORDER BY t.transfer_date DESC, t.id DESC
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .op("list personnel transfers")?;
        scan_all(&rows, scan_transfer).op("scan personnel transfer")
    }
}
