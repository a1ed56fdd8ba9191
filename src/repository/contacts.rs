//! Contacts and fast-call repositories

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::{apply_update, delete_by_id},
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::contact::{ContactDetails, ContactQuery, CreateContact, CreateFastCall, FastCall, UpdateContact},
};

const CONTACT_SELECT: &str = r#"
    SELECT c.id, c.fio, c.email, c.phone, c.mobile_phone, c.birth_date, c.created_at, c.updated_at,
           o.id AS organization_id, o.name AS organization_name,
           d.id AS department_id, d.name AS department_name,
           p.id AS position_id, p.name AS position_name
    FROM contacts c
    LEFT JOIN organizations o ON o.id = c.organization_id
    LEFT JOIN departments d ON d.id = c.department_id
    LEFT JOIN positions p ON p.id = c.position_id
"#;

const FAST_CALL_SELECT: &str = r#"
    SELECT f.id, f.position,
           c.id AS contact_id, c.fio AS contact_fio, c.phone, c.mobile_phone,
           d.id AS department_id, d.name AS department_name
    FROM fast_calls f
    LEFT JOIN contacts c ON c.id = f.contact_id
    LEFT JOIN departments d ON d.id = c.department_id
    ORDER BY f.position, f.id
"#;

fn scan_contact(row: &PgRow) -> Result<ContactDetails, sqlx::Error> {
    Ok(ContactDetails {
        id: row.try_get("id")?,
        fio: row.try_get("fio")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        mobile_phone: row.try_get("mobile_phone")?,
        birth_date: row.try_get("birth_date")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        department: named_ref(row, "department_id", "department_name")?,
        position: named_ref(row, "position_id", "position_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn scan_fast_call(row: &PgRow) -> Result<FastCall, sqlx::Error> {
    Ok(FastCall {
        id: row.try_get("id")?,
        position: row.try_get("position")?,
        contact: contact_ref(row, "contact_id", "contact_fio")?,
        phone: row.try_get("phone")?,
        mobile_phone: row.try_get("mobile_phone")?,
        department: named_ref(row, "department_id", "department_name")?,
    })
}

#[derive(Clone)]
pub struct ContactsRepository {
    pool: Pool<Postgres>,
}

impl ContactsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateContact) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO contacts (fio, email, phone, mobile_phone, birth_date,
                                  organization_id, department_id, position_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&data.fio)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.mobile_phone)
        .bind(data.birth_date)
        .bind(data.organization_id)
        .bind(data.department_id)
        .bind(data.position_id)
        .fetch_one(&self.pool)
        .await
        .op("create contact")?;

        tracing::debug!(contact_id = id, "Contact created");
        Ok(id)
    }

    /// Get a contact with its organization, department and position
    pub async fn get_by_id(&self, id: i64) -> AppResult<ContactDetails> {
        let query = format!("{} WHERE c.id = $1", CONTACT_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get contact")?
            .ok_or_else(|| AppError::NotFound(format!("Contact {} not found", id)))?;
        scan_contact(&row).op("scan contact")
    }

    /// Search contacts by name, email or phone, ordered by name
    pub async fn list(&self, query: &ContactQuery) -> AppResult<Vec<ContactDetails>> {
        let mut filter = FilterBuilder::new(CONTACT_SELECT);
        filter
            .search(&["c.fio", "c.email", "c.phone", "c.mobile_phone"], query.search.as_deref())
            .eq("c.organization_id", query.organization_id)
            .eq("c.department_id", query.department_id)
            .eq("c.position_id", query.position_id)
            .order_by("c.fio, c.id")
            .paginate(query.page, query.per_page);

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list contacts")?;
        scan_all(&rows, scan_contact).op("scan contact")
    }

    pub async fn update(&self, id: i64, data: &UpdateContact) -> AppResult<()> {
        let mut update = UpdateBuilder::new("contacts");
        update
            .set("fio", data.fio.as_deref())
            .set("email", data.email.as_deref())
            .set("phone", data.phone.as_deref())
            .set("mobile_phone", data.mobile_phone.as_deref())
            .set("birth_date", data.birth_date)
            .set("organization_id", data.organization_id)
            .set("department_id", data.department_id)
            .set("position_id", data.position_id)
            .touch("updated_at");
        apply_update(&self.pool, update, "Contact", "update contact", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "contacts", "Contact", "delete contact", id).await
    }
}

#[derive(Clone)]
pub struct FastCallsRepository {
    pool: Pool<Postgres>,
}

impl FastCallsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Pin a contact; a contact appears on the list at most once
    pub async fn add(&self, data: &CreateFastCall) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO fast_calls (contact_id, position) VALUES ($1, $2) RETURNING id",
        )
        .bind(data.contact_id)
        .bind(data.position)
        .fetch_one(&self.pool)
        .await
        .op("add fast call")
    }

    pub async fn list(&self) -> AppResult<Vec<FastCall>> {
        let rows = sqlx::query(FAST_CALL_SELECT)
            .fetch_all(&self.pool)
            .await
            .op("list fast calls")?;
        scan_all(&rows, scan_fast_call).op("scan fast call")
    }

    /// Move an entry to another sort position
    pub async fn update_position(&self, id: i64, position: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE fast_calls SET position = $1 WHERE id = $2")
            .bind(position)
            .bind(id)
            .execute(&self.pool)
            .await
            .op("update fast call position")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Fast call {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "fast_calls", "Fast call", "delete fast call", id).await
    }
}
