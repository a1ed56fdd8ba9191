//! Vacations repository.
//!
//! Requests move draft → pending → approved | rejected; every transition is
//! gated on the prior status. Approving an annual vacation also books its days
//! against the employee's balance for the year the vacation starts in.

use chrono::{Datelike, NaiveDate};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::delete_by_id,
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::{
        enums::{VacationStatus, VacationType},
        vacation::{
            vacation_days, BlockedPeriod, CreateBlockedPeriod, CreateVacation, UpdateVacation, UpsertVacationBalance,
            Vacation, VacationBalance, VacationQuery,
        },
    },
};

const VACATION_SELECT: &str = r#"
    SELECT v.id, v.personnel_record_id, v.vacation_type, v.start_date, v.end_date, v.days_count,
           v.status, v.comment, v.created_by, v.decided_by, v.decided_at, v.created_at, v.updated_at,
           c.id AS employee_id, c.fio AS employee_fio
    FROM vacations v
    LEFT JOIN personnel_records r ON r.id = v.personnel_record_id
    LEFT JOIN contacts c ON c.id = r.contact_id
"#;

const BLOCKED_SELECT: &str = r#"
    SELECT b.id, b.start_date, b.end_date, b.reason, b.created_by, b.created_at,
           d.id AS department_id, d.name AS department_name
    FROM department_blocked_periods b
    LEFT JOIN departments d ON d.id = b.department_id
"#;

const BALANCE_COLUMNS: &str =
    "id, personnel_record_id, year, total_days, used_days, total_days - used_days AS remaining_days";

fn scan_vacation(row: &PgRow) -> Result<Vacation, sqlx::Error> {
    Ok(Vacation {
        id: row.try_get("id")?,
        personnel_record_id: row.try_get("personnel_record_id")?,
        employee: contact_ref(row, "employee_id", "employee_fio")?,
        vacation_type: row.try_get("vacation_type")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        days_count: row.try_get("days_count")?,
        status: row.try_get("status")?,
        comment: row.try_get("comment")?,
        created_by: row.try_get("created_by")?,
        decided_by: row.try_get("decided_by")?,
        decided_at: row.try_get("decided_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn scan_blocked(row: &PgRow) -> Result<BlockedPeriod, sqlx::Error> {
    Ok(BlockedPeriod {
        id: row.try_get("id")?,
        department: named_ref(row, "department_id", "department_name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        reason: row.try_get("reason")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn not_in_state(id: i64, status: VacationStatus) -> AppError {
    AppError::NotFound(format!("Vacation {} not found or not {}", id, status))
}

#[derive(Clone)]
pub struct VacationsRepository {
    pool: Pool<Postgres>,
}

impl VacationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a draft request
    pub async fn create(&self, data: &CreateVacation, created_by: i64) -> AppResult<i64> {
        let days_count = vacation_days(data.start_date, data.end_date)?;

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO vacations (personnel_record_id, vacation_type, start_date, end_date,
                                   days_count, status, comment, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(data.personnel_record_id)
        .bind(data.vacation_type)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(days_count)
        .bind(VacationStatus::Draft)
        .bind(&data.comment)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .op("create vacation")
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Vacation> {
        let query = format!("{} WHERE v.id = $1", VACATION_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get vacation")?
            .ok_or_else(|| AppError::NotFound(format!("Vacation {} not found", id)))?;
        scan_vacation(&row).op("scan vacation")
    }

    pub async fn list(&self, query: &VacationQuery) -> AppResult<Vec<Vacation>> {
        let mut filter = FilterBuilder::new(VACATION_SELECT);
        filter
            .eq("v.personnel_record_id", query.personnel_record_id)
            .eq("r.department_id", query.department_id)
            .eq("v.status", query.status)
            .gte("v.start_date", query.date_from)
            .lte("v.start_date", query.date_to)
            .order_by("v.start_date DESC, v.id DESC");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list vacations")?;
        scan_all(&rows, scan_vacation).op("scan vacation")
    }

    /// Edit a draft; changed dates recompute the day count
    pub async fn update(&self, id: i64, data: &UpdateVacation) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin update vacation")?;

        let (start_date, end_date): (NaiveDate, NaiveDate) = sqlx::query_as(
            "SELECT start_date, end_date FROM vacations WHERE id = $1 AND status = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(VacationStatus::Draft)
        .fetch_optional(&mut *tx)
        .await
        .op("lock vacation")?
        .ok_or_else(|| not_in_state(id, VacationStatus::Draft))?;

        let days_count = if data.start_date.is_some() || data.end_date.is_some() {
            Some(vacation_days(
                data.start_date.unwrap_or(start_date),
                data.end_date.unwrap_or(end_date),
            )?)
        } else {
            None
        };

        let mut update = UpdateBuilder::new("vacations");
        update
            .set("vacation_type", data.vacation_type)
            .set("start_date", data.start_date)
            .set("end_date", data.end_date)
            .set("days_count", days_count)
            .set("comment", data.comment.as_deref())
            .touch("updated_at");
        if update.is_empty() {
            return Ok(());
        }

        let mut query = update.where_key("id", id);
        query
            .build()
            .execute(&mut *tx)
            .await
            .op("update vacation")?;

        tx.commit().await.op("commit update vacation")?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM vacations WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(VacationStatus::Draft)
            .execute(&self.pool)
            .await
            .op("delete vacation")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, VacationStatus::Draft));
        }
        Ok(())
    }

    /// draft → pending
    pub async fn submit(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE vacations SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(VacationStatus::Pending)
        .bind(id)
        .bind(VacationStatus::Draft)
        .execute(&self.pool)
        .await
        .op("submit vacation")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, VacationStatus::Draft));
        }
        Ok(())
    }

    /// pending → approved; annual vacations are booked against the balance
    #[tracing::instrument(skip(self))]
    pub async fn approve(&self, id: i64, decided_by: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin approve vacation")?;

        let (personnel_record_id, vacation_type, start_date, days_count): (i64, VacationType, NaiveDate, i32) =
            sqlx::query_as(
                r#"
                UPDATE vacations
                SET status = $1, decided_by = $2, decided_at = NOW(), updated_at = NOW()
                WHERE id = $3 AND status = $4
                RETURNING personnel_record_id, vacation_type, start_date, days_count
                "#,
            )
            .bind(VacationStatus::Approved)
            .bind(decided_by)
            .bind(id)
            .bind(VacationStatus::Pending)
            .fetch_optional(&mut *tx)
            .await
            .op("approve vacation")?
            .ok_or_else(|| not_in_state(id, VacationStatus::Pending))?;

        if vacation_type == VacationType::Annual {
            sqlx::query(
                r#"
                INSERT INTO vacation_balances (personnel_record_id, year, total_days, used_days)
                VALUES ($1, $2, 0, $3)
                ON CONFLICT (personnel_record_id, year) DO UPDATE
                SET used_days = vacation_balances.used_days + EXCLUDED.used_days,
                    updated_at = NOW()
                "#,
            )
            .bind(personnel_record_id)
            .bind(start_date.year())
            .bind(days_count)
            .execute(&mut *tx)
            .await
            .op("book vacation days")?;
        }

        tx.commit().await.op("commit approve vacation")?;

        tracing::info!(vacation_id = id, personnel_record_id, days_count, %vacation_type, "Vacation approved");
        Ok(())
    }

    /// pending → rejected
    pub async fn reject(&self, id: i64, decided_by: i64, comment: Option<&str>) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vacations
            SET status = $1, decided_by = $2, decided_at = NOW(),
                comment = COALESCE($3, comment), updated_at = NOW()
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(VacationStatus::Rejected)
        .bind(decided_by)
        .bind(comment)
        .bind(id)
        .bind(VacationStatus::Pending)
        .execute(&self.pool)
        .await
        .op("reject vacation")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, VacationStatus::Pending));
        }
        Ok(())
    }

    // Balances

    pub async fn get_balance(&self, personnel_record_id: i64, year: i32) -> AppResult<VacationBalance> {
        let sql = format!(
            "SELECT {} FROM vacation_balances WHERE personnel_record_id = $1 AND year = $2",
            BALANCE_COLUMNS
        );
        sqlx::query_as::<_, VacationBalance>(&sql)
            .bind(personnel_record_id)
            .bind(year)
            .fetch_optional(&self.pool)
            .await
            .op("get vacation balance")?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No vacation balance for personnel record {} in {}",
                    personnel_record_id, year
                ))
            })
    }

    /// Set the yearly entitlement; used days are kept
    pub async fn upsert_balance(&self, data: &UpsertVacationBalance) -> AppResult<VacationBalance> {
        let sql = format!(
            r#"
            INSERT INTO vacation_balances (personnel_record_id, year, total_days, used_days)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (personnel_record_id, year) DO UPDATE
            SET total_days = EXCLUDED.total_days, updated_at = NOW()
            RETURNING {}
            "#,
            BALANCE_COLUMNS
        );
        sqlx::query_as::<_, VacationBalance>(&sql)
            .bind(data.personnel_record_id)
            .bind(data.year)
            .bind(data.total_days)
            .fetch_one(&self.pool)
            .await
            .op("upsert vacation balance")
    }

    pub async fn list_balances(&self, year: Option<i32>, personnel_record_id: Option<i64>) -> AppResult<Vec<VacationBalance>> {
        let mut filter = FilterBuilder::new(format!("SELECT {} FROM vacation_balances", BALANCE_COLUMNS));
        filter
            .eq("year", year)
            .eq("personnel_record_id", personnel_record_id)
            .order_by("year DESC, personnel_record_id");

        filter
            .into_query()
            .build_query_as::<VacationBalance>()
            .fetch_all(&self.pool)
            .await
            .op("list vacation balances")
    }

    // Blocked periods

    pub async fn create_blocked_period(&self, data: &CreateBlockedPeriod, created_by: i64) -> AppResult<i64> {
        if data.end_date < data.start_date {
            return Err(AppError::Validation(format!(
                "blocked period end {} is before its start {}",
                data.end_date, data.start_date
            )));
        }

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO department_blocked_periods (department_id, start_date, end_date, reason, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(data.department_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.reason)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .op("create blocked period")
    }

    pub async fn list_blocked_periods(&self, department_id: Option<i64>) -> AppResult<Vec<BlockedPeriod>> {
        let mut filter = FilterBuilder::new(BLOCKED_SELECT);
        filter
            .eq("b.department_id", department_id)
            .order_by("b.start_date, b.id");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list blocked periods")?;
        scan_all(&rows, scan_blocked).op("scan blocked period")
    }

    /// Blocked periods of a department intersecting `start..=end`
    pub async fn find_overlapping_blocked_periods(
        &self,
        department_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<BlockedPeriod>> {
        let query = format!(
            "{} WHERE b.department_id = $1 AND b.start_date <= $3 AND b.end_date >= $2 ORDER BY b.start_date",
            BLOCKED_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(department_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .op("find overlapping blocked periods")?;
        scan_all(&rows, scan_blocked).op("scan blocked period")
    }

    pub async fn delete_blocked_period(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "department_blocked_periods", "Blocked period", "delete blocked period", id).await
    }
}
