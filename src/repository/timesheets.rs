//! Timesheets repository: entries, holidays and corrections

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use super::{crud::delete_by_id, sql::FilterBuilder};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::{
        enums::{CorrectionStatus, DayType},
        timesheet::{
            month_bounds, CorrectionQuery, CreateHoliday, CreateTimesheetCorrection, Holiday, TimesheetCorrection,
            TimesheetEntry, TimesheetMonthQuery, UpsertTimesheetEntry,
        },
    },
};

const ENTRY_COLUMNS: &str = "id, personnel_record_id, work_date, hours_worked, day_type, comment, updated_at";

const CORRECTION_COLUMNS: &str = "id, personnel_record_id, work_date, requested_hours, requested_day_type, \
                                  reason, status, requested_by, reviewed_by, reviewed_at, created_at";

#[derive(Clone)]
pub struct TimesheetsRepository {
    pool: Pool<Postgres>,
}

impl TimesheetsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // Entries

    pub async fn upsert_entry(&self, data: &UpsertTimesheetEntry) -> AppResult<TimesheetEntry> {
        let sql = format!(
            r#"
            INSERT INTO timesheet_entries (personnel_record_id, work_date, hours_worked, day_type, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (personnel_record_id, work_date) DO UPDATE
            SET hours_worked = EXCLUDED.hours_worked,
                day_type = EXCLUDED.day_type,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );
        sqlx::query_as::<_, TimesheetEntry>(&sql)
            .bind(data.personnel_record_id)
            .bind(data.work_date)
            .bind(data.hours_worked)
            .bind(data.day_type)
            .bind(&data.comment)
            .fetch_one(&self.pool)
            .await
            .op("upsert timesheet entry")
    }

    /// Entries of one month for an employee or every employee of a department
    pub async fn list_month(&self, query: &TimesheetMonthQuery) -> AppResult<Vec<TimesheetEntry>> {
        let (first, last) = month_bounds(query.year, query.month)?;

        let mut filter = FilterBuilder::new(
            "SELECT e.id, e.personnel_record_id, e.work_date, e.hours_worked, e.day_type, e.comment, e.updated_at \
             FROM timesheet_entries e JOIN personnel_records r ON r.id = e.personnel_record_id",
        );
        filter
            .gte("e.work_date", Some(first))
            .lte("e.work_date", Some(last))
            .eq("e.personnel_record_id", query.personnel_record_id)
            .eq("r.department_id", query.department_id)
            .order_by("e.personnel_record_id, e.work_date");

        filter
            .into_query()
            .build_query_as::<TimesheetEntry>()
            .fetch_all(&self.pool)
            .await
            .op("list timesheet month")
    }

    pub async fn delete_entry(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "timesheet_entries", "Timesheet entry", "delete timesheet entry", id).await
    }

    // Holidays

    pub async fn create_holiday(&self, data: &CreateHoliday) -> AppResult<Holiday> {
        sqlx::query_as::<_, Holiday>(
            "INSERT INTO holidays (holiday_date, name) VALUES ($1, $2) RETURNING id, holiday_date, name",
        )
        .bind(data.holiday_date)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .op("create holiday")
    }

    pub async fn list_holidays(&self, year: i32) -> AppResult<Vec<Holiday>> {
        sqlx::query_as::<_, Holiday>(
            r#"
            SELECT id, holiday_date, name FROM holidays
            WHERE EXTRACT(YEAR FROM holiday_date)::int = $1
            ORDER BY holiday_date
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .op("list holidays")
    }

    pub async fn delete_holiday(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "holidays", "Holiday", "delete holiday", id).await
    }

    // Corrections

    /// File a pending correction
    pub async fn create_correction(
        &self,
        data: &CreateTimesheetCorrection,
        requested_by: i64,
    ) -> AppResult<TimesheetCorrection> {
        let sql = format!(
            r#"
            INSERT INTO timesheet_corrections (personnel_record_id, work_date, requested_hours,
                                               requested_day_type, reason, status, requested_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            CORRECTION_COLUMNS
        );
        sqlx::query_as::<_, TimesheetCorrection>(&sql)
            .bind(data.personnel_record_id)
            .bind(data.work_date)
            .bind(data.requested_hours)
            .bind(data.requested_day_type)
            .bind(&data.reason)
            .bind(CorrectionStatus::Pending)
            .bind(requested_by)
            .fetch_one(&self.pool)
            .await
            .op("create timesheet correction")
    }

    pub async fn list_corrections(&self, query: &CorrectionQuery) -> AppResult<Vec<TimesheetCorrection>> {
        let mut filter = FilterBuilder::new(format!("SELECT {} FROM timesheet_corrections", CORRECTION_COLUMNS));
        filter
            .eq("personnel_record_id", query.personnel_record_id)
            .eq("status", query.status)
            .order_by("created_at DESC, id DESC");

        filter
            .into_query()
            .build_query_as::<TimesheetCorrection>()
            .fetch_all(&self.pool)
            .await
            .op("list timesheet corrections")
    }

    /// pending → approved, writing the requested values into the timesheet
    #[tracing::instrument(skip(self))]
    pub async fn approve_correction(&self, id: i64, reviewed_by: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin approve correction")?;

        let (personnel_record_id, work_date, hours, day_type): (i64, NaiveDate, f64, DayType) =
            sqlx::query_as(
                r#"
                UPDATE timesheet_corrections
                SET status = $1, reviewed_by = $2, reviewed_at = NOW()
                WHERE id = $3 AND status = $4
                RETURNING personnel_record_id, work_date, requested_hours, requested_day_type
                "#,
            )
            .bind(CorrectionStatus::Approved)
            .bind(reviewed_by)
            .bind(id)
            .bind(CorrectionStatus::Pending)
            .fetch_optional(&mut *tx)
            .await
            .op("approve correction")?
            .ok_or_else(|| AppError::NotFound(format!("Correction {} not found or not pending", id)))?;

        sqlx::query(
            r#"
            INSERT INTO timesheet_entries (personnel_record_id, work_date, hours_worked, day_type, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (personnel_record_id, work_date) DO UPDATE
            SET hours_worked = EXCLUDED.hours_worked,
                day_type = EXCLUDED.day_type,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            "#,
        )
        .bind(personnel_record_id)
        .bind(work_date)
        .bind(hours)
        .bind(day_type)
        .bind(format!("correction #{}", id))
        .execute(&mut *tx)
        .await
        .op("apply correction")?;

        tx.commit().await.op("commit approve correction")?;

        tracing::info!(correction_id = id, personnel_record_id, %work_date, "Timesheet correction applied");
        Ok(())
    }

    /// pending → rejected; the timesheet is left as is
    pub async fn reject_correction(&self, id: i64, reviewed_by: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE timesheet_corrections
            SET status = $1, reviewed_by = $2, reviewed_at = NOW()
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(CorrectionStatus::Rejected)
        .bind(reviewed_by)
        .bind(id)
        .bind(CorrectionStatus::Pending)
        .execute(&self.pool)
        .await
        .op("reject correction")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Correction {} not found or not pending", id)));
        }
        Ok(())
    }
}
