//! Payroll repository.
//!
//! Salary status moves draft → calculated → approved → paid, with
//! calculated → draft as the only way back. Each transition is a single UPDATE
//! gated on the prior status, so a salary in any other state reports
//! `NotFound`. Amounts and adjustments can only change while in draft;
//! adjustment writes hold a share lock on the salary row until they commit.

use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::delete_by_id,
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::{
        enums::SalaryStatus,
        salary::{
            validate_period, CreateSalary, CreateSalaryAdjustment, CreateSalaryStructure, Salary, SalaryAdjustment,
            SalaryQuery, SalaryStructure, UpdateSalary,
        },
    },
};

const SALARY_SELECT: &str = r#"
    SELECT s.id, s.personnel_record_id, s.period_year, s.period_month, s.base_amount,
           s.bonuses_total, s.deductions_total, s.net_amount, s.status,
           s.calculated_at, s.approved_by, s.approved_at, s.paid_at,
           s.created_by, s.created_at, s.updated_at,
           c.id AS employee_id, c.fio AS employee_fio
    FROM salaries s
    LEFT JOIN personnel_records r ON r.id = s.personnel_record_id
    LEFT JOIN contacts c ON c.id = r.contact_id
"#;

fn scan_salary(row: &PgRow) -> Result<Salary, sqlx::Error> {
    Ok(Salary {
        id: row.try_get("id")?,
        personnel_record_id: row.try_get("personnel_record_id")?,
        employee: contact_ref(row, "employee_id", "employee_fio")?,
        period_year: row.try_get("period_year")?,
        period_month: row.try_get("period_month")?,
        base_amount: row.try_get("base_amount")?,
        bonuses_total: row.try_get("bonuses_total")?,
        deductions_total: row.try_get("deductions_total")?,
        net_amount: row.try_get("net_amount")?,
        status: row.try_get("status")?,
        calculated_at: row.try_get("calculated_at")?,
        approved_by: row.try_get("approved_by")?,
        approved_at: row.try_get("approved_at")?,
        paid_at: row.try_get("paid_at")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn scan_structure(row: &PgRow) -> Result<SalaryStructure, sqlx::Error> {
    Ok(SalaryStructure {
        id: row.try_get("id")?,
        position: named_ref(row, "position_id", "position_name")?,
        base_amount: row.try_get("base_amount")?,
        allowance_percent: row.try_get("allowance_percent")?,
        effective_from: row.try_get("effective_from")?,
        created_at: row.try_get("created_at")?,
    })
}

fn not_in_state(id: i64, status: SalaryStatus) -> AppError {
    AppError::NotFound(format!("Salary {} not found or not {}", id, status))
}

/// Bonus and deduction tables share one layout
#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Bonus,
    Deduction,
}

impl Adjustment {
    fn table(self) -> &'static str {
        match self {
            Adjustment::Bonus => "salary_bonuses",
            Adjustment::Deduction => "salary_deductions",
        }
    }
}

#[derive(Clone)]
pub struct SalariesRepository {
    pool: Pool<Postgres>,
}

impl SalariesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // Structures

    pub async fn create_structure(&self, data: &CreateSalaryStructure) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO salary_structures (position_id, base_amount, allowance_percent, effective_from)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(data.position_id)
        .bind(data.base_amount)
        .bind(data.allowance_percent)
        .bind(data.effective_from)
        .fetch_one(&self.pool)
        .await
        .op("create salary structure")
    }

    /// Structures, newest effective date first within each position
    pub async fn list_structures(&self, position_id: Option<i64>) -> AppResult<Vec<SalaryStructure>> {
        let mut filter = FilterBuilder::new(
            r#"
            SELECT ss.id, ss.base_amount, ss.allowance_percent, ss.effective_from, ss.created_at,
                   p.id AS position_id, p.name AS position_name
            FROM salary_structures ss
            LEFT JOIN positions p ON p.id = ss.position_id
            "#,
        );
        filter
            .eq("ss.position_id", position_id)
            .order_by("p.name, ss.effective_from DESC");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list salary structures")?;
        scan_all(&rows, scan_structure).op("scan salary structure")
    }

    pub async fn delete_structure(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "salary_structures", "Salary structure", "delete salary structure", id).await
    }

    // Salaries

    /// Create a draft salary; one per employee and month
    pub async fn create(&self, data: &CreateSalary, created_by: i64) -> AppResult<i64> {
        validate_period(data.period_year, data.period_month)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO salaries (personnel_record_id, period_year, period_month, base_amount, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(data.personnel_record_id)
        .bind(data.period_year)
        .bind(data.period_month)
        .bind(data.base_amount)
        .bind(SalaryStatus::Draft)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .op("create salary")?;

        tracing::debug!(salary_id = id, "Draft salary created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Salary> {
        let query = format!("{} WHERE s.id = $1", SALARY_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get salary")?
            .ok_or_else(|| AppError::NotFound(format!("Salary {} not found", id)))?;
        scan_salary(&row).op("scan salary")
    }

    pub async fn list(&self, query: &SalaryQuery) -> AppResult<Vec<Salary>> {
        let mut filter = FilterBuilder::new(SALARY_SELECT);
        filter
            .eq("s.personnel_record_id", query.personnel_record_id)
            .eq("s.period_year", query.period_year)
            .eq("s.period_month", query.period_month)
            .eq("s.status", query.status)
            .order_by("s.period_year DESC, s.period_month DESC, c.fio");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list salaries")?;
        scan_all(&rows, scan_salary).op("scan salary")
    }

    /// Change the base amount of a draft salary
    pub async fn update(&self, id: i64, data: &UpdateSalary) -> AppResult<()> {
        let mut update = UpdateBuilder::new("salaries");
        update.set("base_amount", data.base_amount).touch("updated_at");
        if update.is_empty() {
            return Ok(());
        }

        let mut query = update.where_key("id", id);
        query.push(" AND status = ").push_bind(SalaryStatus::Draft);
        let result = query
            .build()
            .execute(&self.pool)
            .await
            .op("update salary")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, SalaryStatus::Draft));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM salaries WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(SalaryStatus::Draft)
            .execute(&self.pool)
            .await
            .op("delete salary")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, SalaryStatus::Draft));
        }
        Ok(())
    }

    /// draft → calculated: totals bonuses and deductions and returns the net amount.
    ///
    /// The salary row is locked before the sums are read, so an adjustment
    /// committed while the lock was awaited is included in the totals.
    #[tracing::instrument(skip(self))]
    pub async fn calculate(&self, id: i64) -> AppResult<Decimal> {
        let mut tx = self.pool.begin().await.op("begin calculate salary")?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM salaries WHERE id = $1 AND status = $2 FOR UPDATE")
            .bind(id)
            .bind(SalaryStatus::Draft)
            .fetch_optional(&mut *tx)
            .await
            .op("lock salary")?
            .ok_or_else(|| not_in_state(id, SalaryStatus::Draft))?;

        let net_amount = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE salaries s
            SET bonuses_total = t.bonuses,
                deductions_total = t.deductions,
                net_amount = s.base_amount + t.bonuses - t.deductions,
                status = $2,
                calculated_at = NOW(),
                updated_at = NOW()
            FROM (
                SELECT COALESCE((SELECT SUM(amount) FROM salary_bonuses WHERE salary_id = $1), 0) AS bonuses,
                       COALESCE((SELECT SUM(amount) FROM salary_deductions WHERE salary_id = $1), 0) AS deductions
            ) t
            WHERE s.id = $1
            RETURNING s.net_amount
            "#,
        )
        .bind(id)
        .bind(SalaryStatus::Calculated)
        .fetch_one(&mut *tx)
        .await
        .op("calculate salary")?;

        tx.commit().await.op("commit calculate salary")?;

        tracing::info!(salary_id = id, %net_amount, "Salary calculated");
        Ok(net_amount)
    }

    /// calculated → approved
    pub async fn approve(&self, id: i64, approved_by: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE salaries
            SET status = $1, approved_by = $2, approved_at = NOW(), updated_at = NOW()
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(SalaryStatus::Approved)
        .bind(approved_by)
        .bind(id)
        .bind(SalaryStatus::Calculated)
        .execute(&self.pool)
        .await
        .op("approve salary")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, SalaryStatus::Calculated));
        }
        tracing::info!(salary_id = id, approved_by, "Salary approved");
        Ok(())
    }

    /// approved → paid
    pub async fn mark_paid(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE salaries SET status = $1, paid_at = NOW(), updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(SalaryStatus::Paid)
        .bind(id)
        .bind(SalaryStatus::Approved)
        .execute(&self.pool)
        .await
        .op("mark salary paid")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, SalaryStatus::Approved));
        }
        tracing::info!(salary_id = id, "Salary paid");
        Ok(())
    }

    /// calculated → draft; clears the computed totals
    pub async fn return_to_draft(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE salaries
            SET status = $1, net_amount = NULL, calculated_at = NULL, updated_at = NOW()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(SalaryStatus::Draft)
        .bind(id)
        .bind(SalaryStatus::Calculated)
        .execute(&self.pool)
        .await
        .op("return salary to draft")?;
        if result.rows_affected() == 0 {
            return Err(not_in_state(id, SalaryStatus::Calculated));
        }
        Ok(())
    }

    // Bonuses and deductions

    async fn add_adjustment(
        &self,
        kind: Adjustment,
        salary_id: i64,
        data: &CreateSalaryAdjustment,
    ) -> AppResult<SalaryAdjustment> {
        let sql = format!(
            r#"
            INSERT INTO {} (salary_id, amount, reason)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM salaries WHERE id = $1 AND status = $4 FOR SHARE)
            RETURNING id, salary_id, amount, reason, created_at
            "#,
            kind.table()
        );
        sqlx::query_as::<_, SalaryAdjustment>(&sql)
            .bind(salary_id)
            .bind(data.amount)
            .bind(&data.reason)
            .bind(SalaryStatus::Draft)
            .fetch_optional(&self.pool)
            .await
            .op("add salary adjustment")?
            .ok_or_else(|| not_in_state(salary_id, SalaryStatus::Draft))
    }

    async fn list_adjustments(&self, kind: Adjustment, salary_id: i64) -> AppResult<Vec<SalaryAdjustment>> {
        let sql = format!(
            "SELECT id, salary_id, amount, reason, created_at FROM {} WHERE salary_id = $1 ORDER BY id",
            kind.table()
        );
        sqlx::query_as::<_, SalaryAdjustment>(&sql)
            .bind(salary_id)
            .fetch_all(&self.pool)
            .await
            .op("list salary adjustments")
    }

    async fn delete_adjustment(&self, kind: Adjustment, id: i64) -> AppResult<()> {
        let sql = format!(
            r#"
            DELETE FROM {} a
            WHERE a.id = $1
              AND EXISTS (SELECT 1 FROM salaries s WHERE s.id = a.salary_id AND s.status = $2 FOR SHARE)
            "#,
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(SalaryStatus::Draft)
            .execute(&self.pool)
            .await
            .op("delete salary adjustment")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Adjustment {} not found or its salary is not draft",
                id
            )));
        }
        Ok(())
    }

    pub async fn add_bonus(&self, salary_id: i64, data: &CreateSalaryAdjustment) -> AppResult<SalaryAdjustment> {
        self.add_adjustment(Adjustment::Bonus, salary_id, data).await
    }

    pub async fn list_bonuses(&self, salary_id: i64) -> AppResult<Vec<SalaryAdjustment>> {
        self.list_adjustments(Adjustment::Bonus, salary_id).await
    }

    pub async fn delete_bonus(&self, id: i64) -> AppResult<()> {
        self.delete_adjustment(Adjustment::Bonus, id).await
    }

    pub async fn add_deduction(&self, salary_id: i64, data: &CreateSalaryAdjustment) -> AppResult<SalaryAdjustment> {
        self.add_adjustment(Adjustment::Deduction, salary_id, data).await
    }

    pub async fn list_deductions(&self, salary_id: i64) -> AppResult<Vec<SalaryAdjustment>> {
        self.list_adjustments(Adjustment::Deduction, salary_id).await
    }

    pub async fn delete_deduction(&self, id: i64) -> AppResult<()> {
        self.delete_adjustment(Adjustment::Deduction, id).await
    }
}
