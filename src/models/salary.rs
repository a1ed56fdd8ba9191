//! Payroll: salary structures, monthly salaries, bonuses and deductions

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, NamedRef};
use super::enums::SalaryStatus;
use crate::error::{AppError, AppResult};

/// Check that `(year, month)` names a real payroll period
pub fn validate_period(year: i32, month: i32) -> AppResult<()> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!("invalid salary month {}", month)));
    }
    if !(2000..=2100).contains(&year) {
        return Err(AppError::Validation(format!("invalid salary year {}", year)));
    }
    Ok(())
}

/// Base pay configured for a position
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalaryStructure {
    pub id: i64,
    pub position: Option<NamedRef>,
    pub base_amount: Decimal,
    pub allowance_percent: Option<Decimal>,
    pub effective_from: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSalaryStructure {
    pub position_id: i64,
    pub base_amount: Decimal,
    pub allowance_percent: Option<Decimal>,
    pub effective_from: NaiveDate,
}

/// Salary of one employee for one month
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Salary {
    pub id: i64,
    pub personnel_record_id: i64,
    pub employee: Option<ContactRef>,
    pub period_year: i32,
    pub period_month: i32,
    pub base_amount: Decimal,
    pub bonuses_total: Decimal,
    pub deductions_total: Decimal,
    /// base + bonuses - deductions, filled by `calculate`
    pub net_amount: Option<Decimal>,
    pub status: SalaryStatus,
    pub calculated_at: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSalary {
    pub personnel_record_id: i64,
    pub period_year: i32,
    pub period_month: i32,
    pub base_amount: Decimal,
}

/// Editable while the salary is a draft
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSalary {
    pub base_amount: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct SalaryQuery {
    pub personnel_record_id: Option<i64>,
    pub period_year: Option<i32>,
    pub period_month: Option<i32>,
    pub status: Option<SalaryStatus>,
}

/// Row of `salary_bonuses` or `salary_deductions`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SalaryAdjustment {
    pub id: i64,
    pub salary_id: i64,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSalaryAdjustment {
    pub amount: Decimal,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_period() {
        assert!(validate_period(2024, 1).is_ok());
        assert!(validate_period(2024, 12).is_ok());
        assert!(matches!(validate_period(2024, 0), Err(AppError::Validation(_))));
        assert!(matches!(validate_period(2024, 13), Err(AppError::Validation(_))));
        assert!(matches!(validate_period(1999, 5), Err(AppError::Validation(_))));
    }
}
