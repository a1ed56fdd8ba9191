//! Vacation requests, yearly balances and department blocked periods

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, NamedRef};
use super::enums::{VacationStatus, VacationType};
use crate::error::{AppError, AppResult};

/// Calendar days covered by `start..=end`
pub fn vacation_days(start: NaiveDate, end: NaiveDate) -> AppResult<i32> {
    if end < start {
        return Err(AppError::Validation(format!(
            "vacation end {} is before its start {}",
            end, start
        )));
    }
    i32::try_from((end - start).num_days() + 1)
        .map_err(|_| AppError::Validation("vacation is too long".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Vacation {
    pub id: i64,
    pub personnel_record_id: i64,
    pub employee: Option<ContactRef>,
    pub vacation_type: VacationType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_count: i32,
    pub status: VacationStatus,
    pub comment: Option<String>,
    pub created_by: i64,
    pub decided_by: Option<i64>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVacation {
    pub personnel_record_id: i64,
    pub vacation_type: VacationType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub comment: Option<String>,
}

/// Editable while the request is a draft
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateVacation {
    pub vacation_type: Option<VacationType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct VacationQuery {
    pub personnel_record_id: Option<i64>,
    pub department_id: Option<i64>,
    pub status: Option<VacationStatus>,
    /// Vacations starting within this window
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Annual vacation entitlement and usage of one employee
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct VacationBalance {
    pub id: i64,
    pub personnel_record_id: i64,
    pub year: i32,
    pub total_days: i32,
    pub used_days: i32,
    pub remaining_days: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertVacationBalance {
    pub personnel_record_id: i64,
    pub year: i32,
    pub total_days: i32,
}

/// Period during which a department accepts no vacations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockedPeriod {
    pub id: i64,
    pub department: Option<NamedRef>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlockedPeriod {
    pub department_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_vacation_days_inclusive() {
        assert_eq!(vacation_days(date(7, 1), date(7, 14)).unwrap(), 14);
        assert_eq!(vacation_days(date(7, 1), date(7, 1)).unwrap(), 1);
        assert_eq!(vacation_days(date(2, 28), date(3, 1)).unwrap(), 3);
    }

    #[test]
    fn test_vacation_days_rejects_inverted_range() {
        assert!(matches!(vacation_days(date(7, 2), date(7, 1)), Err(AppError::Validation(_))));
    }
}
