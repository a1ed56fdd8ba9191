//! Timesheets: daily entries, public holidays and correction requests

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::{CorrectionStatus, DayType};
use crate::error::{AppError, AppResult};

/// First and last day of a calendar month
pub fn month_bounds(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("invalid month {}-{}", year, month)))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::Validation(format!("invalid month {}-{}", year, month)))?;
    let last = next
        .pred_opt()
        .ok_or_else(|| AppError::Validation(format!("invalid month {}-{}", year, month)))?;
    Ok((first, last))
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimesheetEntry {
    pub id: i64,
    pub personnel_record_id: i64,
    pub work_date: NaiveDate,
    pub hours_worked: f64,
    pub day_type: DayType,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Insert-or-replace keyed by `(personnel_record_id, work_date)`
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertTimesheetEntry {
    pub personnel_record_id: i64,
    pub work_date: NaiveDate,
    pub hours_worked: f64,
    pub day_type: DayType,
    pub comment: Option<String>,
}

/// Month selection for one employee or a whole department
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct TimesheetMonthQuery {
    pub year: i32,
    pub month: u32,
    pub personnel_record_id: Option<i64>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Holiday {
    pub id: i64,
    pub holiday_date: NaiveDate,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateHoliday {
    pub holiday_date: NaiveDate,
    pub name: String,
}

/// Request to change a recorded (or missing) timesheet day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimesheetCorrection {
    pub id: i64,
    pub personnel_record_id: i64,
    pub work_date: NaiveDate,
    pub requested_hours: f64,
    pub requested_day_type: DayType,
    pub reason: String,
    pub status: CorrectionStatus,
    pub requested_by: i64,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTimesheetCorrection {
    pub personnel_record_id: i64,
    pub work_date: NaiveDate,
    pub requested_hours: f64,
    pub requested_day_type: DayType,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CorrectionQuery {
    pub personnel_record_id: Option<i64>,
    pub status: Option<CorrectionStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2024, 2).unwrap(), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_bounds(2023, 2).unwrap(), (date(2023, 2, 1), date(2023, 2, 28)));
        assert_eq!(month_bounds(2024, 12).unwrap(), (date(2024, 12, 1), date(2024, 12, 31)));
    }

    #[test]
    fn test_month_bounds_rejects_bad_month() {
        assert!(matches!(month_bounds(2024, 0), Err(AppError::Validation(_))));
        assert!(matches!(month_bounds(2024, 13), Err(AppError::Validation(_))));
    }
}
