//! Idle water discharge model and flow-rate derivation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::NamedRef;
use crate::error::{AppError, AppResult};

/// Flow rate in m³/s of `volume_thousand_m3` released between `start` and `end`.
///
/// Fails when the window has no end or is not strictly positive.
pub fn calculate_flow_rate(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    volume_thousand_m3: f64,
) -> AppResult<f64> {
    let end = end.ok_or_else(|| {
        AppError::Validation("end time is required to compute the idle discharge flow rate".to_string())
    })?;

    let seconds = (end - start).num_milliseconds() as f64 / 1000.0;
    if seconds <= 0.0 {
        return Err(AppError::Validation(format!(
            "idle discharge end time {} must be after start time {}",
            end, start
        )));
    }

    Ok(volume_thousand_m3 * 1000.0 / seconds)
}

/// Idle discharge as exposed by `v_idle_water_discharges_with_volume`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdleDischarge {
    pub id: i64,
    pub organization: Option<NamedRef>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Derived flow rate (m³/s)
    pub flow_rate_m3_s: f64,
    pub reason: Option<String>,
    pub created_by: i64,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    /// No end time yet, or the end is in the future
    pub is_ongoing: bool,
    /// Flow rate × duration; absent while the window is open
    pub total_volume_m3: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Discharge summary embedded in a shutdown
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdleDischargeSummary {
    pub id: i64,
    pub flow_rate_m3_s: f64,
    pub total_volume_m3: Option<f64>,
    pub is_ongoing: bool,
}

/// Create a standalone idle discharge
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIdleDischarge {
    pub organization_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Released volume in thousand m³
    pub volume_thousand_m3: f64,
    pub reason: Option<String>,
}

/// Update a standalone idle discharge.
///
/// The flow rate is recomputed only when a volume is supplied.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateIdleDischarge {
    pub organization_id: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub volume_thousand_m3: Option<f64>,
    pub reason: Option<String>,
}

/// Query parameters for idle discharges
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct IdleDischargeQuery {
    pub organization_id: Option<i64>,
    pub start_from: Option<DateTime<Utc>>,
    pub start_to: Option<DateTime<Utc>>,
    pub ongoing: Option<bool>,
    pub approved: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_flow_rate_two_hours() {
        let rate = calculate_flow_rate(at(10, 0), Some(at(12, 0)), 10.0).unwrap();
        assert!((rate - 10_000.0 / 7_200.0).abs() < 1e-12);
        assert!((rate - 1.388889).abs() < 1e-6);
    }

    #[test]
    fn test_flow_rate_one_hour_is_exact() {
        let rate = calculate_flow_rate(at(10, 0), Some(at(11, 0)), 3.6).unwrap();
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn test_flow_rate_zero_volume() {
        let rate = calculate_flow_rate(at(10, 0), Some(at(10, 30)), 0.0).unwrap();
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn test_flow_rate_sub_second_precision() {
        let start = at(10, 0);
        let end = start + chrono::Duration::milliseconds(1_500);
        let rate = calculate_flow_rate(start, Some(end), 0.003).unwrap();
        assert!((rate - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_flow_rate_requires_end() {
        let err = calculate_flow_rate(at(10, 0), None, 5.0).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_flow_rate_rejects_empty_or_inverted_window() {
        for end in [at(10, 0), at(9, 59)] {
            let err = calculate_flow_rate(at(10, 0), Some(end), 5.0).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }
}
