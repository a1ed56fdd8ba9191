//! Reservoir monitoring: reservoirs, level/volume curve, daily data,
//! snow-cover observations and gauging-device summaries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::common::NamedRef;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reservoir {
    pub id: i64,
    pub name: String,
    pub organization: Option<NamedRef>,
    /// Normal retaining level (m)
    pub normal_level_m: Option<f64>,
    /// Dead storage level (m)
    pub dead_level_m: Option<f64>,
    pub full_volume_mln_m3: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservoir {
    pub name: String,
    pub organization_id: i64,
    pub normal_level_m: Option<f64>,
    pub dead_level_m: Option<f64>,
    pub full_volume_mln_m3: Option<f64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateReservoir {
    pub name: Option<String>,
    pub organization_id: Option<i64>,
    pub normal_level_m: Option<f64>,
    pub dead_level_m: Option<f64>,
    pub full_volume_mln_m3: Option<f64>,
}

/// One point of the level → volume curve
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IndicatorHeight {
    pub id: i64,
    pub reservoir_id: i64,
    pub level_m: f64,
    pub volume_mln_m3: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIndicatorHeight {
    pub level_m: f64,
    pub volume_mln_m3: f64,
}

/// Daily hydrological observation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReservoirData {
    pub id: i64,
    pub reservoir_id: i64,
    pub data_date: NaiveDate,
    pub level_m: Option<f64>,
    pub volume_mln_m3: Option<f64>,
    pub inflow_m3_s: Option<f64>,
    pub outflow_m3_s: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert-or-replace payload keyed by `(reservoir_id, data_date)`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertReservoirData {
    pub reservoir_id: i64,
    pub data_date: NaiveDate,
    pub level_m: Option<f64>,
    pub volume_mln_m3: Option<f64>,
    pub inflow_m3_s: Option<f64>,
    pub outflow_m3_s: Option<f64>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReservoirDataQuery {
    pub reservoir_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Snow-cover observation for a reservoir basin
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Modsnow {
    pub id: i64,
    pub reservoir_id: i64,
    pub date: NaiveDate,
    pub cover_percent: f64,
    pub snow_water_equivalent_mm: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertModsnow {
    pub reservoir_id: i64,
    pub date: NaiveDate,
    pub cover_percent: f64,
    pub snow_water_equivalent_mm: Option<f64>,
}

/// Counts of gauging devices installed on a reservoir
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeviceSummary {
    pub id: i64,
    pub reservoir_id: i64,
    pub device_type: String,
    pub total_count: i32,
    pub working_count: i32,
    pub faulty_count: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDeviceSummary {
    pub reservoir_id: i64,
    pub device_type: String,
    pub total_count: i32,
    pub working_count: i32,
    pub faulty_count: i32,
}

/// One entry of a batch patch; only present counts are changed
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchDeviceSummary {
    pub id: i64,
    pub device_type: Option<String>,
    pub total_count: Option<i32>,
    pub working_count: Option<i32>,
    pub faulty_count: Option<i32>,
}
