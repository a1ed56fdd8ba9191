//! Shutdown (generation downtime) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, FileInfo, NamedRef};
use super::idle_discharge::IdleDischargeSummary;

/// Shutdown row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shutdown {
    pub id: i64,
    pub organization_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub generation_loss_mwh: Option<f64>,
    pub reported_by_contact_id: Option<i64>,
    pub idle_discharge_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shutdown with organization, reporter, idle discharge and files resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShutdownDetails {
    pub id: i64,
    pub organization: Option<NamedRef>,
    pub start_time: DateTime<Utc>,
    /// Absent while the downtime is ongoing
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub generation_loss_mwh: Option<f64>,
    pub reported_by: Option<ContactRef>,
    pub idle_discharge: Option<IdleDischargeSummary>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<FileInfo>,
}

/// Create shutdown request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShutdown {
    pub organization_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub generation_loss_mwh: Option<f64>,
    pub reported_by_contact_id: Option<i64>,
    /// Idle discharge volume in thousand m³; creates the linked discharge
    pub idle_discharge_volume: Option<f64>,
    #[serde(default)]
    pub file_ids: Vec<i64>,
}

/// Update shutdown request.
///
/// `end_time` and `generation_loss_mwh` are always written (absent clears
/// them). Omitting `idle_discharge_volume` removes a linked discharge.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateShutdown {
    pub organization_id: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub generation_loss_mwh: Option<f64>,
    pub reported_by_contact_id: Option<i64>,
    pub idle_discharge_volume: Option<f64>,
    /// Replaces the attached files when present
    pub file_ids: Option<Vec<i64>>,
}

/// Query parameters for shutdowns
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ShutdownQuery {
    pub organization_id: Option<i64>,
    pub start_from: Option<DateTime<Utc>>,
    pub start_to: Option<DateTime<Utc>>,
    /// Only shutdowns without an end time
    #[serde(default)]
    pub ongoing_only: bool,
}
