//! Incident model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, FileInfo, NamedRef};

/// Incident with organization, reporter and files resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentDetails {
    pub id: i64,
    pub organization: Option<NamedRef>,
    pub incident_time: DateTime<Utc>,
    pub description: String,
    pub consequences: Option<String>,
    pub measures_taken: Option<String>,
    pub reported_by: Option<ContactRef>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIncident {
    pub organization_id: i64,
    pub incident_time: DateTime<Utc>,
    pub description: String,
    pub consequences: Option<String>,
    pub measures_taken: Option<String>,
    pub reported_by_contact_id: Option<i64>,
    #[serde(default)]
    pub file_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateIncident {
    pub organization_id: Option<i64>,
    pub incident_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub consequences: Option<String>,
    pub measures_taken: Option<String>,
    pub reported_by_contact_id: Option<i64>,
    /// Replaces the attached files when present
    pub file_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct IncidentQuery {
    pub organization_id: Option<i64>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}
