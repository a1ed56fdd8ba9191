//! Official visit model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, FileInfo, NamedRef};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitDetails {
    pub id: i64,
    pub organization: Option<NamedRef>,
    pub visit_date: NaiveDate,
    pub visitor: String,
    pub purpose: Option<String>,
    pub responsible: Option<ContactRef>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVisit {
    pub organization_id: i64,
    pub visit_date: NaiveDate,
    pub visitor: String,
    pub purpose: Option<String>,
    pub responsible_contact_id: Option<i64>,
    #[serde(default)]
    pub file_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateVisit {
    pub organization_id: Option<i64>,
    pub visit_date: Option<NaiveDate>,
    pub visitor: Option<String>,
    pub purpose: Option<String>,
    pub responsible_contact_id: Option<i64>,
    pub file_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct VisitQuery {
    pub organization_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}
