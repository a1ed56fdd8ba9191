//! Reception (citizen/visitor appointment) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, NamedRef};
use super::enums::ReceptionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reception {
    pub id: i64,
    pub visitor_name: String,
    pub topic: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub status: ReceptionStatus,
    /// Person holding the reception
    pub host: Option<ContactRef>,
    pub organization: Option<NamedRef>,
    pub notes: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReception {
    pub visitor_name: String,
    pub topic: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    /// Defaults to `scheduled`
    pub status: Option<ReceptionStatus>,
    pub host_contact_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateReception {
    pub visitor_name: Option<String>,
    pub topic: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<ReceptionStatus>,
    pub host_contact_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReceptionQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub status: Option<ReceptionStatus>,
    pub host_contact_id: Option<i64>,
}
