//! Contacts and the fast-call list

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, NamedRef};

/// Contact with organization, department and position resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactDetails {
    pub id: i64,
    pub fio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub organization: Option<NamedRef>,
    pub department: Option<NamedRef>,
    pub position: Option<NamedRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContact {
    pub fio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub organization_id: Option<i64>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateContact {
    pub fio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub organization_id: Option<i64>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
}

/// Query parameters for contacts
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ContactQuery {
    /// Matches name, email or phone numbers
    pub search: Option<String>,
    pub organization_id: Option<i64>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Pinned contact on the fast-call list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FastCall {
    pub id: i64,
    pub position: i32,
    pub contact: Option<ContactRef>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub department: Option<NamedRef>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFastCall {
    pub contact_id: i64,
    pub position: i32,
}
