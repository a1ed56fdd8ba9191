//! Personnel records, their documents and transfer history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, FileInfo, NamedRef};
use super::enums::PersonnelStatus;

/// Employment record of one employee
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersonnelRecord {
    pub id: i64,
    pub contact: Option<ContactRef>,
    pub department: Option<NamedRef>,
    pub position: Option<NamedRef>,
    pub personnel_number: String,
    pub hire_date: NaiveDate,
    pub termination_date: Option<NaiveDate>,
    pub status: PersonnelStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePersonnelRecord {
    pub contact_id: i64,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub personnel_number: String,
    pub hire_date: NaiveDate,
    /// Defaults to `active`
    pub status: Option<PersonnelStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePersonnelRecord {
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub personnel_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    pub status: Option<PersonnelStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PersonnelQuery {
    pub department_id: Option<i64>,
    pub status: Option<PersonnelStatus>,
    /// Matches employee name or personnel number
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Scanned document kept in an employee's file
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersonnelDocument {
    pub id: i64,
    pub personnel_record_id: i64,
    pub document_type: String,
    pub title: String,
    pub issued_at: Option<NaiveDate>,
    pub file: Option<FileInfo>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePersonnelDocument {
    pub document_type: String,
    pub title: String,
    pub issued_at: Option<NaiveDate>,
    pub file_id: Option<i64>,
}

/// Move of an employee to another department and/or position
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersonnelTransfer {
    pub id: i64,
    pub personnel_record_id: i64,
    pub from_department: Option<NamedRef>,
    pub to_department: Option<NamedRef>,
    pub from_position: Option<NamedRef>,
    pub to_position: Option<NamedRef>,
    pub transfer_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Transfer request; absent targets keep the current department or position
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePersonnelTransfer {
    pub to_department_id: Option<i64>,
    pub to_position_id: Option<i64>,
    pub transfer_date: NaiveDate,
    pub reason: Option<String>,
}
