//! Investment projects and active construction projects

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, FileInfo, NamedRef};

/// Dictionary entry of `investment_types` or `investment_statuses`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InvestmentDictionaryEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvestmentDetails {
    pub id: i64,
    pub name: String,
    pub investment_type: Option<NamedRef>,
    pub status: Option<NamedRef>,
    pub organization: Option<NamedRef>,
    /// Planned amount in the accounting currency
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvestment {
    pub name: String,
    pub type_id: i64,
    pub status_id: i64,
    pub organization_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateInvestment {
    pub name: Option<String>,
    pub type_id: Option<i64>,
    pub status_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub file_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct InvestmentQuery {
    pub type_id: Option<i64>,
    pub status_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Project currently under construction or commissioning
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActiveProject {
    pub id: i64,
    pub name: String,
    pub organization: Option<NamedRef>,
    pub investment: Option<NamedRef>,
    pub responsible: Option<ContactRef>,
    pub budget: Option<Decimal>,
    pub progress_percent: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateActiveProject {
    pub name: String,
    pub organization_id: Option<i64>,
    pub investment_id: Option<i64>,
    pub responsible_contact_id: Option<i64>,
    pub budget: Option<Decimal>,
    pub progress_percent: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateActiveProject {
    pub name: Option<String>,
    pub organization_id: Option<i64>,
    pub investment_id: Option<i64>,
    pub responsible_contact_id: Option<i64>,
    pub budget: Option<Decimal>,
    pub progress_percent: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub description: Option<String>,
}
