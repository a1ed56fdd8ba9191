//! Organizations, departments and positions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::NamedRef;

/// Organization with its parent resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub parent: Option<NamedRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrganization {
    pub name: String,
    pub parent_organization_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub parent_organization_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct OrganizationQuery {
    pub search: Option<String>,
    pub parent_organization_id: Option<i64>,
}

/// Department of an organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub organization: Option<NamedRef>,
    pub parent: Option<NamedRef>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDepartment {
    pub name: String,
    pub organization_id: i64,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub organization_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DepartmentQuery {
    pub organization_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub search: Option<String>,
}

/// Job position
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Position {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePosition {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePosition {
    pub name: Option<String>,
    pub description: Option<String>,
}
