//! Shared nested references and file metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Id + display name of a related record (organization, department, type, status...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

/// Contact reference embedded in other records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactRef {
    pub id: i64,
    pub fio: String,
}

/// Stored file metadata (content lives in object storage)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FileInfo {
    pub id: i64,
    pub file_name: String,
    /// Key of the object in the external store
    pub object_key: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Register file metadata after the upload to object storage
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFile {
    pub file_name: String,
    pub object_key: String,
    pub mime_type: String,
    pub size_bytes: i64,
}
