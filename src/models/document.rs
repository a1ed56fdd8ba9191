//! Instructions, reports and legal documents

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::common::{ContactRef, FileInfo, NamedRef};

/// The three document families sharing one table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Instruction,
    Report,
    LegalDocument,
}

/// Entry of the `document_status` dictionary
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DocumentStatus {
    pub id: i64,
    /// Machine code (new, in_progress, approved, archived, ...)
    pub code: String,
    pub name: String,
}

/// Document type dictionary entry (`<kind>_types`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DocumentType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocumentType {
    pub name: String,
}

/// Short view of a document linked to another one
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LinkedDocument {
    pub id: i64,
    pub name: String,
    pub number: Option<String>,
    pub document_date: Option<NaiveDate>,
}

/// Document with resolved references, files and links
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentDetails {
    pub id: i64,
    pub kind: DocumentKind,
    pub name: String,
    pub number: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub document_type: Option<NamedRef>,
    pub status: Option<NamedRef>,
    pub organization: Option<NamedRef>,
    pub responsible: Option<ContactRef>,
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<FileInfo>,
    pub linked_documents: Vec<LinkedDocument>,
}

/// Create document request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocument {
    pub name: String,
    pub number: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub type_id: i64,
    /// Initial status; the `new` status is used when absent
    pub status_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub responsible_contact_id: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<i64>,
    #[serde(default)]
    pub linked_document_ids: Vec<i64>,
}

/// Update document request (status changes go through `change_status`)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDocument {
    pub name: Option<String>,
    pub number: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub type_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub responsible_contact_id: Option<i64>,
    pub description: Option<String>,
    /// Replaces the attached files when present
    pub file_ids: Option<Vec<i64>>,
}

/// Query parameters for documents
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DocumentQuery {
    pub type_id: Option<i64>,
    pub status_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Substring of name or number
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Status transition request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeDocumentStatus {
    pub status_id: i64,
    pub comment: Option<String>,
}

/// One row of `<kind>_status_history`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub from_status: Option<NamedRef>,
    pub to_status: Option<NamedRef>,
    pub changed_by: i64,
    pub changed_at: DateTime<Utc>,
    pub comment: Option<String>,
}
