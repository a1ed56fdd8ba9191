//! Documents repository shared by instructions, reports and legal documents.
//!
//! The three families use the same layout: a main table plus `<kind>_types`,
//! `<kind>_file_links`, `<kind>_document_links` and `<kind>_status_history`.

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::{apply_update, delete_by_id},
    files::{FileLinks, INSTRUCTION_FILES, LEGAL_DOCUMENT_FILES, REPORT_FILES},
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
    status_history::{StatusHistory, INSTRUCTION_HISTORY, LEGAL_DOCUMENT_HISTORY, REPORT_HISTORY},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::document::{
        ChangeDocumentStatus, CreateDocument, CreateDocumentType, DocumentDetails, DocumentKind, DocumentQuery,
        DocumentStatus, DocumentType, LinkedDocument, StatusHistoryEntry, UpdateDocument,
    },
};

/// Table names of one document family
#[derive(Debug, Clone, Copy)]
struct DocumentTables {
    main: &'static str,
    types: &'static str,
    links: &'static str,
    files: FileLinks,
    history: StatusHistory,
    label: &'static str,
}

impl DocumentKind {
    fn tables(self) -> DocumentTables {
        match self {
            DocumentKind::Instruction => DocumentTables {
                main: "instructions",
                types: "instruction_types",
                links: "instruction_document_links",
                files: INSTRUCTION_FILES,
                history: INSTRUCTION_HISTORY,
                label: "Instruction",
            },
            DocumentKind::Report => DocumentTables {
                main: "reports",
                types: "report_types",
                links: "report_document_links",
                files: REPORT_FILES,
                history: REPORT_HISTORY,
                label: "Report",
            },
            DocumentKind::LegalDocument => DocumentTables {
                main: "legal_documents",
                types: "legal_document_types",
                links: "legal_document_document_links",
                files: LEGAL_DOCUMENT_FILES,
                history: LEGAL_DOCUMENT_HISTORY,
                label: "Legal document",
            },
        }
    }
}

#[derive(Clone)]
pub struct DocumentsRepository {
    pool: Pool<Postgres>,
    kind: DocumentKind,
    tables: DocumentTables,
}

impl DocumentsRepository {
    pub fn new(pool: Pool<Postgres>, kind: DocumentKind) -> Self {
        Self {
            pool,
            kind,
            tables: kind.tables(),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn select(&self) -> String {
        format!(
            r#"
            SELECT doc.id, doc.name, doc.number, doc.document_date, doc.description,
                   doc.created_by, doc.created_at, doc.updated_at,
                   t.id AS type_id, t.name AS type_name,
                   s.id AS status_id, s.name AS status_name,
                   o.id AS organization_id, o.name AS organization_name,
                   c.id AS responsible_id, c.fio AS responsible_fio
            FROM {main} doc
            LEFT JOIN {types} t ON t.id = doc.type_id
            LEFT JOIN document_status s ON s.id = doc.status_id
            LEFT JOIN organizations o ON o.id = doc.organization_id
            LEFT JOIN contacts c ON c.id = doc.responsible_contact_id
            "#,
            main = self.tables.main,
            types = self.tables.types,
        )
    }

    fn scan(&self, row: &PgRow) -> Result<DocumentDetails, sqlx::Error> {
        Ok(DocumentDetails {
            id: row.try_get("id")?,
            kind: self.kind,
            name: row.try_get("name")?,
            number: row.try_get("number")?,
            document_date: row.try_get("document_date")?,
            document_type: named_ref(row, "type_id", "type_name")?,
            status: named_ref(row, "status_id", "status_name")?,
            organization: named_ref(row, "organization_id", "organization_name")?,
            responsible: contact_ref(row, "responsible_id", "responsible_fio")?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            files: Vec::new(),
            linked_documents: Vec::new(),
        })
    }

    fn not_found(&self, id: i64) -> AppError {
        AppError::NotFound(format!("{} {} not found", self.tables.label, id))
    }

    /// Create a document with its files, links and the initial history entry
    #[tracing::instrument(skip(self, data), fields(kind = ?self.kind))]
    pub async fn create(&self, data: &CreateDocument, created_by: i64) -> AppResult<i64> {
        let mut tx = self.pool.begin().await.op("begin create document")?;

        let sql = format!(
            r#"
            INSERT INTO {} (name, number, document_date, type_id, status_id,
                            organization_id, responsible_contact_id, description, created_by)
            VALUES ($1, $2, $3, $4,
                    COALESCE($5, (SELECT id FROM document_status WHERE code = 'new')),
                    $6, $7, $8, $9)
            RETURNING id, status_id
            "#,
            self.tables.main
        );
        let (id, status_id): (i64, i64) = sqlx::query_as(&sql)
            .bind(&data.name)
            .bind(&data.number)
            .bind(data.document_date)
            .bind(data.type_id)
            .bind(data.status_id)
            .bind(data.organization_id)
            .bind(data.responsible_contact_id)
            .bind(&data.description)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await
            .op("create document")?;

        self.tables.files.link(&mut *tx, id, &data.file_ids).await?;
        self.insert_links(&mut *tx, id, &data.linked_document_ids).await?;
        self.tables
            .history
            .append(&mut *tx, id, None, status_id, created_by, None)
            .await?;

        tx.commit().await.op("commit create document")?;

        tracing::debug!(document_id = id, status_id, "Document created");
        Ok(id)
    }

    /// Get a document with type, status, files and linked documents
    pub async fn get_by_id(&self, id: i64) -> AppResult<DocumentDetails> {
        let query = format!("{} WHERE doc.id = $1", self.select());
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get document")?
            .ok_or_else(|| self.not_found(id))?;

        let mut document = self.scan(&row).op("scan document")?;
        document.files = self.tables.files.load(&self.pool, id).await?;
        document.linked_documents = self.linked_documents(id).await?;
        Ok(document)
    }

    /// List documents, newest document date first; files are attached, links are not
    pub async fn list(&self, query: &DocumentQuery) -> AppResult<Vec<DocumentDetails>> {
        let mut filter = FilterBuilder::new(self.select());
        filter
            .eq("doc.type_id", query.type_id)
            .eq("doc.status_id", query.status_id)
            .eq("doc.organization_id", query.organization_id)
            .gte("doc.document_date", query.date_from)
            .lte("doc.document_date", query.date_to)
            .search(&["doc.name", "doc.number"], query.search.as_deref())
            .order_by("doc.document_date DESC NULLS LAST, doc.id DESC")
            .paginate(query.page, query.per_page);

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list documents")?;
        let mut documents = scan_all(&rows, |row| self.scan(row)).op("scan document")?;

        let ids: Vec<i64> = documents.iter().map(|d| d.id).collect();
        let mut files = self.tables.files.load_many(&self.pool, &ids).await?;
        for document in &mut documents {
            document.files = files.remove(&document.id).unwrap_or_default();
        }
        Ok(documents)
    }

    /// Update present fields; `file_ids` replaces the attachments
    pub async fn update(&self, id: i64, data: &UpdateDocument) -> AppResult<()> {
        let mut update = UpdateBuilder::new(self.tables.main);
        update
            .set("name", data.name.as_deref())
            .set("number", data.number.as_deref())
            .set("document_date", data.document_date)
            .set("type_id", data.type_id)
            .set("organization_id", data.organization_id)
            .set("responsible_contact_id", data.responsible_contact_id)
            .set("description", data.description.as_deref())
            .touch("updated_at");

        let file_ids = match &data.file_ids {
            Some(file_ids) => file_ids,
            None => return apply_update(&self.pool, update, self.tables.label, "update document", id).await,
        };

        let mut tx = self.pool.begin().await.op("begin update document")?;
        let mut query = update.where_key("id", id);
        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .op("update document")?;
        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }
        self.tables.files.replace(&mut *tx, id, file_ids).await?;
        tx.commit().await.op("commit update document")?;
        Ok(())
    }

    /// Delete a document; links and history go with it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, self.tables.main, self.tables.label, "delete document", id).await
    }

    /// Move a document to another status and record the transition
    #[tracing::instrument(skip(self, data), fields(kind = ?self.kind, to = data.status_id))]
    pub async fn change_status(&self, id: i64, data: &ChangeDocumentStatus, changed_by: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await.op("begin change document status")?;

        let lock = format!("SELECT status_id FROM {} WHERE id = $1 FOR UPDATE", self.tables.main);
        let from_status_id: Option<i64> = sqlx::query_scalar(&lock)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .op("lock document")?
            .ok_or_else(|| self.not_found(id))?;

        let sql = format!(
            "UPDATE {} SET status_id = $1, updated_at = NOW() WHERE id = $2",
            self.tables.main
        );
        sqlx::query(&sql)
            .bind(data.status_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .op("change document status")?;

        self.tables
            .history
            .append(&mut *tx, id, from_status_id, data.status_id, changed_by, data.comment.as_deref())
            .await?;

        tx.commit().await.op("commit change document status")?;

        tracing::info!(document_id = id, ?from_status_id, to_status_id = data.status_id, "Document status changed");
        Ok(())
    }

    pub async fn history(&self, id: i64) -> AppResult<Vec<StatusHistoryEntry>> {
        self.tables.history.list(&self.pool, id).await
    }

    /// Replace the comment of the most recent transition
    pub async fn update_latest_history_comment(&self, id: i64, comment: Option<&str>) -> AppResult<()> {
        self.tables.history.update_latest_comment(&self.pool, id, comment).await
    }

    // Document links

    async fn insert_links(
        &self,
        conn: &mut sqlx::PgConnection,
        id: i64,
        linked_ids: &[i64],
    ) -> AppResult<()> {
        if linked_ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "INSERT INTO {} (document_id, linked_document_id) \
             SELECT $1, UNNEST($2::bigint[]) ON CONFLICT DO NOTHING",
            self.tables.links
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(linked_ids)
            .execute(conn)
            .await
            .op("link documents")?;
        Ok(())
    }

    /// Link documents of the same family to `id`
    pub async fn link_documents(&self, id: i64, linked_ids: &[i64]) -> AppResult<()> {
        if linked_ids.contains(&id) {
            return Err(AppError::Validation(format!(
                "{} {} cannot be linked to itself",
                self.tables.label, id
            )));
        }
        let mut conn = self.pool.acquire().await.op("acquire connection")?;
        self.insert_links(&mut conn, id, linked_ids).await
    }

    pub async fn unlink_document(&self, id: i64, linked_id: i64) -> AppResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE document_id = $1 AND linked_document_id = $2",
            self.tables.links
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(linked_id)
            .execute(&self.pool)
            .await
            .op("unlink document")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} {} is not linked to {}",
                self.tables.label, linked_id, id
            )));
        }
        Ok(())
    }

    pub async fn linked_documents(&self, id: i64) -> AppResult<Vec<LinkedDocument>> {
        let sql = format!(
            r#"
            SELECT d.id, d.name, d.number, d.document_date
            FROM {links} l
            JOIN {main} d ON d.id = l.linked_document_id
            WHERE l.document_id = $1
            ORDER BY d.document_date DESC NULLS LAST, d.id DESC
            "#,
            links = self.tables.links,
            main = self.tables.main,
        );
        sqlx::query_as::<_, LinkedDocument>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .op("list linked documents")
    }

    // Dictionaries

    pub async fn list_types(&self) -> AppResult<Vec<DocumentType>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name", self.tables.types);
        sqlx::query_as::<_, DocumentType>(&sql)
            .fetch_all(&self.pool)
            .await
            .op("list document types")
    }

    pub async fn create_type(&self, data: &CreateDocumentType) -> AppResult<DocumentType> {
        let sql = format!("INSERT INTO {} (name) VALUES ($1) RETURNING id, name", self.tables.types);
        sqlx::query_as::<_, DocumentType>(&sql)
            .bind(&data.name)
            .fetch_one(&self.pool)
            .await
            .op("create document type")
    }

    /// The `document_status` dictionary shared by every family
    pub async fn list_statuses(&self) -> AppResult<Vec<DocumentStatus>> {
        sqlx::query_as::<_, DocumentStatus>("SELECT id, code, name FROM document_status ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .op("list document statuses")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_distinct_tables() {
        let kinds = [DocumentKind::Instruction, DocumentKind::Report, DocumentKind::LegalDocument];
        let mains: Vec<&str> = kinds.iter().map(|k| k.tables().main).collect();
        assert_eq!(mains, vec!["instructions", "reports", "legal_documents"]);

        let links = DocumentKind::LegalDocument.tables().links;
        assert_eq!(links, "legal_document_document_links");
    }
}
