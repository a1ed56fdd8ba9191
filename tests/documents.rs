//! Document status history and linking tests

mod common;

use hydro_admin::{
    models::{
        document::{ChangeDocumentStatus, CreateDocument, CreateDocumentType},
        DocumentKind,
    },
    AppError, Repository,
};

async fn create_document(repo: &Repository, kind: DocumentKind, name: &str) -> i64 {
    let documents = repo.documents(kind);
    let document_type = documents
        .create_type(&CreateDocumentType { name: common::unique("Order") })
        .await
        .unwrap();
    documents
        .create(
            &CreateDocument {
                name: name.to_string(),
                number: Some("12-p".to_string()),
                document_date: None,
                type_id: document_type.id,
                status_id: None,
                organization_id: None,
                responsible_contact_id: None,
                description: None,
                file_ids: vec![],
                linked_document_ids: vec![],
            },
            1,
        )
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_status_change_appends_history() {
    let repo = common::setup().await;
    let id = create_document(&repo, DocumentKind::Instruction, "Dam safety instruction").await;
    let documents = repo.documents(DocumentKind::Instruction);

    let statuses = documents.list_statuses().await.unwrap();
    let new = statuses.iter().find(|s| s.code == "new").unwrap();
    let approved = statuses.iter().find(|s| s.code == "approved").unwrap();

    let document = documents.get_by_id(id).await.unwrap();
    assert_eq!(document.status.as_ref().map(|s| s.id), Some(new.id));

    documents
        .change_status(
            id,
            &ChangeDocumentStatus {
                status_id: approved.id,
                comment: Some("Signed by the chief engineer".to_string()),
            },
            2,
        )
        .await
        .unwrap();

    let history = documents.history(id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].from_status.as_ref().map(|s| s.id), Some(new.id));
    assert_eq!(history[0].to_status.as_ref().map(|s| s.id), Some(approved.id));
    assert!(history[1].from_status.is_none());

    documents
        .update_latest_history_comment(id, Some("Signed and registered"))
        .await
        .unwrap();
    let history = documents.history(id).await.unwrap();
    assert_eq!(history[0].comment.as_deref(), Some("Signed and registered"));
}

#[tokio::test]
#[ignore]
async fn test_status_change_on_missing_document_is_not_found() {
    let repo = common::setup().await;
    let documents = repo.documents(DocumentKind::Report);
    let statuses = documents.list_statuses().await.unwrap();

    let result = documents
        .change_status(
            i64::MAX,
            &ChangeDocumentStatus {
                status_id: statuses[0].id,
                comment: None,
            },
            1,
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_link_and_unlink_documents() {
    let repo = common::setup().await;
    let first = create_document(&repo, DocumentKind::LegalDocument, "Water use permit").await;
    let second = create_document(&repo, DocumentKind::LegalDocument, "Permit amendment").await;
    let documents = repo.documents(DocumentKind::LegalDocument);

    assert!(matches!(
        documents.link_documents(first, &[first]).await,
        Err(AppError::Validation(_))
    ));

    documents.link_documents(first, &[second]).await.unwrap();
    // Linking twice is a no-op
    documents.link_documents(first, &[second]).await.unwrap();

    let linked = documents.get_by_id(first).await.unwrap().linked_documents;
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].id, second);

    documents.unlink_document(first, second).await.unwrap();
    assert!(matches!(
        documents.unlink_document(first, second).await,
        Err(AppError::NotFound(_))
    ));
}
