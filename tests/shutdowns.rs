//! Shutdown and idle discharge consistency tests

mod common;

use chrono::{Duration, TimeZone, Utc};
use hydro_admin::{
    models::{
        idle_discharge::CreateIdleDischarge,
        shutdown::{CreateShutdown, UpdateShutdown},
    },
    AppError, Repository,
};

fn create_request(organization_id: i64, hours: Option<i64>, volume: Option<f64>) -> CreateShutdown {
    let start_time = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
    CreateShutdown {
        organization_id,
        start_time,
        end_time: hours.map(|h| start_time + Duration::hours(h)),
        reason: Some("Turbine 2 maintenance".to_string()),
        generation_loss_mwh: Some(120.5),
        reported_by_contact_id: None,
        idle_discharge_volume: volume,
        file_ids: vec![],
    }
}

async fn discharge_count(repo: &Repository, organization_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM idle_water_discharges WHERE organization_id = $1")
        .bind(organization_id)
        .fetch_one(&repo.pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_create_with_volume_and_no_end_writes_nothing() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;

    let result = repo
        .shutdowns
        .create(&create_request(organization_id, None, Some(36.0)), 1)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shutdowns WHERE organization_id = $1")
        .bind(organization_id)
        .fetch_one(&repo.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(discharge_count(&repo, organization_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_create_with_volume_links_discharge() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;

    // 36 thousand m³ over one hour is 10 m³/s
    let id = repo
        .shutdowns
        .create(&create_request(organization_id, Some(1), Some(36.0)), 1)
        .await
        .unwrap();

    let shutdown = repo.shutdowns.get_by_id(id).await.unwrap();
    let discharge = shutdown.idle_discharge.expect("discharge should be linked");
    assert!((discharge.flow_rate_m3_s - 10.0).abs() < 1e-9);
    assert!((discharge.total_volume_m3.unwrap() - 36_000.0).abs() < 1e-6);
    assert!(!discharge.is_ongoing);
}

#[tokio::test]
#[ignore]
async fn test_edit_attaches_updates_and_removes_discharge() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;
    let request = create_request(organization_id, Some(2), None);
    let id = repo.shutdowns.create(&request, 1).await.unwrap();
    assert!(repo.shutdowns.get_by_id(id).await.unwrap().idle_discharge.is_none());

    // Positive volume on an unlinked shutdown creates the discharge
    repo.shutdowns
        .update(
            id,
            &UpdateShutdown {
                end_time: request.end_time,
                idle_discharge_volume: Some(72.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let first = repo.shutdowns.get_by_id(id).await.unwrap().idle_discharge.unwrap();
    assert!((first.flow_rate_m3_s - 10.0).abs() < 1e-9);
    assert_eq!(discharge_count(&repo, organization_id).await, 1);

    // New volume while linked updates the same discharge
    repo.shutdowns
        .update(
            id,
            &UpdateShutdown {
                end_time: request.end_time,
                idle_discharge_volume: Some(36.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = repo.shutdowns.get_by_id(id).await.unwrap().idle_discharge.unwrap();
    assert_eq!(second.id, first.id);
    assert!((second.flow_rate_m3_s - 5.0).abs() < 1e-9);
    assert_eq!(discharge_count(&repo, organization_id).await, 1);

    // No volume deletes the discharge and clears the link
    repo.shutdowns
        .update(
            id,
            &UpdateShutdown {
                end_time: request.end_time,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(repo.shutdowns.get_by_id(id).await.unwrap().idle_discharge.is_none());
    assert!(matches!(
        repo.idle_discharges.get_by_id(first.id).await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(discharge_count(&repo, organization_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_edit_clears_omitted_end_and_loss() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;
    let id = repo
        .shutdowns
        .create(&create_request(organization_id, Some(3), None), 1)
        .await
        .unwrap();

    repo.shutdowns
        .update(
            id,
            &UpdateShutdown {
                reason: Some("Inspection".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let shutdown = repo.shutdowns.get_by_id(id).await.unwrap();
    assert_eq!(shutdown.reason.as_deref(), Some("Inspection"));
    assert!(shutdown.end_time.is_none());
    assert!(shutdown.generation_loss_mwh.is_none());
}

#[tokio::test]
#[ignore]
async fn test_edit_with_volume_and_no_end_writes_nothing() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;
    let id = repo
        .shutdowns
        .create(&create_request(organization_id, None, None), 1)
        .await
        .unwrap();

    let result = repo
        .shutdowns
        .update(
            id,
            &UpdateShutdown {
                reason: Some("Spillway test".to_string()),
                generation_loss_mwh: Some(10.0),
                idle_discharge_volume: Some(36.0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let shutdown = repo.shutdowns.get_by_id(id).await.unwrap();
    assert_eq!(shutdown.reason.as_deref(), Some("Turbine 2 maintenance"));
    assert_eq!(shutdown.generation_loss_mwh, Some(120.5));
    assert!(shutdown.idle_discharge.is_none());
    assert_eq!(discharge_count(&repo, organization_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_edit_with_inverted_window_leaves_row_unchanged() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;
    let request = create_request(organization_id, Some(1), Some(36.0));
    let id = repo.shutdowns.create(&request, 1).await.unwrap();
    let before = repo.shutdowns.get_by_id(id).await.unwrap();
    let linked = before.idle_discharge.as_ref().unwrap();

    let end_time = request.end_time.unwrap();
    let result = repo
        .shutdowns
        .update(
            id,
            &UpdateShutdown {
                start_time: Some(end_time + Duration::hours(1)),
                end_time: Some(end_time),
                reason: Some("Wrong window".to_string()),
                idle_discharge_volume: Some(72.0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let after = repo.shutdowns.get_by_id(id).await.unwrap();
    assert_eq!(after.start_time, request.start_time);
    assert_eq!(after.end_time, request.end_time);
    assert_eq!(after.reason.as_deref(), Some("Turbine 2 maintenance"));
    let discharge = after.idle_discharge.unwrap();
    assert_eq!(discharge.id, linked.id);
    assert!((discharge.flow_rate_m3_s - 10.0).abs() < 1e-9);
    assert_eq!(discharge_count(&repo, organization_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_edit_with_zero_volume_and_no_link_creates_nothing() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;
    let request = create_request(organization_id, Some(1), None);
    let id = repo.shutdowns.create(&request, 1).await.unwrap();

    repo.shutdowns
        .update(
            id,
            &UpdateShutdown {
                end_time: request.end_time,
                idle_discharge_volume: Some(0.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(repo.shutdowns.get_by_id(id).await.unwrap().idle_discharge.is_none());
}

#[tokio::test]
#[ignore]
async fn test_delete_removes_linked_discharge() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;
    let id = repo
        .shutdowns
        .create(&create_request(organization_id, Some(1), Some(18.0)), 1)
        .await
        .unwrap();
    let discharge_id = repo.shutdowns.get_by_id(id).await.unwrap().idle_discharge.unwrap().id;

    repo.shutdowns.delete(id).await.unwrap();

    assert!(matches!(repo.shutdowns.get_by_id(id).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        repo.idle_discharges.get_by_id(discharge_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_delete_without_link_keeps_other_discharges() {
    let repo = common::setup().await;
    let organization_id = common::organization(&repo).await;
    let request = create_request(organization_id, Some(1), None);
    let standalone = repo
        .idle_discharges
        .create(
            &CreateIdleDischarge {
                organization_id,
                start_time: request.start_time,
                end_time: request.end_time,
                volume_thousand_m3: 18.0,
                reason: Some("Flood release".to_string()),
            },
            1,
        )
        .await
        .unwrap();
    let id = repo.shutdowns.create(&request, 1).await.unwrap();

    repo.shutdowns.delete(id).await.unwrap();

    assert!(repo.idle_discharges.get_by_id(standalone).await.is_ok());
    assert_eq!(discharge_count(&repo, organization_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_missing_shutdown_is_not_found() {
    let repo = common::setup().await;

    assert!(matches!(repo.shutdowns.get_by_id(i64::MAX).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        repo.shutdowns.update(i64::MAX, &UpdateShutdown::default()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(repo.shutdowns.delete(i64::MAX).await, Err(AppError::NotFound(_))));
}
