//! Reservoir curve and batch write tests

mod common;

use chrono::NaiveDate;
use hydro_admin::{
    models::reservoir::{
        CreateDeviceSummary, CreateIndicatorHeight, CreateReservoir, PatchDeviceSummary, ReservoirDataQuery,
        UpsertReservoirData,
    },
    AppError, Repository,
};

async fn reservoir(repo: &Repository) -> i64 {
    let organization_id = common::organization(repo).await;
    repo.reservoirs
        .create(&CreateReservoir {
            name: common::unique("Reservoir"),
            organization_id,
            normal_level_m: Some(120.0),
            dead_level_m: Some(95.0),
            full_volume_mln_m3: Some(850.0),
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_volume_at_level_uses_nearest_lower_point() {
    let repo = common::setup().await;
    let id = reservoir(&repo).await;

    for (level_m, volume_mln_m3) in [(100.0, 200.0), (110.0, 450.0), (120.0, 850.0)] {
        repo.reservoirs
            .add_indicator_height(id, &CreateIndicatorHeight { level_m, volume_mln_m3 })
            .await
            .unwrap();
    }

    assert_eq!(repo.reservoirs.volume_at_level(id, 110.0).await.unwrap(), 450.0);
    assert_eq!(repo.reservoirs.volume_at_level(id, 115.5).await.unwrap(), 450.0);
    assert!(matches!(
        repo.reservoirs.volume_at_level(id, 90.0).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_data_upsert_replaces_same_day() {
    let repo = common::setup().await;
    let id = reservoir(&repo).await;
    let day = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let row = |level_m| UpsertReservoirData {
        reservoir_id: id,
        data_date: day,
        level_m: Some(level_m),
        volume_mln_m3: None,
        inflow_m3_s: Some(310.0),
        outflow_m3_s: Some(290.0),
    };

    assert_eq!(repo.reservoirs.upsert_data(&[row(112.4)]).await.unwrap(), 1);
    repo.reservoirs.upsert_data(&[row(112.9)]).await.unwrap();

    let data = repo
        .reservoirs
        .list_data(&ReservoirDataQuery {
            reservoir_id: Some(id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].level_m, Some(112.9));
}

#[tokio::test]
#[ignore]
async fn test_device_summary_batch_rolls_back_on_missing_row() {
    let repo = common::setup().await;
    let id = reservoir(&repo).await;
    let summary = repo
        .reservoirs
        .create_device_summary(&CreateDeviceSummary {
            reservoir_id: id,
            device_type: "piezometer".to_string(),
            total_count: 40,
            working_count: 38,
            faulty_count: 2,
        })
        .await
        .unwrap();

    let result = repo
        .reservoirs
        .patch_device_summary(&[
            PatchDeviceSummary {
                id: summary.id,
                working_count: Some(35),
                faulty_count: Some(5),
                ..Default::default()
            },
            PatchDeviceSummary {
                id: i64::MAX,
                working_count: Some(1),
                ..Default::default()
            },
        ])
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let stored = repo.reservoirs.list_device_summary(Some(id)).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].working_count, 38);
    assert_eq!(stored[0].faulty_count, 2);
}
