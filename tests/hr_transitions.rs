//! HR workflow state machine tests

mod common;

use std::time::Duration;

use chrono::NaiveDate;
use hydro_admin::{
    models::{
        enums::{CorrectionStatus, DayType, SalaryStatus, VacationType},
        salary::{CreateSalary, CreateSalaryAdjustment},
        timesheet::{CreateTimesheetCorrection, TimesheetMonthQuery},
        vacation::CreateVacation,
    },
    AppError, Repository,
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
#[ignore]
async fn test_salary_lifecycle() {
    let repo = common::setup().await;
    let (_, record_id) = common::employee(&repo).await;

    let id = repo
        .salaries
        .create(
            &CreateSalary {
                personnel_record_id: record_id,
                period_year: 2024,
                period_month: 6,
                base_amount: dec!(1000.00),
            },
            1,
        )
        .await
        .unwrap();

    let adjustment = |amount| CreateSalaryAdjustment { amount, reason: None };
    repo.salaries.add_bonus(id, &adjustment(dec!(250.00))).await.unwrap();
    repo.salaries.add_deduction(id, &adjustment(dec!(100.00))).await.unwrap();

    // Only a calculated salary can be approved
    assert!(matches!(repo.salaries.approve(id, 2).await, Err(AppError::NotFound(_))));

    let net = repo.salaries.calculate(id).await.unwrap();
    assert_eq!(net, dec!(1150.00));

    // Adjustments are frozen outside draft
    assert!(matches!(
        repo.salaries.add_bonus(id, &adjustment(dec!(1.00))).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(repo.salaries.mark_paid(id).await, Err(AppError::NotFound(_))));

    repo.salaries.approve(id, 2).await.unwrap();
    repo.salaries.mark_paid(id).await.unwrap();

    let salary = repo.salaries.get_by_id(id).await.unwrap();
    assert_eq!(salary.status, SalaryStatus::Paid);
    assert_eq!(salary.net_amount, Some(dec!(1150.00)));
    assert!(salary.paid_at.is_some());

    // A paid salary cannot go back to draft or be deleted
    assert!(matches!(repo.salaries.return_to_draft(id).await, Err(AppError::NotFound(_))));
    assert!(matches!(repo.salaries.delete(id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_salary_period_is_unique() {
    let repo = common::setup().await;
    let (_, record_id) = common::employee(&repo).await;
    let request = CreateSalary {
        personnel_record_id: record_id,
        period_year: 2024,
        period_month: 7,
        base_amount: dec!(500),
    };

    repo.salaries.create(&request, 1).await.unwrap();
    assert!(matches!(repo.salaries.create(&request, 1).await, Err(AppError::Duplicate(_))));
}

async fn draft_salary(repo: &Repository, period_month: i32) -> i64 {
    let (_, record_id) = common::employee(repo).await;
    repo.salaries
        .create(
            &CreateSalary {
                personnel_record_id: record_id,
                period_year: 2024,
                period_month,
                base_amount: dec!(1000.00),
            },
            1,
        )
        .await
        .unwrap()
}

fn bonus(amount: rust_decimal::Decimal) -> CreateSalaryAdjustment {
    CreateSalaryAdjustment { amount, reason: None }
}

#[tokio::test]
#[ignore]
async fn test_bonus_blocked_by_uncommitted_calculation() {
    let repo = common::setup().await;
    let id = draft_salary(&repo, 9).await;

    let mut tx = repo.pool.begin().await.unwrap();
    sqlx::query("UPDATE salaries SET status = 'calculated', net_amount = base_amount WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .unwrap();

    let adding = {
        let repo = repo.clone();
        tokio::spawn(async move { repo.salaries.add_bonus(id, &bonus(dec!(500.00))).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.commit().await.unwrap();

    assert!(matches!(adding.await.unwrap(), Err(AppError::NotFound(_))));
    assert!(repo.salaries.list_bonuses(id).await.unwrap().is_empty());
    let salary = repo.salaries.get_by_id(id).await.unwrap();
    assert_eq!(salary.net_amount, Some(dec!(1000.00)));
}

#[tokio::test]
#[ignore]
async fn test_bonus_delete_blocked_by_uncommitted_calculation() {
    let repo = common::setup().await;
    let id = draft_salary(&repo, 10).await;
    let added = repo.salaries.add_bonus(id, &bonus(dec!(200.00))).await.unwrap();

    let mut tx = repo.pool.begin().await.unwrap();
    sqlx::query("UPDATE salaries SET status = 'calculated', net_amount = base_amount + 200 WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .unwrap();

    let deleting = {
        let repo = repo.clone();
        tokio::spawn(async move { repo.salaries.delete_bonus(added.id).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.commit().await.unwrap();

    assert!(matches!(deleting.await.unwrap(), Err(AppError::NotFound(_))));
    assert_eq!(repo.salaries.list_bonuses(id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_calculation_includes_bonus_committed_while_waiting() {
    let repo = common::setup().await;
    let id = draft_salary(&repo, 11).await;

    // Concurrent adjustment: holds the salary share lock until commit
    let mut tx = repo.pool.begin().await.unwrap();
    sqlx::query("SELECT 1 FROM salaries WHERE id = $1 FOR SHARE")
        .bind(id)
        .execute(&mut *tx)
        .await
        .unwrap();
    sqlx::query("INSERT INTO salary_bonuses (salary_id, amount) VALUES ($1, 500.00)")
        .bind(id)
        .execute(&mut *tx)
        .await
        .unwrap();

    let calculating = {
        let repo = repo.clone();
        tokio::spawn(async move { repo.salaries.calculate(id).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.commit().await.unwrap();

    assert_eq!(calculating.await.unwrap().unwrap(), dec!(1500.00));
    let salary = repo.salaries.get_by_id(id).await.unwrap();
    assert_eq!(salary.bonuses_total, dec!(500.00));
    assert_eq!(salary.status, SalaryStatus::Calculated);
}

#[tokio::test]
#[ignore]
async fn test_annual_vacation_approval_books_balance() {
    let repo = common::setup().await;
    let (_, record_id) = common::employee(&repo).await;

    let id = repo
        .vacations
        .create(
            &CreateVacation {
                personnel_record_id: record_id,
                vacation_type: VacationType::Annual,
                start_date: date(2024, 7, 1),
                end_date: date(2024, 7, 14),
                comment: None,
            },
            1,
        )
        .await
        .unwrap();

    // Drafts must be submitted first
    assert!(matches!(repo.vacations.approve(id, 2).await, Err(AppError::NotFound(_))));

    repo.vacations.submit(id).await.unwrap();
    repo.vacations.approve(id, 2).await.unwrap();

    let balance = repo.vacations.get_balance(record_id, 2024).await.unwrap();
    assert_eq!(balance.used_days, 14);

    // Already decided
    assert!(matches!(repo.vacations.reject(id, 2, None).await, Err(AppError::NotFound(_))));
    assert!(matches!(repo.vacations.submit(id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_vacation_with_inverted_range_is_rejected() {
    let repo = common::setup().await;
    let (_, record_id) = common::employee(&repo).await;

    let result = repo
        .vacations
        .create(
            &CreateVacation {
                personnel_record_id: record_id,
                vacation_type: VacationType::Unpaid,
                start_date: date(2024, 8, 10),
                end_date: date(2024, 8, 1),
                comment: None,
            },
            1,
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
#[ignore]
async fn test_correction_approval_writes_timesheet() {
    let repo = common::setup().await;
    let (department_id, record_id) = common::employee(&repo).await;

    let correction = repo
        .timesheets
        .create_correction(
            &CreateTimesheetCorrection {
                personnel_record_id: record_id,
                work_date: date(2024, 3, 5),
                requested_hours: 4.0,
                requested_day_type: DayType::Work,
                reason: "Left early for a medical appointment".to_string(),
            },
            1,
        )
        .await
        .unwrap();
    assert_eq!(correction.status, CorrectionStatus::Pending);

    repo.timesheets.approve_correction(correction.id, 2).await.unwrap();

    let entries = repo
        .timesheets
        .list_month(&TimesheetMonthQuery {
            year: 2024,
            month: 3,
            personnel_record_id: None,
            department_id: Some(department_id),
        })
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].hours_worked, 4.0);
    assert_eq!(entries[0].day_type, DayType::Work);

    // A reviewed correction cannot be reviewed again
    assert!(matches!(
        repo.timesheets.approve_correction(correction.id, 2).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repo.timesheets.reject_correction(correction.id, 2).await,
        Err(AppError::NotFound(_))
    ));
}
