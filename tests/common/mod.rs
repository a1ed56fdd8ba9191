//! Shared setup for database-backed tests.
//!
//! Requires a PostgreSQL instance reachable through `DATABASE_URL`.
//! Run with: cargo test -- --ignored

#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use hydro_admin::{
    config::DatabaseConfig,
    db,
    models::{
        contact::CreateContact,
        organization::{CreateDepartment, CreateOrganization},
        personnel::CreatePersonnelRecord,
    },
    Repository,
};

pub async fn setup() -> Repository {
    dotenvy::dotenv().ok();
    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
        ..DatabaseConfig::default()
    };
    let pool = db::connect(&config).await.expect("Failed to connect to database");
    db::MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    Repository::new(pool)
}

/// Name that will not collide with rows left by earlier runs
pub fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

pub async fn organization(repo: &Repository) -> i64 {
    repo.organizations
        .create(&CreateOrganization {
            name: unique("HPP"),
            parent_organization_id: None,
        })
        .await
        .expect("Failed to create organization")
}

/// Organization, department, contact and personnel record; returns (department_id, record_id)
pub async fn employee(repo: &Repository) -> (i64, i64) {
    let organization_id = organization(repo).await;
    let department_id = repo
        .departments
        .create(&CreateDepartment {
            name: unique("Operations"),
            organization_id,
            parent_id: None,
            description: None,
        })
        .await
        .expect("Failed to create department");
    let contact_id = repo
        .contacts
        .create(&CreateContact {
            fio: unique("Ivanov"),
            email: None,
            phone: None,
            mobile_phone: None,
            birth_date: None,
            organization_id: Some(organization_id),
            department_id: Some(department_id),
            position_id: None,
        })
        .await
        .expect("Failed to create contact");
    let record_id = repo
        .personnel
        .create(&CreatePersonnelRecord {
            contact_id,
            department_id: Some(department_id),
            position_id: None,
            personnel_number: unique("TN"),
            hire_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            status: None,
        })
        .await
        .expect("Failed to create personnel record");
    (department_id, record_id)
}
