//! Hydro Admin
//!
//! Data-access layer of the back-office system of a hydropower operator:
//! contacts and organizations, HR records, operational events (shutdowns,
//! idle water discharges, incidents, visits), reservoir monitoring, investments
//! and document management with file attachments and status history.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::Repository;
