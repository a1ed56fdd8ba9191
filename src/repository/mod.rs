//! Repository layer for database operations

mod crud;
mod scan;
mod sql;

pub mod contacts;
pub mod documents;
pub mod files;
pub mod idle_discharges;
pub mod incidents;
pub mod investments;
pub mod organizations;
pub mod personnel;
pub mod receptions;
pub mod reservoirs;
pub mod salaries;
pub mod shutdowns;
pub mod status_history;
pub mod timesheets;
pub mod vacations;
pub mod visits;

use sqlx::{Pool, Postgres};

use crate::models::document::DocumentKind;

/// Main repository struct holding the pool and one repository per entity family
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub files: files::FilesRepository,
    pub organizations: organizations::OrganizationsRepository,
    pub departments: organizations::DepartmentsRepository,
    pub positions: organizations::PositionsRepository,
    pub contacts: contacts::ContactsRepository,
    pub fast_calls: contacts::FastCallsRepository,
    pub receptions: receptions::ReceptionsRepository,
    pub incidents: incidents::IncidentsRepository,
    pub visits: visits::VisitsRepository,
    pub shutdowns: shutdowns::ShutdownsRepository,
    pub idle_discharges: idle_discharges::IdleDischargesRepository,
    pub reservoirs: reservoirs::ReservoirsRepository,
    pub instructions: documents::DocumentsRepository,
    pub reports: documents::DocumentsRepository,
    pub legal_documents: documents::DocumentsRepository,
    pub investments: investments::InvestmentsRepository,
    pub active_projects: investments::ActiveProjectsRepository,
    pub personnel: personnel::PersonnelRepository,
    pub salaries: salaries::SalariesRepository,
    pub timesheets: timesheets::TimesheetsRepository,
    pub vacations: vacations::VacationsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            files: files::FilesRepository::new(pool.clone()),
            organizations: organizations::OrganizationsRepository::new(pool.clone()),
            departments: organizations::DepartmentsRepository::new(pool.clone()),
            positions: organizations::PositionsRepository::new(pool.clone()),
            contacts: contacts::ContactsRepository::new(pool.clone()),
            fast_calls: contacts::FastCallsRepository::new(pool.clone()),
            receptions: receptions::ReceptionsRepository::new(pool.clone()),
            incidents: incidents::IncidentsRepository::new(pool.clone()),
            visits: visits::VisitsRepository::new(pool.clone()),
            shutdowns: shutdowns::ShutdownsRepository::new(pool.clone()),
            idle_discharges: idle_discharges::IdleDischargesRepository::new(pool.clone()),
            reservoirs: reservoirs::ReservoirsRepository::new(pool.clone()),
            instructions: documents::DocumentsRepository::new(pool.clone(), DocumentKind::Instruction),
            reports: documents::DocumentsRepository::new(pool.clone(), DocumentKind::Report),
            legal_documents: documents::DocumentsRepository::new(pool.clone(), DocumentKind::LegalDocument),
            investments: investments::InvestmentsRepository::new(pool.clone()),
            active_projects: investments::ActiveProjectsRepository::new(pool.clone()),
            personnel: personnel::PersonnelRepository::new(pool.clone()),
            salaries: salaries::SalariesRepository::new(pool.clone()),
            timesheets: timesheets::TimesheetsRepository::new(pool.clone()),
            vacations: vacations::VacationsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Repository of one document family
    pub fn documents(&self, kind: DocumentKind) -> &documents::DocumentsRepository {
        match kind {
            DocumentKind::Instruction => &self.instructions,
            DocumentKind::Report => &self.reports,
            DocumentKind::LegalDocument => &self.legal_documents,
        }
    }
}
