//! Data models for Hydro Admin

pub mod common;
pub mod contact;
pub mod document;
pub mod enums;
pub mod idle_discharge;
pub mod incident;
pub mod investment;
pub mod organization;
pub mod personnel;
pub mod reception;
pub mod reservoir;
pub mod salary;
pub mod shutdown;
pub mod timesheet;
pub mod vacation;
pub mod visit;

// Re-export commonly used types
pub use common::{ContactRef, FileInfo, NamedRef};
pub use document::{DocumentDetails, DocumentKind};
pub use enums::{CorrectionStatus, DayType, PersonnelStatus, ReceptionStatus, SalaryStatus, VacationStatus, VacationType};
pub use idle_discharge::{calculate_flow_rate, IdleDischarge, IdleDischargeSummary};
pub use shutdown::{Shutdown, ShutdownDetails};
