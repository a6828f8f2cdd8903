pub mod reports;

pub use reports::{Report, ReportCreate, ReportUpdate, ReportsStore};
