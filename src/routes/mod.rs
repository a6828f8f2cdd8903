pub mod ai;
pub mod files;
pub mod health;
pub mod reports;
