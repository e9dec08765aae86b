pub mod inventory;
pub mod report;
pub mod sweep;
