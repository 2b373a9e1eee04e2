pub mod image;
pub mod sync_report;
