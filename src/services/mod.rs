pub mod config_service;
pub mod enrichment_service;
pub mod metadata_service;
pub mod scan_service;
pub mod thumbnail_service;
