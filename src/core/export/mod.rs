//! Export orchestration
//!
//! This module reads stored data back into the portable format:
//! - Paginated collection reads
//! - Export factory (collection selection, certificate pairing and join)
//! - Export processor (raw documents to the canonical export object)
//! - Export coordination and summary

pub mod coordinator;
pub mod factory;
pub mod pagination;
pub mod processor;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use factory::{CertificatePair, ExportData, ExportFactory, ExportRequestMap, ExportSelection};
pub use pagination::{read_all, DEFAULT_PAGE_SIZE};
pub use processor::ExportProcessor;
pub use summary::ExportSummary;
