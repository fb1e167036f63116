//! Core domain logic and pipeline orchestration for contractgen.
//!
//! This crate ties the amount formatter, the service block assembler, the
//! legal resolver and both renderers into one generation workflow
//! ([`ContractService::generate`]) plus the record operations around it.

pub mod amount;
pub mod assembler;
pub mod catalog;
pub mod pipeline;
pub mod scaffold;
pub mod snapshot;
pub mod words;

pub use amount::{FormattedAmount, format_amount};
pub use assembler::{ServiceBlock, ServiceBlockAssembler};
pub use catalog::{Catalog, build_catalog};
pub use pipeline::{
    ContractService, DEFAULT_PAGE_SIZE, DeleteOutcome, Download, GeneratedContract,
    MAX_PAGE_SIZE, ProgressReporter, ServiceComponents, SilentProgress,
};
pub use scaffold::{ScaffoldReport, init_assets};
pub use snapshot::{ContractSnapshot, SnapshotBuilder};
