//! Shared types, error model, and configuration for contractgen.
//!
//! This crate is the foundation depended on by all other contractgen crates.
//! It provides:
//! - [`ContractGenError`] — the unified error type
//! - Domain types ([`ContractRequest`], [`ContractRecord`], [`FileId`], [`DocumentFormat`])
//! - Immutable reference tables ([`ReferenceData`], [`CurrencyInfo`], [`ServiceCategory`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod reference;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, PathsConfig, PdfConfig, config_dir, config_file_path, init_config,
    init_config_at, load_config, load_config_from,
};
pub use error::{ContractGenError, Result};
pub use reference::{
    CurrencyInfo, DEFAULT_JURISDICTION, JURISDICTIONS, REFERENCE_CURRENCY, ReferenceData,
    ServiceCategory, UnitNames,
};
pub use types::{
    ContractPage, ContractRecord, ContractRequest, ContractStats, DocumentFormat, FileId,
    NewContract,
};
