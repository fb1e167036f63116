//! Country → governing-law clause resolution.
//!
//! The resolver never fails outward: unknown countries, empty clauses and
//! read errors all fall back to the `default` jurisdiction.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use contractgen_shared::{DEFAULT_JURISDICTION, ReferenceData};

use crate::ClauseStore;

/// The legal clause chosen for a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalFramework {
    /// Jurisdiction key whose text was loaded (`default` on fallback).
    pub jurisdiction: String,
    /// Clause text, possibly empty if even the default is missing.
    pub text: String,
    /// Whether the default clause was used.
    pub is_default: bool,
}

/// Resolves a free-text country to a jurisdiction clause.
#[derive(Clone)]
pub struct LegalFrameworkResolver {
    store: Arc<dyn ClauseStore>,
    reference: Arc<ReferenceData>,
}

impl LegalFrameworkResolver {
    pub fn new(store: Arc<dyn ClauseStore>, reference: Arc<ReferenceData>) -> Self {
        Self { store, reference }
    }

    /// Resolve `country` to its clause, falling back to the default.
    #[instrument(skip(self))]
    pub fn resolve(&self, country: &str) -> LegalFramework {
        if let Some(key) = self.reference.jurisdiction_for(country) {
            match self.store.load(key) {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    debug!(jurisdiction = key, "loaded jurisdiction clause");
                    return LegalFramework {
                        jurisdiction: key.to_string(),
                        text,
                        is_default: key == DEFAULT_JURISDICTION,
                    };
                }
                Ok(_) => {
                    warn!(jurisdiction = key, "jurisdiction clause missing, using default");
                }
                Err(e) => {
                    warn!(jurisdiction = key, error = %e, "jurisdiction clause unreadable, using default");
                }
            }
        } else {
            debug!("unknown country, using default jurisdiction");
        }

        LegalFramework {
            jurisdiction: DEFAULT_JURISDICTION.to_string(),
            text: self.store.load_or_empty(DEFAULT_JURISDICTION),
            is_default: true,
        }
    }
}

impl std::fmt::Debug for LegalFrameworkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegalFrameworkResolver").finish_non_exhaustive()
    }
}
