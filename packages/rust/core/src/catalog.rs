//! What a request may choose from: currencies, service categories with the
//! services present in the clause store, and the jurisdictions with a legal
//! clause.

use serde::Serialize;

use contractgen_clauses::ClauseStore;
use contractgen_shared::{DEFAULT_JURISDICTION, JURISDICTIONS, ReferenceData};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyEntry {
    pub code: String,
    pub symbol: String,
    pub name: String,
    /// Rate to the reference currency, as a decimal string.
    pub rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub id: String,
    pub display_name: String,
    /// Full service identifiers (`it_support`), sorted.
    pub services: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JurisdictionEntry {
    pub name: String,
    /// Whether the legal store holds a clause for it.
    pub has_clause: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub currencies: Vec<CurrencyEntry>,
    pub categories: Vec<CategoryEntry>,
    pub jurisdictions: Vec<JurisdictionEntry>,
}

/// Build the catalog from the reference tables and both stores.
pub fn build_catalog(
    reference: &ReferenceData,
    clauses: &dyn ClauseStore,
    legal: &dyn ClauseStore,
) -> Catalog {
    let currencies = reference
        .currencies()
        .iter()
        .map(|c| CurrencyEntry {
            code: c.code.to_string(),
            symbol: c.symbol.to_string(),
            name: c.name.to_string(),
            rate: c.rate.normalize().to_string(),
        })
        .collect();

    let categories = reference
        .categories()
        .iter()
        .map(|c| CategoryEntry {
            id: c.id.to_string(),
            display_name: c.display_name.to_string(),
            services: clauses
                .keys(c.id)
                .into_iter()
                .map(|name| format!("{}_{name}", c.id))
                .collect(),
        })
        .collect();

    let jurisdictions = JURISDICTIONS
        .iter()
        .chain(std::iter::once(&DEFAULT_JURISDICTION))
        .map(|name| JurisdictionEntry {
            name: name.to_string(),
            has_clause: matches!(legal.load(name), Ok(Some(_))),
        })
        .collect();

    Catalog {
        currencies,
        categories,
        jurisdictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contractgen_clauses::MemoryClauseStore;
    use contractgen_clauses::bundle::{default_clauses, default_legal_frameworks};

    #[test]
    fn lists_services_from_store() {
        let catalog = build_catalog(
            &ReferenceData::builtin(),
            &default_clauses(),
            &default_legal_frameworks(),
        );

        let it = catalog.categories.iter().find(|c| c.id == "it").unwrap();
        assert!(it.services.contains(&"it_app_development".to_string()));
        assert!(it.services.windows(2).all(|w| w[0] <= w[1]));

        let usd = catalog.currencies.iter().find(|c| c.code == "USD").unwrap();
        assert_eq!(usd.rate, "1");

        assert!(catalog.jurisdictions.iter().all(|j| j.has_clause));
        assert_eq!(catalog.jurisdictions.last().unwrap().name, "default");
    }

    #[test]
    fn empty_store_still_lists_categories() {
        let empty = MemoryClauseStore::new();
        let catalog = build_catalog(&ReferenceData::builtin(), &empty, &empty);
        assert!(!catalog.categories.is_empty());
        assert!(catalog.categories.iter().all(|c| c.services.is_empty()));
        assert!(catalog.jurisdictions.iter().all(|j| !j.has_clause));
    }
}
