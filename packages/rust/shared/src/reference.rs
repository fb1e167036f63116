//! Static reference tables: currencies, service categories, country aliases.
//!
//! Built once at process start into an immutable [`ReferenceData`] and shared
//! read-only (usually behind an `Arc`) by every request path.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{ContractGenError, Result};

/// Code of the currency every fee is converted into for reporting.
pub const REFERENCE_CURRENCY: &str = "USD";

/// Jurisdiction key used when a country has no dedicated legal clause.
pub const DEFAULT_JURISDICTION: &str = "default";

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

/// English names of a currency's major and minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitNames {
    pub major_singular: &'static str,
    pub major_plural: &'static str,
    pub minor_singular: &'static str,
    pub minor_plural: &'static str,
}

/// One row of the currency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyInfo {
    /// ISO 4217 code, upper-case.
    pub code: &'static str,
    /// Display prefix, e.g. `$` or `AED `.
    pub symbol: &'static str,
    /// Plural display name, e.g. `US Dollars`.
    pub name: &'static str,
    /// Conversion rate to [`REFERENCE_CURRENCY`].
    pub rate: Decimal,
    /// Unit names for amount-in-words; `None` when words are unsupported.
    pub units: Option<UnitNames>,
}

fn builtin_currencies() -> Vec<CurrencyInfo> {
    vec![
        CurrencyInfo {
            code: "USD",
            symbol: "$",
            name: "US Dollars",
            rate: Decimal::ONE,
            units: Some(UnitNames {
                major_singular: "dollar",
                major_plural: "dollars",
                minor_singular: "cent",
                minor_plural: "cents",
            }),
        },
        CurrencyInfo {
            code: "EUR",
            symbol: "€",
            name: "Euros",
            rate: Decimal::new(108, 2),
            units: Some(UnitNames {
                major_singular: "euro",
                major_plural: "euro",
                minor_singular: "cent",
                minor_plural: "cents",
            }),
        },
        CurrencyInfo {
            code: "GBP",
            symbol: "£",
            name: "Pounds Sterling",
            rate: Decimal::new(127, 2),
            units: Some(UnitNames {
                major_singular: "pound",
                major_plural: "pounds",
                minor_singular: "penny",
                minor_plural: "pence",
            }),
        },
        CurrencyInfo {
            code: "AED",
            symbol: "AED ",
            name: "UAE Dirhams",
            rate: Decimal::new(27, 2),
            units: None,
        },
        CurrencyInfo {
            code: "SAR",
            symbol: "SAR ",
            name: "Saudi Riyals",
            rate: Decimal::new(27, 2),
            units: None,
        },
    ]
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A service category: the prefix of a service identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCategory {
    pub id: &'static str,
    pub display_name: &'static str,
}

fn builtin_categories() -> Vec<ServiceCategory> {
    vec![
        ServiceCategory {
            id: "finance",
            display_name: "Finance & Accounting",
        },
        ServiceCategory {
            id: "it",
            display_name: "IT / Software",
        },
        ServiceCategory {
            id: "hr",
            display_name: "HR & Payroll",
        },
        ServiceCategory {
            id: "business",
            display_name: "Business Consulting",
        },
    ]
}

// ---------------------------------------------------------------------------
// Jurisdictions
// ---------------------------------------------------------------------------

/// Jurisdictions with a dedicated governing-law clause.
pub const JURISDICTIONS: &[&str] = &["USA", "UK", "UAE", "KSA", "Bahrain"];

fn builtin_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("usa", "USA"),
        ("us", "USA"),
        ("united states", "USA"),
        ("united states of america", "USA"),
        ("uk", "UK"),
        ("united kingdom", "UK"),
        ("great britain", "UK"),
        ("england", "UK"),
        ("uae", "UAE"),
        ("united arab emirates", "UAE"),
        ("dubai", "UAE"),
        ("abu dhabi", "UAE"),
        ("ksa", "KSA"),
        ("saudi arabia", "KSA"),
        ("kingdom of saudi arabia", "KSA"),
        ("bahrain", "Bahrain"),
        ("kingdom of bahrain", "Bahrain"),
    ]
}

// ---------------------------------------------------------------------------
// ReferenceData
// ---------------------------------------------------------------------------

/// Immutable lookup tables shared by every request.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    currencies: Vec<CurrencyInfo>,
    categories: Vec<ServiceCategory>,
    /// Lower-cased alias → jurisdiction key.
    aliases: BTreeMap<String, String>,
}

impl ReferenceData {
    /// The builtin tables with no overrides.
    pub fn builtin() -> Self {
        Self {
            currencies: builtin_currencies(),
            categories: builtin_categories(),
            aliases: builtin_aliases()
                .into_iter()
                .map(|(alias, key)| (alias.to_string(), key.to_string()))
                .collect(),
        }
    }

    /// The builtin tables plus extra country aliases (e.g. from config).
    ///
    /// Extra entries win over builtin ones with the same alias.
    pub fn with_aliases<'a>(extra: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut data = Self::builtin();
        for (alias, key) in extra {
            data.aliases
                .insert(normalize_alias(alias), key.trim().to_string());
        }
        data
    }

    /// All supported currencies in table order.
    pub fn currencies(&self) -> &[CurrencyInfo] {
        &self.currencies
    }

    /// Look up a currency by code (case-insensitive).
    pub fn currency(&self, code: &str) -> Result<&CurrencyInfo> {
        let code = code.trim();
        self.currencies
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .ok_or_else(|| ContractGenError::UnsupportedCurrency {
                code: code.to_string(),
            })
    }

    /// All service categories in table order.
    pub fn categories(&self) -> &[ServiceCategory] {
        &self.categories
    }

    /// Look up a category by identifier.
    pub fn category(&self, id: &str) -> Option<&ServiceCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Map a free-text country to its jurisdiction key, if known.
    pub fn jurisdiction_for(&self, country: &str) -> Option<&str> {
        self.aliases
            .get(&normalize_alias(country))
            .map(String::as_str)
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_alias(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_lookup_is_case_insensitive() {
        let data = ReferenceData::builtin();
        assert_eq!(data.currency("usd").unwrap().symbol, "$");
        assert_eq!(data.currency(" GBP ").unwrap().rate, Decimal::new(127, 2));
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let data = ReferenceData::builtin();
        let err = data.currency("JPY").unwrap_err();
        assert!(matches!(err, ContractGenError::UnsupportedCurrency { .. }));
    }

    #[test]
    fn reference_currency_has_unit_rate() {
        let data = ReferenceData::builtin();
        assert_eq!(data.currency(REFERENCE_CURRENCY).unwrap().rate, Decimal::ONE);
    }

    #[test]
    fn aliases_resolve() {
        let data = ReferenceData::builtin();
        assert_eq!(data.jurisdiction_for("United Arab Emirates"), Some("UAE"));
        assert_eq!(data.jurisdiction_for("  saudi   ARABIA "), Some("KSA"));
        assert_eq!(data.jurisdiction_for("Bahrain"), Some("Bahrain"));
        assert_eq!(data.jurisdiction_for("Mars"), None);
    }

    #[test]
    fn extra_aliases_override_builtin() {
        let extra = BTreeMap::from([
            ("Qatar".to_string(), "default".to_string()),
            ("Dubai".to_string(), "Dubai".to_string()),
        ]);
        let data = ReferenceData::with_aliases(&extra);
        assert_eq!(data.jurisdiction_for("qatar"), Some("default"));
        assert_eq!(data.jurisdiction_for("dubai"), Some("Dubai"));
        assert_eq!(data.jurisdiction_for("uae"), Some("UAE"));
    }

    #[test]
    fn every_jurisdiction_has_an_identity_alias() {
        let data = ReferenceData::builtin();
        for key in JURISDICTIONS {
            assert_eq!(data.jurisdiction_for(key), Some(*key));
        }
    }

    #[test]
    fn four_categories() {
        let data = ReferenceData::builtin();
        assert_eq!(data.categories().len(), 4);
        assert_eq!(data.category("it").unwrap().display_name, "IT / Software");
        assert!(data.category("legal").is_none());
    }
}
