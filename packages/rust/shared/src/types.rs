//! Core domain types for contract generation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContractGenError, Result};

// ---------------------------------------------------------------------------
// FileId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper naming the blobs of one generation (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub Uuid);

impl FileId {
    /// Generate a new time-sortable file identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// DocumentFormat
// ---------------------------------------------------------------------------

/// The two rendered artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type served for downloads.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }

    /// Download filename offered to the client.
    pub fn download_name(self) -> String {
        format!("Service_Agreement.{}", self.extension())
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = ContractGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ContractGenError::FormatNotSupported {
                format: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ContractRequest
// ---------------------------------------------------------------------------

/// Everything the client submits to generate one agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRequest {
    pub client_name: String,
    #[serde(default)]
    pub client_address: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_phone: String,
    pub country: String,
    /// Raw fee as typed, may contain `,` grouping separators.
    pub fees: String,
    /// Currency code from the supported table.
    pub currency: String,
    /// Duration label, e.g. `12 Months`.
    pub duration: String,
    pub effective_date: NaiveDate,
    /// Ordered `category_servicename` identifiers.
    pub services: Vec<String>,
    /// Append the right-to-left title line to the PDF.
    #[serde(default)]
    pub bilingual: bool,
}

impl ContractRequest {
    /// Check the structural invariants that do not need reference data.
    ///
    /// Amount and currency are checked by the formatter, which needs the
    /// currency table.
    pub fn validate(&self) -> Result<()> {
        if self.services.iter().all(|s| s.trim().is_empty()) {
            return Err(ContractGenError::MissingServices);
        }
        if self.client_name.trim().is_empty() {
            return Err(ContractGenError::validation("client name is required"));
        }
        if self.country.trim().is_empty() {
            return Err(ContractGenError::validation("country is required"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ContractRecord
// ---------------------------------------------------------------------------

/// Fields of a contract row before the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContract {
    pub client_name: String,
    pub client_address: String,
    pub client_email: String,
    pub client_phone: String,
    pub country: String,
    /// Parsed fee amount as a plain decimal string (`2000`).
    pub fee_amount: String,
    /// Display fee (`2,000.00`).
    pub fees: String,
    pub fees_words: String,
    pub currency: String,
    pub currency_symbol: String,
    pub currency_name: String,
    pub usd_equivalent: String,
    pub contract_duration: String,
    pub services: Vec<String>,
    pub effective_date: String,
    pub file_id: String,
    pub docx_path: String,
    pub pdf_path: String,
    pub docx_sha256: String,
    pub pdf_sha256: String,
}

/// A persisted contract row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: NewContract,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractRecord {
    /// Parse the stored file id.
    pub fn file_id(&self) -> Result<FileId> {
        self.fields.file_id.parse().map_err(|e| {
            ContractGenError::Storage(format!(
                "contract {} has invalid file id '{}': {e}",
                self.id, self.fields.file_id
            ))
        })
    }
}

/// One page of records plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct ContractPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub items: Vec<ContractRecord>,
}

/// Aggregates over all stored contracts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContractStats {
    pub total_contracts: u64,
    /// Sum of fee amounts per currency code, two-decimal strings.
    pub revenue_by_currency: BTreeMap<String, String>,
    /// How many contracts selected each service identifier.
    pub service_counts: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContractRequest {
        ContractRequest {
            client_name: "Acme Ltd".into(),
            client_address: "1 Main St".into(),
            client_email: "ops@acme.test".into(),
            client_phone: "+1 555 0100".into(),
            country: "USA".into(),
            fees: "2,000".into(),
            currency: "USD".into(),
            duration: "12 Months".into(),
            effective_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            services: vec!["it_support".into()],
            bilingual: false,
        }
    }

    #[test]
    fn file_id_roundtrip() {
        let id = FileId::new();
        let parsed: FileId = id.to_string().parse().expect("parse FileId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn format_parsing() {
        assert_eq!("docx".parse::<DocumentFormat>().unwrap(), DocumentFormat::Docx);
        assert_eq!(" PDF ".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
        let err = "odt".parse::<DocumentFormat>().unwrap_err();
        assert!(matches!(err, ContractGenError::FormatNotSupported { .. }));
    }

    #[test]
    fn request_without_services_is_rejected() {
        let mut req = request();
        req.services.clear();
        assert!(matches!(
            req.validate().unwrap_err(),
            ContractGenError::MissingServices
        ));

        req.services = vec!["  ".into()];
        assert!(matches!(
            req.validate().unwrap_err(),
            ContractGenError::MissingServices
        ));
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let json = r#"{
            "client_name": "Acme",
            "country": "UK",
            "fees": "100",
            "currency": "GBP",
            "duration": "6 Months",
            "effective_date": "2025-01-15",
            "services": ["hr_payroll"]
        }"#;
        let req: ContractRequest = serde_json::from_str(json).expect("deserialize");
        assert!(req.client_email.is_empty());
        assert!(!req.bilingual);
        assert_eq!(req.services, vec!["hr_payroll"]);
    }
}
