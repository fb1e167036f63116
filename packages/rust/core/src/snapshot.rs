//! The derived-data stage shared by both renderers.
//!
//! A [`ContractSnapshot`] holds every value computed from a request:
//! formatted amounts, the service block, the legal clause and boilerplate.
//! The DOCX replacement map, the PDF input and the stored record are all
//! projections of one snapshot, so the two documents cannot disagree.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use contractgen_clauses::{
    BANK_DETAILS_KEY, ClauseStore, FsClauseStore, LegalFramework, LegalFrameworkResolver,
    SERVICE_PROVIDER_KEY,
};
use contractgen_pdf::PdfContract;
use contractgen_shared::{
    AppConfig, ContractGenError, ContractRequest, NewContract, ReferenceData, Result,
};

use crate::amount::{FormattedAmount, format_amount};
use crate::assembler::{ServiceBlock, ServiceBlockAssembler};

/// Display format of the effective date (`01 March 2025`).
pub const EFFECTIVE_DATE_FORMAT: &str = "%d %B %Y";

/// Everything derived from one request.
#[derive(Debug, Clone, Serialize)]
pub struct ContractSnapshot {
    pub request: ContractRequest,
    pub amount: FormattedAmount,
    pub services: ServiceBlock,
    #[serde(skip)]
    pub legal: LegalFramework,
    pub service_provider: String,
    pub bank_details: String,
    pub effective_date: String,
    pub generated_at: DateTime<Utc>,
}

/// Artifact facts known only after rendering.
#[derive(Debug, Clone)]
pub struct ArtifactRefs {
    pub file_id: String,
    pub docx_path: String,
    pub pdf_path: String,
    pub docx_sha256: String,
    pub pdf_sha256: String,
}

impl ContractSnapshot {
    /// Token → value map for the DOCX template.
    pub fn replacements(&self) -> BTreeMap<String, String> {
        let r = &self.request;
        let a = &self.amount;
        [
            ("CLIENT_NAME", r.client_name.trim().to_string()),
            ("CLIENT_ADDRESS", r.client_address.trim().to_string()),
            ("CLIENT_EMAIL", r.client_email.trim().to_string()),
            ("CLIENT_PHONE", r.client_phone.trim().to_string()),
            ("COUNTRY", r.country.trim().to_string()),
            ("EFFECTIVE_DATE", self.effective_date.clone()),
            ("CONTRACT_DURATION", r.duration.trim().to_string()),
            ("FEES_AMOUNT", a.display.clone()),
            ("FEES_IN_WORDS", a.words.clone()),
            ("CURRENCY_CODE", a.currency.code.to_string()),
            ("CURRENCY_SYMBOL", a.currency.symbol.to_string()),
            ("CURRENCY_NAME", a.currency.name.to_string()),
            ("USD_EQUIVALENT", a.equivalent_display.clone()),
            ("SERVICES_BLOCK", self.services.text.clone()),
            ("LEGAL_FRAMEWORK", self.legal.text.trim_end().to_string()),
            ("SERVICE_PROVIDER", self.service_provider.clone()),
            ("BANK_DETAILS", self.bank_details.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Input for the PDF renderer.
    pub fn pdf_contract(&self) -> PdfContract {
        let r = &self.request;
        let a = &self.amount;
        PdfContract {
            client_name: r.client_name.trim().to_string(),
            client_address: r.client_address.trim().to_string(),
            client_email: r.client_email.trim().to_string(),
            client_phone: r.client_phone.trim().to_string(),
            country: r.country.trim().to_string(),
            effective_date: self.effective_date.clone(),
            contract_duration: r.duration.trim().to_string(),
            fees: a.display.clone(),
            fees_in_words: a.words.clone(),
            currency_code: a.currency.code.to_string(),
            currency_symbol: a.currency.symbol.to_string(),
            currency_name: a.currency.name.to_string(),
            usd_equivalent: a.equivalent_display.clone(),
            services_block: self.services.text.clone(),
            category_headers: self.services.headers(),
            legal_framework: self.legal.text.trim_end().to_string(),
            service_provider: self.service_provider.clone(),
            bank_details: self.bank_details.clone(),
            generated_at: self.generated_at,
        }
    }

    /// The row to persist once both artifacts exist.
    pub fn new_contract(&self, artifacts: ArtifactRefs) -> NewContract {
        let r = &self.request;
        let a = &self.amount;
        NewContract {
            client_name: r.client_name.trim().to_string(),
            client_address: r.client_address.trim().to_string(),
            client_email: r.client_email.trim().to_string(),
            client_phone: r.client_phone.trim().to_string(),
            country: r.country.trim().to_string(),
            fee_amount: a.amount.normalize().to_string(),
            fees: a.display.clone(),
            fees_words: a.words.clone(),
            currency: a.currency.code.to_string(),
            currency_symbol: a.currency.symbol.to_string(),
            currency_name: a.currency.name.to_string(),
            usd_equivalent: a.equivalent_display.clone(),
            contract_duration: r.duration.trim().to_string(),
            services: self.services.service_ids(),
            effective_date: self.effective_date.clone(),
            file_id: artifacts.file_id,
            docx_path: artifacts.docx_path,
            pdf_path: artifacts.pdf_path,
            docx_sha256: artifacts.docx_sha256,
            pdf_sha256: artifacts.pdf_sha256,
        }
    }
}

/// Builds snapshots from the reference tables and clause stores.
#[derive(Clone)]
pub struct SnapshotBuilder {
    reference: Arc<ReferenceData>,
    clauses: Arc<dyn ClauseStore>,
    assembler: ServiceBlockAssembler,
    legal: LegalFrameworkResolver,
}

impl SnapshotBuilder {
    pub fn new(
        reference: Arc<ReferenceData>,
        clauses: Arc<dyn ClauseStore>,
        legal: Arc<dyn ClauseStore>,
    ) -> Self {
        Self {
            assembler: ServiceBlockAssembler::new(Arc::clone(&clauses), Arc::clone(&reference)),
            legal: LegalFrameworkResolver::new(legal, Arc::clone(&reference)),
            reference,
            clauses,
        }
    }

    /// Builder over the clause directories of `config`. Touches neither the
    /// database nor the output directory.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(config.reference_data()),
            Arc::new(FsClauseStore::new(&config.paths.clause_dir)),
            Arc::new(FsClauseStore::new(&config.paths.legal_dir)),
        )
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Validate `request` and derive every value the documents show.
    #[instrument(skip_all, fields(client = %request.client_name, currency = %request.currency))]
    pub fn build(&self, request: &ContractRequest) -> Result<ContractSnapshot> {
        request.validate()?;
        let services = self.assembler.assemble(&request.services);
        if services.groups.is_empty() {
            return Err(ContractGenError::MissingServices);
        }
        let amount = format_amount(&request.fees, &request.currency, &self.reference)?;
        let legal = self.legal.resolve(&request.country);

        let snapshot = ContractSnapshot {
            request: request.clone(),
            amount,
            services,
            legal,
            service_provider: self
                .clauses
                .load_or_empty(SERVICE_PROVIDER_KEY)
                .trim_end()
                .to_string(),
            bank_details: self
                .clauses
                .load_or_empty(BANK_DETAILS_KEY)
                .trim_end()
                .to_string(),
            effective_date: request
                .effective_date
                .format(EFFECTIVE_DATE_FORMAT)
                .to_string(),
            generated_at: Utc::now(),
        };
        debug!(
            jurisdiction = %snapshot.legal.jurisdiction,
            groups = snapshot.services.groups.len(),
            "snapshot built"
        );
        Ok(snapshot)
    }
}

impl std::fmt::Debug for SnapshotBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBuilder").finish_non_exhaustive()
    }
}
