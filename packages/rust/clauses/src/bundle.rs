//! Stock clause and legal texts shipped with the binary.
//!
//! `contractgen init` writes these to disk so a fresh checkout can generate
//! immediately; deployments are expected to edit the files afterwards.

use crate::{BANK_DETAILS_KEY, MemoryClauseStore, SERVICE_PROVIDER_KEY};

/// Service and boilerplate clauses, keyed like the filesystem store.
pub fn default_clauses() -> MemoryClauseStore {
    MemoryClauseStore::new()
        .with(
            SERVICE_PROVIDER_KEY,
            "The Service Provider is an independent professional services firm \
             that delivers the services described in this Agreement through its \
             own qualified personnel.",
        )
        .with(
            BANK_DETAILS_KEY,
            "Payments shall be made by bank transfer to the account nominated by \
             the Service Provider in its invoice. Bank charges on the Client's side \
             are borne by the Client.",
        )
        .with(
            "finance/bookkeeping",
            "Bookkeeping:\n\
             - Recording of all financial transactions in the Client's ledger.\n\
             - Monthly bank and ledger reconciliations.\n\
             - Preparation of monthly management accounts.",
        )
        .with(
            "finance/tax_advisory",
            "Tax Advisory:\n\
             - Preparation and filing of periodic tax and VAT returns.\n\
             - Advice on tax obligations arising from the Client's operations.",
        )
        .with(
            "finance/audit_support",
            "Audit Support:\n\
             - Preparation of year-end schedules for the Client's auditors.\n\
             - Coordination of auditor queries during fieldwork.",
        )
        .with(
            "it/app_development",
            "Application Development:\n\
             - Design, development and testing of software applications to the \
             Client's written specification.\n\
             - Delivery of source code and deployment documentation.",
        )
        .with(
            "it/support",
            "IT Support:\n\
             - Remote helpdesk support during business hours.\n\
             - Incident response for systems listed in the service schedule.",
        )
        .with(
            "it/cloud_hosting",
            "Cloud Hosting:\n\
             - Provisioning and monitoring of the Client's cloud infrastructure.\n\
             - Scheduled backups and security patching.",
        )
        .with(
            "hr/payroll",
            "Payroll Processing:\n\
             - Monthly payroll calculation and payslip preparation.\n\
             - Statutory payroll filings in the Client's jurisdiction.",
        )
        .with(
            "hr/recruitment",
            "Recruitment:\n\
             - Sourcing and screening of candidates for agreed roles.\n\
             - Coordination of interviews and offer letters.",
        )
        .with(
            "business/strategy",
            "Business Strategy:\n\
             - Review of the Client's current operating model.\n\
             - Preparation of a written strategic plan with recommendations.",
        )
        .with(
            "business/market_research",
            "Market Research:\n\
             - Desk research on the Client's target markets.\n\
             - Competitor analysis and summary report.",
        )
}

/// Governing-law clauses keyed by jurisdiction, including `default`.
pub fn default_legal_frameworks() -> MemoryClauseStore {
    MemoryClauseStore::new()
        .with(
            "USA",
            "This Agreement shall be governed by the laws of the State of Delaware, \
             United States of America. Disputes shall be submitted to the state and \
             federal courts located in Delaware.",
        )
        .with(
            "UK",
            "This Agreement shall be governed by the laws of England and Wales. The \
             courts of England and Wales shall have exclusive jurisdiction.",
        )
        .with(
            "UAE",
            "This Agreement shall be governed by the federal laws of the United Arab \
             Emirates as applied in the Emirate of Dubai. Disputes shall be referred \
             to the courts of Dubai.",
        )
        .with(
            "KSA",
            "This Agreement shall be governed by the laws of the Kingdom of Saudi \
             Arabia. Disputes shall be referred to the competent courts in Riyadh.",
        )
        .with(
            "Bahrain",
            "This Agreement shall be governed by the laws of the Kingdom of Bahrain. \
             Disputes shall be referred to the Bahrain Chamber for Dispute Resolution.",
        )
        .with(
            "default",
            "This Agreement shall be governed by the laws of the jurisdiction in which \
             the Client is registered, without regard to its conflict of law provisions.",
        )
}
