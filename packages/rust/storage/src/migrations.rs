//! SQL migration definitions for the contracts database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: contracts",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per successful generation
CREATE TABLE IF NOT EXISTS contracts (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    client_name       TEXT NOT NULL,
    client_address    TEXT NOT NULL DEFAULT '',
    client_email      TEXT NOT NULL DEFAULT '',
    client_phone      TEXT NOT NULL DEFAULT '',
    country           TEXT NOT NULL,
    fee_amount        TEXT NOT NULL,
    fees              TEXT NOT NULL,
    fees_words        TEXT NOT NULL,
    currency          TEXT NOT NULL,
    currency_symbol   TEXT NOT NULL,
    currency_name     TEXT NOT NULL,
    usd_equivalent    TEXT NOT NULL,
    contract_duration TEXT NOT NULL,
    services          TEXT NOT NULL,
    effective_date    TEXT NOT NULL,
    file_id           TEXT NOT NULL UNIQUE,
    docx_path         TEXT NOT NULL,
    pdf_path          TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contracts_created ON contracts(created_at);
CREATE INDEX IF NOT EXISTS idx_contracts_currency ON contracts(currency);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Artifact checksums",
            sql: r#"
ALTER TABLE contracts ADD COLUMN docx_sha256 TEXT NOT NULL DEFAULT '';
ALTER TABLE contracts ADD COLUMN pdf_sha256 TEXT NOT NULL DEFAULT '';

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
