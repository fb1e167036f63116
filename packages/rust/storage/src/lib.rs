//! libSQL record store and filesystem blob store.
//!
//! The [`Storage`] struct wraps a local libSQL database holding one row per
//! generated contract. Rendered documents live beside it in a
//! [`BlobStore`](blob::BlobStore).
//!
//! **Access rules:**
//! - CLI commands that write: read-write via [`Storage::open`]
//! - listing / stats / download: read-only via [`Storage::open_readonly`]

pub mod blob;
mod migrations;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, Row, Rows, params};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use contractgen_shared::{
    ContractGenError, ContractPage, ContractRecord, ContractStats, NewContract, Result,
};

pub use blob::{BlobStore, FsBlobStore, blob_name, sha256_hex};

const CONTRACT_COLUMNS: &str = "id, client_name, client_address, client_email, client_phone, \
     country, fee_amount, fees, fees_words, currency, currency_symbol, currency_name, \
     usd_equivalent, contract_duration, services, effective_date, file_id, docx_path, \
     pdf_path, docx_sha256, pdf_sha256, created_at, updated_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ContractGenError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ContractGenError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ContractGenError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ContractGenError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Contract operations
    // -----------------------------------------------------------------------

    /// Insert a contract and return it with its generated id and timestamps.
    #[instrument(skip_all, fields(client = %new.client_name, file_id = %new.file_id))]
    pub async fn insert_contract(&self, new: &NewContract) -> Result<ContractRecord> {
        self.check_writable()?;
        let now = Utc::now();
        let stamp = timestamp(&now);
        let services = serde_json::to_string(&new.services)
            .map_err(|e| ContractGenError::Storage(format!("encoding services: {e}")))?;

        self.conn
            .execute(
                "INSERT INTO contracts (client_name, client_address, client_email, client_phone,
                   country, fee_amount, fees, fees_words, currency, currency_symbol, currency_name,
                   usd_equivalent, contract_duration, services, effective_date, file_id,
                   docx_path, pdf_path, docx_sha256, pdf_sha256, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                   ?17, ?18, ?19, ?20, ?21, ?22)",
                params![
                    new.client_name.as_str(),
                    new.client_address.as_str(),
                    new.client_email.as_str(),
                    new.client_phone.as_str(),
                    new.country.as_str(),
                    new.fee_amount.as_str(),
                    new.fees.as_str(),
                    new.fees_words.as_str(),
                    new.currency.as_str(),
                    new.currency_symbol.as_str(),
                    new.currency_name.as_str(),
                    new.usd_equivalent.as_str(),
                    new.contract_duration.as_str(),
                    services.as_str(),
                    new.effective_date.as_str(),
                    new.file_id.as_str(),
                    new.docx_path.as_str(),
                    new.pdf_path.as_str(),
                    new.docx_sha256.as_str(),
                    new.pdf_sha256.as_str(),
                    stamp.as_str(),
                    stamp.as_str(),
                ],
            )
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        let id = self.conn.last_insert_rowid();
        info!(id, "contract stored");

        Ok(ContractRecord {
            id,
            fields: new.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a contract by id.
    pub async fn get_contract(&self, id: i64) -> Result<Option<ContractRecord>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_contract(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(ContractGenError::Storage(e.to_string())),
        }
    }

    /// List contracts newest first.
    pub async fn list_contracts(&self, offset: u64, limit: u64) -> Result<ContractPage> {
        let total = self.count_contracts().await?;

        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {CONTRACT_COLUMNS} FROM contracts
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?1 OFFSET ?2"
                ),
                params![to_i64(limit), to_i64(offset)],
            )
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(row) = next_row(&mut rows).await? {
            items.push(row_to_contract(&row)?);
        }

        Ok(ContractPage {
            total,
            offset,
            limit,
            items,
        })
    }

    /// Delete a contract row. Returns whether a row was removed.
    pub async fn delete_contract(&self, id: i64) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute("DELETE FROM contracts WHERE id = ?1", params![id])
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;
        debug!(id, affected, "contract delete");
        Ok(affected > 0)
    }

    /// Number of stored contracts.
    pub async fn count_contracts(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM contracts", params![])
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| ContractGenError::Storage(e.to_string()))?;
                Ok(u64::try_from(count).unwrap_or(0))
            }
            Ok(None) => Ok(0),
            Err(e) => Err(ContractGenError::Storage(e.to_string())),
        }
    }

    /// Totals per currency and service selection counts.
    ///
    /// Amounts are summed as decimals so no float rounding creeps in.
    #[instrument(skip_all)]
    pub async fn contract_stats(&self) -> Result<ContractStats> {
        let mut rows = self
            .conn
            .query(
                "SELECT currency, fee_amount, services FROM contracts",
                params![],
            )
            .await
            .map_err(|e| ContractGenError::Storage(e.to_string()))?;

        let mut total_contracts = 0u64;
        let mut revenue: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut service_counts: BTreeMap<String, u64> = BTreeMap::new();

        while let Some(row) = next_row(&mut rows).await? {
            total_contracts += 1;

            let currency: String = row
                .get(0)
                .map_err(|e| ContractGenError::Storage(e.to_string()))?;
            let amount: String = row
                .get(1)
                .map_err(|e| ContractGenError::Storage(e.to_string()))?;
            let services: String = row
                .get(2)
                .map_err(|e| ContractGenError::Storage(e.to_string()))?;

            match amount.parse::<Decimal>() {
                Ok(value) => *revenue.entry(currency).or_default() += value,
                Err(e) => warn!(amount = %amount, error = %e, "skipping unparseable stored amount"),
            }

            let unique: BTreeSet<String> = decode_services(&services)?.into_iter().collect();
            for service in unique {
                *service_counts.entry(service).or_default() += 1;
            }
        }

        let revenue_by_currency = revenue
            .into_iter()
            .map(|(code, mut sum)| {
                sum.rescale(2);
                (code, sum.to_string())
            })
            .collect();

        Ok(ContractStats {
            total_contracts,
            revenue_by_currency,
            service_counts,
        })
    }
}

/// Advance `rows`, surfacing a failed step instead of ending iteration.
async fn next_row(rows: &mut Rows) -> Result<Option<Row>> {
    rows.next()
        .await
        .map_err(|e| ContractGenError::Storage(e.to_string()))
}

/// Move the database at `path` aside to `<path>.backup` (replacing an older
/// backup) and create a fresh schema in its place.
///
/// Returns the opened storage and the backup location, if a database existed.
pub async fn reset_database(path: &Path) -> Result<(Storage, Option<PathBuf>)> {
    let backup = if path.exists() {
        let mut name = path.as_os_str().to_owned();
        name.push(".backup");
        let backup = PathBuf::from(name);
        if backup.exists() {
            std::fs::remove_file(&backup).map_err(|e| ContractGenError::io(&backup, e))?;
        }
        std::fs::rename(path, &backup).map_err(|e| ContractGenError::io(path, e))?;
        info!(backup = %backup.display(), "database backed up");
        Some(backup)
    } else {
        None
    };

    let storage = Storage::open(path).await?;
    info!(path = %path.display(), "database recreated");
    Ok((storage, backup))
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn decode_services(json: &str) -> Result<Vec<String>> {
    serde_json::from_str(json)
        .map_err(|e| ContractGenError::Storage(format!("invalid services column: {e}")))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ContractGenError::Storage(format!("invalid date: {e}")))
}

/// Convert a database row to a [`ContractRecord`].
fn row_to_contract(row: &Row) -> Result<ContractRecord> {
    let text = |idx: i32| -> Result<String> {
        row.get::<String>(idx)
            .map_err(|e| ContractGenError::Storage(e.to_string()))
    };

    Ok(ContractRecord {
        id: row
            .get::<i64>(0)
            .map_err(|e| ContractGenError::Storage(e.to_string()))?,
        fields: NewContract {
            client_name: text(1)?,
            client_address: text(2)?,
            client_email: text(3)?,
            client_phone: text(4)?,
            country: text(5)?,
            fee_amount: text(6)?,
            fees: text(7)?,
            fees_words: text(8)?,
            currency: text(9)?,
            currency_symbol: text(10)?,
            currency_name: text(11)?,
            usd_equivalent: text(12)?,
            contract_duration: text(13)?,
            services: decode_services(&text(14)?)?,
            effective_date: text(15)?,
            file_id: text(16)?,
            docx_path: text(17)?,
            pdf_path: text(18)?,
            docx_sha256: text(19)?,
            pdf_sha256: text(20)?,
        },
        created_at: parse_time(&text(21)?)?,
        updated_at: parse_time(&text(22)?)?,
    })
}
