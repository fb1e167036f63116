//! End-to-end contract pipeline: request → snapshot → DOCX → PDF → record.
//!
//! [`ContractService`] owns the record store, the blob store and the clause
//! stores, and exposes the operations of the request surface: generate,
//! list, get, download, delete and stats.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use contractgen_clauses::{ClauseStore, FsClauseStore};
use contractgen_pdf::PdfOptions;
use contractgen_shared::{
    AppConfig, ContractGenError, ContractPage, ContractRecord, ContractRequest, ContractStats,
    DocumentFormat, FileId, ReferenceData, Result,
};
use contractgen_storage::{BlobStore, FsBlobStore, Storage, sha256_hex};

use crate::snapshot::{ArtifactRefs, ContractSnapshot, SnapshotBuilder};

/// Default page size for [`ContractService::list`].
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Largest page size [`ContractService::list`] will serve.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Everything a [`ContractService`] is built from.
pub struct ServiceComponents {
    pub storage: Storage,
    pub blobs: Arc<dyn BlobStore>,
    pub clauses: Arc<dyn ClauseStore>,
    pub legal: Arc<dyn ClauseStore>,
    pub reference: Arc<ReferenceData>,
    /// Master DOCX template with `{{TOKEN}}` markers.
    pub template_path: PathBuf,
    pub pdf: PdfOptions,
}

/// Result of one generation.
#[derive(Debug)]
pub struct GeneratedContract {
    pub record: ContractRecord,
    pub file_id: FileId,
    pub docx_path: PathBuf,
    pub pdf_path: PathBuf,
    /// Tokens left in the DOCX because no value was supplied for them.
    pub unresolved_tokens: Vec<String>,
    /// Optional PDF assets (logo, RTL font) left out, as messages.
    pub skipped_assets: Vec<String>,
    pub elapsed: Duration,
}

/// A stored artifact ready to hand to a client.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
    pub format: DocumentFormat,
}

/// What [`ContractService::delete`] removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: i64,
    pub blobs_removed: usize,
}

/// Progress callback for reporting generation status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the generation completes.
    fn done(&self, result: &GeneratedContract);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &GeneratedContract) {}
}

/// The contract generation service.
pub struct ContractService {
    storage: Storage,
    blobs: Arc<dyn BlobStore>,
    builder: SnapshotBuilder,
    template_path: PathBuf,
    pdf: PdfOptions,
}

impl ContractService {
    pub fn new(components: ServiceComponents) -> Self {
        Self {
            builder: SnapshotBuilder::new(
                components.reference,
                components.clauses,
                components.legal,
            ),
            storage: components.storage,
            blobs: components.blobs,
            template_path: components.template_path,
            pdf: components.pdf,
        }
    }

    /// Open the service described by `config` in read-write mode.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let storage = Storage::open(&config.paths.database_path).await?;
        Self::from_config(config, storage)
    }

    /// Open the service for read-only commands (list, show, download, stats).
    pub async fn open_readonly(config: &AppConfig) -> Result<Self> {
        let storage = Storage::open_readonly(&config.paths.database_path).await?;
        Self::from_config(config, storage)
    }

    fn from_config(config: &AppConfig, storage: Storage) -> Result<Self> {
        Ok(Self::new(ServiceComponents {
            storage,
            blobs: Arc::new(FsBlobStore::open(&config.paths.output_dir)?),
            clauses: Arc::new(FsClauseStore::new(&config.paths.clause_dir)),
            legal: Arc::new(FsClauseStore::new(&config.paths.legal_dir)),
            reference: Arc::new(config.reference_data()),
            template_path: config.paths.template_path.clone(),
            pdf: PdfOptions {
                bilingual: config.pdf.bilingual,
                logo_path: config.pdf.logo_path.clone(),
                rtl_font_path: config.pdf.rtl_font_path.clone(),
            },
        }))
    }

    pub fn reference(&self) -> &ReferenceData {
        self.builder.reference()
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Generate both documents for `request` and persist the record.
    ///
    /// Blobs written before a failing step are removed before the error is
    /// returned, so a failed generation leaves nothing behind.
    #[instrument(skip_all, fields(client = %request.client_name, currency = %request.currency))]
    pub async fn generate(
        &self,
        request: &ContractRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<GeneratedContract> {
        let start = Instant::now();

        progress.phase("Validating request");
        let snapshot = self.builder.build(request)?;

        progress.phase("Loading template");
        let template = contractgen_docx::load_template(&self.template_path)?;

        let file_id = FileId::new();
        info!(%file_id, "starting generation");

        let mut written = Vec::new();
        let outcome = self
            .write_artifacts(&snapshot, &template, &file_id, &mut written, progress)
            .await;
        match outcome {
            Ok(mut generated) => {
                generated.elapsed = start.elapsed();
                info!(
                    id = generated.record.id,
                    %file_id,
                    elapsed_ms = generated.elapsed.as_millis() as u64,
                    "contract generated"
                );
                progress.done(&generated);
                Ok(generated)
            }
            Err(e) => {
                for format in written {
                    if self.blobs.delete(&file_id, format) {
                        debug!(%file_id, %format, "rolled back blob");
                    }
                }
                warn!(%file_id, error = %e, "generation failed, artifacts removed");
                Err(e)
            }
        }
    }

    async fn write_artifacts(
        &self,
        snapshot: &ContractSnapshot,
        template: &[u8],
        file_id: &FileId,
        written: &mut Vec<DocumentFormat>,
        progress: &dyn ProgressReporter,
    ) -> Result<GeneratedContract> {
        progress.phase("Rendering DOCX");
        let docx = contractgen_docx::render(template, &snapshot.replacements())?;
        if !docx.unresolved.is_empty() {
            warn!(tokens = ?docx.unresolved, "template tokens without values");
        }
        let docx_path = self.blobs.put(file_id, DocumentFormat::Docx, &docx.bytes)?;
        written.push(DocumentFormat::Docx);

        progress.phase("Rendering PDF");
        let options = PdfOptions {
            bilingual: self.pdf.bilingual || snapshot.request.bilingual,
            ..self.pdf.clone()
        };
        let pdf = contractgen_pdf::render(&snapshot.pdf_contract(), &options)?;
        let pdf_path = self.blobs.put(file_id, DocumentFormat::Pdf, &pdf.bytes)?;
        written.push(DocumentFormat::Pdf);

        progress.phase("Saving record");
        let new = snapshot.new_contract(ArtifactRefs {
            file_id: file_id.to_string(),
            docx_path: docx_path.display().to_string(),
            pdf_path: pdf_path.display().to_string(),
            docx_sha256: sha256_hex(&docx.bytes),
            pdf_sha256: sha256_hex(&pdf.bytes),
        });
        let record = self.storage.insert_contract(&new).await?;

        Ok(GeneratedContract {
            record,
            file_id: file_id.clone(),
            docx_path,
            pdf_path,
            unresolved_tokens: docx.unresolved,
            skipped_assets: pdf.skipped_assets.iter().map(ToString::to_string).collect(),
            elapsed: Duration::ZERO,
        })
    }

    /// One page of records, newest first. `limit` is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub async fn list(&self, offset: u64, limit: u64) -> Result<ContractPage> {
        self.storage
            .list_contracts(offset, limit.clamp(1, MAX_PAGE_SIZE))
            .await
    }

    /// Fetch a record, failing with `RecordNotFound` when absent.
    pub async fn get(&self, id: i64) -> Result<ContractRecord> {
        self.storage
            .get_contract(id)
            .await?
            .ok_or(ContractGenError::RecordNotFound { id })
    }

    /// Fetch one artifact of a record. The format is checked before the
    /// record is looked up.
    #[instrument(skip(self))]
    pub async fn download(&self, id: i64, format: &str) -> Result<Download> {
        let format: DocumentFormat = format.parse()?;
        let record = self.get(id).await?;
        let bytes = self.blobs.get(&record.file_id()?, format)?;
        debug!(id, %format, bytes = bytes.len(), "artifact loaded");
        Ok(Download {
            bytes,
            file_name: format.download_name(),
            mime_type: format.mime_type(),
            format,
        })
    }

    /// Remove a record and both of its blobs.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome> {
        let record = self.get(id).await?;
        let file_id = record.file_id()?;

        if !self.storage.delete_contract(id).await? {
            return Err(ContractGenError::RecordNotFound { id });
        }

        let mut blobs_removed = 0;
        for format in [DocumentFormat::Docx, DocumentFormat::Pdf] {
            if self.blobs.delete(&file_id, format) {
                blobs_removed += 1;
            } else {
                warn!(id, %file_id, %format, "blob already missing");
            }
        }
        info!(id, blobs_removed, "contract deleted");
        Ok(DeleteOutcome { id, blobs_removed })
    }

    pub async fn stats(&self) -> Result<ContractStats> {
        self.storage.contract_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contractgen_clauses::bundle::{default_clauses, default_legal_frameworks};
    use contractgen_docx::template::default_template;
    use std::sync::Mutex;

    struct Workspace {
        root: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let root = std::env::temp_dir()
                .join(format!("contractgen-pipeline-{}", uuid::Uuid::now_v7()));
            std::fs::create_dir_all(&root).unwrap();
            std::fs::write(root.join("master.docx"), default_template().unwrap()).unwrap();
            Self { root }
        }

        fn output(&self) -> PathBuf {
            self.root.join("generated")
        }

        async fn service(&self) -> ContractService {
            let blobs = Arc::new(FsBlobStore::open(self.output()).unwrap());
            self.service_with(blobs).await
        }

        async fn service_with(&self, blobs: Arc<dyn BlobStore>) -> ContractService {
            ContractService::new(ServiceComponents {
                storage: Storage::open(&self.root.join("contracts.db")).await.unwrap(),
                blobs,
                clauses: Arc::new(default_clauses()),
                legal: Arc::new(default_legal_frameworks()),
                reference: Arc::new(ReferenceData::builtin()),
                template_path: self.root.join("master.docx"),
                pdf: PdfOptions::default(),
            })
        }

        fn blob_count(&self) -> usize {
            std::fs::read_dir(self.output())
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    impl Drop for Workspace {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    /// Delegates to a real store but refuses PDF writes.
    struct PdfRejectingStore {
        inner: FsBlobStore,
        attempts: Mutex<usize>,
    }

    impl BlobStore for PdfRejectingStore {
        fn put(&self, file_id: &FileId, format: DocumentFormat, bytes: &[u8]) -> Result<PathBuf> {
            *self.attempts.lock().unwrap() += 1;
            match format {
                DocumentFormat::Pdf => Err(ContractGenError::Render("disk full".into())),
                DocumentFormat::Docx => self.inner.put(file_id, format, bytes),
            }
        }

        fn get(&self, file_id: &FileId, format: DocumentFormat) -> Result<Vec<u8>> {
            self.inner.get(file_id, format)
        }

        fn delete(&self, file_id: &FileId, format: DocumentFormat) -> bool {
            self.inner.delete(file_id, format)
        }
    }

    fn request() -> ContractRequest {
        ContractRequest {
            client_name: "Acme Trading W.L.L.".into(),
            client_address: "Road 34, Manama".into(),
            client_email: "legal@acme.example".into(),
            client_phone: "+973 1700 0000".into(),
            country: "Bahrain".into(),
            fees: "2,000".into(),
            currency: "USD".into(),
            duration: "12 Months".into(),
            effective_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            services: vec![
                "it_app_development".into(),
                "finance_bookkeeping".into(),
                "it_support".into(),
            ],
            bilingual: false,
        }
    }

    #[tokio::test]
    async fn generate_writes_both_artifacts_and_record() {
        let ws = Workspace::new();
        let service = ws.service().await;

        let generated = service.generate(&request(), &SilentProgress).await.unwrap();
        assert!(generated.unresolved_tokens.is_empty());
        assert!(generated.skipped_assets.is_empty());
        assert_eq!(generated.record.fields.fees, "2,000.00");
        assert_eq!(generated.record.fields.usd_equivalent, "2,000.00");
        assert_eq!(generated.record.fields.currency_symbol, "$");
        assert_eq!(generated.record.fields.file_id, generated.file_id.to_string());

        let docx = std::fs::read(&generated.docx_path).unwrap();
        assert_eq!(generated.record.fields.docx_sha256, sha256_hex(&docx));
        let text = contractgen_docx::extract_text(&docx).unwrap().join("\n");
        assert!(contractgen_docx::find_tokens(&text).is_empty());
        assert!(text.contains("Acme Trading W.L.L."));

        let pdf = std::fs::read(&generated.pdf_path).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(ws.blob_count(), 2);
    }

    #[tokio::test]
    async fn identical_requests_get_distinct_files_and_equal_amounts() {
        let ws = Workspace::new();
        let service = ws.service().await;

        let a = service.generate(&request(), &SilentProgress).await.unwrap();
        let b = service.generate(&request(), &SilentProgress).await.unwrap();

        assert_ne!(a.file_id, b.file_id);
        assert_ne!(a.record.id, b.record.id);
        assert_eq!(a.record.fields.fees, b.record.fields.fees);
        assert_eq!(a.record.fields.fees_words, b.record.fields.fees_words);
        assert_eq!(a.record.fields.usd_equivalent, b.record.fields.usd_equivalent);
        assert_eq!(ws.blob_count(), 4);
    }

    #[tokio::test]
    async fn invalid_request_writes_nothing() {
        let ws = Workspace::new();
        let service = ws.service().await;

        let mut req = request();
        req.fees = "two thousand".into();
        let err = service.generate(&req, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, ContractGenError::InvalidAmount { .. }));
        assert_eq!(ws.blob_count(), 0);
        assert_eq!(service.list(0, 10).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn bilingual_without_font_reports_skipped_title() {
        let ws = Workspace::new();
        let service = ws.service().await;

        let mut req = request();
        req.bilingual = true;
        let generated = service.generate(&req, &SilentProgress).await.unwrap();
        assert_eq!(generated.skipped_assets.len(), 1);
        assert!(generated.skipped_assets[0].contains("rtl_font_path"));
        assert!(std::fs::read(&generated.pdf_path).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn malformed_service_ids_only_writes_nothing() {
        let ws = Workspace::new();
        let service = ws.service().await;

        let mut req = request();
        req.services = vec!["support".into(), "finance".into()];
        let err = service.generate(&req, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, ContractGenError::MissingServices));
        assert_eq!(ws.blob_count(), 0);
        assert_eq!(service.list(0, 10).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn missing_template_is_fatal() {
        let ws = Workspace::new();
        std::fs::remove_file(ws.root.join("master.docx")).unwrap();
        let service = ws.service().await;

        let err = service.generate(&request(), &SilentProgress).await.unwrap_err();
        assert!(matches!(err, ContractGenError::TemplateLoadFailure { .. }));
        assert_eq!(ws.blob_count(), 0);
    }

    #[tokio::test]
    async fn failed_pdf_write_removes_docx() {
        let ws = Workspace::new();
        let store = Arc::new(PdfRejectingStore {
            inner: FsBlobStore::open(ws.output()).unwrap(),
            attempts: Mutex::new(0),
        });
        let service = ws.service_with(store.clone()).await;

        let err = service.generate(&request(), &SilentProgress).await.unwrap_err();
        assert!(matches!(err, ContractGenError::Render(_)));
        assert_eq!(*store.attempts.lock().unwrap(), 2);
        assert_eq!(ws.blob_count(), 0);
        assert_eq!(service.stats().await.unwrap().total_contracts, 0);
    }

    #[tokio::test]
    async fn download_checks_format_then_record() {
        let ws = Workspace::new();
        let service = ws.service().await;
        let generated = service.generate(&request(), &SilentProgress).await.unwrap();
        let id = generated.record.id;

        let err = service.download(id, "txt").await.unwrap_err();
        assert!(matches!(err, ContractGenError::FormatNotSupported { .. }));
        let err = service.download(id + 100, "txt").await.unwrap_err();
        assert!(matches!(err, ContractGenError::FormatNotSupported { .. }));
        let err = service.download(id + 100, "pdf").await.unwrap_err();
        assert!(matches!(err, ContractGenError::RecordNotFound { .. }));

        let pdf = service.download(id, "PDF").await.unwrap();
        assert_eq!(pdf.mime_type, "application/pdf");
        assert_eq!(pdf.file_name, "Service_Agreement.pdf");
        assert_eq!(pdf.bytes, std::fs::read(&generated.pdf_path).unwrap());

        let docx = service.download(id, "docx").await.unwrap();
        assert_eq!(docx.file_name, "Service_Agreement.docx");
    }

    #[tokio::test]
    async fn delete_removes_blobs_and_row() {
        let ws = Workspace::new();
        let service = ws.service().await;
        let generated = service.generate(&request(), &SilentProgress).await.unwrap();
        let id = generated.record.id;

        let outcome = service.delete(id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome { id, blobs_removed: 2 });
        assert!(!generated.docx_path.exists());
        assert!(!generated.pdf_path.exists());

        assert!(matches!(
            service.get(id).await.unwrap_err(),
            ContractGenError::RecordNotFound { .. }
        ));
        assert!(matches!(
            service.delete(id).await.unwrap_err(),
            ContractGenError::RecordNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn stats_aggregate_generations() {
        let ws = Workspace::new();
        let service = ws.service().await;

        service.generate(&request(), &SilentProgress).await.unwrap();
        let mut eur = request();
        eur.fees = "1500.50".into();
        eur.currency = "EUR".into();
        eur.services = vec!["it_support".into()];
        service.generate(&eur, &SilentProgress).await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_contracts, 2);
        assert_eq!(stats.revenue_by_currency["USD"], "2000.00");
        assert_eq!(stats.revenue_by_currency["EUR"], "1500.50");
        assert_eq!(stats.service_counts["it_support"], 2);
        assert_eq!(stats.service_counts["finance_bookkeeping"], 1);
    }

    #[tokio::test]
    async fn list_clamps_page_size() {
        let ws = Workspace::new();
        let service = ws.service().await;
        service.generate(&request(), &SilentProgress).await.unwrap();

        let page = service.list(0, 0).await.unwrap();
        assert_eq!(page.limit, 1);
        assert_eq!(page.items.len(), 1);
        let page = service.list(0, 10_000).await.unwrap();
        assert_eq!(page.limit, MAX_PAGE_SIZE);
    }
}
