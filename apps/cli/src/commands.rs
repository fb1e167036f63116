//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use contractgen_clauses::FsClauseStore;
use contractgen_core::pipeline::{
    ContractService, DEFAULT_PAGE_SIZE, GeneratedContract, ProgressReporter,
};
use contractgen_core::{SnapshotBuilder, build_catalog, init_assets};
use contractgen_shared::{
    AppConfig, ContractRecord, ContractRequest, ContractStats, config_file_path, init_config_at,
    load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// contractgen — international service agreements as DOCX and PDF.
#[derive(Parser)]
#[command(
    name = "contractgen",
    version,
    about = "Generate international service agreements as DOCX and PDF and keep a record of each.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.contractgen/contractgen.toml).
    #[arg(long, global = true, env = "CONTRACTGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a contract from request fields or a JSON request file.
    Generate(GenerateArgs),

    /// List stored contracts, newest first.
    List {
        #[arg(long, default_value_t = 0)]
        offset: u64,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u64,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one stored contract.
    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Write a stored document to disk.
    Download {
        id: i64,

        /// docx or pdf.
        #[arg(short, long, default_value = "pdf")]
        format: String,

        /// Output file (defaults to Service_Agreement.<format>).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Delete a contract and its documents.
    Delete { id: i64 },

    /// Totals per currency and service selection counts.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Supported currencies, service categories and jurisdictions.
    Catalog {
        #[arg(long)]
        json: bool,
    },

    /// Write the stock clauses, legal texts and master template.
    Init {
        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
    },

    /// Database maintenance.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `generate`.
#[derive(clap::Args)]
pub(crate) struct GenerateArgs {
    /// JSON file holding a full request; field flags are ignored when set.
    #[arg(long, value_name = "PATH")]
    pub from: Option<PathBuf>,

    #[arg(long, required_unless_present = "from")]
    pub client_name: Option<String>,

    #[arg(long, default_value = "")]
    pub client_address: String,

    #[arg(long, default_value = "")]
    pub client_email: String,

    #[arg(long, default_value = "")]
    pub client_phone: String,

    #[arg(long, required_unless_present = "from")]
    pub country: Option<String>,

    /// Fee as typed, e.g. `2,000` or `1500.50`.
    #[arg(long, required_unless_present = "from")]
    pub fees: Option<String>,

    /// Currency code (defaults to the configured currency).
    #[arg(long)]
    pub currency: Option<String>,

    /// Duration label (defaults to the configured duration).
    #[arg(long)]
    pub duration: Option<String>,

    /// Effective date, YYYY-MM-DD (defaults to today).
    #[arg(long)]
    pub effective_date: Option<NaiveDate>,

    /// Service identifier `category_servicename`; repeat for several.
    #[arg(short, long = "service", value_name = "ID")]
    pub services: Vec<String>,

    /// Add the Arabic title line to the PDF.
    #[arg(long)]
    pub bilingual: bool,

    /// Print the derived values without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the stored record as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Database subcommands.
#[derive(Subcommand)]
pub(crate) enum DbAction {
    /// Move the database to `<path>.backup` and recreate the schema.
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contractgen=info",
        1 => "contractgen=debug",
        _ => "contractgen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
        command => {
            let config = resolve_config(config_path.as_deref())?;
            match command {
                Command::Generate(args) => cmd_generate(&config, args).await,
                Command::List {
                    offset,
                    limit,
                    json,
                } => cmd_list(&config, offset, limit, json).await,
                Command::Show { id, json } => cmd_show(&config, id, json).await,
                Command::Download { id, format, out } => {
                    cmd_download(&config, id, &format, out).await
                }
                Command::Delete { id } => cmd_delete(&config, id).await,
                Command::Stats { json } => cmd_stats(&config, json).await,
                Command::Catalog { json } => cmd_catalog(&config, json),
                Command::Init { force } => cmd_init(&config, force),
                Command::Db {
                    action: DbAction::Reset { yes },
                } => cmd_db_reset(&config, yes).await,
                Command::Config { .. } => Ok(()),
            }
        }
    }
}

/// Load the config (flag path or default location) with paths made absolute
/// against the working directory.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    Ok(config.rebase(&cwd))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn build_request(config: &AppConfig, args: &GenerateArgs) -> Result<ContractRequest> {
    if let Some(path) = &args.from {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read request file {}", path.display()))?;
        let request: ContractRequest = serde_json::from_str(&content)
            .wrap_err_with(|| format!("invalid request file {}", path.display()))?;
        return Ok(request);
    }

    let required = |value: &Option<String>, flag: &str| {
        value
            .clone()
            .ok_or_else(|| eyre!("--{flag} is required without --from"))
    };

    Ok(ContractRequest {
        client_name: required(&args.client_name, "client-name")?,
        client_address: args.client_address.clone(),
        client_email: args.client_email.clone(),
        client_phone: args.client_phone.clone(),
        country: required(&args.country, "country")?,
        fees: required(&args.fees, "fees")?,
        currency: args
            .currency
            .clone()
            .unwrap_or_else(|| config.defaults.currency.clone()),
        duration: args
            .duration
            .clone()
            .unwrap_or_else(|| config.defaults.duration.clone()),
        effective_date: args
            .effective_date
            .unwrap_or_else(|| Local::now().date_naive()),
        services: args.services.clone(),
        bilingual: args.bilingual,
    })
}

async fn cmd_generate(config: &AppConfig, args: GenerateArgs) -> Result<()> {
    let request = build_request(config, &args)?;

    if args.dry_run {
        let snapshot = SnapshotBuilder::from_config(config).build(&request)?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let service = ContractService::open(config).await?;

    info!(
        client = %request.client_name,
        country = %request.country,
        services = request.services.len(),
        "generating contract"
    );

    let reporter = CliProgress::new();
    let result = service.generate(&request, &reporter).await;
    reporter.finish();
    let generated = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&generated.record)?);
        return Ok(());
    }

    let fields = &generated.record.fields;
    println!();
    println!("  Contract generated successfully!");
    println!("  ID:       {}", generated.record.id);
    println!("  File ID:  {}", generated.file_id);
    println!("  Client:   {}", fields.client_name);
    println!(
        "  Fees:     {}{} ({})",
        fields.currency_symbol, fields.fees, fields.currency
    );
    println!("  In words: {}", fields.fees_words);
    println!("  USD:      ${}", fields.usd_equivalent);
    println!("  DOCX:     {}", generated.docx_path.display());
    println!("  PDF:      {}", generated.pdf_path.display());
    if !generated.unresolved_tokens.is_empty() {
        println!(
            "  Unfilled: {} (template tokens with no value)",
            generated.unresolved_tokens.join(", ")
        );
    }
    for skipped in &generated.skipped_assets {
        println!("  Skipped:  {skipped}");
    }
    println!("  Time:     {:.1}s", generated.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_list(config: &AppConfig, offset: u64, limit: u64, json: bool) -> Result<()> {
    let service = ContractService::open_readonly(config).await?;
    let page = service.list(offset, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.items.is_empty() {
        println!("No contracts found.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<30}  {:<16}  {:>16}  {:<10}",
        "ID", "CLIENT", "COUNTRY", "FEES", "CREATED"
    );
    for record in &page.items {
        let f = &record.fields;
        println!(
            "{:>5}  {:<30}  {:<16}  {:>16}  {:<10}",
            record.id,
            truncate(&f.client_name, 30),
            truncate(&f.country, 16),
            format!("{} {}", f.fees, f.currency),
            record.created_at.format("%Y-%m-%d"),
        );
    }
    println!(
        "\nShowing {}-{} of {}",
        page.offset + 1,
        page.offset + page.items.len() as u64,
        page.total
    );
    Ok(())
}

async fn cmd_show(config: &AppConfig, id: i64, json: bool) -> Result<()> {
    let service = ContractService::open_readonly(config).await?;
    let record = service.get(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &ContractRecord) {
    let f = &record.fields;
    println!();
    println!("  Contract #{}", record.id);
    println!("  Client:    {}", f.client_name);
    println!("  Address:   {}", f.client_address);
    println!("  Email:     {}", f.client_email);
    println!("  Phone:     {}", f.client_phone);
    println!("  Country:   {}", f.country);
    println!("  Fees:      {}{} ({})", f.currency_symbol, f.fees, f.currency);
    println!("  In words:  {}", f.fees_words);
    println!("  USD:       ${}", f.usd_equivalent);
    println!("  Duration:  {}", f.contract_duration);
    println!("  Effective: {}", f.effective_date);
    println!("  Services:  {}", f.services.join(", "));
    println!("  DOCX:      {}", f.docx_path);
    println!("  PDF:       {}", f.pdf_path);
    println!("  Created:   {}", record.created_at.to_rfc3339());
    println!();
}

async fn cmd_download(
    config: &AppConfig,
    id: i64,
    format: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let service = ContractService::open_readonly(config).await?;
    let download = service.download(id, format).await?;

    let path = out.unwrap_or_else(|| PathBuf::from(&download.file_name));
    std::fs::write(&path, &download.bytes)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;

    info!(id, format = %download.format, bytes = download.bytes.len(), "document written");
    println!(
        "Wrote {} ({}, {} bytes)",
        path.display(),
        download.mime_type,
        download.bytes.len()
    );
    Ok(())
}

async fn cmd_delete(config: &AppConfig, id: i64) -> Result<()> {
    let service = ContractService::open(config).await?;
    let outcome = service.delete(id).await?;
    println!(
        "Deleted contract {} ({} document(s) removed)",
        outcome.id, outcome.blobs_removed
    );
    Ok(())
}

/// Stats from the configured database. A database that was never created
/// holds no contracts.
async fn load_stats(config: &AppConfig) -> Result<ContractStats> {
    let path = &config.paths.database_path;
    if !path.exists() {
        debug!(path = %path.display(), "no database yet, reporting empty stats");
        return Ok(ContractStats::default());
    }
    let service = ContractService::open_readonly(config).await?;
    Ok(service.stats().await?)
}

async fn cmd_stats(config: &AppConfig, json: bool) -> Result<()> {
    let stats = load_stats(config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("  Total contracts: {}", stats.total_contracts);
    if !stats.revenue_by_currency.is_empty() {
        println!();
        println!("  Revenue by currency:");
        for (code, total) in &stats.revenue_by_currency {
            println!("    {code:<5} {total:>18}");
        }
    }
    if !stats.service_counts.is_empty() {
        println!();
        println!("  Services:");
        let mut counts: Vec<_> = stats.service_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (service, count) in counts {
            println!("    {service:<32} {count:>5}");
        }
    }
    println!();
    Ok(())
}

fn cmd_catalog(config: &AppConfig, json: bool) -> Result<()> {
    let reference = config.reference_data();
    let clauses = FsClauseStore::new(&config.paths.clause_dir);
    let legal = FsClauseStore::new(&config.paths.legal_dir);
    let catalog = build_catalog(&reference, &clauses, &legal);

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!();
    println!("  Currencies:");
    for c in &catalog.currencies {
        println!("    {:<4} {:<6} {:<22} 1 = {} USD", c.code, c.symbol.trim(), c.name, c.rate);
    }
    println!();
    println!("  Services:");
    for category in &catalog.categories {
        println!("    {} ({})", category.display_name, category.id);
        if category.services.is_empty() {
            println!("      (no clauses in {})", config.paths.clause_dir.display());
        }
        for id in &category.services {
            println!("      {id}");
        }
    }
    println!();
    println!("  Jurisdictions:");
    for j in &catalog.jurisdictions {
        let marker = if j.has_clause { "" } else { "  (missing clause)" };
        println!("    {}{marker}", j.name);
    }
    println!();
    Ok(())
}

fn cmd_init(config: &AppConfig, force: bool) -> Result<()> {
    let report = init_assets(&config.paths, force)?;
    println!();
    println!("  Clauses written: {} ({})", report.clauses_written, config.paths.clause_dir.display());
    println!("  Legal written:   {} ({})", report.legal_written, config.paths.legal_dir.display());
    match &report.template {
        Some(path) => println!("  Template:        {}", path.display()),
        None => println!("  Template:        kept existing"),
    }
    println!("  Output dir:      {}", report.output_dir.display());
    println!();
    Ok(())
}

async fn cmd_db_reset(config: &AppConfig, yes: bool) -> Result<()> {
    if !yes {
        return Err(eyre!(
            "refusing to reset {} without --yes",
            config.paths.database_path.display()
        ));
    }
    let (_storage, backup) =
        contractgen_storage::reset_database(&config.paths.database_path).await?;
    match backup {
        Some(path) => println!("Database reset; previous data kept at {}", path.display()),
        None => println!("Database created at {}", config.paths.database_path.display()),
    }
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &GeneratedContract) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_build_a_request() {
        let cli = Cli::parse_from([
            "contractgen",
            "generate",
            "--client-name",
            "Acme Ltd",
            "--country",
            "UAE",
            "--fees",
            "2,000",
            "--effective-date",
            "2025-03-01",
            "-s",
            "it_support",
            "--service",
            "finance_bookkeeping",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let request = build_request(&AppConfig::default(), &args).unwrap();
        assert_eq!(request.currency, "USD");
        assert_eq!(request.duration, "12 Months");
        assert_eq!(request.services, vec!["it_support", "finance_bookkeeping"]);
        assert_eq!(request.effective_date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn generate_requires_fields_without_from() {
        let result = Cli::try_parse_from(["contractgen", "generate", "--country", "UAE"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["contractgen", "generate", "--from", "req.json"]);
        assert!(result.is_ok());
    }

    fn scratch_config() -> (PathBuf, AppConfig) {
        let root = std::env::temp_dir().join(format!("contractgen-cli-{}", uuid::Uuid::now_v7()));
        let mut config = AppConfig::default();
        config.paths.clause_dir = root.join("clauses");
        config.paths.legal_dir = root.join("legal");
        config.paths.template_path = root.join("master_contract.docx");
        config.paths.output_dir = root.join("generated");
        config.paths.database_path = root.join("contracts.db");
        (root, config)
    }

    #[tokio::test]
    async fn dry_run_creates_no_files() {
        let (root, config) = scratch_config();
        let cli = Cli::parse_from([
            "contractgen",
            "generate",
            "--client-name",
            "Acme Ltd",
            "--country",
            "UAE",
            "--fees",
            "2,000",
            "-s",
            "it_support",
            "--dry-run",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };

        cmd_generate(&config, args).await.unwrap();
        assert!(!config.paths.database_path.exists());
        assert!(!config.paths.output_dir.exists());
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn stats_without_database_is_empty() {
        let (root, config) = scratch_config();
        let stats = load_stats(&config).await.unwrap();
        assert_eq!(stats.total_contracts, 0);
        assert!(stats.revenue_by_currency.is_empty());
        assert!(!root.exists());
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
