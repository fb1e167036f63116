//! Application configuration for contractgen.
//!
//! User config lives at `~/.contractgen/contractgen.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContractGenError, Result};
use crate::reference::ReferenceData;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contractgen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contractgen";

// ---------------------------------------------------------------------------
// Config structs (matching contractgen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where templates, clauses, outputs and the database live.
    #[serde(default)]
    pub paths: PathsConfig,

    /// PDF rendering assets and options.
    #[serde(default)]
    pub pdf: PdfConfig,

    /// Request defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extra country alias → jurisdiction entries.
    #[serde(default)]
    pub country_aliases: BTreeMap<String, String>,
}

/// `[paths]` section. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_clause_dir")]
    pub clause_dir: PathBuf,

    #[serde(default = "default_legal_dir")]
    pub legal_dir: PathBuf,

    /// Master DOCX template with `{{TOKEN}}` markers.
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    /// Blob store directory for rendered documents.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            clause_dir: default_clause_dir(),
            legal_dir: default_legal_dir(),
            template_path: default_template_path(),
            output_dir: default_output_dir(),
            database_path: default_database_path(),
        }
    }
}

fn default_clause_dir() -> PathBuf {
    "clauses".into()
}
fn default_legal_dir() -> PathBuf {
    "legal".into()
}
fn default_template_path() -> PathBuf {
    "templates/master_contract.docx".into()
}
fn default_output_dir() -> PathBuf {
    "generated".into()
}
fn default_database_path() -> PathBuf {
    "contracts.db".into()
}

/// `[pdf]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Logo embedded above the title; silently skipped when absent.
    #[serde(default = "default_logo_path", skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<PathBuf>,

    /// TrueType font with Arabic presentation forms, for the bilingual title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtl_font_path: Option<PathBuf>,

    /// Render the bilingual title for every request.
    #[serde(default)]
    pub bilingual: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            logo_path: default_logo_path(),
            rtl_font_path: None,
            bilingual: false,
        }
    }
}

fn default_logo_path() -> Option<PathBuf> {
    Some("assets/logo.png".into())
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_duration")]
    pub duration: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            duration: default_duration(),
        }
    }
}

fn default_currency() -> String {
    "USD".into()
}
fn default_duration() -> String {
    "12 Months".into()
}

impl AppConfig {
    /// Build the immutable reference tables, merging configured aliases.
    pub fn reference_data(&self) -> ReferenceData {
        ReferenceData::with_aliases(&self.country_aliases)
    }

    /// Resolve every configured path against `base`.
    pub fn rebase(mut self, base: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        self.paths.clause_dir = join(&self.paths.clause_dir);
        self.paths.legal_dir = join(&self.paths.legal_dir);
        self.paths.template_path = join(&self.paths.template_path);
        self.paths.output_dir = join(&self.paths.output_dir);
        self.paths.database_path = join(&self.paths.database_path);
        self.pdf.logo_path = self.pdf.logo_path.as_deref().map(join);
        self.pdf.rtl_font_path = self.pdf.rtl_font_path.as_deref().map(join);
        self
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contractgen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContractGenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contractgen/contractgen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContractGenError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContractGenError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| ContractGenError::io(dir, e))?;
        }
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContractGenError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ContractGenError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
