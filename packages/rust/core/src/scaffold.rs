//! `contractgen init`: write the stock clause bundle, legal texts and master
//! template so a fresh checkout can generate immediately.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument};

use contractgen_clauses::bundle::{default_clauses, default_legal_frameworks};
use contractgen_shared::{ContractGenError, PathsConfig, Result};

/// What [`init_assets`] wrote.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScaffoldReport {
    pub clauses_written: usize,
    pub legal_written: usize,
    /// Set when the master template was written.
    pub template: Option<PathBuf>,
    pub output_dir: PathBuf,
}

/// Populate the configured directories. Existing files are kept unless
/// `overwrite` is set.
#[instrument(skip_all, fields(overwrite = overwrite))]
pub fn init_assets(paths: &PathsConfig, overwrite: bool) -> Result<ScaffoldReport> {
    let clauses_written = default_clauses().write_to(&paths.clause_dir, overwrite)?;
    let legal_written = default_legal_frameworks().write_to(&paths.legal_dir, overwrite)?;

    let template_path = &paths.template_path;
    let template = if template_path.exists() && !overwrite {
        debug!(path = %template_path.display(), "template exists, keeping");
        None
    } else {
        if let Some(parent) = template_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ContractGenError::io(parent, e))?;
            }
        }
        let bytes = contractgen_docx::template::default_template()?;
        std::fs::write(template_path, bytes).map_err(|e| ContractGenError::io(template_path, e))?;
        Some(template_path.clone())
    };

    std::fs::create_dir_all(&paths.output_dir)
        .map_err(|e| ContractGenError::io(&paths.output_dir, e))?;

    info!(clauses_written, legal_written, template = template.is_some(), "assets initialized");
    Ok(ScaffoldReport {
        clauses_written,
        legal_written,
        template,
        output_dir: paths.output_dir.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contractgen_clauses::{ClauseStore, FsClauseStore};

    fn paths() -> PathsConfig {
        let root = std::env::temp_dir().join(format!("contractgen-init-{}", uuid::Uuid::now_v7()));
        PathsConfig {
            clause_dir: root.join("clauses"),
            legal_dir: root.join("legal"),
            template_path: root.join("templates").join("master_contract.docx"),
            output_dir: root.join("generated"),
            database_path: root.join("contracts.db"),
        }
    }

    #[test]
    fn writes_everything_once() {
        let paths = paths();

        let first = init_assets(&paths, false).unwrap();
        assert!(first.clauses_written > 0);
        assert!(first.legal_written > 0);
        assert_eq!(first.template.as_deref(), Some(paths.template_path.as_path()));
        assert!(paths.output_dir.is_dir());

        let clauses = FsClauseStore::new(&paths.clause_dir);
        assert!(clauses.keys("it").contains(&"support".to_string()));
        let legal = FsClauseStore::new(&paths.legal_dir);
        assert!(legal.load("default").unwrap().is_some());
        contractgen_docx::load_template(&paths.template_path).unwrap();

        let second = init_assets(&paths, false).unwrap();
        assert_eq!(second.clauses_written, 0);
        assert_eq!(second.legal_written, 0);
        assert!(second.template.is_none());

        let forced = init_assets(&paths, true).unwrap();
        assert_eq!(forced.clauses_written, first.clauses_written);
        assert!(forced.template.is_some());
    }

    #[test]
    fn edited_clauses_survive_reinit() {
        let paths = paths();
        init_assets(&paths, false).unwrap();
        let file = paths.clause_dir.join("it").join("support.txt");
        std::fs::write(&file, "Custom support terms.").unwrap();

        init_assets(&paths, false).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "Custom support terms.");
    }
}
