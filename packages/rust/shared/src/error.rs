//! Error types for contractgen.
//!
//! Library crates use [`ContractGenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all contractgen operations.
#[derive(Debug, thiserror::Error)]
pub enum ContractGenError {
    /// Fee amount is not a number or is not strictly positive.
    #[error("invalid amount '{raw}': {reason}")]
    InvalidAmount { raw: String, reason: String },

    /// Currency code is not in the static currency table.
    #[error("unsupported currency '{code}'")]
    UnsupportedCurrency { code: String },

    /// A contract request selected no services.
    #[error("at least one service must be selected")]
    MissingServices,

    /// The binary DOCX template could not be read or is not a valid package.
    #[error("failed to load template {path:?}: {message}")]
    TemplateLoadFailure { path: PathBuf, message: String },

    /// An optional rendering asset (logo, font) could not be used.
    #[error("failed to load asset {path:?}: {message}")]
    AssetLoadFailure { path: PathBuf, message: String },

    /// A clause lookup key had no text behind it.
    #[error("clause '{key}' not found")]
    ClauseMissing { key: String },

    /// No contract record exists with the given id.
    #[error("contract {id} not found")]
    RecordNotFound { id: i64 },

    /// Download format outside `docx` / `pdf`.
    #[error("format '{format}' is not supported (expected docx or pdf)")]
    FormatNotSupported { format: String },

    /// A record points at a blob that no longer exists.
    #[error("blob {file_id} ({format}) not found")]
    BlobNotFound { file_id: String, format: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Document rendering error (zip/XML/PDF emission).
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Any other data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContractGenError>;

impl ContractGenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an invalid-amount error for the raw input.
    pub fn invalid_amount(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Create a template load failure for `path`.
    pub fn template(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::TemplateLoadFailure {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an asset load failure for `path`.
    pub fn asset(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::AssetLoadFailure {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ContractGenError::invalid_amount("abc", "not a number");
        assert_eq!(err.to_string(), "invalid amount 'abc': not a number");

        let err = ContractGenError::UnsupportedCurrency { code: "XYZ".into() };
        assert!(err.to_string().contains("XYZ"));

        let err = ContractGenError::RecordNotFound { id: 42 };
        assert_eq!(err.to_string(), "contract 42 not found");
    }
}
