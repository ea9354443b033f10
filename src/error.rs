//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading rules, scanning, moving files or
/// writing reports.
#[derive(Debug, Error)]
pub enum SorterError {
    /// The source path does not exist or is not a directory.
    #[error("Directory '{}' not found", path.display())]
    InvalidSource { path: PathBuf },

    /// Failed to create a destination folder.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to move a file into its destination folder.
    #[error("Failed to move '{}' to {}: {source}", display_name(from), to.display())]
    FileMove {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// A rule names a destination that is not a single folder inside the
    /// source folder.
    #[error("Invalid destination folder name '{folder}'")]
    InvalidFolderName { folder: String },

    /// The rule file exists but could not be read.
    #[error("Failed to read rule file {}: {source}", path.display())]
    RulesRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The rule file is not valid JSON in either supported shape.
    #[error("Invalid rule file {}: {reason}", path.display())]
    RulesParse { path: PathBuf, reason: String },

    /// The rule file could not be written.
    #[error("Failed to write rule file {}: {source}", path.display())]
    RulesWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Invalid glob pattern in the scan filters.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    /// Invalid regex pattern in the scan filters.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    /// A report artifact could not be written.
    #[error("Could not write report to {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, SorterError>;
