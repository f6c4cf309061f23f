//! Error types for foldertidy.
//!
//! Per-file problems during an organize or undo pass are not errors: they are
//! recorded as `Failed` move records or failed undo entries and the pass
//! continues. The types here cover the conditions that stop an operation as
//! a whole: an unusable root directory, a missing or corrupted operation log,
//! and invalid configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for organize and undo operations.
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Stopped after moving {file} to {destination}: the operation log could not be saved, so this last move is not recorded for undo: {error}"
    )]
    Checkpoint {
        file: PathBuf,
        destination: PathBuf,
        #[source]
        error: LogError,
    },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors reading, writing or validating an operation log.
///
/// Any of these is fatal to an undo: nothing is restored from a log that
/// could not be loaded in full.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("No operation log found in {dir}. Nothing to undo.")]
    NotFound { dir: PathBuf },

    #[error("Operation log not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read operation log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write operation log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize operation log: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Operation log is corrupted: {reason}")]
    Corrupted { reason: String },
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("Invalid category table: {0}")]
    InvalidCategory(String),

    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, OrganizeError>;
