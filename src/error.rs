//! Error types for the catalog generator

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the catalog generator
///
/// Only `Path` and `Config` are fatal to a run. Per-item failures during
/// scanning are downgraded to [`crate::model::ScanWarning`] and never
/// propagate here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found or unreadable: {path}")]
    Path { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to process image {path}: {message}")]
    Image { path: PathBuf, message: String },

    #[error("PDF generation error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

/// Failure to parse a single NFO description file.
///
/// Carries any title recovered before the parse broke so the scanner can
/// decide between a title-only record and skipping the item.
#[derive(Error, Debug)]
#[error("failed to parse description file: {message}")]
pub struct ExtractionError {
    pub message: String,
    pub recovered_title: Option<String>,
}
