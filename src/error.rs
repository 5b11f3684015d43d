//! Error types for the giketsu library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`GiketsuError`] (**fatal**): the operation cannot proceed at all
//!   (document index unreachable, malformed master CSV during build, output
//!   not writable). Returned as `Err(GiketsuError)` from top-level functions.
//!
//! * [`DocumentError`] (**non-fatal**): a single council document could not be
//!   fetched or its text could not be extracted. Collected in
//!   [`crate::output::CrawlOutput::failures`]; every other document is still
//!   processed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the giketsu library.
#[derive(Debug, Error)]
pub enum GiketsuError {
    // ── Discovery errors ──────────────────────────────────────────────────
    /// The top-level index page could not be fetched; nothing can be crawled.
    #[error("Cannot reach document index '{url}': {reason}\nCheck your internet connection or --index-url.")]
    IndexUnreachable { url: String, reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP request failed (connection, non-2xx status, body read).
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// HTTP request exceeded its timeout. Requests are never retried.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{source_name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    /// The PDF text extractor rejected the document.
    #[error("Text extraction failed for '{source_name}': {detail}")]
    TextExtractionFailed { source_name: String, detail: String },

    // ── Data-file errors ──────────────────────────────────────────────────
    /// A JSON input (session index, theme config) could not be read or parsed.
    #[error("Failed to read '{path}': {detail}")]
    InputReadFailed { path: PathBuf, detail: String },

    /// A link CSV has no usable `caseType,eraLabel,num,ref` header.
    #[error("{path}: line {line}: header must contain caseType, eraLabel, num, ref\n  Found: {found}")]
    InvalidCsvHeader {
        path: PathBuf,
        line: u64,
        found: String,
    },

    /// A master-store row failed strict validation; the build was aborted.
    #[error("{path}: line {line}: {detail}")]
    InvalidLinkRow {
        path: PathBuf,
        line: u64,
        detail: String,
    },

    /// The master link store does not exist yet.
    #[error("Master link store not found: '{path}'\nCreate it with the header line: caseType,eraLabel,num,ref")]
    MasterNotFound { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or theme-config validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single council document.
///
/// The crawl records it, logs it with the document URL, and moves on to the
/// next document.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentError {
    /// The PDF could not be downloaded (network error, timeout, HTTP status).
    #[error("{session}: fetch failed for {url}: {detail}")]
    FetchFailed {
        session: String,
        url: String,
        detail: String,
    },

    /// The bytes were fetched but no text could be extracted.
    #[error("{session}: text extraction failed for {url}: {detail}")]
    ExtractionFailed {
        session: String,
        url: String,
        detail: String,
    },
}

impl DocumentError {
    /// Classify a fatal pipeline error as a per-document failure.
    pub fn from_pipeline(session: &str, url: &str, err: GiketsuError) -> Self {
        match err {
            GiketsuError::NotAPdf { .. } | GiketsuError::TextExtractionFailed { .. } => {
                DocumentError::ExtractionFailed {
                    session: session.to_string(),
                    url: url.to_string(),
                    detail: err.to_string(),
                }
            }
            other => DocumentError::FetchFailed {
                session: session.to_string(),
                url: url.to_string(),
                detail: other.to_string(),
            },
        }
    }

    /// URL of the document that failed.
    pub fn url(&self) -> &str {
        match self {
            DocumentError::FetchFailed { url, .. } | DocumentError::ExtractionFailed { url, .. } => {
                url
            }
        }
    }
}
