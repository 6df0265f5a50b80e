//! Unified error types for sheetview.
//!
//! Every failure in the acquisition-cache-parse-render pipeline maps to one
//! of these variants. The display string carries a stable upper-case code so
//! callers (and logs) can classify failures without matching on text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Guidance shown when the origin answers with something that is not a table.
const SHARING_HINT: &str = "Make sure the spreadsheet is shared so that \"Anyone with the link\" can view it, \
     or use File > Share > Publish to web, then try again.";

/// Unified error types for sheetview.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document key or URL could not be turned into a fetch target.
    #[error("INVALID_REFERENCE: {0}")]
    InvalidReference(String),

    /// An option value could not be interpreted.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Transport-level failure while retrieving the document.
    #[error("FETCH_ERROR: {0}")]
    FetchFailed(String),

    /// The HTML document contains no `<table>` at all.
    #[error("NO_TABLE_FOUND: the fetched document contains no tables")]
    NoTableFound,

    /// The requested sheet does not exist in the HTML snapshot.
    #[error("SHEET_NOT_FOUND: sheet {sheet} requested but the document has {available} sheet(s)")]
    SheetNotFound { sheet: String, available: usize },

    /// CSV payload could not be read.
    #[error("PARSE_FAILED: {0}")]
    ParseFailed(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored cache value failed to decode.
    #[error("CACHE_ERROR: corrupt payload: {0}")]
    CorruptPayload(String),
}

impl Error {
    /// Whether this error originates in the cache backend.
    ///
    /// The pipeline treats these as a cache miss instead of failing the request.
    pub fn is_cache_backend(&self) -> bool {
        matches!(self, Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptPayload(_))
    }

    /// Human-readable message suitable for inline display in a rendered page.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidReference(msg) => format!("Could not understand the spreadsheet reference: {msg}"),
            Error::InvalidInput(msg) => format!("Invalid option: {msg}"),
            Error::FetchFailed(msg) => format!("Could not retrieve the spreadsheet: {msg}"),
            Error::NoTableFound => format!("No table was found in the retrieved document. {SHARING_HINT}"),
            Error::SheetNotFound { sheet, available } => format!(
                "Sheet {sheet} does not exist; the document has {available} sheet(s). \
                 Sheets are numbered from 0 in the order they appear. {SHARING_HINT}"
            ),
            Error::ParseFailed(msg) => format!("The spreadsheet data could not be read: {msg}"),
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptPayload(_) => {
                "The spreadsheet cache is unavailable.".to_string()
            }
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidReference(_) | Error::InvalidInput(_) => -32602,
            Error::FetchFailed(_) => -32006,
            Error::NoTableFound => -32020,
            Error::SheetNotFound { .. } => -32021,
            Error::ParseFailed(_) => -32022,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptPayload(_) => -32002,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
