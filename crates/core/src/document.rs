//! Document references and the fetch targets derived from them.

use serde::{Deserialize, Serialize};

/// A user-supplied reference to a remote spreadsheet.
///
/// `key` is either a bare document ID or a full document URL. Empty strings
/// for `sheet_id` and `query` are normalized to `None` on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub key: String,
    pub sheet_id: Option<String>,
    pub query: Option<String>,
}

impl DocumentReference {
    pub fn new(key: impl Into<String>, sheet_id: Option<String>, query: Option<String>) -> Self {
        Self { key: key.into().trim().to_string(), sheet_id: non_empty(sheet_id), query: non_empty(query) }
    }

    /// Reference to a whole document with no sheet or query selection.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self::new(key, None, None)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Canonical URL to retrieve plus what kind of endpoint it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTarget {
    pub url: String,
    pub is_query: bool,
    /// Document ID used to derive element identifiers.
    pub document_key: String,
}
