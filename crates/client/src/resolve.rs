//! Resolution of document references into fetch URLs.
//!
//! Three shapes of input are accepted:
//!
//! - a bare document key, fetched through the legacy publish endpoint
//! - a full document URL (`.../spreadsheets/d/<ID>/edit`, `/pubhtml`, ...),
//!   fetched through the CSV export endpoint
//! - a full document URL plus a query, fetched through the query-language endpoint

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sheetview_core::{DocumentReference, Error, FetchTarget};
use url::{Url, form_urlencoded};

/// Host serving the legacy publish-export endpoint for bare keys.
pub const LEGACY_PUBLISH_HOST: &str = "spreadsheets.google.com";

/// Path (relative to the document root) of the plain CSV export.
pub const CSV_EXPORT_ENDPOINT: &str = "export?format=csv";

/// Path (relative to the document root) of the query-language endpoint.
pub const QUERY_ENDPOINT: &str = "gviz/tq";

static DOCUMENT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/(?:e/)?([A-Za-z0-9_-]+)(?:/|$)").expect("invalid document path regex"));

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid key regex"));

/// Whether the key is given as a URL rather than a bare identifier.
fn has_scheme(key: &str) -> bool {
    key.contains("://")
}

/// Whether the URL's last path segment carries a file extension.
fn has_file_extension(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .is_some_and(|last| Path::new(last).extension().is_some())
}

/// Classify a key as a spreadsheet reference (as opposed to a plain file URL).
///
/// Bare keys are always spreadsheets; URLs are spreadsheets unless their path
/// ends in a file name with an extension.
pub fn is_spreadsheet_reference(key: &str) -> bool {
    if !has_scheme(key) {
        return true;
    }
    Url::parse(key).map(|url| !has_file_extension(&url)).unwrap_or(false)
}

/// Percent-encode a query-language string.
///
/// The user writes `%3C` / `%3E` where they mean `<` / `>` because the
/// shortcode syntax cannot carry angle brackets. Those sequences are kept
/// singly encoded so the origin decodes them to the brackets; every other
/// character is encoded once.
pub fn encode_query(query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    encoded
        .replace("%253C", "%3C")
        .replace("%253c", "%3c")
        .replace("%253E", "%3E")
        .replace("%253e", "%3e")
}

fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Resolve a document reference into a fetch target.
///
/// # Errors
///
/// Returns `Error::InvalidReference` if the key is empty, is a bare key with
/// characters that cannot appear in a document ID, is a URL that does not
/// parse, uses an unsupported scheme, points at a file, or contains no
/// `/spreadsheets/d/<ID>` path segment.
pub fn resolve(reference: &DocumentReference) -> Result<FetchTarget, Error> {
    let key = reference.key.as_str();
    if key.is_empty() {
        return Err(Error::InvalidReference("document key is empty".into()));
    }

    if has_scheme(key) { resolve_url(key, reference) } else { resolve_bare(key, reference) }
}

fn resolve_bare(key: &str, reference: &DocumentReference) -> Result<FetchTarget, Error> {
    if !BARE_KEY.is_match(key) {
        return Err(Error::InvalidReference(format!("{key:?} is neither a document key nor a URL")));
    }

    if reference.query.is_some() {
        tracing::debug!(key, "query ignored for a bare document key");
    }

    let mut url = format!("https://{LEGACY_PUBLISH_HOST}/pub?key={key}&output=csv");
    if let Some(gid) = &reference.sheet_id {
        url.push_str("&single=true&gid=");
        url.push_str(&encode_component(gid));
    }

    Ok(FetchTarget { url, is_query: false, document_key: key.to_string() })
}

fn resolve_url(key: &str, reference: &DocumentReference) -> Result<FetchTarget, Error> {
    let parsed = Url::parse(key).map_err(|e| Error::InvalidReference(format!("{key}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidReference(format!("unsupported scheme: {scheme}"))),
    }

    if !is_spreadsheet_reference(key) {
        return Err(Error::InvalidReference(format!("{key} points to a file, not a spreadsheet")));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| Error::InvalidReference(format!("{key} has no host")))?;
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let path = parsed.path();
    let captures = DOCUMENT_PATH
        .captures(path)
        .ok_or_else(|| Error::InvalidReference(format!("no /spreadsheets/d/<ID>/ segment in {key}")))?;
    let id = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let id_end = captures.get(1).map(|m| m.end()).unwrap_or_default();

    let base = format!("{}://{}{}/", parsed.scheme(), authority, &path[..id_end]);

    let (mut url, is_query) = match &reference.query {
        Some(query) => (format!("{base}{QUERY_ENDPOINT}?tqx=out:csv&tq={}", encode_query(query)), true),
        None => (format!("{base}{CSV_EXPORT_ENDPOINT}"), false),
    };

    if let Some(gid) = &reference.sheet_id {
        url.push_str("&gid=");
        url.push_str(&encode_component(gid));
    }

    Ok(FetchTarget { url, is_query, document_key: id.to_string() })
}
