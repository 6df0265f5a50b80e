//! Conversion of raw payloads into a canonical table.
//!
//! Dispatches on the payload's content type:
//! - CSV bodies are read record by record, one row per record.
//! - HTML snapshots hold one `<table>` per sheet after a leading sheet-index
//!   table; the requested sheet's rows and cells are read as text.
//!
//! Header/body separation is not decided here; that is a rendering concern.

mod csv;
mod html;

pub use self::csv::parse_csv;
pub use self::html::parse_html;

use sheetview_core::{ContentType, DocumentReference, Error, RawPayload};

/// One row of decoded, unescaped cell text.
pub type Row = Vec<String>;

/// Ordered rows of cells. Rows may differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Vec<S>> for Table {
    fn from_iter<I: IntoIterator<Item = Vec<S>>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

/// Parse a payload for the given document reference.
///
/// The reference's sheet selects the table in HTML snapshots.
pub fn parse(payload: &RawPayload, reference: &DocumentReference) -> Result<Table, Error> {
    match payload.content_type {
        ContentType::Csv => parse_csv(&payload.body),
        ContentType::Html => parse_html(&String::from_utf8_lossy(&payload.body), reference.sheet_id.as_deref()),
    }
}
