//! HTML snapshot parsing.
//!
//! A published HTML snapshot contains a sheet-index table followed by one
//! table per sheet, in sheet order.

use scraper::{ElementRef, Html, Selector};
use sheetview_core::Error;

use super::{Row, Table};

/// Extract the table for `sheet_id` (zero-based position, default 0).
///
/// # Errors
///
/// - `Error::NoTableFound` if the document has no `<table>` at all, whatever the sheet.
/// - `Error::SheetNotFound` if the sheet is not a number or is past the last sheet.
pub fn parse_html(html: &str, sheet_id: Option<&str>) -> Result<Table, Error> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").expect("invalid selector");

    let tables: Vec<ElementRef<'_>> = document
        .select(&table_selector)
        .filter(|table| is_top_level(*table))
        .collect();
    if tables.is_empty() {
        return Err(Error::NoTableFound);
    }

    let sheets = &tables[1..];
    let label = sheet_id.unwrap_or("0");
    let table = label
        .parse::<usize>()
        .ok()
        .and_then(|index| sheets.get(index))
        .ok_or_else(|| Error::SheetNotFound { sheet: label.to_string(), available: sheets.len() })?;

    let row_selector = Selector::parse("tr").expect("invalid selector");
    let rows = table
        .select(&row_selector)
        .filter(|row| belongs_to(*row, *table))
        .map(read_row)
        .collect();

    Ok(Table::new(rows))
}

/// Whether `table` is not nested inside another table. Only top-level tables
/// count as sheets.
fn is_top_level(table: ElementRef<'_>) -> bool {
    !table
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "table")
}

/// Whether `table` is the nearest `<table>` ancestor of `row`, so rows of
/// nested tables are not attributed to the outer one.
fn belongs_to(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|el| el.id() == table.id())
}

/// Text of each direct `<th>`/`<td>` child, in order. A row without cells is empty.
fn read_row(row: ElementRef<'_>) -> Row {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .map(|cell| cell.text().collect::<String>())
        .collect()
}
