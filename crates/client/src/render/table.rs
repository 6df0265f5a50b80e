//! HTML table rendering.

use super::escape::{escape_attribute, escape_text};
use super::linkify::linkify;
use super::{BASE_ID_PREFIX, parity};
use crate::options::RenderOptions;
use crate::parse::{Row, Table};

/// Class every rendered table carries.
pub const TABLE_CLASS: &str = "igsv-table";

/// Render a table as HTML.
///
/// Header cell text is wrapped in a `<div>` for styling hooks. Rows are numbered from 1 continuously through header and body. Header
/// cells are numbered with one counter across all header rows; body cells
/// restart at column 1 on every row. Ragged rows render only the cells they
/// have.
pub fn render_table(table: &Table, document_key: &str, options: &RenderOptions) -> String {
    let rows: &[Row] = table.rows.get(options.strip_rows..).unwrap_or_default();
    let header_count = options.header_rows.max(1).min(rows.len());
    let (head, body) = rows.split_at(header_count);

    let mut html = String::new();
    html.push_str(&format!("<table id=\"{BASE_ID_PREFIX}{}\"", escape_attribute(document_key)));

    let class = match options.css_class.as_deref() {
        Some(extra) => format!("{TABLE_CLASS} {extra}"),
        None => TABLE_CLASS.to_string(),
    };
    html.push_str(&format!(" class=\"{}\"", escape_attribute(&class)));

    for (name, value) in [("title", &options.title), ("summary", &options.summary), ("style", &options.style)] {
        if let Some(value) = value {
            html.push_str(&format!(" {name}=\"{}\"", escape_attribute(value)));
        }
    }
    html.push('>');

    if let Some(caption) = &options.caption {
        html.push_str(&format!("<caption>{}</caption>", escape_text(caption)));
    }

    let mut row_number = 1;

    html.push_str("<thead>");
    let mut header_column = 1;
    for row in head {
        html.push_str(&open_row(row_number));
        for cell in row {
            html.push_str(&format!(
                "<th class=\"col-{header_column} {}\"><div>{}</div></th>",
                parity(header_column),
                escape_text(cell)
            ));
            header_column += 1;
        }
        html.push_str("</tr>");
        row_number += 1;
    }
    html.push_str("</thead><tbody>");

    for row in body {
        html.push_str(&open_row(row_number));
        for (index, cell) in row.iter().enumerate() {
            let column = index + 1;
            html.push_str(&format!("<td class=\"col-{column} {}\">{}</td>", parity(column), escape_text(cell)));
        }
        html.push_str("</tr>");
        row_number += 1;
    }
    html.push_str("</tbody></table>");

    if options.linkify { linkify(&html) } else { html }
}

fn open_row(number: usize) -> String {
    format!("<tr class=\"row-{number} {}\">", parity(number))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> RenderOptions {
        RenderOptions { linkify: false, ..Default::default() }
    }

    fn sample() -> Table {
        Table::from_iter([vec!["H1", "H2"], vec!["a", "b"], vec!["c", "d"]])
    }

    #[test]
    fn test_header_and_body_numbering() {
        let html = render_table(&sample(), "KEY", &plain());
        assert_eq!(
            html,
            "<table id=\"igsv-KEY\" class=\"igsv-table\" summary=\"Google Spreadsheet\"><thead>\
             <tr class=\"row-1 odd\"><th class=\"col-1 odd\"><div>H1</div></th><th class=\"col-2 even\"><div>H2</div></th></tr>\
             </thead><tbody>\
             <tr class=\"row-2 even\"><td class=\"col-1 odd\">a</td><td class=\"col-2 even\">b</td></tr>\
             <tr class=\"row-3 odd\"><td class=\"col-1 odd\">c</td><td class=\"col-2 even\">d</td></tr>\
             </tbody></table>"
        );
    }

    #[test]
    fn test_strip_rows() {
        let options = RenderOptions { strip_rows: 1, ..plain() };
        let html = render_table(&sample(), "KEY", &options);
        assert!(html.contains("<thead><tr class=\"row-1 odd\"><th class=\"col-1 odd\"><div>a</div></th>"));
        assert!(!html.contains("H1"));
        assert!(html.contains("<tr class=\"row-2 even\"><td class=\"col-1 odd\">c</td>"));
    }

    #[test]
    fn test_strip_everything() {
        let options = RenderOptions { strip_rows: 10, ..plain() };
        let html = render_table(&sample(), "KEY", &options);
        assert!(html.ends_with("<thead></thead><tbody></tbody></table>"));
    }

    #[test]
    fn test_multiple_header_rows_share_column_counter() {
        let options = RenderOptions { header_rows: 2, ..plain() };
        let html = render_table(&sample(), "KEY", &options);
        assert!(html.contains(
            "<tr class=\"row-2 even\"><th class=\"col-3 odd\"><div>a</div></th>\
             <th class=\"col-4 even\"><div>b</div></th></tr></thead>"
        ));
        assert!(html.contains("<tbody><tr class=\"row-3 odd\"><td class=\"col-1 odd\">c</td>"));
    }

    #[test]
    fn test_ragged_rows_not_padded() {
        let table = Table::from_iter([vec!["H1", "H2", "H3"], vec!["only"], vec![]]);
        let html = render_table(&table, "KEY", &plain());
        assert!(html.contains("<tr class=\"row-2 even\"><td class=\"col-1 odd\">only</td></tr>"));
        assert!(html.contains("<tr class=\"row-3 odd\"></tr>"));
        assert_eq!(html.matches("<td").count(), 1);
    }

    #[test]
    fn test_attributes_and_caption_escaped() {
        let options = RenderOptions {
            css_class: Some("wide\" onclick=\"x".into()),
            caption: Some("<Sales & Costs>".into()),
            title: Some("Q1 \"final\"".into()),
            summary: Some("Summary".into()),
            style: Some("color:red".into()),
            ..plain()
        };
        let html = render_table(&sample(), "KEY", &options);
        assert!(html.starts_with(
            "<table id=\"igsv-KEY\" class=\"igsv-table wide&quot; onclick=&quot;x\" \
             title=\"Q1 &quot;final&quot;\" summary=\"Summary\" style=\"color:red\">\
             <caption>&lt;Sales &amp; Costs&gt;</caption>"
        ));
    }

    #[test]
    fn test_cells_escaped() {
        let table = Table::from_iter([vec!["<script>alert(1)</script>"], vec!["a & b"]]);
        let html = render_table(&table, "KEY", &plain());
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains(">a &amp; b</td>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_linkify_enabled() {
        let table = Table::from_iter([vec!["Site"], vec!["https://example.com"]]);
        let html = render_table(&table, "KEY", &RenderOptions::default());
        assert!(html.contains("<td class=\"col-1 odd\"><a href=\"https://example.com\">https://example.com</a></td>"));

        let html = render_table(&table, "KEY", &plain());
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_summary_omitted_when_cleared() {
        let options = RenderOptions { summary: None, ..plain() };
        let html = render_table(&sample(), "KEY", &options);
        assert!(html.starts_with("<table id=\"igsv-KEY\" class=\"igsv-table\"><thead>"));
    }
}
