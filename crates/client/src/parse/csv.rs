//! CSV payload parsing.

use csv::ReaderBuilder;
use sheetview_core::Error;

use super::{Row, Table};

/// Parse a comma-delimited body into rows, one per line.
///
/// Fields may be double-quoted; inside quotes both `""` and `\"` produce a
/// literal quote, and any other backslash is kept as written. Records may
/// have differing field counts. A blank line becomes an empty row so row
/// positions match the source. Invalid UTF-8 is replaced rather than rejected.
pub fn parse_csv(body: &[u8]) -> Result<Table, Error> {
    let (prepared, blank_lines) = prepare(body);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(prepared.as_slice());

    let mut blank_lines = blank_lines.into_iter().peekable();
    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        while blank_lines.next_if(|&before| before == index).is_some() {
            rows.push(Row::new());
        }

        let record = record.map_err(|e| Error::ParseFailed(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    rows.extend(blank_lines.map(|_| Row::new()));

    Ok(Table::new(rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    RecordStart,
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Rewrite `\"` inside quoted fields to `""` and locate blank lines.
///
/// Returns the rewritten body and, for each blank line, the number of records
/// before it. Record boundaries follow the reader's rules: a quote opens a
/// quoted field only at the start of a field, and `\r\n` is one terminator.
fn prepare(body: &[u8]) -> (Vec<u8>, Vec<usize>) {
    let mut out = Vec::with_capacity(body.len());
    let mut blank_lines = Vec::new();
    let mut records = 0;
    let mut state = Scan::RecordStart;

    let mut i = 0;
    while i < body.len() {
        let byte = body[i];
        match (state, byte) {
            (Scan::Quoted, b'\\') if body.get(i + 1) == Some(&b'"') => {
                out.extend_from_slice(b"\"\"");
                i += 2;
                continue;
            }
            (Scan::Quoted, b'"') => state = Scan::QuoteInQuoted,
            (Scan::Quoted, _) => {}
            (Scan::QuoteInQuoted, b'"') => state = Scan::Quoted,
            (_, b'\r' | b'\n') => {
                if state == Scan::RecordStart {
                    blank_lines.push(records);
                } else {
                    records += 1;
                }
                state = Scan::RecordStart;

                if byte == b'\r' && body.get(i + 1) == Some(&b'\n') {
                    out.extend_from_slice(b"\r\n");
                    i += 2;
                    continue;
                }
            }
            (_, b',') => state = Scan::FieldStart,
            (Scan::RecordStart | Scan::FieldStart, b'"') => state = Scan::Quoted,
            _ => state = Scan::Unquoted,
        }
        out.push(byte);
        i += 1;
    }

    (out, blank_lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rows() {
        let table = parse_csv(b"a,b\n1,2\n").unwrap();
        assert_eq!(table, Table::from_iter([vec!["a", "b"], vec!["1", "2"]]));
    }

    #[test]
    fn test_quoted_fields() {
        let table = parse_csv(b"\"x, y\",\"say \"\"hi\"\"\",\"back \\\"slash\\\"\"\n").unwrap();
        assert_eq!(table.rows[0], vec!["x, y", "say \"hi\"", "back \"slash\""]);
    }

    #[test]
    fn test_multiline_quoted_field() {
        let table = parse_csv(b"\"line one\nline two\",b\r\nc,d\r\n").unwrap();
        assert_eq!(table, Table::from_iter([vec!["line one\nline two", "b"], vec!["c", "d"]]));
    }

    #[test]
    fn test_ragged_rows_kept() {
        let table = parse_csv(b"a,b,c\n1\n2,3\n").unwrap();
        assert_eq!(table.rows.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn test_no_trailing_newline() {
        let table = parse_csv(b"a,b\n1,2").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["1", "2"]);
    }

    #[test]
    fn test_empty_body() {
        assert!(parse_csv(b"").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let table = parse_csv(b"caf\xe9,ok\n").unwrap();
        assert_eq!(table.rows[0][0], "caf\u{fffd}");
        assert_eq!(table.rows[0][1], "ok");
    }

    #[test]
    fn test_markup_is_not_interpreted() {
        let table = parse_csv(b"<b>bold</b>,&amp;\n").unwrap();
        assert_eq!(table.rows[0], vec!["<b>bold</b>", "&amp;"]);
    }

    #[test]
    fn test_backslash_kept_outside_quote_escape() {
        let table = parse_csv(b"\"a\\b\",c\\d\n").unwrap();
        assert_eq!(table.rows[0], vec!["a\\b", "c\\d"]);

        let table = parse_csv(b"\"C:\\Users\\me, docs\",x\n").unwrap();
        assert_eq!(table.rows[0], vec!["C:\\Users\\me, docs", "x"]);
    }

    #[test]
    fn test_blank_lines_become_empty_rows() {
        let table = parse_csv(b"a,b\n\n1,2\n").unwrap();
        assert_eq!(table, Table::from_iter([vec!["a", "b"], vec![], vec!["1", "2"]]));

        let table = parse_csv(b"\r\na\r\n\r\nb\r\n\n").unwrap();
        assert_eq!(table.rows.iter().map(Vec::len).collect::<Vec<_>>(), vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_newline_inside_quotes_is_not_blank_line() {
        let table = parse_csv(b"\"one\n\ntwo\",x\n\ny\n").unwrap();
        assert_eq!(table, Table::from_iter([vec!["one\n\ntwo", "x"], vec![], vec!["y"]]));
    }
}
