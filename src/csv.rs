//! Minimal quote-aware CSV reading and writing.
//!
//! Output targets spreadsheet software, hence the UTF-8 BOM on written
//! files. The reader tolerates quoted fields, doubled-quote escapes, CRLF
//! line endings, and a leading BOM.

use std::fs;
use std::io::{self, Write};
use std::mem::take;
use std::path::Path;

const BOM: &str = "\u{feff}";

/// Parse CSV text into records. Blank lines are skipped.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => record.push(take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(take(&mut field));
                if record.len() > 1 || !record[0].is_empty() {
                    records.push(take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush a trailing record with no final newline.
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

fn needs_quoting(field: &str) -> bool {
    field.contains([',', '"', '\n', '\r'])
}

/// Write one record, quoting fields only where required.
pub fn write_record<W: Write>(w: &mut W, record: &[String]) -> io::Result<()> {
    for (i, field) in record.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if needs_quoting(field) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Write records to `path` as UTF-8 with a leading BOM.
pub fn write_file(path: &Path, records: &[Vec<String>]) -> io::Result<()> {
    let mut buf = Vec::new();
    buf.extend_from_slice(BOM.as_bytes());
    for record in records {
        write_record(&mut buf, record)?;
    }
    fs::write(path, buf)
}

/// Read and parse a CSV file.
pub fn read_file(path: &Path) -> io::Result<Vec<Vec<String>>> {
    Ok(parse(&fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_records() {
        let rows = parse("a,b,c\n1,2,3\n");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn parses_quotes_escapes_and_crlf() {
        let rows = parse("\"a,b\",\"say \"\"hi\"\"\"\r\nplain,\"multi\nline\"\r\n");
        assert_eq!(rows[0], vec!["a,b", "say \"hi\""]);
        assert_eq!(rows[1], vec!["plain", "multi\nline"]);
    }

    #[test]
    fn strips_leading_bom() {
        let rows = parse("\u{feff}序号,课程号\n1,04831750\n");
        assert_eq!(rows[0][0], "序号");
    }

    #[test]
    fn skips_blank_lines_and_flushes_trailing_record() {
        let rows = parse("a,b\n\n1,2");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["1", "2"]);
    }

    #[test]
    fn written_records_parse_back() {
        let records = vec![
            vec!["序号".to_owned(), "备,注".to_owned()],
            vec!["1".to_owned(), "he said \"go\"".to_owned()],
        ];
        let mut buf = Vec::new();
        for r in &records {
            write_record(&mut buf, r).unwrap();
        }
        assert_eq!(parse(std::str::from_utf8(&buf).unwrap()), records);
    }
}
