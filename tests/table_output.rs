//! End-to-end file behavior: persisted tables carry a BOM and a header, and
//! the dedup pass over a re-read file keeps first-seen rows only.

use std::path::Path;

use dean::portal::json::RawRow;
use dean::table::{COLUMNS, CourseTable, rows_from_page};
use dean::{csv, dedup};

fn raw_row(serial: &str, code: &str, section: &str, schedule: &str) -> RawRow {
    vec![
        serde_json::json!(serial),
        serde_json::json!(code),
        serde_json::json!("数据结构与算法"),
        serde_json::json!("专业必修"),
        serde_json::json!("信息科学技术学院"),
        serde_json::json!(section),
        serde_json::json!("3"),
        serde_json::json!("24-100200"),
        serde_json::json!("1-16周"),
        serde_json::json!(format!("<b>{schedule}</b>")),
        serde_json::json!("李四"),
        serde_json::json!("限40人, 先修要求"),
    ]
}

fn write_sample_table(path: &Path) {
    let mut table = CourseTable::new();
    table.extend(
        rows_from_page(&[
            raw_row("2", "04830050", "01", "周一1-2节"),
            raw_row("1", "04830050", "01", "周一1-2节"),
            raw_row("3", "04830050", "02", "周三3-4节"),
        ])
        .unwrap(),
    );
    table.sort_by_serial();
    table.write_csv(path).unwrap();
}

#[test]
fn written_table_has_bom_header_and_sorted_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    write_sample_table(&path);

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with("\u{feff}".as_bytes()), "missing BOM");

    let records = csv::read_file(&path).unwrap();
    assert_eq!(records[0], COLUMNS.map(str::to_owned).to_vec());
    assert_eq!(records.len(), 4);
    assert_eq!(records[1][0], "1");
    assert_eq!(records[2][0], "2");
    // Markup stripped, quoted comma field round-trips.
    assert_eq!(records[1][9], "周一1-2节");
    assert_eq!(records[1][11], "限40人, 先修要求");
}

#[test]
fn dedup_over_a_reread_file_keeps_first_seen_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    write_sample_table(&path);

    let records = csv::read_file(&path).unwrap();
    let survivors = dedup::dedup_records(&records[1..]);

    // Rows with serial 1 and 2 share (code, section, plan, schedule).
    assert_eq!(survivors.len(), 2);
    assert_eq!(survivors[0][0], "1");
    assert_eq!(survivors[1][0], "3");
}
