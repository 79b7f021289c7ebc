//! Normalized course rows and the table written per query.

use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::csv;
use crate::portal::json::RawRow;

/// Column headers as the portal labels them, serial number first.
pub const COLUMNS: [&str; 12] = [
    "序号",
    "课程号",
    "课程名称",
    "课程类型",
    "开课单位",
    "班号",
    "学分",
    "执行计划编号",
    "起止周",
    "上课时间",
    "教师",
    "备注",
];

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new("<.*?>").unwrap());

/// Remove `<tag>`-style markup substrings (non-greedy `<` through the next
/// `>`). Already clean text passes through unchanged, so applying this twice
/// is a no-op.
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").into_owned()
}

/// One course offering as fetched, keyed by serial number. Serial numbers
/// are unique within one raw fetch but not across re-runs.
#[derive(Debug, Clone)]
pub struct CourseRow {
    pub serial: String,
    pub course_code: String,
    pub name: String,
    pub course_type: String,
    pub offering_unit: String,
    pub section: String,
    pub credits: String,
    pub plan_id: String,
    pub week_range: String,
    pub schedule: String,
    pub teacher: String,
    pub remarks: String,
}

impl CourseRow {
    /// Build a row from one raw `courselist` entry, stripping markup from
    /// every text cell.
    pub fn from_raw(raw: &RawRow) -> anyhow::Result<Self> {
        if raw.len() != COLUMNS.len() {
            anyhow::bail!("expected {} cells per row, got {}", COLUMNS.len(), raw.len());
        }
        Ok(Self {
            serial: normalize_cell(&raw[0]),
            course_code: normalize_cell(&raw[1]),
            name: normalize_cell(&raw[2]),
            course_type: normalize_cell(&raw[3]),
            offering_unit: normalize_cell(&raw[4]),
            section: normalize_cell(&raw[5]),
            credits: normalize_cell(&raw[6]),
            plan_id: normalize_cell(&raw[7]),
            week_range: normalize_cell(&raw[8]),
            schedule: normalize_cell(&raw[9]),
            teacher: normalize_cell(&raw[10]),
            remarks: normalize_cell(&raw[11]),
        })
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.serial.clone(),
            self.course_code.clone(),
            self.name.clone(),
            self.course_type.clone(),
            self.offering_unit.clone(),
            self.section.clone(),
            self.credits.clone(),
            self.plan_id.clone(),
            self.week_range.clone(),
            self.schedule.clone(),
            self.teacher.clone(),
            self.remarks.clone(),
        ]
    }
}

/// String cells are stripped of markup; numbers and booleans are rendered as
/// plain scalars; nulls become empty cells.
fn normalize_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => strip_tags(s),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Convert one fetched page into rows, failing if any row is malformed.
pub fn rows_from_page(raw: &[RawRow]) -> anyhow::Result<Vec<CourseRow>> {
    raw.iter().map(CourseRow::from_raw).collect()
}

/// Ordered collection of course rows, the concatenation of all fetched
/// pages.
#[derive(Debug, Default)]
pub struct CourseTable {
    rows: Vec<CourseRow>,
}

impl CourseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CourseRow] {
        &self.rows
    }

    /// Append one page's rows; pages must arrive in offset order.
    pub fn extend(&mut self, rows: Vec<CourseRow>) {
        self.rows.extend(rows);
    }

    /// Sort ascending by numeric serial number. Rows with non-numeric
    /// serials keep their relative order after the numeric ones.
    pub fn sort_by_serial(&mut self) {
        self.rows
            .sort_by_key(|row| row.serial.trim().parse::<u64>().unwrap_or(u64::MAX));
    }

    /// Write the table as UTF-8 CSV with a BOM, header row first.
    pub fn write_csv(&self, path: &Path) -> io::Result<()> {
        let mut records = Vec::with_capacity(self.rows.len() + 1);
        records.push(COLUMNS.iter().map(|c| (*c).to_owned()).collect());
        records.extend(self.rows.iter().map(CourseRow::to_record));
        csv::write_file(path, &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_row(serial: &str) -> RawRow {
        vec![
            json!(serial),
            json!("04831750"),
            json!("编译原理"),
            json!("专业必修"),
            json!("信息科学技术学院"),
            json!("01"),
            json!("4"),
            json!("24-100687"),
            json!("1-16周"),
            json!("<span class='time'>周一5-6节</span>"),
            json!("张三"),
            json!(null),
        ]
    }

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("<span class='a'>周一5-6节</span>"), "周一5-6节");
        assert_eq!(strip_tags("a<br/>b<i>c</i>"), "abc");
    }

    #[test]
    fn strip_tags_is_idempotent_on_clean_text() {
        let clean = "编译原理 1-16周";
        assert_eq!(strip_tags(clean), clean);
        assert_eq!(strip_tags(&strip_tags(clean)), clean);
    }

    #[test]
    fn non_string_cells_pass_through() {
        assert_eq!(normalize_cell(&json!(4)), "4");
        assert_eq!(normalize_cell(&json!(2.5)), "2.5");
        assert_eq!(normalize_cell(&json!(null)), "");
    }

    #[test]
    fn from_raw_normalizes_every_cell() {
        let row = CourseRow::from_raw(&raw_row("7")).unwrap();
        assert_eq!(row.serial, "7");
        assert_eq!(row.schedule, "周一5-6节");
        assert_eq!(row.remarks, "");
    }

    #[test]
    fn from_raw_rejects_wrong_cell_count() {
        let mut short = raw_row("1");
        short.pop();
        assert!(CourseRow::from_raw(&short).is_err());
    }

    #[test]
    fn sort_by_serial_is_numeric_not_lexicographic() {
        let mut table = CourseTable::new();
        table.extend(rows_from_page(&[raw_row("10"), raw_row("2"), raw_row("1")]).unwrap());
        table.sort_by_serial();
        let serials: Vec<&str> = table.rows().iter().map(|r| r.serial.as_str()).collect();
        assert_eq!(serials, ["1", "2", "10"]);
    }

    #[test]
    fn concatenated_pages_sort_back_to_source_order() {
        // Two pages in offset order with contiguous serials.
        let page_one = rows_from_page(&(1..=10).map(|n| raw_row(&n.to_string())).collect::<Vec<_>>()).unwrap();
        let page_two = rows_from_page(&(11..=15).map(|n| raw_row(&n.to_string())).collect::<Vec<_>>()).unwrap();
        let mut table = CourseTable::new();
        table.extend(page_one);
        table.extend(page_two);
        table.sort_by_serial();
        let serials: Vec<u64> = table
            .rows()
            .iter()
            .map(|r| r.serial.parse().unwrap())
            .collect();
        assert_eq!(serials, (1..=15).collect::<Vec<u64>>());
    }
}
