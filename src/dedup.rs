//! First-seen-wins deduplication over a persisted course table.
//!
//! Re-running a query produces rows whose serial numbers differ but which
//! describe the same course offering. Two rows are duplicates when they
//! agree on course code, section number, plan id, and schedule.

use std::collections::HashSet;

/// 0-based positions, in file column order, of the fields that identify one
/// course offering: 课程号 (course code), 班号 (section), 执行计划编号
/// (plan id), 上课时间 (schedule).
const KEY_COLUMNS: [usize; 4] = [1, 5, 7, 9];

/// Filter records (header excluded) down to the first row seen per key.
/// Survivors keep their contents and relative order; O(n) time with an
/// auxiliary seen-key set.
pub fn dedup_records(records: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let mut survivors = Vec::new();
    for record in records {
        let key: (String, String, String, String) = (
            field(record, KEY_COLUMNS[0]),
            field(record, KEY_COLUMNS[1]),
            field(record, KEY_COLUMNS[2]),
            field(record, KEY_COLUMNS[3]),
        );
        if seen.insert(key) {
            survivors.push(record.clone());
        }
    }
    survivors
}

fn field(record: &[String], index: usize) -> String {
    record.get(index).cloned().unwrap_or_default()
}
