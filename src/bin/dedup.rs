//! Standalone deduplication pass over one fetched course table.
//!
//! Reads a fixed input file and writes the surviving rows, header first and
//! in original order, to a fixed output file. Run it from the directory
//! holding the fetch output.

use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};

use dean::{csv, dedup, logging};

const INPUT_FILE: &str = "CN_TN_YS24-25-2_CT0_YX0.csv";
const OUTPUT_FILE: &str = "unique_courses.csv";

fn main() -> ExitCode {
    logging::init("info");

    let records = match csv::read_file(Path::new(INPUT_FILE)) {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "failed to read {INPUT_FILE}");
            return ExitCode::FAILURE;
        }
    };
    if records.is_empty() {
        error!("{INPUT_FILE} has no header row");
        return ExitCode::FAILURE;
    }

    let survivors = dedup::dedup_records(&records[1..]);
    info!(
        input = records.len() - 1,
        output = survivors.len(),
        "deduplicated course table"
    );

    let mut out = Vec::with_capacity(survivors.len() + 1);
    out.push(records[0].clone());
    out.extend(survivors);
    if let Err(e) = csv::write_file(Path::new(OUTPUT_FILE), &out) {
        error!(error = %e, "failed to write {OUTPUT_FILE}");
        return ExitCode::FAILURE;
    }

    info!("wrote {OUTPUT_FILE}");
    ExitCode::SUCCESS
}
