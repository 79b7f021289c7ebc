//! Command-line surface.

use clap::Parser;

use crate::query::Query;

/// Fetch the PKU course catalog matching a query and save it as CSV.
#[derive(Debug, Parser)]
#[command(name = "dean", version, about)]
pub struct Args {
    /// Course name to look up (empty matches all)
    #[arg(short, long, default_value = "")]
    pub coursename: String,

    /// Teacher name to look up (empty matches all)
    #[arg(short, long, default_value = "")]
    pub teachername: String,

    /// Course type code ("0" for all)
    #[arg(short = 's', long, default_value = "0")]
    pub coursetype: String,

    /// School/department code ("0" for all)
    #[arg(short, long, default_value = "0")]
    pub yuanxi: String,

    /// Term code, e.g. 24-25-2 for the second semester of 2024-2025
    #[arg(long = "ys", default_value = "24-25-2")]
    pub yearandseme: String,

    /// Max retries per request before giving up
    #[arg(short, long, default_value_t = 3)]
    pub retry: u32,

    /// Log level for console output (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Fetch pages in parallel (currently downgraded to sequential)
    #[arg(short, long)]
    pub parallel: bool,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    pub force: bool,

    /// Verification code; skips the interactive prompt when set
    #[arg(short, long, default_value = "")]
    pub vercode: String,
}

impl Args {
    pub fn query(&self) -> Query {
        Query {
            coursename: self.coursename.clone(),
            teachername: self.teachername.clone(),
            yearandseme: self.yearandseme.clone(),
            coursetype: self.coursetype.clone(),
            yuanxi: self.yuanxi.clone(),
        }
    }
}
