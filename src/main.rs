use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use dean::cli::Args;
use dean::fetch::{self, FetchMode};
use dean::logging;
use dean::portal::{self, PortalClient, SearchOptions};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "aborting");
            ExitCode::FAILURE
        }
    }
}

/// The fetch pipeline: bootstrap, obtain code, validate, resolve count, page
/// fetch, persist. The verification code is obtained once, at the only stage
/// requiring human input, and passed to every later stage as a plain
/// parameter.
async fn run(args: Args) -> anyhow::Result<()> {
    let query = args.query();
    let output = query.output_file();
    info!(query = ?query, "querying course catalog");

    if Path::new(&output).exists() && !args.force {
        info!("{output} already exists, use --force to overwrite");
        return Ok(());
    }

    let client = PortalClient::connect().await?;

    let vercode = if args.vercode.is_empty() {
        portal::obtain_verification_code(&client).await
    } else {
        args.vercode.clone()
    };
    if vercode.is_empty() {
        warn!("no verification code provided, trying without one");
    }

    let options = SearchOptions::fetch(&client, args.retry).await?;
    query.validate(&options)?;

    let total = fetch::resolve_total_count(&client, &query, &vercode, args.retry).await?;
    if total == 0 {
        info!("query matched 0 courses, nothing to write");
        return Ok(());
    }

    let mode = if args.parallel {
        warn!("parallel fetching cannot share one verification code, falling back to sequential");
        FetchMode::Sequential
    } else {
        FetchMode::Sequential
    };

    let mut report =
        fetch::fetch_all_pages(&client, &query, &vercode, args.retry, total, mode).await?;
    report.table.sort_by_serial();
    report.table.write_csv(Path::new(&output))?;
    info!(rows = report.table.len(), "job finished, saved to {output}");

    Ok(())
}
