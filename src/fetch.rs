//! Total-count resolution and the sequential page-fetch loop.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::portal::json::{self, SearchResponse};
use crate::portal::{PortalClient, PortalError};
use crate::query::Query;
use crate::table::{self, CourseRow, CourseTable};

/// Rows per page, fixed by the portal.
pub const PAGE_SIZE: u64 = 10;

/// Smoothing factor for the exponential moving average behind the ETA.
const ETA_ALPHA: f64 = 0.3;

/// Rough per-page duration used for the up-front time estimate, seconds.
const TYPICAL_PAGE_SECS: f64 = 0.75;

/// How fetched pages are scheduled.
///
/// Concurrent paging cannot share one session's verification-code state, so
/// the only mode is sequential; `--parallel` downgrades with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Sequential,
}

/// Outcome of a full paging run.
#[derive(Debug)]
pub struct FetchReport {
    /// Successful pages concatenated in offset order.
    pub table: CourseTable,
    /// Offsets of pages that failed after retries.
    pub failed_offsets: Vec<u64>,
}

/// Ask the portal how many rows match `query` by probing offset 0.
///
/// A missing `count` field usually means the verification code was wrong or
/// has expired; that, like retry exhaustion, is fatal here. Zero is a valid
/// "no results" outcome.
pub async fn resolve_total_count(
    client: &PortalClient,
    query: &Query,
    vercode: &str,
    retries: u32,
) -> Result<u64, PortalError> {
    let body = client.search_with_retry(query, 0, vercode, retries).await?;
    let response = json::parse_response(&body).map_err(PortalError::Parse)?;
    let count = response
        .count
        .ok_or(PortalError::Verification { field: "count" })?
        .value()
        .map_err(PortalError::Parse)?;
    info!(count, "resolved total course count");
    Ok(count)
}

/// Fetch one 10-row page; `None` marks a page that failed after retries,
/// failed to parse, or came back without a `courselist`.
async fn fetch_page(
    client: &PortalClient,
    query: &Query,
    vercode: &str,
    startrow: u64,
    retries: u32,
) -> Option<Vec<CourseRow>> {
    let body = match client
        .search_with_retry(query, startrow, vercode, retries)
        .await
    {
        Ok(body) => body,
        Err(e) => {
            error!(startrow, error = %e, "page request failed");
            return None;
        }
    };

    let response: SearchResponse = match json::parse_response(&body) {
        Ok(r) => r,
        Err(e) => {
            error!(startrow, error = %e, "failed to parse page body");
            return None;
        }
    };

    let Some(raw_rows) = response.courselist else {
        error!(
            startrow,
            "no courselist in response, the verification code may be wrong"
        );
        return None;
    };

    match table::rows_from_page(&raw_rows) {
        Ok(rows) => {
            debug!(startrow, rows = rows.len(), "fetched page");
            Some(rows)
        }
        Err(e) => {
            error!(startrow, error = %e, "malformed rows in page");
            None
        }
    }
}

/// Fetch every page covering `total` rows and concatenate the successes in
/// offset order.
///
/// Individual page failures are tolerated and reported in aggregate at the
/// end; a run where every page fails returns [`PortalError::NoPages`]
/// instead of an empty table.
pub async fn fetch_all_pages(
    client: &PortalClient,
    query: &Query,
    vercode: &str,
    retries: u32,
    total: u64,
    mode: FetchMode,
) -> Result<FetchReport, PortalError> {
    let FetchMode::Sequential = mode;

    let offsets: Vec<u64> = (0..total).step_by(PAGE_SIZE as usize).collect();
    info!(
        total,
        pages = offsets.len(),
        eta = format_eta(offsets.len() as f64 * TYPICAL_PAGE_SECS),
        "fetching course list"
    );

    let started = Instant::now();
    let mut table = CourseTable::new();
    let mut failed_offsets = Vec::new();
    let mut page_secs: Option<f64> = None;

    for (index, &startrow) in offsets.iter().enumerate() {
        let page_started = Instant::now();
        match fetch_page(client, query, vercode, startrow, retries).await {
            Some(rows) => table.extend(rows),
            None => failed_offsets.push(startrow),
        }

        let elapsed = page_started.elapsed().as_secs_f64();
        let smoothed = match page_secs {
            Some(prev) => ETA_ALPHA * elapsed + (1.0 - ETA_ALPHA) * prev,
            None => elapsed,
        };
        page_secs = Some(smoothed);

        let remaining = (offsets.len() - index - 1) as f64 * smoothed;
        info!(
            page = index + 1,
            pages = offsets.len(),
            eta = format_eta(remaining),
            "fetching course data"
        );
    }

    info!(
        took = format_eta(started.elapsed().as_secs_f64()),
        "finished paging"
    );

    if failed_offsets.is_empty() {
        info!("successfully fetched all pages");
    } else {
        error!(
            count = failed_offsets.len(),
            offsets = ?failed_offsets,
            "some pages failed to fetch"
        );
    }

    if table.is_empty() && !offsets.is_empty() {
        return Err(PortalError::NoPages {
            pages: offsets.len(),
        });
    }

    if table.len() as u64 != total {
        warn!(
            fetched = table.len(),
            expected = total,
            "fetched row count does not match resolved total"
        );
    }

    Ok(FetchReport {
        table,
        failed_offsets,
    })
}

fn format_eta(seconds: f64) -> String {
    if seconds > 60.0 {
        format!("{:.1}min", seconds / 60.0)
    } else {
        format!("{seconds:.0}s")
    }
}
