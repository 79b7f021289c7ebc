//! Paginated course-catalog fetcher for the PKU dean portal.
//!
//! The portal gates its search endpoint behind a cookie session and a
//! human-transcribed CAPTCHA. This crate drives that protocol sequentially
//! (one 10-row page per POST), normalizes the rows, and persists the result
//! as CSV. A second binary deduplicates a persisted table by course
//! offering.

pub mod cli;
pub mod csv;
pub mod dedup;
pub mod fetch;
pub mod logging;
pub mod portal;
pub mod query;
pub mod table;
