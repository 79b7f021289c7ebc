//! Client for the course-search portal: session bootstrap, CAPTCHA
//! retrieval, option scraping, and the search POST protocol.

mod client;
mod errors;
pub mod json;
mod options;

pub use client::{PORTAL_BASE, PortalClient, VERCODE_IMAGE, obtain_verification_code};
pub use errors::PortalError;
pub use options::{CodeMap, SearchOptions};
