//! Error types for the portal client.

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("failed to establish portal session: {0}")]
    Session(String),
    #[error("response has no `{field}` field, the verification code may be wrong or expired")]
    Verification { field: &'static str },
    #[error("server returned status {status} after {attempts} attempts")]
    Fetch { status: u16, attempts: u32 },
    #[error("failed to parse response body")]
    Parse(#[source] anyhow::Error),
    #[error("invalid query: {0}")]
    Validation(String),
    #[error("all {pages} pages failed, nothing to write")]
    NoPages { pages: usize },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}
