//! HTTP client for the dean.pku.edu.cn course-search portal.
//!
//! The portal is cookie-gated: a session must first visit the landing page,
//! then download a CAPTCHA image whose human transcription accompanies every
//! search POST as `vercode`. One client owns one session; it is not reusable
//! once the verification code expires.

use std::io::{self, Write};
use std::path::Path;

use rand::seq::IndexedRandom;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use tracing::{debug, error, info, warn};

use crate::portal::PortalError;
use crate::query::Query;

/// Root of the portal's course-search pages.
pub const PORTAL_BASE: &str = "https://dean.pku.edu.cn/service/web";

const SEARCH_PAGE: &str = "courseSearch.php";
const SEARCH_ENDPOINT: &str = "courseSearch_do.php";
const VERCODE_ENDPOINT: &str = "course_vercode.php";

/// Where the CAPTCHA image is saved for the human to read.
pub const VERCODE_IMAGE: &str = "vercode.png";

/// Browser User-Agent strings, one chosen at random per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 Edg/89.0.774.63",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 Edg/89.0.774.63",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 OPR/75.0.3969.267",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 OPR/75.0.3969.267",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 Vivaldi/3.8.2259.37",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 Vivaldi/3.8.2259.37",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 Firefox/87.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36 Firefox/87.0",
];

/// One portal session: a cookie-holding HTTP client plus the fixed header
/// template sent with every request.
#[derive(Debug)]
pub struct PortalClient {
    http: reqwest::Client,
    base: String,
    headers: HeaderMap,
}

impl PortalClient {
    /// Establish a session against the production portal.
    pub async fn connect() -> Result<Self, PortalError> {
        Self::connect_to(PORTAL_BASE).await
    }

    /// Establish a session against an arbitrary base URL.
    ///
    /// Visits the landing page once to pick up session cookies. Anything
    /// other than a 200 is fatal; there is no retry at this stage.
    pub async fn connect_to(base: &str) -> Result<Self, PortalError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| PortalError::Session(e.to_string()))?;

        let base = base.trim_end_matches('/').to_owned();
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static("https://dean.pku.edu.cn"));
        let referer = format!("{base}/{SEARCH_PAGE}");
        headers.insert(
            REFERER,
            HeaderValue::from_str(&referer).map_err(|e| PortalError::Session(e.to_string()))?,
        );

        let client = Self {
            http,
            base,
            headers,
        };

        let response = client
            .http
            .get(client.url(SEARCH_PAGE))
            .headers(client.request_headers())
            .send()
            .await
            .map_err(|e| PortalError::Session(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(PortalError::Session(format!(
                "landing page returned status {}",
                response.status()
            )));
        }

        debug!("portal session established");
        Ok(client)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint)
    }

    /// The header template plus a freshly chosen User-Agent.
    fn request_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        let ua = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        headers.insert(USER_AGENT, HeaderValue::from_static(ua));
        headers
    }

    /// Send a request, repeating it while the server answers non-200 and the
    /// retry budget lasts: one initial attempt plus `retries` more.
    async fn send_with_retry(
        &self,
        make: impl Fn() -> reqwest::RequestBuilder,
        retries: u32,
    ) -> Result<reqwest::Response, PortalError> {
        let attempts = retries + 1;
        let mut response = make().send().await?;
        let mut left = retries;
        while response.status() != StatusCode::OK && left > 0 {
            warn!(
                status = %response.status(),
                retries_left = left,
                "got non-200 from server, retrying"
            );
            response = make().send().await?;
            left -= 1;
        }

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = truncate(&body, 200),
                "request failed after retries"
            );
            return Err(PortalError::Fetch {
                status: status.as_u16(),
                attempts,
            });
        }
        Ok(response)
    }

    /// POST one search request and return the response body. `startrow`
    /// selects the 10-row page; `0` also serves as the total-count probe.
    pub async fn search_with_retry(
        &self,
        query: &Query,
        startrow: u64,
        vercode: &str,
        retries: u32,
    ) -> Result<String, PortalError> {
        let form = query.form_body(startrow, vercode);
        debug!(startrow, "POST {SEARCH_ENDPOINT}");
        let response = self
            .send_with_retry(
                || {
                    self.http
                        .post(self.url(SEARCH_ENDPOINT))
                        .headers(self.request_headers())
                        .form(&form)
                },
                retries,
            )
            .await?;
        Ok(response.text().await?)
    }

    /// GET the landing page HTML (used for the option scrape), with retry.
    pub async fn landing_page(&self, retries: u32) -> Result<String, PortalError> {
        debug!("GET {SEARCH_PAGE}");
        let response = self
            .send_with_retry(
                || {
                    self.http
                        .get(self.url(SEARCH_PAGE))
                        .headers(self.request_headers())
                },
                retries,
            )
            .await?;
        Ok(response.text().await?)
    }

    /// Download the CAPTCHA image to `path`.
    pub async fn save_verification_image(&self, path: &Path) -> anyhow::Result<()> {
        let response = self
            .http
            .get(self.url(VERCODE_ENDPOINT))
            .headers(self.request_headers())
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            anyhow::bail!(
                "verification image request returned status {}",
                response.status()
            );
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }
}

/// Download the CAPTCHA and block until the human transcribes it.
///
/// A failed download or read is not fatal: an empty code is returned with a
/// warning, and the caller decides whether to proceed (the portal will then
/// reject most requests).
pub async fn obtain_verification_code(client: &PortalClient) -> String {
    if let Err(e) = client
        .save_verification_image(Path::new(VERCODE_IMAGE))
        .await
    {
        warn!(error = %e, "failed to download verification image, continuing without a code");
        return String::new();
    }

    info!("verification image saved as {VERCODE_IMAGE}");
    info!("open {VERCODE_IMAGE} and enter the code below");
    match read_line("Verification code: ").await {
        Ok(code) => code,
        Err(e) => {
            warn!(error = %e, "could not read verification code from stdin");
            String::new()
        }
    }
}

/// Prompt on stdout and read one trimmed line from stdin without blocking
/// the runtime.
async fn read_line(prompt: &str) -> io::Result<String> {
    let prompt = prompt.to_owned();
    tokio::task::spawn_blocking(move || {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_owned())
    })
    .await
    .map_err(io::Error::other)?
}

/// Clip a body snippet for log output, respecting char boundaries.
fn truncate(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
