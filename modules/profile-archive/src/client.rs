// Plain HTTP transport for profile pages, behind a trait so strategies can be
// exercised without the network.

use std::time::Duration;

use async_trait::async_trait;
use profile_common::HarvestConfig;
use rand::Rng;
use reqwest::redirect::Policy;
use tracing::{debug, warn};

use crate::error::ExtractionError;

/// Upper bound on redirects followed for a single request.
const MAX_REDIRECTS: usize = 10;
/// Base backoff for connection retries. Actual delay is base * 2^attempt + jitter, capped.
const RETRY_BASE: Duration = Duration::from_secs(1);
const RETRY_CAP: Duration = Duration::from_secs(10);

/// Response after redirects, with the body already read.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedBody {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PageClient: Send + Sync {
    /// GET a URL following redirects. Any HTTP status is returned as a body;
    /// only transport failures are errors.
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedBody, ExtractionError>;

    /// Follow redirects and report where they ended and with which status.
    /// The body is not read; `body` is always empty.
    async fn resolve(&self, url: &str, timeout: Duration) -> Result<FetchedBody, ExtractionError>;
}

pub struct HttpPageClient {
    client: reqwest::Client,
    max_attempts: u32,
}

impl HttpPageClient {
    pub fn new(config: &HarvestConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self {
            client,
            max_attempts: config.max_retries.max(1),
        })
    }

    /// Send a GET, retrying only when the connection itself could not be made.
    /// Timeouts and HTTP statuses are never retried.
    async fn send(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, ExtractionError> {
        let mut attempt = 0;
        loop {
            match self.client.get(url).timeout(timeout).send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_connect() && !e.is_timeout() && attempt + 1 < self.max_attempts => {
                    let backoff = (RETRY_BASE * 2u32.pow(attempt)).min(RETRY_CAP);
                    let jitter = Duration::from_millis(rand::rng().random_range(0..500));
                    warn!(url, attempt = attempt + 1, error = %e, "Connection failed, retrying");
                    tokio::time::sleep(backoff + jitter).await;
                    attempt += 1;
                }
                Err(e) => return Err(transport_error(url, &e)),
            }
        }
    }
}

#[async_trait]
impl PageClient for HttpPageClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedBody, ExtractionError> {
        let resp = self.send(url, timeout).await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().await.map_err(|e| transport_error(url, &e))?;
        debug!(url, final_url = final_url.as_str(), status, bytes = body.len(), "Fetched page");
        Ok(FetchedBody {
            final_url,
            status,
            body,
        })
    }

    async fn resolve(&self, url: &str, timeout: Duration) -> Result<FetchedBody, ExtractionError> {
        let resp = self.send(url, timeout).await?;
        Ok(FetchedBody {
            final_url: resp.url().to_string(),
            status: resp.status().as_u16(),
            body: String::new(),
        })
    }
}

fn transport_error(url: &str, e: &reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::network(url, "request timed out")
    } else if e.is_redirect() {
        ExtractionError::network(url, format!("too many redirects: {e}"))
    } else {
        ExtractionError::network(url, e.to_string())
    }
}

/// Hosts and leading path segments that mean the share link landed on a login page.
const SIGN_IN_HOSTS: [&str; 3] = ["accounts.google.com", "account.proton.me", "login.live.com"];
const SIGN_IN_PATHS: [&str; 3] = ["/login", "/signin", "/sign-in"];

/// Whether a post-redirect URL is a sign-in wall rather than the document.
pub fn is_sign_in_url(final_url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(final_url) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    if SIGN_IN_HOSTS.contains(&host.as_str()) {
        return true;
    }
    let path = parsed.path().to_lowercase();
    SIGN_IN_PATHS.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Turn a fetched body into a usable one: sign-in walls and non-2xx statuses are errors.
pub(crate) fn require_content(url: &str, fetched: FetchedBody) -> Result<FetchedBody, ExtractionError> {
    if is_sign_in_url(&fetched.final_url) {
        return Err(ExtractionError::AuthRequired(fetched.final_url));
    }
    if !fetched.is_success() {
        return Err(ExtractionError::HttpStatus {
            url: url.to_string(),
            status: fetched.status,
        });
    }
    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(final_url: &str, status: u16) -> FetchedBody {
        FetchedBody {
            final_url: final_url.to_string(),
            status,
            body: "hello".to_string(),
        }
    }

    #[test]
    fn sign_in_walls_are_detected() {
        assert!(is_sign_in_url(
            "https://accounts.google.com/ServiceLogin?continue=https://docs.google.com/x"
        ));
        assert!(is_sign_in_url("https://www.dropbox.com/login?cont=abc"));
        assert!(is_sign_in_url("https://account.proton.me/login"));
        assert!(!is_sign_in_url("https://docs.google.com/document/d/abc/edit"));
        assert!(!is_sign_in_url("https://example.com/blog/login-tips"));
        assert!(!is_sign_in_url("not a url"));
    }

    #[test]
    fn sign_in_paths_match_whole_segments() {
        assert!(is_sign_in_url("https://example.com/signin"));
        assert!(is_sign_in_url("https://example.com/sign-in/"));
        assert!(is_sign_in_url("https://example.com/login/sso?next=/me"));
        assert!(!is_sign_in_url("https://example.com/signing-up"));
        assert!(!is_sign_in_url("https://example.com/loginhelp"));
    }

    #[test]
    fn require_content_rejects_walls_before_status() {
        let err = require_content("https://x", body("https://accounts.google.com/signin", 200))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::AuthRequired(_)));
    }

    #[test]
    fn require_content_reports_status_against_requested_url() {
        let err = require_content("https://a.example/me", body("https://b.example/me", 404))
            .unwrap_err();
        assert_eq!(
            err,
            ExtractionError::HttpStatus {
                url: "https://a.example/me".into(),
                status: 404
            }
        );
        assert!(require_content("https://a.example", body("https://a.example", 204)).is_ok());
    }
}
