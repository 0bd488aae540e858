//! HTTP client with the crawler's fixed request policy.
//!
//! - GET defaults: TLS verification off, redirects followed, configured
//!   timeout and `User-Agent`
//! - Per-call [`GetOpts`] override any of those defaults
//! - JSON POST with caller headers; secret headers are redacted in logs
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), newspipe_http::HttpError> {
//! use std::time::Duration;
//!
//! let client = newspipe_http::HttpClient::new(Duration::from_secs(30), "Newspipe")?;
//! let resp = client
//!     .get("https://example.com/favicon.ico", newspipe_http::GetOpts::default())
//!     .await?;
//! println!("{} -> {}", resp.url(), resp.status());
//! # Ok(()) }
//! ```
//!
//! Transport failures are returned as [`HttpError::Request`] carrying the
//! underlying `reqwest::Error`, so callers can still ask it `is_timeout()`
//! or `is_connect()`.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use std::borrow::Cow;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Redirect hop limit for crawler requests.
const MAX_REDIRECTS: usize = 30;
const SNIPPET_MAX: usize = 500;
const SECRET_HEADERS: &[&str] = &["authorization", "x-api-key", "cookie"];

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

// ==============================
// Request options
// ==============================

/// Per-call overrides for [`HttpClient::get`]. `None` keeps the client default.
///
/// A supplied `headers` map replaces the default header set, `User-Agent`
/// included.
///
/// ```
/// use newspipe_http::GetOpts;
/// use std::time::Duration;
///
/// let opts = GetOpts {
///     timeout: Some(Duration::from_secs(2)),
///     follow_redirects: Some(false),
///     ..Default::default()
/// };
/// assert!(opts.verify_tls.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct GetOpts<'a> {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
    pub verify_tls: Option<bool>,
    pub follow_redirects: Option<bool>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    /// Crawler policy: no TLS verification, redirects followed.
    crawler: Client,
    /// Verified TLS, used for authenticated API calls.
    verified: Client,
    user_agent: HeaderValue,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Build a client with the crawler timeout and user agent.
    ///
    /// ```no_run
    /// use newspipe_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new(Duration::from_secs(30), "Newspipe")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, HttpError> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| HttpError::Build(format!("invalid User-Agent: {e}")))?;
        Ok(Self {
            crawler: build_client(false, true)?,
            verified: build_client(true, true)?,
            user_agent,
            default_timeout: timeout,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn user_agent(&self) -> &HeaderValue {
        &self.user_agent
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers
    }

    fn client_for(&self, verify_tls: bool, follow_redirects: bool) -> Result<Client, HttpError> {
        match (verify_tls, follow_redirects) {
            (false, true) => Ok(self.crawler.clone()),
            (true, true) => Ok(self.verified.clone()),
            _ => build_client(verify_tls, follow_redirects),
        }
    }

    /// GET `url` with the crawler defaults, overridden by `opts`.
    ///
    /// The response is returned whatever its status; only transport failures
    /// become errors.
    pub async fn get(&self, url: &str, opts: GetOpts<'_>) -> Result<Response, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(format!("{url}: {e}")))?;
        let verify_tls = opts.verify_tls.unwrap_or(false);
        let follow_redirects = opts.follow_redirects.unwrap_or(true);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let headers = opts.headers.unwrap_or_else(|| self.default_headers());

        let mut rb = self
            .client_for(verify_tls, follow_redirects)?
            .get(url.clone())
            .timeout(timeout)
            .headers(headers);
        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        tracing::debug!(
            host_path = %host_path(&url),
            timeout_ms = timeout.as_millis() as u64,
            verify_tls,
            follow_redirects,
            "http.get.start"
        );

        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|e| {
            tracing::debug!(
                host_path = %host_path(&url),
                timeout = e.is_timeout(),
                connect = e.is_connect(),
                message = %e,
                "http.get.failed"
            );
            HttpError::Request(e)
        })?;

        tracing::debug!(
            status = %resp.status(),
            final_url = %resp.url(),
            duration_ms = t0.elapsed().as_millis() as u64,
            "http.response"
        );
        Ok(resp)
    }

    /// POST `body` as JSON to `url` over verified TLS.
    ///
    /// `Content-Type` and `Accept` default to `application/json`; entries in
    /// `headers` are added on top.
    pub async fn post_json<B>(
        &self,
        url: Url,
        body: &B,
        headers: HeaderMap,
    ) -> Result<Response, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;

        let mut merged = HeaderMap::new();
        merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        merged.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in headers.iter() {
            merged.insert(name, value.clone());
        }

        tracing::debug!(
            host_path = %host_path(&url),
            headers = ?redact_headers(&merged),
            body_len = bytes.len(),
            "http.post.start"
        );

        let t0 = Instant::now();
        let resp = self
            .verified
            .post(url)
            .timeout(self.default_timeout)
            .headers(merged)
            .body(bytes)
            .send()
            .await?;

        tracing::debug!(
            status = %resp.status(),
            duration_ms = t0.elapsed().as_millis() as u64,
            "http.response"
        );
        Ok(resp)
    }
}

// ==============================
// Helpers
// ==============================

fn build_client(verify_tls: bool, follow_redirects: bool) -> Result<Client, HttpError> {
    let redirect = if follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };
    Client::builder()
        .danger_accept_invalid_certs(!verify_tls)
        .redirect(redirect)
        .build()
        .map_err(|e| HttpError::Build(e.to_string()))
}

fn host_path(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or("-"), url.path())
}

/// Header pairs for logging, with secret values replaced.
pub fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if SECRET_HEADERS.contains(&key.to_ascii_lowercase().as_str()) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

/// Lossy UTF-8 prefix of a response body for log lines.
pub fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).into_owned();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
