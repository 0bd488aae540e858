//! Favicon probing against a list of candidate base URLs.

use crate::fetch::newspipe_get;
use crate::urls::{rebuild_url, UrlSplit};
use newspipe_http::{GetOpts, HttpClient, HttpError};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

/// Why fetching a candidate failed before a response could be judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    InvalidRequest,
    Timeout,
    Connect,
    Redirect,
    Body,
    Other,
}

impl ProbeFailure {
    pub fn classify(err: &HttpError) -> Self {
        match err {
            HttpError::Url(_) | HttpError::Build(_) => ProbeFailure::InvalidRequest,
            HttpError::Request(e) if e.is_timeout() => ProbeFailure::Timeout,
            HttpError::Request(e) if e.is_connect() => ProbeFailure::Connect,
            HttpError::Request(e) if e.is_redirect() => ProbeFailure::Redirect,
            HttpError::Request(e) if e.is_body() || e.is_decode() => ProbeFailure::Body,
            HttpError::Request(e) if e.is_builder() => ProbeFailure::InvalidRequest,
            HttpError::Request(_) => ProbeFailure::Other,
        }
    }
}

#[derive(Debug)]
enum Verdict {
    Accepted(String),
    Status(StatusCode),
    /// Servers often answer missing icons with a styled HTML 404 page.
    Html,
    Empty,
    Failed(ProbeFailure),
}

/// Media types are case-insensitive, so `Text/HTML` counts as HTML too.
fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("html")
}

async fn probe(client: &HttpClient, url: &str) -> Verdict {
    let resp = match newspipe_get(client, url, GetOpts::default()).await {
        Ok(resp) => resp,
        Err(e) => return Verdict::Failed(ProbeFailure::classify(&e)),
    };

    let status = resp.status();
    if !status.is_success() {
        return Verdict::Status(status);
    }
    let is_html = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_html);
    let final_url = resp.url().to_string();

    match resp.bytes().await {
        Err(e) => Verdict::Failed(ProbeFailure::classify(&HttpError::Request(e))),
        Ok(_) if is_html => Verdict::Html,
        Ok(body) if body.is_empty() => Verdict::Empty,
        Ok(_) => Verdict::Accepted(final_url),
    }
}

/// First working icon URL, trying `url` against each candidate base in order.
///
/// `None` entries are skipped. A candidate is accepted when the response is
/// 2xx, its content type is not HTML, and the body is non-empty; the
/// post-redirect URL is returned. Failed candidates are logged and skipped.
pub async fn try_get_icon_url(
    client: &HttpClient,
    url: &str,
    splits: &[Option<UrlSplit>],
) -> Option<String> {
    for split in splits.iter().flatten() {
        let candidate = rebuild_url(url, split);
        match probe(client, &candidate).await {
            Verdict::Accepted(final_url) => {
                tracing::debug!(%candidate, %final_url, "icon.candidate.accepted");
                return Some(final_url);
            }
            verdict => {
                tracing::debug!(%candidate, ?verdict, "icon.candidate.rejected");
            }
        }
    }
    None
}
