//! Reporting vulnerability sightings to a Vulnerability Lookup instance.
//!
//! An article that mentions vulnerability identifiers produces one "seen"
//! sighting per identifier, POSTed to `<base>/sighting/` with the configured
//! API key. Delivery is best effort: failures are logged and the remaining
//! identifiers are still sent. Nothing is retried.

use newspipe_common::NewspipeError;
use newspipe_config::NewspipeConfig;
use newspipe_http::{snip_body, HttpClient};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");
const SIGHTING_PATH: &str = "sighting/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SightingType {
    Seen,
}

/// Request body for `POST /sighting/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sighting<'a> {
    #[serde(rename = "type")]
    pub kind: SightingType,
    pub source: &'a str,
    pub vulnerability: &'a str,
}

impl<'a> Sighting<'a> {
    pub fn seen(source: &'a str, vulnerability: &'a str) -> Self {
        Sighting {
            kind: SightingType::Seen,
            source,
            vulnerability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SightingOutcome {
    Accepted(StatusCode),
    Rejected { status: StatusCode, reason: String },
    Failed(String),
}

impl SightingOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SightingOutcome::Accepted(_))
    }
}

/// Per-identifier outcomes, in the order the identifiers were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SightingReport {
    pub outcomes: Vec<(String, SightingOutcome)>,
}

impl SightingReport {
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_accepted()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.accepted()
    }
}

/// `<base>/sighting/` using URL-join rules (a base without a trailing slash
/// loses its last path segment).
///
/// ```
/// use newspipe_utils::sighting::sighting_endpoint;
///
/// let url = sighting_endpoint("https://lookup.example/api/").unwrap();
/// assert_eq!(url.as_str(), "https://lookup.example/api/sighting/");
/// ```
pub fn sighting_endpoint(base_url: &str) -> Result<Url, NewspipeError> {
    Url::parse(base_url)
        .and_then(|base| base.join(SIGHTING_PATH))
        .map_err(|e| NewspipeError::InvalidUrl(format!("{base_url}: {e}")))
}

fn api_headers(token: &str) -> Result<HeaderMap, NewspipeError> {
    let value = HeaderValue::from_str(token)
        .map_err(|e| NewspipeError::Config(format!("invalid vulnerability auth token: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, value);
    Ok(headers)
}

/// Push one "seen" sighting per identifier for `article_uri`.
///
/// Never fails: each identifier's outcome is logged and recorded in the
/// returned report. Requests are sent one at a time, in order.
pub async fn push_sighting_to_vulnerability_lookup<S: AsRef<str>>(
    client: &HttpClient,
    config: &NewspipeConfig,
    article_uri: &str,
    vulnerability_ids: &[S],
) -> SightingReport {
    tracing::info!(
        source = %article_uri,
        count = vulnerability_ids.len(),
        "sighting.push.start"
    );

    let setup = sighting_endpoint(&config.vulnerability_lookup_base_url)
        .and_then(|url| Ok((url, api_headers(&config.vulnerability_auth_token)?)));
    let (endpoint, headers) = match setup {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "sighting.push.misconfigured");
            let outcomes = vulnerability_ids
                .iter()
                .map(|id| (id.as_ref().to_string(), SightingOutcome::Failed(e.to_string())))
                .collect();
            return SightingReport { outcomes };
        }
    };

    let mut report = SightingReport::default();
    for vuln in vulnerability_ids {
        let vuln = vuln.as_ref();
        let body = Sighting::seen(article_uri, vuln);
        let outcome = match client.post_json(endpoint.clone(), &body, headers.clone()).await {
            Ok(resp) => {
                let status = resp.status();
                if status == StatusCode::OK || status == StatusCode::CREATED {
                    tracing::debug!(vulnerability = %vuln, %status, "sighting.accepted");
                    SightingOutcome::Accepted(status)
                } else {
                    let reason = status.canonical_reason().unwrap_or("unknown").to_string();
                    let snippet = resp
                        .bytes()
                        .await
                        .map(|b| snip_body(&b))
                        .unwrap_or_default();
                    tracing::warn!(
                        vulnerability = %vuln,
                        %status,
                        %reason,
                        body_snippet = %snippet,
                        "sighting.rejected"
                    );
                    SightingOutcome::Rejected { status, reason }
                }
            }
            Err(e) => {
                tracing::warn!(vulnerability = %vuln, error = %e, "sighting.network_error");
                SightingOutcome::Failed(e.to_string())
            }
        };
        report.outcomes.push((vuln.to_string(), outcome));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sighting_serializes_with_type_field() {
        let body = Sighting::seen("https://news.example/a/1", "CVE-2024-1234");
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "type": "seen",
                "source": "https://news.example/a/1",
                "vulnerability": "CVE-2024-1234"
            })
        );
    }

    #[test]
    fn endpoint_follows_join_rules() {
        assert_eq!(
            sighting_endpoint("https://lookup.example/").unwrap().as_str(),
            "https://lookup.example/sighting/"
        );
        assert_eq!(
            sighting_endpoint("https://lookup.example/api").unwrap().as_str(),
            "https://lookup.example/sighting/"
        );
        assert!(matches!(
            sighting_endpoint("lookup.example"),
            Err(NewspipeError::InvalidUrl(_))
        ));
    }

    #[test]
    fn api_headers_reject_control_characters() {
        assert!(api_headers("abc\n").is_err());
        let h = api_headers("tok").unwrap();
        assert_eq!(h.get("x-api-key").unwrap(), "tok");
    }

    #[test]
    fn report_counts() {
        let report = SightingReport {
            outcomes: vec![
                ("a".into(), SightingOutcome::Accepted(StatusCode::CREATED)),
                ("b".into(), SightingOutcome::Failed("down".into())),
                (
                    "c".into(),
                    SightingOutcome::Rejected {
                        status: StatusCode::FORBIDDEN,
                        reason: "Forbidden".into(),
                    },
                ),
            ],
        };
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.failed(), 2);
    }
}
