//! The crawler's GET policy, bound to [`NewspipeConfig`].

use newspipe_config::NewspipeConfig;
use newspipe_http::{GetOpts, HttpClient, HttpError};
use reqwest::Response;

/// Client carrying the configured crawler timeout and user agent.
///
/// A config built by hand is not validated by the loader, so an unusable
/// timeout surfaces here as [`HttpError::Build`].
pub fn crawler_client(config: &NewspipeConfig) -> Result<HttpClient, HttpError> {
    let timeout = config
        .crawler_timeout()
        .map_err(|e| HttpError::Build(e.to_string()))?;
    HttpClient::new(timeout, &config.crawler_user_agent)
}

/// GET `url` without TLS verification, following redirects, with the
/// configured timeout and `User-Agent`. Fields set in `overrides` win.
///
/// Transport errors are returned unchanged; HTTP error statuses are not errors.
pub async fn newspipe_get(
    client: &HttpClient,
    url: &str,
    overrides: GetOpts<'_>,
) -> Result<Response, HttpError> {
    client.get(url, overrides).await
}
