//! Choosing where to send a user after login or a form post.

use crate::urls::UrlSplit;

/// Endpoint resolved when neither `next` nor a referrer is available.
pub const DEFAULT_REDIRECT_ENDPOINT: &str = "home";

/// The parts of the incoming request that redirect selection reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectContext {
    /// The `next` query parameter.
    pub next: Option<String>,
    /// The `Referer` header.
    pub referrer: Option<String>,
}

impl RedirectContext {
    /// Build from a raw query string (without the leading `?`) and referrer.
    ///
    /// ```
    /// use newspipe_utils::RedirectContext;
    ///
    /// let ctx = RedirectContext::from_query("page=2&next=https%3A%2F%2Fexample.com%2Ffeeds", None);
    /// assert_eq!(ctx.next.as_deref(), Some("https://example.com/feeds"));
    /// ```
    pub fn from_query(query: &str, referrer: Option<&str>) -> Self {
        let next = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "next")
            .map(|(_, v)| v.into_owned());
        RedirectContext {
            next,
            referrer: referrer.map(str::to_string),
        }
    }
}

/// Maps an endpoint name to its URL.
pub trait RouteResolver {
    fn url_for(&self, endpoint: &str) -> String;
}

impl<F> RouteResolver for F
where
    F: Fn(&str) -> String,
{
    fn url_for(&self, endpoint: &str) -> String {
        self(endpoint)
    }
}

/// [`safe_redirect_url_or`] with the `home` endpoint as fallback.
pub fn safe_redirect_url<R>(ctx: &RedirectContext, resolver: &R) -> Option<String>
where
    R: RouteResolver + ?Sized,
{
    safe_redirect_url_or(ctx, resolver, DEFAULT_REDIRECT_ENDPOINT)
}

/// Pick `next`, else the referrer, else the URL of `default`; empty values
/// count as missing.
///
/// The target is returned only when it carries a network location; targets
/// without one yield `None`.
///
/// ```
/// use newspipe_utils::{safe_redirect_url, RedirectContext};
///
/// let resolver = |endpoint: &str| format!("/{endpoint}");
/// let ctx = RedirectContext {
///     next: Some("https://reader.example.com/feeds".into()),
///     referrer: None,
/// };
/// assert_eq!(
///     safe_redirect_url(&ctx, &resolver).as_deref(),
///     Some("https://reader.example.com/feeds")
/// );
/// assert_eq!(safe_redirect_url(&RedirectContext::default(), &resolver), None);
/// ```
pub fn safe_redirect_url_or<R>(ctx: &RedirectContext, resolver: &R, default: &str) -> Option<String>
where
    R: RouteResolver + ?Sized,
{
    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
    let target = present(&ctx.next)
        .or_else(|| present(&ctx.referrer))
        .unwrap_or_else(|| resolver.url_for(default));

    if !target.is_empty() && !UrlSplit::parse(&target).netloc.is_empty() {
        Some(target)
    } else {
        tracing::debug!(%target, "redirect.target.without_netloc");
        None
    }
}
