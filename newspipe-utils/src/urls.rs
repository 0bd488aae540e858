//! URL splitting and normalization against a base URL.
//!
//! `url::Url` only models absolute URLs, but feeds hand us relative icon and
//! link paths, so [`UrlSplit`] keeps the five generic components as plain
//! strings and reassembles them without resolving anything.

use std::fmt;

/// Schemes whose URLs carry a `//netloc` part even when the netloc is empty.
const USES_NETLOC: &[&str] = &[
    "", "ftp", "http", "gopher", "nntp", "telnet", "imap", "wais", "file", "mms", "https",
    "shttp", "snews", "prospero", "rtsp", "rtsps", "rtspu", "rsync", "svn", "svn+ssh", "sftp",
    "nfs", "git", "git+ssh", "ws", "wss", "itms-services",
];

/// A URL broken into scheme, network location, path, query, and fragment.
///
/// ```
/// use newspipe_utils::UrlSplit;
///
/// let s = UrlSplit::parse("https://example.com/feed.xml?page=2#top");
/// assert_eq!(s.scheme, "https");
/// assert_eq!(s.netloc, "example.com");
/// assert_eq!(s.path, "/feed.xml");
/// assert_eq!(s.query, "page=2");
/// assert_eq!(s.fragment, "top");
/// assert_eq!(s.to_string(), "https://example.com/feed.xml?page=2#top");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UrlSplit {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl UrlSplit {
    /// Split any string; never fails. Missing components are empty.
    pub fn parse(raw: &str) -> Self {
        let cleaned: String = raw
            .trim_start_matches(|c: char| c <= ' ')
            .chars()
            .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
            .collect();
        let mut rest = cleaned.as_str();
        let mut split = UrlSplit::default();

        if let Some(i) = rest.find(':') {
            let candidate = &rest[..i];
            if is_scheme(candidate) {
                split.scheme = candidate.to_ascii_lowercase();
                rest = &rest[i + 1..];
            }
        }

        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            split.netloc = after[..end].to_string();
            rest = &after[end..];
        }

        if let Some((before, fragment)) = rest.split_once('#') {
            split.fragment = fragment.to_string();
            rest = before;
        }
        if let Some((before, query)) = rest.split_once('?') {
            split.query = query.to_string();
            rest = before;
        }
        split.path = rest.to_string();
        split
    }

    pub fn has_scheme_and_netloc(&self) -> bool {
        !self.scheme.is_empty() && !self.netloc.is_empty()
    }

    /// Reassemble the components into a URL string.
    pub fn unsplit(&self) -> String {
        let mut out = String::new();
        if !self.scheme.is_empty() {
            out.push_str(&self.scheme);
            out.push(':');
        }

        if !self.netloc.is_empty() {
            out.push_str("//");
            out.push_str(&self.netloc);
            if !self.path.is_empty() && !self.path.starts_with('/') {
                out.push('/');
            }
        } else if self.path.starts_with("//")
            || (!self.scheme.is_empty()
                && USES_NETLOC.contains(&self.scheme.as_str())
                && (self.path.is_empty() || self.path.starts_with('/')))
        {
            out.push_str("//");
        }
        out.push_str(&self.path);

        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            out.push('#');
            out.push_str(&self.fragment);
        }
        out
    }
}

impl fmt::Display for UrlSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unsplit())
    }
}

impl From<&::url::Url> for UrlSplit {
    fn from(url: &::url::Url) -> Self {
        UrlSplit {
            scheme: url.scheme().to_string(),
            netloc: url.authority().to_string(),
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
            fragment: url.fragment().unwrap_or_default().to_string(),
        }
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Make `url` absolute using `base` for a missing scheme or netloc.
///
/// Absolute input is returned untouched. Otherwise the path of `url` is kept
/// and query and fragment are always dropped.
///
/// ```
/// use newspipe_utils::{rebuild_url, UrlSplit};
///
/// let base = UrlSplit::parse("https://example.com/blog/feed?format=atom");
/// assert_eq!(rebuild_url("/favicon.ico?v=2", &base), "https://example.com/favicon.ico");
/// assert_eq!(rebuild_url("http://cdn.example.org/i.png?x#y", &base), "http://cdn.example.org/i.png?x#y");
/// ```
pub fn rebuild_url(url: &str, base: &UrlSplit) -> String {
    let split = UrlSplit::parse(url);
    if split.has_scheme_and_netloc() {
        return url.to_string();
    }
    let pick = |own: String, fallback: &str| {
        if own.is_empty() {
            fallback.to_string()
        } else {
            own
        }
    };
    UrlSplit {
        scheme: pick(split.scheme, &base.scheme),
        netloc: pick(split.netloc, &base.netloc),
        path: split.path,
        query: String::new(),
        fragment: String::new(),
    }
    .unsplit()
}
