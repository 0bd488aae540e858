//! Fingerprints and light text cleanup.

use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("HTML tag pattern compiles"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("whitespace pattern compiles"));

/// MD5 hex digest of `data`; text is hashed as its UTF-8 bytes.
///
/// ```
/// use newspipe_utils::to_hash;
///
/// assert_eq!(to_hash("newspipe"), to_hash(b"newspipe".as_slice()));
/// assert_eq!(to_hash(""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
pub fn to_hash<T: AsRef<[u8]>>(data: T) -> String {
    format!("{:x}", md5::compute(data))
}

/// Replace each whitespace character with a space, then drop `<...>` tags.
///
/// Runs of whitespace are not merged: every whitespace character becomes
/// exactly one space.
///
/// ```
/// use newspipe_utils::clear_string;
///
/// assert_eq!(clear_string("<p>Breaking\nnews</p>"), "Breaking news");
/// assert_eq!(clear_string("a\n\nb"), "a  b");
/// ```
pub fn clear_string(data: &str) -> String {
    let spaced = WHITESPACE.replace_all(data, " ");
    HTML_TAG.replace_all(&spaced, "").into_owned()
}
