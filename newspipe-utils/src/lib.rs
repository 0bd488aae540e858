//! Helpers used by the Newspipe web application and crawler.
//!
//! - [`json`]: fallback serialization for values `serde_json` cannot encode directly
//! - [`urls`]: URL splitting and [`rebuild_url`] normalization against a base
//! - [`text`]: [`to_hash`] fingerprints and [`clear_string`] sanitization
//! - [`collections`]: [`try_keys`] and [`remove_case_insensitive_duplicates`]
//! - [`fetch`]: [`newspipe_get`], the crawler GET policy
//! - [`icon`]: [`try_get_icon_url`] favicon probing
//! - [`redirect`]: [`safe_redirect_url`] for post-login redirects
//! - [`sighting`]: pushing vulnerability sightings to a Vulnerability Lookup instance
//!
//! Everything here is stateless apart from the read-only
//! [`newspipe_config::NewspipeConfig`] and the [`newspipe_http::HttpClient`]
//! built from it. Network helpers await each request before issuing the next.

pub mod collections;
pub mod fetch;
pub mod icon;
pub mod json;
pub mod redirect;
pub mod sighting;
pub mod text;
pub mod urls;

pub use collections::{remove_case_insensitive_duplicates, try_keys};
pub use fetch::{crawler_client, newspipe_get};
pub use icon::{try_get_icon_url, ProbeFailure};
pub use json::{default_handler, default_handler_with_role, JsonDefault};
pub use redirect::{safe_redirect_url, RedirectContext, RouteResolver};
pub use sighting::{push_sighting_to_vulnerability_lookup, SightingReport};
pub use text::{clear_string, to_hash};
pub use urls::{rebuild_url, UrlSplit};
