//! Common types shared across the Newspipe crates.
//!
//! - [`NewspipeError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! The crate stays dependency-light so the HTTP, config, and helper crates can
//! all depend on it.

pub mod observability;

/// Error types used across the Newspipe helpers.
#[derive(thiserror::Error, Debug)]
pub enum NewspipeError {
    /// A value reached the JSON fallback without any serialization capability.
    #[error("Object of type {type_name} with value of {repr} is not JSON serializable")]
    NotSerializable {
        type_name: &'static str,
        repr: String,
    },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Convenient alias for results that use [`NewspipeError`].
pub type Result<T> = std::result::Result<T, NewspipeError>;
