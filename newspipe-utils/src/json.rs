//! Fallback JSON encoding for values `serde` cannot serialize directly.
//!
//! A type opts in by implementing [`JsonDefault`] and overriding the
//! capability accessors that apply to it. [`default_handler`] tries them in a
//! fixed order: timestamp, role-aware dump, sequence, error. A value with no
//! capability is rejected with [`NewspipeError::NotSerializable`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Timelike};
use newspipe_common::{NewspipeError, Result};
use newspipe_http::HttpError;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::BuildHasher;

/// Role used by [`default_handler`] when none is given.
pub const DEFAULT_ROLE: &str = "admin";

/// ISO-8601 rendering.
pub trait Isoformat {
    fn isoformat(&self) -> String;
}

/// Role-aware JSON projection, e.g. a model hiding fields from non-admins.
pub trait Dump {
    fn dump(&self, role: &str) -> Value;
}

/// Capabilities consulted by [`default_handler`]. Every accessor defaults to
/// "not supported".
pub trait JsonDefault: fmt::Debug {
    fn as_isoformat(&self) -> Option<&dyn Isoformat> {
        None
    }

    fn as_dump(&self) -> Option<&dyn Dump> {
        None
    }

    /// Materialized elements for set-like or lazily produced sequences.
    fn as_sequence(&self) -> Option<Vec<Value>> {
        None
    }

    fn as_error(&self) -> Option<&dyn std::error::Error> {
        None
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// [`default_handler_with_role`] with [`DEFAULT_ROLE`].
pub fn default_handler<T: JsonDefault + ?Sized>(obj: &T) -> Result<Value> {
    default_handler_with_role(obj, DEFAULT_ROLE)
}

/// Encode `obj` through the first capability it supports.
///
/// ```
/// use newspipe_utils::default_handler;
/// use std::collections::BTreeSet;
///
/// let tags = BTreeSet::from(["rust", "feeds"]);
/// assert_eq!(default_handler(&tags).unwrap(), serde_json::json!(["feeds", "rust"]));
/// ```
pub fn default_handler_with_role<T: JsonDefault + ?Sized>(obj: &T, role: &str) -> Result<Value> {
    if let Some(ts) = obj.as_isoformat() {
        return Ok(Value::String(ts.isoformat()));
    }
    if let Some(dumpable) = obj.as_dump() {
        return Ok(dumpable.dump(role));
    }
    if let Some(items) = obj.as_sequence() {
        return Ok(Value::Array(items));
    }
    if let Some(err) = obj.as_error() {
        return Ok(Value::String(err.to_string()));
    }
    Err(NewspipeError::NotSerializable {
        type_name: obj.type_name(),
        repr: format!("{obj:?}"),
    })
}

fn serialize_all<'a, T, I>(items: I) -> Option<Vec<Value>>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()
}

// ==============================
// Timestamps
// ==============================

/// Whether a fraction is rendered: always six digits, never below a microsecond.
fn has_micros<T: Timelike>(t: &T) -> bool {
    t.nanosecond() / 1_000 != 0
}

impl<Tz: TimeZone> Isoformat for DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn isoformat(&self) -> String {
        let precision = if has_micros(self) {
            SecondsFormat::Micros
        } else {
            SecondsFormat::Secs
        };
        self.to_rfc3339_opts(precision, false)
    }
}

impl<Tz: TimeZone> JsonDefault for DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn as_isoformat(&self) -> Option<&dyn Isoformat> {
        Some(self)
    }
}

macro_rules! impl_json_isoformat {
    ($ty:ty) => {
        impl JsonDefault for $ty {
            fn as_isoformat(&self) -> Option<&dyn Isoformat> {
                Some(self)
            }
        }
    };
}

macro_rules! naive_isoformat {
    ($($ty:ty => $fmt:literal),* $(,)?) => {
        $(
            impl Isoformat for $ty {
                fn isoformat(&self) -> String {
                    self.format($fmt).to_string()
                }
            }

            impl_json_isoformat!($ty);
        )*
    };
}

macro_rules! naive_timelike_isoformat {
    ($($ty:ty => $fmt:literal),* $(,)?) => {
        $(
            impl Isoformat for $ty {
                fn isoformat(&self) -> String {
                    let mut out = self.format($fmt).to_string();
                    if has_micros(self) {
                        out.push_str(&self.format("%.6f").to_string());
                    }
                    out
                }
            }

            impl_json_isoformat!($ty);
        )*
    };
}

naive_isoformat! {
    NaiveDate => "%Y-%m-%d",
}

naive_timelike_isoformat! {
    NaiveDateTime => "%Y-%m-%dT%H:%M:%S",
    NaiveTime => "%H:%M:%S",
}

// ==============================
// Sequences
// ==============================

impl<T: Serialize + fmt::Debug, S: BuildHasher> JsonDefault for HashSet<T, S> {
    fn as_sequence(&self) -> Option<Vec<Value>> {
        serialize_all(self.iter())
    }
}

impl<T: Serialize + fmt::Debug> JsonDefault for BTreeSet<T> {
    fn as_sequence(&self) -> Option<Vec<Value>> {
        serialize_all(self.iter())
    }
}

/// A lazily produced sequence, drained on first encoding.
///
/// ```
/// use newspipe_utils::json::{default_handler, LazySeq};
///
/// let squares = LazySeq::new((1..=3).map(|n| n * n));
/// assert_eq!(default_handler(&squares).unwrap(), serde_json::json!([1, 4, 9]));
/// // Like any generator, it is empty once consumed.
/// assert_eq!(default_handler(&squares).unwrap(), serde_json::json!([]));
/// ```
pub struct LazySeq<I>(RefCell<I>);

impl<I> LazySeq<I> {
    pub fn new(iter: I) -> Self {
        LazySeq(RefCell::new(iter))
    }
}

impl<I> fmt::Debug for LazySeq<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<lazy sequence {}>", std::any::type_name::<I>())
    }
}

impl<I> JsonDefault for LazySeq<I>
where
    I: Iterator,
    I::Item: Serialize,
{
    fn as_sequence(&self) -> Option<Vec<Value>> {
        let mut iter = self.0.try_borrow_mut().ok()?;
        iter.by_ref()
            .map(|item| serde_json::to_value(item))
            .collect::<std::result::Result<Vec<_>, _>>()
            .ok()
    }
}

// ==============================
// Errors
// ==============================

macro_rules! error_as_string {
    ($($ty:ty),* $(,)?) => {
        $(
            impl JsonDefault for $ty {
                fn as_error(&self) -> Option<&dyn std::error::Error> {
                    Some(self)
                }
            }
        )*
    };
}

error_as_string!(std::io::Error, serde_json::Error, NewspipeError, HttpError);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    #[derive(Debug)]
    struct Opaque {
        id: u32,
    }

    impl JsonDefault for Opaque {}

    #[derive(Debug)]
    struct Feed {
        title: &'static str,
        owner_email: &'static str,
    }

    impl Dump for Feed {
        fn dump(&self, role: &str) -> Value {
            if role == "admin" {
                json!({ "title": self.title, "owner_email": self.owner_email })
            } else {
                json!({ "title": self.title })
            }
        }
    }

    impl JsonDefault for Feed {
        fn as_dump(&self) -> Option<&dyn Dump> {
            Some(self)
        }
    }

    /// Both a timestamp and dumpable; the timestamp must win.
    #[derive(Debug)]
    struct Stamped;

    impl Isoformat for Stamped {
        fn isoformat(&self) -> String {
            "2024-01-01T00:00:00".into()
        }
    }

    impl Dump for Stamped {
        fn dump(&self, _role: &str) -> Value {
            json!("dumped")
        }
    }

    impl JsonDefault for Stamped {
        fn as_isoformat(&self) -> Option<&dyn Isoformat> {
            Some(self)
        }
        fn as_dump(&self) -> Option<&dyn Dump> {
            Some(self)
        }
    }

    #[test]
    fn datetimes_use_iso_8601() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 5, 10, 11, 12).unwrap();
        assert_eq!(default_handler(&utc).unwrap(), json!("2024-03-05T10:11:12+00:00"));

        let cet = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 10, 11, 12)
            .unwrap();
        assert_eq!(default_handler(&cet).unwrap(), json!("2024-03-05T10:11:12+01:00"));

        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(default_handler(&date).unwrap(), json!("2024-03-05"));

        let naive = date.and_hms_micro_opt(1, 2, 3, 450_000).unwrap();
        assert_eq!(default_handler(&naive).unwrap(), json!("2024-03-05T01:02:03.450000"));
    }

    #[test]
    fn fractions_use_six_digits_or_none() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let whole = date.and_hms_opt(1, 2, 3).unwrap();
        assert_eq!(default_handler(&whole).unwrap(), json!("2024-03-05T01:02:03"));

        let nanos = date.and_hms_nano_opt(1, 2, 3, 123_456_789).unwrap();
        assert_eq!(default_handler(&nanos).unwrap(), json!("2024-03-05T01:02:03.123456"));

        // Below microsecond resolution counts as no fraction.
        let tiny = date.and_hms_nano_opt(1, 2, 3, 999).unwrap();
        assert_eq!(default_handler(&tiny).unwrap(), json!("2024-03-05T01:02:03"));

        let time = NaiveTime::from_hms_milli_opt(23, 59, 1, 5).unwrap();
        assert_eq!(default_handler(&time).unwrap(), json!("23:59:01.005000"));

        let utc = Utc.with_ymd_and_hms(2024, 3, 5, 10, 11, 12).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(default_handler(&utc).unwrap(), json!("2024-03-05T10:11:12.250000+00:00"));
    }

    #[test]
    fn dump_receives_role() {
        let feed = Feed {
            title: "Example",
            owner_email: "owner@example.com",
        };
        assert_eq!(
            default_handler(&feed).unwrap(),
            json!({ "title": "Example", "owner_email": "owner@example.com" })
        );
        assert_eq!(
            default_handler_with_role(&feed, "user").unwrap(),
            json!({ "title": "Example" })
        );
    }

    #[test]
    fn timestamp_takes_precedence_over_dump() {
        assert_eq!(default_handler(&Stamped).unwrap(), json!("2024-01-01T00:00:00"));
    }

    #[test]
    fn sets_become_arrays_with_same_elements() {
        let set: HashSet<&str> = HashSet::from(["a", "b", "c"]);
        let value = default_handler(&set).unwrap();
        let mut items: Vec<String> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        items.sort();
        assert_eq!(items, ["a", "b", "c"]);
    }

    #[test]
    fn errors_become_their_message() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(default_handler(&err).unwrap(), json!("disk full"));

        let err = NewspipeError::Config("missing token".into());
        assert_eq!(
            default_handler(&err).unwrap(),
            json!("Configuration error: missing token")
        );
    }

    #[test]
    fn unsupported_values_are_rejected_with_type_and_repr() {
        let err = default_handler(&Opaque { id: 7 }).unwrap_err();
        match &err {
            NewspipeError::NotSerializable { type_name, repr } => {
                assert!(type_name.ends_with("Opaque"));
                assert_eq!(repr, "Opaque { id: 7 }");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("is not JSON serializable"));
    }

    #[test]
    fn works_through_trait_objects() {
        let values: Vec<Box<dyn JsonDefault>> = vec![
            Box::new(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()),
            Box::new(BTreeSet::from([2, 1])),
            Box::new(Opaque { id: 1 }),
        ];
        let encoded: Vec<Option<Value>> = values
            .iter()
            .map(|v| default_handler(v.as_ref()).ok())
            .collect();
        assert_eq!(
            encoded,
            vec![Some(json!("2020-01-02")), Some(json!([1, 2])), None]
        );

        let err = default_handler(values[2].as_ref()).unwrap_err();
        assert!(err.to_string().contains("Opaque"));
    }
}
