//! Small lookup and deduplication helpers over maps and string lists.

use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Read access by key, shared by the map types [`try_keys`] accepts.
pub trait KeyLookup<Q: ?Sized> {
    type Value;

    fn lookup(&self, key: &Q) -> Option<&Self::Value>;
}

impl<K, V, Q, S> KeyLookup<Q> for HashMap<K, V, S>
where
    K: Borrow<Q> + Hash + Eq,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Value = V;

    fn lookup(&self, key: &Q) -> Option<&V> {
        self.get(key)
    }
}

impl<K, V, Q> KeyLookup<Q> for BTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Value = V;

    fn lookup(&self, key: &Q) -> Option<&V> {
        self.get(key)
    }
}

impl KeyLookup<str> for Map<String, Value> {
    type Value = Value;

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Value of the first of `keys` present in `map`.
///
/// ```
/// use newspipe_utils::try_keys;
/// use std::collections::HashMap;
///
/// let entry = HashMap::from([("a", 1), ("b", 2)]);
/// assert_eq!(try_keys(&entry, &["c", "b"]), Some(&2));
/// assert_eq!(try_keys(&HashMap::<&str, i32>::new(), &["x"]), None);
/// ```
pub fn try_keys<'m, M, Q>(map: &'m M, keys: &[&Q]) -> Option<&'m M::Value>
where
    M: KeyLookup<Q> + ?Sized,
    Q: ?Sized,
{
    keys.iter().find_map(|key| map.lookup(*key))
}

/// Drop case-insensitive duplicates.
///
/// Each lowercase key keeps the position of its first occurrence and the
/// value of its last one.
///
/// ```
/// use newspipe_utils::remove_case_insensitive_duplicates;
///
/// let tags = remove_case_insensitive_duplicates(["Foo", "bar", "FOO"]);
/// assert_eq!(tags, ["FOO", "bar"]);
/// ```
pub fn remove_case_insensitive_duplicates<I, S>(items: I) -> Vec<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<S> = Vec::new();
    for item in items {
        match slots.entry(item.as_ref().to_lowercase()) {
            Entry::Occupied(slot) => kept[*slot.get()] = item,
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(item);
            }
        }
    }
    kept
}
