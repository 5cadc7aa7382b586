use core::cmp::Ordering;

use serde::{Serialize, ser::SerializeTuple};

/// One key-value pair of a [`crate::SortedMap`]
///
/// Equality and ordering of a whole entry only look at the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdEntry<K, V> {
    pub key: K,
    pub value: V,
}
impl<K, V> OrdEntry<K, V> {
    #[must_use]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
    pub fn into_flatten(self) -> (K, V) {
        (self.key, self.value)
    }
    pub fn flatten(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }

    #[must_use]
    pub fn cmp_by_key(&self, other: &Self) -> Ordering
    where
        K: Ord,
    {
        self.key.cmp(&other.key)
    }
    #[must_use]
    pub fn cmp_by_value(&self, other: &Self) -> Ordering
    where
        V: Ord,
    {
        self.value.cmp(&other.value)
    }
    /// [`None`] if the two values have no order between them
    #[must_use]
    pub fn partial_cmp_by_value(&self, other: &Self) -> Option<Ordering>
    where
        V: PartialOrd,
    {
        self.value.partial_cmp(&other.value)
    }
}
impl<K, V> From<(K, V)> for OrdEntry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}
impl<K: PartialEq, V> PartialEq for OrdEntry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl<K: Eq, V> Eq for OrdEntry<K, V> {}
impl<K: PartialOrd, V> PartialOrd for OrdEntry<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.key.partial_cmp(&other.key)
    }
}
impl<K: Ord, V> Ord for OrdEntry<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}
impl<K: Serialize, V: Serialize> Serialize for OrdEntry<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.key)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}
