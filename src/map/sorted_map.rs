use core::{borrow::Borrow, cmp::Ordering, fmt, hash::BuildHasher, marker::PhantomData};
use std::collections::{BTreeMap, HashMap};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use tracing::trace;

use crate::{Direction, Error, Len, OrdEntry, Result, ops::slice::try_merge_sort_by};

/// A map whose iteration order is fixed by its entry sequence
///
/// The stored order is the only order: iteration, [`fmt::Display`] and [`Serialize`] all walk the
/// entries front to back. The order is established by a constructor ([`SortedMap::from_unordered`],
/// [`SortedMap::by_value`]) or an explicit sort call. [`SortedMap::push`] only appends.
///
/// Keys are expected to be unique. Nothing checks for duplicates: pushing a key twice yields two
/// entries.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
///
/// use sorted_map::SortedMap;
///
/// let source = HashMap::from([(3, "c"), (1, "a"), (2, "b")]);
/// let map = SortedMap::from_unordered(source);
/// assert_eq!(map.keys(), [1, 2, 3]);
/// assert_eq!(map.to_string(), "[1: a 2: b 3: c]");
/// assert_eq!(map.to_json().unwrap(), r#"{"1":"a","2":"b","3":"c"}"#);
/// ```
#[derive(Debug, Clone)]
pub struct SortedMap<K, V> {
    entries: Vec<OrdEntry<K, V>>,
}
impl<K, V> SortedMap<K, V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry and hand the map back for chaining
    #[must_use]
    pub fn add(mut self, key: K, value: V) -> Self {
        self.push(key, value);
        self
    }
    pub fn push(&mut self, key: K, value: V) {
        self.entries.push(OrdEntry { key, value });
    }

    #[must_use]
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter_keys().cloned().collect()
    }
    #[must_use]
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter_values().cloned().collect()
    }
    pub fn iter_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|entry| &entry.key)
    }
    pub fn iter_values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|entry| &entry.value)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(OrdEntry::flatten)
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> + '_ {
        self.entries
            .iter_mut()
            .map(|entry| (&entry.key, &mut entry.value))
    }
    #[must_use]
    pub fn entries(&self) -> &[OrdEntry<K, V>] {
        &self.entries
    }
    #[must_use]
    pub fn into_entries(self) -> Vec<OrdEntry<K, V>> {
        self.entries
    }

    /// Linear scan; the first entry wins if the key was pushed more than once
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: PartialEq + ?Sized,
        K: Borrow<Q>,
    {
        self.entries
            .iter()
            .find(|entry| entry.key.borrow() == key)
            .map(|entry| &entry.value)
    }
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: PartialEq + ?Sized,
        K: Borrow<Q>,
    {
        self.get(key).is_some()
    }

    fn from_pairs(source: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: source.into_iter().map(OrdEntry::from).collect(),
        }
    }
    /// `order` holds every index exactly once
    fn permute(&mut self, order: Vec<usize>) {
        let mut slots: Vec<_> = core::mem::take(&mut self.entries)
            .into_iter()
            .map(Some)
            .collect();
        self.entries = order.into_iter().filter_map(|i| slots[i].take()).collect();
    }

    pub fn to_json(&self) -> Result<String>
    where
        K: Serialize,
        V: Serialize,
    {
        Ok(serde_json::to_string(self)?)
    }
    pub fn to_json_pretty(&self) -> Result<String>
    where
        K: Serialize,
        V: Serialize,
    {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<K: Ord, V> SortedMap<K, V> {
    /// Copy all pairs of an unordered source and sort them by ascending key
    #[must_use]
    pub fn from_unordered(source: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut map = Self::from_pairs(source);
        map.sort();
        map
    }

    /// Stable sort by ascending key
    pub fn sort(&mut self) {
        self.sort_keys(Direction::Ascending);
    }
    /// Stable sort by key
    pub fn sort_keys(&mut self, direction: Direction) {
        trace!(len = self.entries.len(), ?direction, "sort by key");
        self.entries.sort_by(|a, b| direction.apply(a.cmp_by_key(b)));
    }
}

impl<K, V: Ord> SortedMap<K, V> {
    /// Copy all pairs of an unordered source and sort them by value
    ///
    /// Entries with equal values keep the order the source yielded them in.
    #[must_use]
    pub fn by_value(
        source: impl IntoIterator<Item = (K, V)>,
        direction: impl Into<Direction>,
    ) -> Self {
        let mut map = Self::from_pairs(source);
        map.sort_values(direction.into());
        map
    }

    /// Stable sort by value
    pub fn sort_values(&mut self, direction: Direction) {
        trace!(len = self.entries.len(), ?direction, "sort by value");
        self.entries.sort_by(|a, b| direction.apply(a.cmp_by_value(b)));
    }
}

impl<K, V> SortedMap<K, V>
where
    V: PartialOrd + fmt::Debug,
{
    /// [`SortedMap::by_value`] for values that are only partially ordered
    ///
    /// Fails with [`Error::Incomparable`] if any two values have no order between them.
    pub fn try_by_value(
        source: impl IntoIterator<Item = (K, V)>,
        direction: impl Into<Direction>,
    ) -> Result<Self> {
        let mut map = Self::from_pairs(source);
        map.try_sort_values(direction.into())?;
        Ok(map)
    }

    /// Stable sort by value
    ///
    /// Fails with [`Error::Incomparable`] if any two values have no order between them. The order
    /// is left untouched on error.
    pub fn try_sort_values(&mut self, direction: Direction) -> Result<()> {
        trace!(len = self.entries.len(), ?direction, "sort by partially ordered value");
        let entries = &self.entries;
        let cmp = |a: usize, b: usize| {
            let ordering = entries[a].partial_cmp_by_value(&entries[b])?;
            Some(direction.apply(ordering))
        };
        let mut order: Vec<usize> = (0..entries.len()).collect();
        try_merge_sort_by(&mut order, |&a, &b| cmp(a, b))
            .map_err(|(a, b)| Error::incomparable(&entries[a].value, &entries[b].value))?;
        // ordered neighbours make every pair comparable by transitivity
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if !matches!(cmp(a, b), Some(Ordering::Less | Ordering::Equal)) {
                return Err(Error::incomparable(&entries[a].value, &entries[b].value));
            }
        }
        self.permute(order);
        Ok(())
    }
}

impl<K, V> Len for SortedMap<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}
impl<K, V> Default for SortedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
impl<K: PartialEq, V: PartialEq> PartialEq for SortedMap<K, V> {
    /// Same entries in the same order
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.iter().eq(other.iter())
    }
}
impl<K: Eq, V: Eq> Eq for SortedMap<K, V> {}

impl<K, V> From<Vec<OrdEntry<K, V>>> for SortedMap<K, V> {
    /// Keeps the order of `entries` as is
    fn from(entries: Vec<OrdEntry<K, V>>) -> Self {
        Self { entries }
    }
}
impl<K: Ord, V, S: BuildHasher> From<HashMap<K, V, S>> for SortedMap<K, V> {
    fn from(source: HashMap<K, V, S>) -> Self {
        Self::from_unordered(source)
    }
}
impl<K, V> From<BTreeMap<K, V>> for SortedMap<K, V> {
    fn from(source: BTreeMap<K, V>) -> Self {
        let entries: Vec<_> = source.into_iter().map(OrdEntry::from).collect();
        entries.into()
    }
}
impl<K: Ord, V> FromIterator<(K, V)> for SortedMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_unordered(iter)
    }
}
impl<K, V> Extend<(K, V)> for SortedMap<K, V> {
    /// Appends without sorting
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.entries.extend(iter.into_iter().map(OrdEntry::from));
    }
}

impl<K, V> IntoIterator for SortedMap<K, V> {
    type Item = (K, V);
    type IntoIter =
        core::iter::Map<std::vec::IntoIter<OrdEntry<K, V>>, fn(OrdEntry<K, V>) -> (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(OrdEntry::into_flatten as fn(OrdEntry<K, V>) -> (K, V))
    }
}
impl<'a, K, V> IntoIterator for &'a SortedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = core::iter::Map<
        core::slice::Iter<'a, OrdEntry<K, V>>,
        fn(&'a OrdEntry<K, V>) -> (&'a K, &'a V),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .iter()
            .map(OrdEntry::flatten as fn(&'a OrdEntry<K, V>) -> (&'a K, &'a V))
    }
}

/// `[k1: v1 k2: v2]` in stored order
impl<K: fmt::Display, V: fmt::Display> fmt::Display for SortedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("]")
    }
}

impl<K: Serialize, V: Serialize> Serialize for SortedMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Members are kept in document order; nothing is sorted
impl<'de, K, V> Deserialize<'de> for SortedMap<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(SortedMapVisitor {
            _entry: PhantomData,
        })
    }
}
struct SortedMapVisitor<K, V> {
    _entry: PhantomData<fn() -> (K, V)>,
}
impl<'de, K, V> Visitor<'de> for SortedMapVisitor<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = SortedMap<K, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = SortedMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry()? {
            map.push(key, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use crate::LenExt;

    use super::*;

    #[test]
    fn test_add_then_sort() {
        let mut map = SortedMap::new()
            .add("e", 5)
            .add("d", 4)
            .add("c", 3)
            .add("b", 2)
            .add("a", 1);
        assert_eq!(map.keys(), ["e", "d", "c", "b", "a"]);
        map.sort();
        assert_eq!(map.keys(), ["a", "b", "c", "d", "e"]);
        assert_eq!(map.values(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_int_keys() {
        let source = HashMap::from([(5, "a"), (4, "b"), (3, "c"), (2, "d"), (1, "e")]);
        let map = SortedMap::from_unordered(source);
        assert_eq!(map.keys(), [1, 2, 3, 4, 5]);
        assert_eq!(map.values(), ["e", "d", "c", "b", "a"]);
        assert_eq!(map.to_json().unwrap(), r#"{"1":"e","2":"d","3":"c","4":"b","5":"a"}"#);
    }

    #[test]
    fn test_by_int_value() {
        let source = HashMap::from([("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]);
        let map = SortedMap::by_value(source.clone(), true);
        assert_eq!(map.keys(), ["a", "b", "c", "d", "e"]);
        let map = SortedMap::by_value(source, false);
        assert_eq!(map.keys(), ["e", "d", "c", "b", "a"]);
    }

    #[test]
    fn test_by_str_value() {
        let source = HashMap::from([("a", "e"), ("b", "d"), ("c", "c"), ("d", "b"), ("e", "a")]);
        let map = SortedMap::by_value(source, Direction::Ascending);
        assert_eq!(map.values(), ["a", "b", "c", "d", "e"]);
        assert_eq!(map.keys(), ["e", "d", "c", "b", "a"]);
    }

    #[test]
    fn test_empty() {
        let map: SortedMap<String, i32> = SortedMap::from_unordered(HashMap::new());
        assert!(map.is_empty());
        assert!(map.keys().is_empty());
        assert_eq!(map.to_json().unwrap(), "{}");
        assert_eq!(map.to_string(), "[]");
        let map: SortedMap<String, i32> = SortedMap::by_value(HashMap::new(), true);
        assert!(map.is_empty());
    }

    #[test]
    fn test_single() {
        let map = SortedMap::from_unordered([("only", 1)]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.to_string(), "[only: 1]");
    }

    #[test]
    fn test_stable_with_duplicate_keys() {
        let mut map = SortedMap::new()
            .add(2, "x")
            .add(1, "first")
            .add(2, "y")
            .add(1, "second");
        map.sort();
        assert_eq!(map.values(), ["first", "second", "x", "y"]);
        map.sort();
        assert_eq!(map.values(), ["first", "second", "x", "y"]);
        assert_eq!(map.get(&1), Some(&"first"));
    }

    #[test]
    fn test_descending_keeps_ties_in_order() {
        let mut map = SortedMap::new()
            .add("a", 1)
            .add("b", 2)
            .add("c", 1)
            .add("d", 2);
        map.sort_values(Direction::Descending);
        assert_eq!(map.keys(), ["b", "d", "a", "c"]);
        map.sort_keys(Direction::Descending);
        assert_eq!(map.keys(), ["d", "c", "b", "a"]);
    }

    #[test]
    fn test_push_does_not_sort() {
        let mut map = SortedMap::from_unordered([(2, ()), (1, ())]);
        map.push(0, ());
        map.extend([(5, ()), (3, ())]);
        assert_eq!(map.keys(), [1, 2, 0, 5, 3]);
        map.sort();
        assert_eq!(map.keys(), [0, 1, 2, 3, 5]);
    }

    #[test]
    fn test_try_by_value_float() {
        let source = HashMap::from([("a", 0.5), ("b", -1.), ("c", 2.)]);
        let map = SortedMap::try_by_value(source, false).unwrap();
        assert_eq!(map.keys(), ["c", "a", "b"]);

        let source = HashMap::from([("a", 0.5), ("b", f64::NAN)]);
        let err = SortedMap::try_by_value(source, true).unwrap_err();
        assert!(matches!(err, Error::Incomparable { .. }));
    }

    #[test]
    fn test_try_sort_values_keeps_order_on_error() {
        let mut map = SortedMap::new().add(1, 2.).add(2, f64::NAN).add(3, 1.);
        assert!(map.try_sort_values(Direction::Ascending).is_err());
        assert_eq!(map.keys(), [1, 2, 3]);
    }

    #[test]
    fn test_try_sort_values_checks_every_pair() {
        // both comparable with the first value, not with each other
        let mut map = SortedMap::new()
            .add("first", (0., 0.))
            .add("x", (1., 2.))
            .add("y", (1., f64::NAN));
        let err = map.try_sort_values(Direction::Ascending).unwrap_err();
        assert!(matches!(err, Error::Incomparable { .. }));
        assert_eq!(map.keys(), ["first", "x", "y"]);

        let source = vec![("y", (1., f64::NAN)), ("first", (0., 0.)), ("x", (1., 2.))];
        assert!(SortedMap::try_by_value(source, Direction::Descending).is_err());

        let source = [("a", (1., 2.)), ("b", (0., 5.)), ("c", (1., -1.))];
        let map = SortedMap::try_by_value(source, true).unwrap();
        assert_eq!(map.keys(), ["b", "c", "a"]);
    }

    #[test]
    fn test_get_and_iter() {
        let mut map = SortedMap::from_unordered([("b".to_string(), 2), ("a".to_string(), 1)]);
        assert_eq!(map.get("a"), Some(&1));
        assert!(map.contains_key("b"));
        assert!(!map.contains_key("c"));
        for (_, value) in map.iter_mut() {
            *value *= 10;
        }
        let pairs: Vec<_> = (&map).into_iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(pairs, [("a", 10), ("b", 20)]);
        let pairs: Vec<_> = map.into_iter().collect();
        assert_eq!(pairs, [("a".to_string(), 10), ("b".to_string(), 20)]);
    }

    #[test]
    fn test_from_other_maps() {
        let mut source = hashbrown::HashMap::new();
        source.insert("z", 26);
        source.insert("m", 13);
        source.insert("a", 1);
        let map = SortedMap::from_unordered(source);
        assert_eq!(map.keys(), ["a", "m", "z"]);

        let mut source = HashMap::with_hasher(ahash::RandomState::new());
        source.insert(3_u8, 'c');
        source.insert(1, 'a');
        let map = SortedMap::from(source);
        assert_eq!(map.keys(), [1, 3]);

        let source = BTreeMap::from([("y", 1), ("x", 2)]);
        let map = SortedMap::from(source);
        assert_eq!(map.keys(), ["x", "y"]);

        let map: SortedMap<_, _> = [(2, 'b'), (1, 'a')].into_iter().collect();
        assert_eq!(map.keys(), [1, 2]);
    }

    #[test]
    fn test_nested_json_order() {
        let inner = SortedMap::by_value([("x", 3), ("y", 1), ("z", 2)], true);
        assert_eq!(inner.keys(), ["y", "z", "x"]);
        let outer = SortedMap::new().add("b", inner.clone()).add("a", inner);
        assert_eq!(
            outer.to_json().unwrap(),
            r#"{"b":{"y":1,"z":2,"x":3},"a":{"y":1,"z":2,"x":3}}"#
        );
    }

    #[test]
    fn test_json_inside_aggregate() {
        let map = SortedMap::by_value([("low", 1), ("high", 9)], false);
        let wrapped = (vec![map.clone()], Some(map));
        assert_eq!(
            serde_json::to_string(&wrapped).unwrap(),
            r#"[[{"high":9,"low":1}],{"high":9,"low":1}]"#
        );
    }

    #[test]
    fn test_json_pretty() {
        let map = SortedMap::from_unordered([("b", 2), ("a", 1)]);
        assert_eq!(map.to_json_pretty().unwrap(), "{\n  \"a\": 1,\n  \"b\": 2\n}");
    }

    #[test]
    fn test_deserialize_keeps_document_order() {
        let map: SortedMap<String, i32> = serde_json::from_str(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        assert_eq!(map.keys(), ["z", "a", "m"]);
        assert_eq!(map.to_json().unwrap(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_eq_is_order_sensitive() {
        let a = SortedMap::new().add(1, 'a').add(2, 'b');
        let b = SortedMap::new().add(2, 'b').add(1, 'a');
        assert_ne!(a, b);
        assert_eq!(a, SortedMap::from_unordered([(2, 'b'), (1, 'a')]));
        assert_ne!(a, SortedMap::new().add(1, 'a').add(2, 'c'));
    }

    proptest! {
        #[test]
        fn prop_keys_are_sorted_source_keys(
            source in prop::collection::hash_map(any::<i32>(), any::<i32>(), 0..64)
        ) {
            let map = SortedMap::from_unordered(source.clone());
            let mut expected: Vec<i32> = source.keys().copied().collect();
            expected.sort();
            prop_assert_eq!(map.len(), source.len());
            prop_assert_eq!(map.keys(), expected);
        }

        #[test]
        fn prop_sort_is_stable_and_idempotent(
            pairs in prop::collection::vec((0..8_u8, any::<u16>()), 0..64)
        ) {
            let mut map = SortedMap::new();
            map.extend(pairs.clone());
            map.sort();
            let mut expected = pairs;
            expected.sort_by_key(|(key, _)| *key);
            let once: Vec<_> = map.clone().into_iter().collect();
            prop_assert_eq!(&once, &expected);
            map.sort();
            let twice: Vec<_> = map.into_iter().collect();
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn prop_by_value_direction(
            source in prop::collection::hash_map(any::<u16>(), any::<i64>(), 0..64)
        ) {
            let ascending = SortedMap::by_value(source.clone(), true).values();
            let descending = SortedMap::by_value(source.clone(), false).values();
            prop_assert!(ascending.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(descending.windows(2).all(|w| w[0] >= w[1]));
            let distinct: BTreeSet<_> = source.values().collect();
            if distinct.len() == source.len() {
                let mut reversed = ascending;
                reversed.reverse();
                prop_assert_eq!(reversed, descending);
            }
        }
    }
}

#[cfg(feature = "nightly")]
#[cfg(test)]
mod benches {
    use std::hint::black_box;

    use test::Bencher;

    use super::*;
    const DATA_SIZE: usize = 1 << 10;

    fn source() -> HashMap<usize, usize> {
        (0..DATA_SIZE).map(|i| (i, DATA_SIZE - i)).collect()
    }

    #[bench]
    fn bench_from_unordered(bencher: &mut Bencher) {
        let source = source();
        bencher.iter(|| {
            let map = SortedMap::from_unordered(source.iter().map(|(k, v)| (*k, *v)));
            black_box(map);
        });
    }
    #[bench]
    fn bench_btree_collect(bencher: &mut Bencher) {
        let source = source();
        bencher.iter(|| {
            let map: BTreeMap<usize, usize> = source.iter().map(|(k, v)| (*k, *v)).collect();
            black_box(map);
        });
    }
    #[bench]
    fn bench_by_value(bencher: &mut Bencher) {
        let source = source();
        bencher.iter(|| {
            let map = SortedMap::by_value(source.iter().map(|(k, v)| (*k, *v)), true);
            black_box(map);
        });
    }
    #[bench]
    fn bench_to_json(bencher: &mut Bencher) {
        let map = SortedMap::from_unordered(source());
        bencher.iter(|| {
            black_box(map.to_json().unwrap());
        });
    }
}
