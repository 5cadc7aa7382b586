use core::{any::Any, cmp::Ordering, fmt};
use std::sync::Arc;

use num_traits::ToPrimitive;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser,
};

use crate::{OrdEntry, SortedMap};

/// Key of a nested [`Value::Map`]
///
/// Integers order before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Text(String),
}
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}
impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}
impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}
impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}
/// JSON object keys are always strings and come back as [`Key::Text`]
impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(KeyVisitor)
    }
}
struct KeyVisitor;
impl Visitor<'_> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a string")
    }
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
        Ok(Key::Int(v))
    }
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
        let int = i64::try_from(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))?;
        Ok(Key::Int(int))
    }
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
        Ok(Key::Text(v.to_owned()))
    }
    fn visit_string<E: de::Error>(self, v: String) -> Result<Key, E> {
        Ok(Key::Text(v))
    }
}

/// A value of any of the types a [`SortedMap`] can render
///
/// - [`fmt::Display`] writes `<nil>` for [`Value::Null`] and the shortest form of floats (`2.0`
///   renders as `2`).
/// - [`Serialize`] fails on [`Value::Opaque`] and on non-finite floats.
/// - [`PartialOrd`] only orders like-typed values; integers and floats compare numerically.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Map(SortedMap<Key, Value>),
    Opaque(Opaque),
}
impl Value {
    #[must_use]
    pub fn opaque<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self::Opaque(Opaque::new(value))
    }
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
    #[must_use]
    pub const fn as_map(&self) -> Option<&SortedMap<Key, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Map(_) => "map",
            Self::Opaque(_) => "opaque",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => self.partial_cmp(other) == Some(Ordering::Equal),
        }
    }
}
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => cmp_int_float(*b, *a).map(Ordering::reverse),
            (Self::Text(a), Self::Text(b)) => a.partial_cmp(b),
            // only equal maps and the same opaque value are comparable
            (Self::Map(_), Self::Map(_)) | (Self::Opaque(_), Self::Opaque(_)) => {
                (self == other).then_some(Ordering::Equal)
            }
            _ => None,
        }
    }
}

/// Exact comparison without rounding `int` through `f64`
fn cmp_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63; every `i64` lies in `[-2^63, 2^63)`
    const BOUND: f64 = 9_223_372_036_854_775_808.;
    if float.is_nan() {
        return None;
    }
    if BOUND <= float {
        return Some(Ordering::Less);
    }
    if float < -BOUND {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match int.cmp(&whole.to_i64()?) {
        Ordering::Equal => 0_f64.partial_cmp(&(float - whole)),
        ordering => Some(ordering),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("<nil>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Map(map) => write!(f, "{map}"),
            Self::Opaque(opaque) => write!(f, "{opaque}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => {
                if !x.is_finite() {
                    return Err(ser::Error::custom(format_args!(
                        "unsupported float value: {x}"
                    )));
                }
                serializer.serialize_f64(*x)
            }
            Self::Text(s) => serializer.serialize_str(s),
            Self::Map(map) => map.serialize(serializer),
            Self::Opaque(opaque) => Err(ser::Error::custom(format_args!(
                "unsupported value of type `{}`: {opaque}",
                opaque.type_name()
            ))),
        }
    }
}

/// JSON arrays have no [`Value`] counterpart and are rejected
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}
struct ValueVisitor;
impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a bool, a number, a string or a map")
    }
    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }
    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }
    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }
    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Text(v.to_owned()))
    }
    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Text(v))
    }
    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = SortedMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<Key, Value>()? {
            map.push(key, value);
        }
        Ok(Value::Map(map))
    }
}

macro_rules! impl_from_int {
    ($($ty: ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(value.into())
                }
            }
        )*
    };
}
impl_from_int!(i8, i16, i32, i64, u8, u16, u32);
impl From<u64> for Value {
    /// Falls back to [`Value::Float`] above [`i64::MAX`]
    fn from(value: u64) -> Self {
        value
            .to_i64()
            .map(Self::Int)
            .or_else(|| value.to_f64().map(Self::Float))
            .unwrap_or_default()
    }
}
impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
impl From<Opaque> for Value {
    fn from(value: Opaque) -> Self {
        Self::Opaque(value)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
/// Keeps the entry order of `map`
impl<K: Into<Key>> From<SortedMap<K, Value>> for Value {
    fn from(map: SortedMap<K, Value>) -> Self {
        let entries: Vec<OrdEntry<Key, Value>> = map
            .into_iter()
            .map(|(key, value)| OrdEntry::new(key.into(), value))
            .collect();
        Self::Map(entries.into())
    }
}

/// A value with no JSON form
///
/// It renders through its [`fmt::Debug`] output and compares equal only to clones of itself.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    repr: String,
    inner: Arc<dyn Any + Send + Sync>,
}
impl Opaque {
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self {
            type_name: core::any::type_name::<T>(),
            repr: format!("{value:?}"),
            inner: Arc::new(value),
        }
    }
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref()
    }
}
impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .field("repr", &self.repr)
            .finish()
    }
}
impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}
impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
