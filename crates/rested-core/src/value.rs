use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::key::Key;
use crate::resource::Resource;

/// A domain value that has no native JSON representation.
///
/// Opaque values travel through the tree untouched and are only interpreted
/// by a [`FallbackEncoder`](crate::encode::FallbackEncoder) at serialization
/// time. Any `Debug + Send + Sync + 'static` type qualifies.
pub trait OpaqueValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + fmt::Debug> OpaqueValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// The payload carried by a resource node.
///
/// `Map` and `List` are containers and may be subscripted; every other
/// variant is a leaf. `Node` embeds a child resource, which is what makes the
/// payload a tree.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<Key, Value>),
    Node(Arc<dyn Resource>),
    Opaque(Arc<dyn OpaqueValue>),
}

impl Value {
    /// Build a map payload from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Build a list payload.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// A finite float, or `None` for NaN and the infinities.
    pub fn float(n: f64) -> Option<Self> {
        serde_json::Number::from_f64(n).map(Self::Number)
    }

    /// A shared `Null`, for resources whose payload is computed by handlers.
    pub fn null_ref() -> &'static Value {
        static NULL: Value = Value::Null;
        &NULL
    }

    /// Wrap a resource as a child node.
    pub fn node<R: Resource + 'static>(resource: R) -> Self {
        Self::Node(Arc::new(resource))
    }

    /// Wrap a non-JSON-native domain value.
    pub fn opaque<T: OpaqueValue>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    /// Subscript this value.
    ///
    /// Maps are indexed by key, lists by a non-negative integer key. Any
    /// other combination yields `None`, exactly as a missing key would.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries.get(key),
            Self::List(items) => {
                let index = usize::try_from(key.as_int()?).ok()?;
                items.get(index)
            }
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Arc<dyn Resource>> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Map(_) | Self::List(_))
    }

    /// Short name of the variant, used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Node(_) => "node",
            Self::Opaque(_) => "opaque",
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for data; identity equality for nodes and opaque values.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => Arc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// Lossy: NaN and the infinities have no JSON form and become `Null`. Use
/// [`Value::float`] to detect them instead.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::float(n).unwrap_or(Self::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<Key, Value>> for Value {
    fn from(entries: BTreeMap<Key, Value>) -> Self {
        Self::Map(entries)
    }
}

impl From<Arc<dyn Resource>> for Value {
    fn from(node: Arc<dyn Resource>) -> Self {
        Self::Node(node)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    /// Object keys are taken verbatim as string keys.
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::list(items),
            serde_json::Value::Object(entries) => Self::map(entries),
        }
    }
}
