use serde_json::{Map, Value};

/// Payload carried on either side of a [`Pair`](crate::core::pair::Pair)
///
/// The pipeline never looks inside an item; only operators do, and each one
/// declares which shape it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A whole record, usually a JSON object
    Record(Value),

    /// A single key-value entry lifted out of a map record
    Entry { key: String, value: Value },
}

/// Shape of an [`Item`], used when reporting type-contract violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Map,
    Entry,
    Scalar,
    List,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Map => write!(f, "map"),
            Self::Entry => write!(f, "map entry"),
            Self::Scalar => write!(f, "scalar"),
            Self::List => write!(f, "list"),
        }
    }
}

impl Item {
    pub fn record(value: impl Into<Value>) -> Self {
        Self::Record(value.into())
    }

    pub fn entry(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Entry {
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Entry { .. } => Shape::Entry,
            Self::Record(Value::Object(_)) => Shape::Map,
            Self::Record(Value::Array(_)) => Shape::List,
            Self::Record(_) => Shape::Scalar,
        }
    }

    /// Key-value entries of a map record, if this item is one
    #[must_use]
    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Record(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Key and value of an entry item, if this item is one
    #[must_use]
    pub fn as_entry(&self) -> Option<(&str, &Value)> {
        match self {
            Self::Entry { key, value } => Some((key.as_str(), value)),
            Self::Record(_) => None,
        }
    }

    /// Split a map record into one entry item per key
    ///
    /// Returns `None` when the item is not a map record.
    #[must_use]
    pub fn entries(&self) -> Option<Vec<Item>> {
        self.as_map().map(|map| {
            map.iter()
                .map(|(key, value)| Item::entry(key.clone(), value.clone()))
                .collect()
        })
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Self::Record(value)
    }
}
