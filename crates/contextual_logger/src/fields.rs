//! Structured context fields: the accumulated [`Fields`] mapping and the flat, alternating
//! key/value argument list ([`FieldArg`]) accepted by
//! [`Contextual::with_fields()`][crate::Contextual::with_fields].

use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};

/// The accumulated mapping from field name to field value carried by a
/// [`LoggerEntry`][crate::LoggerEntry].
///
/// Keys are unique; inserting an existing key overwrites its value. The [`fmt::Display`]
/// representation is the mapping rendered as a compact JSON object, which is what gets attached
/// to emitted log events.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from a flat sequence of alternating keys and values.
    ///
    /// Elements are taken in pairs (`0 & 1`, `2 & 3`, ...). A pair is kept only if its key
    /// resolves to a name (see [`FieldKey`]); any other pair is dropped. A trailing element
    /// without a value is ignored. When a key occurs more than once, the last value wins.
    ///
    /// # Example
    ///
    /// ```
    /// use contextual_logger::{Fields, field_args};
    /// use serde_json::json;
    ///
    /// let fields = Fields::from_args(field_args!["a", 1, 42, "dropped", "a", 2, "trailing"]);
    /// assert_eq!(serde_json::Value::from(fields), json!({ "a": 2 }));
    /// ```
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = FieldArg>,
    {
        let mut fields = Self::new();
        fields.extend_from_args(args);
        fields
    }

    /// Inserts a single field, returning the previous value for that key, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Merges a flat key/value argument list into this mapping, following the same pairing rules
    /// as [`Fields::from_args()`].
    pub fn extend_from_args<I>(&mut self, args: I)
    where
        I: IntoIterator<Item = FieldArg>,
    {
        let mut args = args.into_iter().fuse();
        while let (Some(key), Some(value)) = (args.next(), args.next()) {
            if let Some(name) = key.into_key().into_name() {
                self.0.insert(name, value.into_value());
            }
        }
    }

    /// Returns the value of the field named `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of fields in the mapping.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the mapping holds no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Self::Object(fields.0)
    }
}

/// A single element of a flat, alternating key/value argument list.
///
/// Elements in key position are classified with [`FieldArg::into_key()`]; elements in value
/// position are converted with [`FieldArg::into_value()`]. Use the [`field_args!`] macro to build
/// a list from heterogeneous values.
#[derive(Clone)]
pub enum FieldArg {
    /// A plain value. Only [`Value::String`] is usable as a key.
    Value(Value),

    /// A value able to render itself as text. Usable as a key through its rendered text.
    Display(Arc<dyn fmt::Display + Send + Sync>),
}

impl FieldArg {
    /// Wraps a value implementing [`fmt::Display`].
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::Display(Arc::new(value))
    }

    /// Classifies this element for use in key position.
    pub fn into_key(self) -> FieldKey {
        match self {
            Self::Value(Value::String(text)) => FieldKey::Text(text),
            Self::Display(renderable) => FieldKey::Rendered(renderable.to_string()),
            Self::Value(_) => FieldKey::Invalid,
        }
    }

    /// Converts this element for use in value position. Renderable values are stored as their
    /// rendered text.
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Display(renderable) => Value::String(renderable.to_string()),
        }
    }
}

impl fmt::Debug for FieldArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Display(renderable) => f
                .debug_tuple("Display")
                .field(&format_args!("{renderable}"))
                .finish(),
        }
    }
}

macro_rules! impl_from_for_field_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldArg {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

impl_from_for_field_arg!(
    &str,
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    Map<String, Value>,
);

impl From<Value> for FieldArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// The outcome of resolving a [`FieldArg`] in key position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKey {
    /// The element was text and is used directly as the field name.
    Text(String),

    /// The element was renderable; its rendered text is the field name.
    Rendered(String),

    /// The element cannot name a field; the pair it belongs to is dropped.
    Invalid,
}

impl FieldKey {
    /// The field name, or `None` for [`FieldKey::Invalid`].
    pub fn into_name(self) -> Option<String> {
        match self {
            Self::Text(name) | Self::Rendered(name) => Some(name),
            Self::Invalid => None,
        }
    }
}

/// Builds an array of [`FieldArg`]s from alternating keys and values.
///
/// Every argument is converted with [`FieldArg::from()`], so anything with a `From` conversion
/// (text, numbers, booleans, [`serde_json::Value`], or an existing [`FieldArg`] such as one made
/// with [`FieldArg::display()`]) may be mixed freely.
///
/// ```
/// use contextual_logger::{FieldArg, field_args};
///
/// let args = field_args!["user", "alice", "attempts", 3, FieldArg::display('k'), true];
/// assert_eq!(args.len(), 6);
/// ```
#[macro_export]
macro_rules! field_args {
    () => {{
        let args: [$crate::FieldArg; 0] = [];
        args
    }};
    ($($arg:expr),+ $(,)?) => {
        [$($crate::FieldArg::from($arg)),+]
    };
}
