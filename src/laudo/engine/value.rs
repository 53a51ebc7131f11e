//! Values a template can reference.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Field name to value mapping consumed by the renderer.
pub type Context = BTreeMap<String, Value>;

/// An image placed inline at a fixed width; height follows the aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub path: PathBuf,
    pub width_cm: f64,
}

impl InlineImage {
    pub fn new(path: impl Into<PathBuf>, width_cm: f64) -> Self {
        Self {
            path: path.into(),
            width_cm,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Image(InlineImage),
    List(Vec<Value>),
    Map(Context),
}

impl Value {
    pub fn empty() -> Self {
        Value::Text(String::new())
    }

    /// `Some(path)` becomes an inline image, `None` an empty slot.
    pub fn image_or_empty(path: Option<PathBuf>, width_cm: f64) -> Self {
        match path {
            Some(path) => Value::Image(InlineImage::new(path, width_cm)),
            None => Value::empty(),
        }
    }

    /// Jinja-style truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) => !s.is_empty(),
            Value::Int(i) => *i != 0,
            Value::Image(_) => true,
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attribute access on a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Int(_) => "integer",
            Value::Image(_) => "image",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Context> for Value {
    fn from(value: Context) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(Value::empty)
    }
}
