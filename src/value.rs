use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::value::{Number, Value as Json};

use crate::context::Scope;
use crate::error::RenderError;
use crate::helpers::HelperDef;
use crate::output::SafeString;

/// Runtime value seen by templates and helpers.
///
/// Besides plain data it can hold text that must not be escaped, a callable
/// helper, or a reference to a scope of the running render.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Safe(SafeString),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(Arc<dyn HelperDef>),
    Scope(Arc<Scope>),
}

pub(crate) static NULL: Value = Value::Null;

impl Value {
    /// Wrap a helper function so it can be stored in data or a helper map.
    pub fn function<F: HelperDef + 'static>(f: F) -> Value {
        Value::Function(Arc::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.as_data(), Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// The data behind scope references.
    pub fn as_data(&self) -> &Value {
        match self {
            Value::Scope(s) => s.this(),
            v => v,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.as_data() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_data() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.as_data() {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.as_data() {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.as_data() {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self.as_data() {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self.as_data() {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_null(&self) -> Option<()> {
        if self.is_null() {
            Some(())
        } else {
            None
        }
    }

    /// Text form used when the value is written into a template.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Safe(s) => s.to_string(),
            Value::Array(a) => {
                let items: Vec<String> = a.iter().map(|v| v.render()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Object(_) => "[object]".to_owned(),
            Value::Function(_) => "[function]".to_owned(),
            Value::Scope(s) => s.this().render(),
        }
    }

    /// Empty strings, collections, zero and null are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
            Value::String(s) => !s.is_empty(),
            Value::Safe(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Function(_) => true,
            Value::Scope(s) => s.this().is_truthy(),
        }
    }

    /// Plain data form, when there is one.
    pub fn to_json(&self) -> Json {
        match self.as_data() {
            Value::Null | Value::Function(_) | Value::Scope(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::Safe(s) => Json::String(s.to_string()),
            Value::Array(a) => Json::Array(a.iter().map(|v| v.to_json()).collect()),
            Value::Object(o) => Json::Object(
                o.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Convert any serializable data into a `Value`.
pub fn to_value<T: Serialize + ?Sized>(data: &T) -> Result<Value, RenderError> {
    Ok(Value::from(serde_json::to_value(data)?))
}

impl Default for Value {
    fn default() -> Value {
        Value::Null
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Safe(s) => write!(f, "Safe({:?})", s.to_string()),
            Value::Array(a) => f.debug_list().entries(a.iter()).finish(),
            Value::Object(o) => f.debug_map().entries(o.iter()).finish(),
            Value::Function(_) => f.write_str("Function(..)"),
            Value::Scope(s) => write!(f, "Scope({:?})", s.this()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Safe(a), Value::Safe(b)) => a.to_string() == b.to_string(),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Scope(a), Value::Scope(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Json> for Value {
    fn from(j: Json) -> Value {
        match j {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => Value::String(s),
            Json::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            Json::Object(o) => Value::Object(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl<'a> From<&'a Json> for Value {
    fn from(j: &'a Json) -> Value {
        Value::from(j.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Value {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<SafeString> for Value {
    fn from(s: SafeString) -> Value {
        Value::Safe(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Value {
        Value::Array(a)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(o: BTreeMap<String, Value>) -> Value {
        Value::Object(o)
    }
}

impl From<Arc<Scope>> for Value {
    fn from(s: Arc<Scope>) -> Value {
        Value::Scope(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Value {
        o.map(Into::into).unwrap_or(Value::Null)
    }
}
