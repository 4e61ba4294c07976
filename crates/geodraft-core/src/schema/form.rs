//! UI form state and value coercion.

use super::FieldKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Flat field values keyed by field key.
pub type FormValues = Map<String, Value>;
/// One item of a repeatable group.
pub type FormItem = Map<String, Value>;

/// Form state as edited in the UI: field values plus group items.
///
/// Values stay loosely typed (the UI delivers strings, numbers and booleans
/// as it sees fit); [`super::SchemaClass::build`] coerces them per field kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub values: FormValues,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<FormItem>>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style group item append.
    pub fn with_item(mut self, group: &str, item: Value) -> Self {
        self.push_item(group, item);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Append a group item. Non-object values are ignored.
    pub fn push_item(&mut self, group: &str, item: Value) {
        if let Value::Object(map) = item {
            self.groups.entry(group.to_string()).or_default().push(map);
        }
    }

    /// Remove a group item by index.
    pub fn remove_item(&mut self, group: &str, index: usize) -> Option<FormItem> {
        let items = self.groups.get_mut(group)?;
        (index < items.len()).then(|| items.remove(index))
    }

    pub fn items(&self, group: &str) -> &[FormItem] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.groups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.groups.values().all(Vec::is_empty)
    }
}

/// JSON number for `f`, written as an integer when it is one.
pub(crate) fn number_value(f: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Numeric conversion with blank and non-numeric input treated as empty.
pub(crate) fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Truthiness of a loosely typed value.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text values pass through with their JSON type; only structured values
/// are flattened to a string.
fn to_text(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(value.clone()),
        other => Some(Value::String(other.to_string())),
    }
}

/// Coerce a raw form value for a field kind. `None` means "empty".
pub(crate) fn coerce(kind: FieldKind, value: Option<&Value>) -> Option<Value> {
    let value = value?;
    match kind {
        FieldKind::Text | FieldKind::Select(_) => to_text(value),
        FieldKind::Number => match value {
            Value::Number(_) => Some(value.clone()),
            other => to_number(other).map(number_value),
        },
        FieldKind::Bool => match value {
            Value::Null => None,
            other => Some(Value::Bool(truthy(other))),
        },
    }
}

/// Whether a value counts as a primitive for tags and extensions.
pub(crate) fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Trimmed string content of a value, empty for non-strings.
pub(crate) fn text_of(value: Option<&Value>) -> &str {
    value.and_then(Value::as_str).map(str::trim).unwrap_or("")
}
