//! Form state + geometry to canonical payload.

use super::form::{FormItem, coerce, is_primitive, text_of};
use super::system::{stamp_audit, stamp_classification, timestamp_now};
use super::{
    COORDINATE_KEY, ECHO_KEY, EXTENSION_KEY, EXTENSION_NAMESPACE, EXTENSION_VALUE,
    EXTENSIONS_GROUP, FieldDef, FormState, GeometryLayout, SchemaClass, TAG_CUSTOM_KEY, TAG_KEY,
    TAG_OTHER, TAG_VALUE, TAGS_GROUP,
};
use crate::geometry::{DrawMode, WorldPoint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Operation a payload is built for; decides how system fields are stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildOp {
    Create,
    Edit,
    Import,
}

/// Caller context for [`SchemaClass::build`].
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    /// World identifier, resolved through the world table.
    pub world: &'a str,
    /// Acting editor.
    pub editor: &'a str,
    /// Timestamp written to audit fields.
    pub now: String,
    /// Payload being edited, or the raw item being imported.
    pub prior: Option<&'a Map<String, Value>>,
}

impl<'a> BuildContext<'a> {
    pub fn new(world: &'a str, editor: &'a str) -> Self {
        Self {
            world,
            editor,
            now: timestamp_now(),
            prior: None,
        }
    }

    pub fn with_now(mut self, now: impl Into<String>) -> Self {
        self.now = now.into();
        self
    }

    /// Attach the prior payload. Non-object values are ignored.
    pub fn with_prior(mut self, prior: &'a Value) -> Self {
        self.prior = prior.as_object();
        self
    }
}

/// Project values onto declared fields.
///
/// Optional empties are dropped; required empties are kept as `null` so the
/// caller sees exactly what is missing.
fn project_fields(fields: &[FieldDef], values: &Map<String, Value>, out: &mut Map<String, Value>) {
    for field in fields {
        match coerce(field.kind, values.get(field.key)) {
            Some(value) => {
                out.insert(field.key.to_string(), value);
            }
            None if !field.optional => {
                out.insert(field.key.to_string(), Value::Null);
            }
            None => {}
        }
    }
}

fn coordinate_value(point: &WorldPoint) -> Value {
    let mut coord = Map::new();
    coord.insert("x".to_string(), json!(point.x));
    coord.insert("z".to_string(), json!(point.z));
    if let Some(y) = point.y {
        coord.insert("y".to_string(), json!(y));
    }
    Value::Object(coord)
}

fn tags_value(items: &[FormItem]) -> Option<Value> {
    let mut tags = Map::new();
    for item in items {
        let selector = text_of(item.get(TAG_KEY));
        let key = if selector == TAG_OTHER {
            text_of(item.get(TAG_CUSTOM_KEY))
        } else {
            selector
        };
        let Some(value) = item.get(TAG_VALUE).filter(|v| is_primitive(v)) else {
            continue;
        };
        if !key.is_empty() {
            tags.insert(key.to_string(), value.clone());
        }
    }
    (!tags.is_empty()).then_some(Value::Object(tags))
}

fn extensions_value(items: &[FormItem]) -> Option<Value> {
    let mut extensions: Map<String, Value> = Map::new();
    for item in items {
        let namespace = text_of(item.get(EXTENSION_NAMESPACE));
        let key = text_of(item.get(EXTENSION_KEY));
        let Some(value) = item.get(EXTENSION_VALUE).filter(|v| is_primitive(v)) else {
            continue;
        };
        if namespace.is_empty() || key.is_empty() {
            continue;
        }
        let entry = extensions
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(ns) = entry {
            ns.insert(key.to_string(), value.clone());
        }
    }
    (!extensions.is_empty()).then_some(Value::Object(extensions))
}

impl SchemaClass {
    /// Build the canonical payload for a committed or imported record.
    pub fn build(
        &self,
        op: BuildOp,
        mode: DrawMode,
        coords: &[WorldPoint],
        form: &FormState,
        ctx: &BuildContext<'_>,
    ) -> Value {
        let mut payload = Map::new();

        if self.is_default() {
            self.write_geometry(coords, &mut payload);
            return Value::Object(payload);
        }

        stamp_classification(&mut payload, op, mode, self, ctx);
        project_fields(self.fields, &form.values, &mut payload);

        for group in self.groups {
            let items: Vec<Value> = form
                .items(group.key)
                .iter()
                .map(|item| {
                    let mut out = Map::new();
                    project_fields(group.fields, item, &mut out);
                    Value::Object(out)
                })
                .collect();
            if !items.is_empty() || !group.optional {
                payload.insert(group.key.to_string(), Value::Array(items));
            }
        }

        self.write_geometry(coords, &mut payload);

        if let Some(tags) = tags_value(form.items(TAGS_GROUP)) {
            payload.insert(TAGS_GROUP.to_string(), tags);
        }
        if let Some(extensions) = extensions_value(form.items(EXTENSIONS_GROUP)) {
            payload.insert(EXTENSIONS_GROUP.to_string(), extensions);
        }

        stamp_audit(&mut payload, op, ctx);
        Value::Object(payload)
    }

    fn write_geometry(&self, coords: &[WorldPoint], payload: &mut Map<String, Value>) {
        match self.geometry {
            GeometryLayout::Echo => {
                let points = coords.iter().map(coordinate_value).collect();
                payload.insert(ECHO_KEY.to_string(), Value::Array(points));
            }
            GeometryLayout::Coordinate => {
                let coordinate = coords.first().map(coordinate_value).unwrap_or(Value::Null);
                payload.insert(COORDINATE_KEY.to_string(), coordinate);
            }
            GeometryLayout::Path { key, default_y } => {
                let triples = coords
                    .iter()
                    .map(|p| json!([p.x, p.y.unwrap_or(default_y), p.z]))
                    .collect();
                payload.insert(key.to_string(), Value::Array(triples));
            }
        }
    }
}
