//! Payload back to form state and geometry.

use super::form::FormItem;
use super::{
    COORDINATE_KEY, ECHO_KEY, EXTENSION_KEY, EXTENSION_NAMESPACE, EXTENSION_VALUE,
    EXTENSIONS_GROUP, FieldDef, FormState, GeometryLayout, SchemaClass, TAG_CUSTOM_KEY, TAG_KEY,
    TAG_OTHER, TAG_PRESETS, TAG_VALUE, TAGS_GROUP,
};
use crate::geometry::WorldPoint;
use serde_json::{Map, Value};

fn copy_fields(fields: &[FieldDef], source: &Map<String, Value>) -> FormItem {
    fields
        .iter()
        .filter_map(|field| {
            let value = source.get(field.key).filter(|v| !v.is_null())?;
            Some((field.key.to_string(), value.clone()))
        })
        .collect()
}

fn tag_item(key: &str, value: &Value) -> Value {
    let mut item = Map::new();
    if TAG_PRESETS.contains(&key) {
        item.insert(TAG_KEY.to_string(), Value::from(key));
    } else {
        item.insert(TAG_KEY.to_string(), Value::from(TAG_OTHER));
        item.insert(TAG_CUSTOM_KEY.to_string(), Value::from(key));
    }
    item.insert(TAG_VALUE.to_string(), value.clone());
    Value::Object(item)
}

fn number(value: &Value, what: &str) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("{what} is not a number: {value}"))
}

fn coordinate_point(value: &Value) -> Result<WorldPoint, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| format!("expected {{x, z}} object, got {value}"))?;
    let x = number(obj.get("x").unwrap_or(&Value::Null), "x")?;
    let z = number(obj.get("z").unwrap_or(&Value::Null), "z")?;
    let y = match obj.get("y") {
        None | Some(Value::Null) => None,
        Some(y) => Some(number(y, "y")?),
    };
    Ok(WorldPoint { x, z, y })
}

fn triple_point(value: &Value) -> Result<WorldPoint, String> {
    match value.as_array().map(Vec::as_slice) {
        Some([x, y, z]) => Ok(WorldPoint::with_elevation(
            number(x, "x")?,
            number(y, "y")?,
            number(z, "z")?,
        )),
        _ => Err(format!("expected [x, y, z] triple, got {value}")),
    }
}

fn point_list(
    value: &Value,
    key: &str,
    parse: fn(&Value) -> Result<WorldPoint, String>,
) -> Result<Vec<WorldPoint>, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("`{key}` is not an array"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse(item).map_err(|e| format!("`{key}`[{i}]: {e}")))
        .collect()
}

impl SchemaClass {
    /// Restore form state from a payload produced by [`SchemaClass::build`].
    ///
    /// Only declared fields and groups are read; system fields and geometry
    /// are left to the caller.
    pub fn hydrate(&self, payload: &Value) -> FormState {
        let mut form = FormState::new();
        let Some(payload) = payload.as_object() else {
            return form;
        };
        if self.is_default() {
            return form;
        }

        form.values = copy_fields(self.fields, payload);

        for group in self.groups {
            let Some(items) = payload.get(group.key).and_then(Value::as_array) else {
                continue;
            };
            for item in items.iter().filter_map(Value::as_object) {
                form.push_item(group.key, Value::Object(copy_fields(group.fields, item)));
            }
        }

        if let Some(tags) = payload.get(TAGS_GROUP).and_then(Value::as_object) {
            for (key, value) in tags {
                form.push_item(TAGS_GROUP, tag_item(key, value));
            }
        }

        if let Some(extensions) = payload.get(EXTENSIONS_GROUP).and_then(Value::as_object) {
            for (namespace, entries) in extensions {
                let Some(entries) = entries.as_object() else {
                    continue;
                };
                for (key, value) in entries {
                    let mut item = Map::new();
                    item.insert(EXTENSION_NAMESPACE.to_string(), Value::from(namespace.as_str()));
                    item.insert(EXTENSION_KEY.to_string(), Value::from(key.as_str()));
                    item.insert(EXTENSION_VALUE.to_string(), value.clone());
                    form.push_item(EXTENSIONS_GROUP, Value::Object(item));
                }
            }
        }

        form
    }

    /// Read the geometry stored in a payload.
    ///
    /// A missing or `null` geometry key yields no points; a present but
    /// malformed one is an error.
    pub fn geometry_from_payload(&self, payload: &Value) -> Result<Vec<WorldPoint>, String> {
        let (key, value) = match self.geometry {
            GeometryLayout::Echo => (ECHO_KEY, payload.get(ECHO_KEY)),
            GeometryLayout::Coordinate => (COORDINATE_KEY, payload.get(COORDINATE_KEY)),
            GeometryLayout::Path { key, .. } => (key, payload.get(key)),
        };
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(Vec::new());
        };
        match self.geometry {
            GeometryLayout::Echo => point_list(value, key, coordinate_point),
            GeometryLayout::Coordinate => coordinate_point(value)
                .map(|p| vec![p])
                .map_err(|e| format!("`{key}`: {e}")),
            GeometryLayout::Path { .. } => point_list(value, key, triple_point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DrawMode;
    use crate::schema::fixtures::complete_form;
    use crate::schema::{BuildContext, BuildOp, ClassKey, registry};
    use serde_json::json;

    #[test]
    fn test_required_fields_round_trip() {
        let schema = ClassKey::Platform.schema();
        let form = FormState::new()
            .with_value("PlatformID", "P1")
            .with_value("PlatformName", "1站台")
            .with_value("Height", 1.25)
            .with_item("lines", json!({"LineID": "L1", "Stop": 3}))
            .with_item("tags", json!({"key": "name", "value": "north"}))
            .with_item("tags", json!({"key": "other", "customKey": "gauge", "value": 1435}))
            .with_item("extensions", json!({"namespace": "osm", "key": "id", "value": 9}));
        let ctx = BuildContext::new("zth", "alice");
        let payload = schema.build(
            BuildOp::Create,
            DrawMode::Point,
            &[WorldPoint::new(1.0, 2.0)],
            &form,
            &ctx,
        );

        assert_eq!(schema.hydrate(&payload), form);
    }

    #[test]
    fn test_round_trip_for_every_class() {
        let ctx = BuildContext::new("eden", "bob");
        for class in registry() {
            let mode = class.mode.unwrap_or(DrawMode::Polygon);
            let coords: Vec<_> = (0..mode.min_points())
                .map(|i| WorldPoint::new(i as f64, 1.0))
                .collect();
            let form = complete_form(class);
            let payload = class.build(BuildOp::Create, mode, &coords, &form, &ctx);
            assert_eq!(class.hydrate(&payload), form, "{:?}", class.key);
        }
    }

    #[test]
    fn test_scalar_text_keeps_type() {
        let schema = ClassKey::Railway.schema();
        let form = FormState::new()
            .with_value("LineID", 7)
            .with_value("LineName", "京广线")
            .with_value("Direction", "上行");
        let ctx = BuildContext::new("zth", "alice");
        let coords = [WorldPoint::new(0.0, 0.0), WorldPoint::new(1.0, 0.0)];
        let payload = schema.build(BuildOp::Create, DrawMode::Polyline, &coords, &form, &ctx);
        assert_eq!(payload["LineID"], json!(7));
        assert_eq!(schema.hydrate(&payload).get("LineID"), Some(&json!(7)));
    }

    #[test]
    fn test_hydrate_ignores_system_and_unknown_keys() {
        let payload = json!({"Type": "Polyline", "LineID": "R1", "Unknown": 1, "Bureau": null});
        let form = ClassKey::Railway.schema().hydrate(&payload);
        assert_eq!(form.values.len(), 1);
        assert_eq!(form.get("LineID"), Some(&json!("R1")));
    }

    #[test]
    fn test_geometry_from_path_payload() {
        let schema = ClassKey::Road.schema();
        let payload = json!({"PLpoints": [[0, 64, 0], [1.5, 70, -2]]});
        let points = schema.geometry_from_payload(&payload).unwrap();
        assert_eq!(
            points,
            vec![
                WorldPoint::with_elevation(0.0, 64.0, 0.0),
                WorldPoint::with_elevation(1.5, 70.0, -2.0),
            ]
        );
        assert!(schema.geometry_from_payload(&json!({})).unwrap().is_empty());
        assert!(schema.geometry_from_payload(&json!({"PLpoints": [[0, 1]]})).is_err());
        assert!(schema.geometry_from_payload(&json!({"PLpoints": "x"})).is_err());
    }

    #[test]
    fn test_geometry_from_coordinate_payload() {
        let schema = ClassKey::Station.schema();
        let points = schema
            .geometry_from_payload(&json!({"coordinate": {"x": 3, "z": 4}}))
            .unwrap();
        assert_eq!(points, vec![WorldPoint::new(3.0, 4.0)]);
        assert!(
            schema
                .geometry_from_payload(&json!({"coordinate": {"x": "a", "z": 4}}))
                .is_err()
        );
    }
}
