//! Required-entry validation (commit and import) and structural checks
//! for imported items.

use super::form::{FormItem, coerce, is_primitive, text_of};
use super::{
    EXTENSIONS_GROUP, FieldDef, FieldKind, FormState, SchemaClass, TAG_CUSTOM_KEY, TAG_KEY,
    TAG_OTHER, TAGS_GROUP,
};
use serde_json::{Map, Value};
use thiserror::Error;

/// One missing required entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingEntry {
    #[error("missing required field `{field}` ({label})")]
    Field {
        field: &'static str,
        label: &'static str,
    },

    #[error("group `{group}` ({label}) needs at least {min_items} item(s), found {found}")]
    Group {
        group: &'static str,
        label: &'static str,
        min_items: usize,
        found: usize,
    },

    #[error("missing required field `{field}` ({label}) in `{group}`[{index}]")]
    GroupItemField {
        group: &'static str,
        index: usize,
        field: &'static str,
        label: &'static str,
    },

    #[error("tag {index} uses a custom key but the key is blank")]
    TagKey { index: usize },
}

impl MissingEntry {
    /// Key of the missing field, if the entry names one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            MissingEntry::Field { field, .. } | MissingEntry::GroupItemField { field, .. } => {
                Some(*field)
            }
            MissingEntry::Group { .. } | MissingEntry::TagKey { .. } => None,
        }
    }
}

/// Outcome of required-entry validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredCheck {
    pub missing: Vec<MissingEntry>,
}

impl RequiredCheck {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<MissingEntry>> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(self.missing)
        }
    }
}

fn is_empty(field: &FieldDef, values: &FormItem) -> bool {
    coerce(field.kind, values.get(field.key)).is_none()
}

fn type_error(field: &FieldDef, value: &Value) -> Option<String> {
    let ok = match field.kind {
        FieldKind::Text => matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)),
        FieldKind::Number => value.is_number(),
        FieldKind::Bool => value.is_boolean(),
        FieldKind::Select(options) => value.as_str().is_some_and(|s| options.contains(&s)),
    };
    if ok {
        return None;
    }
    Some(match field.kind {
        FieldKind::Select(options) => format!(
            "`{}` must be one of [{}], got {value}",
            field.key,
            options.join(", ")
        ),
        kind => format!("`{}` has wrong type for {kind:?}: {value}", field.key),
    })
}

fn check_fields(fields: &[FieldDef], source: &Map<String, Value>, at: &str, out: &mut Vec<String>) {
    for field in fields {
        if let Some(value) = source.get(field.key).filter(|v| !v.is_null()) {
            if let Some(err) = type_error(field, value) {
                out.push(format!("{at}{err}"));
            }
        }
    }
}

impl SchemaClass {
    /// Walk declared fields, groups and the tag key rule.
    ///
    /// The default class is always valid.
    pub fn validate_required(&self, form: &FormState) -> RequiredCheck {
        let mut missing = Vec::new();
        if self.is_default() {
            return RequiredCheck { missing };
        }

        for field in self.fields.iter().filter(|f| !f.optional) {
            if is_empty(field, &form.values) {
                missing.push(MissingEntry::Field {
                    field: field.key,
                    label: field.label,
                });
            }
        }

        for group in self.groups {
            let items = form.items(group.key);
            if !group.optional && items.len() < group.min_items {
                missing.push(MissingEntry::Group {
                    group: group.key,
                    label: group.label,
                    min_items: group.min_items,
                    found: items.len(),
                });
            }
            for (index, item) in items.iter().enumerate() {
                for field in group.fields.iter().filter(|f| !f.optional) {
                    if is_empty(field, item) {
                        missing.push(MissingEntry::GroupItemField {
                            group: group.key,
                            index,
                            field: field.key,
                            label: field.label,
                        });
                    }
                }
            }
        }

        for (index, tag) in form.items(TAGS_GROUP).iter().enumerate() {
            let custom_key = text_of(tag.get(TAG_CUSTOM_KEY));
            if text_of(tag.get(TAG_KEY)) == TAG_OTHER && custom_key.is_empty() {
                missing.push(MissingEntry::TagKey { index });
            }
        }

        RequiredCheck { missing }
    }

    /// Check an imported item's shape against the declaration.
    ///
    /// Returns one message per problem; an empty list means the item is
    /// structurally sound. Missing values are not reported here.
    pub fn validate_structure(&self, item: &Map<String, Value>) -> Vec<String> {
        let mut errors = Vec::new();
        if self.is_default() {
            return errors;
        }

        check_fields(self.fields, item, "", &mut errors);

        for group in self.groups {
            match item.get(group.key) {
                None | Some(Value::Null) => {}
                Some(Value::Array(entries)) => {
                    for (i, entry) in entries.iter().enumerate() {
                        match entry.as_object() {
                            Some(obj) => {
                                let at = format!("`{}`[{i}]: ", group.key);
                                check_fields(group.fields, obj, &at, &mut errors);
                            }
                            None => errors.push(format!("`{}`[{i}] is not an object", group.key)),
                        }
                    }
                }
                Some(_) => errors.push(format!("`{}` is not an array", group.key)),
            }
        }

        match item.get(TAGS_GROUP) {
            None | Some(Value::Null) => {}
            Some(Value::Object(tags)) => {
                for (key, value) in tags {
                    if !is_primitive(value) {
                        errors.push(format!("tag `{key}` is not a primitive value"));
                    }
                }
            }
            Some(_) => errors.push(format!("`{TAGS_GROUP}` is not an object")),
        }

        match item.get(EXTENSIONS_GROUP) {
            None | Some(Value::Null) => {}
            Some(Value::Object(namespaces)) => {
                for (ns, entries) in namespaces {
                    match entries.as_object() {
                        Some(entries) => {
                            for (key, value) in entries {
                                if !is_primitive(value) {
                                    errors.push(format!(
                                        "extension `{ns}.{key}` is not a primitive value"
                                    ));
                                }
                            }
                        }
                        None => errors.push(format!("extension namespace `{ns}` is not an object")),
                    }
                }
            }
            Some(_) => errors.push(format!("`{EXTENSIONS_GROUP}` is not an object")),
        }

        if let Err(err) = self.geometry_from_payload(&Value::Object(item.clone())) {
            errors.push(err);
        }

        errors
    }
}
