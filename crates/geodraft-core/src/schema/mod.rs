//! Feature schema registry.
//!
//! Every feature class is a static [`SchemaClass`] keyed by the closed
//! [`ClassKey`] enum. A class declares its fields, repeatable groups and
//! geometry layout; the generic transforms on `SchemaClass` use that
//! declaration to:
//! - `build` a canonical payload from form state and geometry,
//! - `hydrate` form state back from a payload,
//! - validate required entries (shared by commit and import),
//! - validate the structure of an imported item.

mod build;
mod catalogue;
mod form;
mod hydrate;
mod system;
mod validate;

pub use build::{BuildContext, BuildOp};
pub use form::{FormItem, FormState, FormValues};
pub use system::{
    CLASS_FIELD, CREATE_BY_FIELD, CREATE_TIME_FIELD, MODIFY_BY_FIELD, MODIFY_TIME_FIELD,
    TIMESTAMP_FORMAT, TYPE_FIELD, WORLD_FIELD, WORLDS, resolve_world, timestamp_now,
};
pub use validate::{MissingEntry, RequiredCheck};

use crate::geometry::DrawMode;
use serde::{Deserialize, Serialize};

/// Key of the universal tags group.
pub const TAGS_GROUP: &str = "tags";
/// Key of the universal extensions group.
pub const EXTENSIONS_GROUP: &str = "extensions";
/// Tag key selector meaning "use the free-text key override".
pub const TAG_OTHER: &str = "other";
/// Tag keys offered by the key selector.
pub const TAG_PRESETS: &[&str] = &["name", "ref", "operator", "status", "layer"];

/// Item keys inside a tags group item.
pub const TAG_KEY: &str = "key";
pub const TAG_CUSTOM_KEY: &str = "customKey";
pub const TAG_VALUE: &str = "value";
/// Item keys inside an extensions group item.
pub const EXTENSION_NAMESPACE: &str = "namespace";
pub const EXTENSION_KEY: &str = "key";
pub const EXTENSION_VALUE: &str = "value";

/// Payload key of a point class coordinate.
pub const COORDINATE_KEY: &str = "coordinate";
/// Payload key of the default class geometry echo.
pub const ECHO_KEY: &str = "points";

/// Feature classes known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ClassKey {
    /// No class chosen yet; geometry only, never validated.
    #[default]
    Default,
    Station,
    Platform,
    Landmark,
    Railway,
    Road,
    Area,
    Building,
}

impl ClassKey {
    pub const ALL: [ClassKey; 8] = [
        ClassKey::Default,
        ClassKey::Station,
        ClassKey::Platform,
        ClassKey::Landmark,
        ClassKey::Railway,
        ClassKey::Road,
        ClassKey::Area,
        ClassKey::Building,
    ];

    /// The static definition of this class.
    pub fn schema(self) -> &'static SchemaClass {
        catalogue::schema_for(self)
    }

    /// Resolve a class from its `Class` code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.schema().code == Some(code))
    }

    /// Resolve a class from its display label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.schema().label == label)
    }
}

/// Value type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Select(&'static [&'static str]),
}

/// A declared field of a class or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
}

impl FieldDef {
    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
            optional: false,
        }
    }

    pub const fn number(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Number,
            optional: false,
        }
    }

    pub const fn boolean(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Bool,
            optional: false,
        }
    }

    pub const fn select(
        key: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Select(options),
            optional: false,
        }
    }

    /// Mark the field optional.
    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }
}

/// A repeatable sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupDef {
    pub key: &'static str,
    pub label: &'static str,
    pub optional: bool,
    pub min_items: usize,
    pub fields: &'static [FieldDef],
}

impl GroupDef {
    pub const fn required(
        key: &'static str,
        label: &'static str,
        min_items: usize,
        fields: &'static [FieldDef],
    ) -> Self {
        Self {
            key,
            label,
            optional: false,
            min_items,
            fields,
        }
    }

    pub const fn optional(
        key: &'static str,
        label: &'static str,
        fields: &'static [FieldDef],
    ) -> Self {
        Self {
            key,
            label,
            optional: true,
            min_items: 0,
            fields,
        }
    }
}

/// How a class stores its geometry in the payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryLayout {
    /// Plain echo of the draft points under [`ECHO_KEY`].
    Echo,
    /// A single `{x, z[, y]}` object under [`COORDINATE_KEY`].
    Coordinate,
    /// Ordered `[x, y, z]` triples under `key`; `default_y` fills missing elevations.
    Path { key: &'static str, default_y: f64 },
}

/// Declarative definition of one feature class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchemaClass {
    pub key: ClassKey,
    pub label: &'static str,
    /// Value of the `Class` system field; `None` for the default class.
    pub code: Option<&'static str>,
    /// Draw mode this class is digitized in; `None` accepts any mode.
    pub mode: Option<DrawMode>,
    pub fields: &'static [FieldDef],
    pub groups: &'static [GroupDef],
    pub geometry: GeometryLayout,
    /// Field used as the record's external identifier.
    pub id_field: Option<&'static str>,
}

impl SchemaClass {
    /// The identity class is exempt from validation and system fields.
    pub fn is_default(&self) -> bool {
        self.key == ClassKey::Default
    }

    pub fn accepts_mode(&self, mode: DrawMode) -> bool {
        mode != DrawMode::None && self.mode.is_none_or(|m| m == mode)
    }

    pub fn field(&self, key: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn group(&self, key: &str) -> Option<&'static GroupDef> {
        self.groups.iter().find(|g| g.key == key)
    }
}

/// Iterate over every registered class.
pub fn registry() -> impl Iterator<Item = &'static SchemaClass> {
    ClassKey::ALL.into_iter().map(ClassKey::schema)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keys_match() {
        for key in ClassKey::ALL {
            assert_eq!(key.schema().key, key);
        }
    }

    #[test]
    fn test_codes_unique_and_resolvable() {
        let codes: Vec<_> = registry().filter_map(|c| c.code).collect();
        for code in &codes {
            assert_eq!(codes.iter().filter(|c| *c == code).count(), 1);
            assert!(ClassKey::from_code(code).is_some());
        }
        assert_eq!(ClassKey::from_code("RLE"), Some(ClassKey::Railway));
        assert_eq!(ClassKey::from_label("铁路"), Some(ClassKey::Railway));
        assert_eq!(ClassKey::from_code("nope"), None);
    }

    #[test]
    fn test_default_class_accepts_any_mode() {
        let schema = ClassKey::Default.schema();
        assert!(schema.is_default());
        assert!(schema.accepts_mode(DrawMode::Polygon));
        assert!(!schema.accepts_mode(DrawMode::None));
        assert!(!ClassKey::Railway.schema().accepts_mode(DrawMode::Point));
    }

    #[test]
    fn test_id_fields_are_declared() {
        for class in registry() {
            if let Some(id) = class.id_field {
                assert!(class.field(id).is_some(), "{:?}", class.key);
            }
        }
    }
}
