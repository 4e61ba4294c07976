//! System fields: classification (`Type`, `Class`, `World`) and audit
//! (`Create*`, `Modifity*`) stamping.

use super::SchemaClass;
use super::build::{BuildContext, BuildOp};
use crate::geometry::DrawMode;
use serde_json::{Map, Value};

pub const TYPE_FIELD: &str = "Type";
pub const CLASS_FIELD: &str = "Class";
pub const WORLD_FIELD: &str = "World";
pub const CREATE_TIME_FIELD: &str = "CreateTime";
pub const CREATE_BY_FIELD: &str = "CreateBy";
pub const MODIFY_TIME_FIELD: &str = "ModifityTime";
pub const MODIFY_BY_FIELD: &str = "ModifityBy";

/// Format of audit timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed world identifier to `World` code table.
pub const WORLDS: &[(&str, u8)] = &[
    ("zth", 0),
    ("naraku", 1),
    ("houtu", 2),
    ("eden", 3),
    ("laputa", 4),
    ("yunduan", 5),
];

/// Resolve a caller-supplied world identifier.
pub fn resolve_world(id: &str) -> Option<u8> {
    let id = id.trim();
    WORLDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(id))
        .map(|(_, code)| *code)
}

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn present<'a>(prior: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Value> {
    prior?.get(key).filter(|v| !v.is_null())
}

fn editor_value(editor: &str) -> Option<Value> {
    let editor = editor.trim();
    (!editor.is_empty()).then(|| Value::String(editor.to_string()))
}

/// Write `Type`, `Class` and `World`.
///
/// Imports keep declared values (consistency is checked before building);
/// every other operation writes the derived ones.
pub(super) fn stamp_classification(
    payload: &mut Map<String, Value>,
    op: BuildOp,
    mode: DrawMode,
    class: &SchemaClass,
    ctx: &BuildContext<'_>,
) {
    let derived = [
        (TYPE_FIELD, mode.type_name().map(Value::from)),
        (CLASS_FIELD, class.code.map(Value::from)),
        (WORLD_FIELD, resolve_world(ctx.world).map(Value::from)),
    ];
    for (key, value) in derived {
        let kept = match op {
            BuildOp::Import => present(ctx.prior, key).cloned(),
            BuildOp::Create | BuildOp::Edit => None,
        };
        payload.insert(key.to_string(), kept.or(value).unwrap_or(Value::Null));
    }
}

/// Write the audit fields for an operation.
pub(super) fn stamp_audit(payload: &mut Map<String, Value>, op: BuildOp, ctx: &BuildContext<'_>) {
    let now = Value::String(ctx.now.clone());
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            payload.insert(key.to_string(), value);
        }
    };

    match op {
        BuildOp::Create => {
            put(CREATE_TIME_FIELD, Some(now));
            put(CREATE_BY_FIELD, editor_value(ctx.editor));
        }
        BuildOp::Edit => {
            let created = present(ctx.prior, CREATE_TIME_FIELD).cloned();
            put(CREATE_TIME_FIELD, created.or_else(|| Some(now.clone())));
            put(CREATE_BY_FIELD, present(ctx.prior, CREATE_BY_FIELD).cloned());
            put(MODIFY_TIME_FIELD, Some(now));
            put(MODIFY_BY_FIELD, editor_value(ctx.editor));
        }
        BuildOp::Import => {
            let created = present(ctx.prior, CREATE_TIME_FIELD).cloned();
            put(CREATE_TIME_FIELD, created.or(Some(now)));
            let creator = present(ctx.prior, CREATE_BY_FIELD).cloned();
            put(CREATE_BY_FIELD, creator.or_else(|| editor_value(ctx.editor)));
            put(MODIFY_TIME_FIELD, present(ctx.prior, MODIFY_TIME_FIELD).cloned());
            put(MODIFY_BY_FIELD, present(ctx.prior, MODIFY_BY_FIELD).cloned());
        }
    }
}
