//! Bulk import: lenient parsing, per-item validation, all-or-nothing insert.

use crate::config::ModeColors;
use crate::geometry::{DrawMode, WorldPoint};
use crate::layers::{LayerStore, NewRecord, RecordId};
use crate::schema::{
    BuildContext, BuildOp, CLASS_FIELD, ClassKey, FormState, MissingEntry, SchemaClass, TYPE_FIELD,
    WORLD_FIELD, resolve_world,
};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an item (or a whole batch) was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportIssue {
    #[error("structural error: {0}")]
    Structural(String),

    #[error(transparent)]
    MissingRequired(MissingEntry),

    #[error("{mode:?} geometry needs {required} point(s), found {found}")]
    Geometry {
        mode: DrawMode,
        required: usize,
        found: usize,
    },

    #[error("`{field}` is {declared}, expected {expected}")]
    SystemFieldMismatch {
        field: &'static str,
        declared: String,
        expected: String,
    },
}

/// Caller context for an import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub world: String,
    pub editor: String,
    /// Class used for items that carry no `Class`.
    pub fallback_class: Option<ClassKey>,
    pub colors: ModeColors,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            world: "zth".to_string(),
            editor: String::new(),
            fallback_class: None,
            colors: ModeColors::default(),
        }
    }
}

/// Outcome for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    pub index: usize,
    pub class: Option<ClassKey>,
    pub issues: Vec<ImportIssue>,
}

impl ItemReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Problems with the batch as a whole (unparseable text, unknown world).
    pub issues: Vec<ImportIssue>,
    pub items: Vec<ItemReport>,
    /// Ids of inserted records; empty unless every item passed.
    pub inserted: Vec<RecordId>,
}

impl ImportReport {
    pub fn ok(&self) -> bool {
        self.issues.is_empty() && self.items.iter().all(ItemReport::is_ok)
    }

    /// Failing items only.
    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|item| !item.is_ok())
    }
}

/// Parse lenient import text into raw items.
///
/// Accepts a JSON array, an object with `items` or `features`, an object of
/// arrays (flattened in key order), a single object, or several bare
/// top-level objects.
pub fn parse_items(text: &str) -> Result<Vec<Value>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty input".to_string());
    }

    let first_error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return flatten(value),
        Err(e) => e,
    };

    let stream: Result<Vec<Value>, _> = serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .collect();
    if let Ok(values) = stream {
        if values.len() > 1 {
            log::debug!("Parsed {} concatenated values", values.len());
            return Ok(values);
        }
    }

    let repaired = repair_concatenated(text);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => {
            log::debug!("Import text repaired by bracket insertion");
            flatten(value)
        }
        Err(_) => Err(format!("malformed JSON: {first_error}")),
    }
}

fn flatten(value: Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            for key in ["items", "features"] {
                if let Some(Value::Array(items)) = obj.get_mut(key) {
                    return Ok(std::mem::take(items));
                }
            }
            if !obj.is_empty() && obj.values().all(Value::is_array) {
                let items = obj
                    .into_iter()
                    .flat_map(|(_, v)| match v {
                        Value::Array(items) => items,
                        _ => Vec::new(),
                    })
                    .collect();
                return Ok(items);
            }
            Ok(vec![Value::Object(obj)])
        }
        other => Err(format!("expected an array or object, got {other}")),
    }
}

/// Join bare top-level objects with commas and wrap them in brackets.
fn repair_concatenated(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('[');
    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut pending_close = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        if c.is_whitespace() {
            out.push(c);
            continue;
        }
        if pending_close && depth == 0 && c == '{' {
            out.push(',');
        }
        pending_close = false;
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                pending_close = depth == 0 && c == '}';
            }
            _ => {}
        }
        out.push(c);
    }
    out.push(']');
    out
}

fn resolve_class(
    item: &Map<String, Value>,
    fallback: Option<ClassKey>,
) -> Result<ClassKey, String> {
    match item.get(CLASS_FIELD) {
        None | Some(Value::Null) => fallback.ok_or_else(|| "item has no `Class`".to_string()),
        Some(Value::String(code)) => {
            let code = code.trim();
            ClassKey::from_code(code)
                .or_else(|| ClassKey::from_label(code))
                .ok_or_else(|| format!("unknown class `{code}`"))
        }
        Some(other) => Err(format!("`Class` must be a string, got {other}")),
    }
}

fn item_mode(schema: &SchemaClass, item: &Map<String, Value>) -> Result<DrawMode, String> {
    if let Some(mode) = schema.mode {
        return Ok(mode);
    }
    item.get(TYPE_FIELD)
        .and_then(Value::as_str)
        .and_then(DrawMode::from_type_name)
        .ok_or_else(|| "cannot infer draw mode without a valid `Type`".to_string())
}

fn check_system_fields(
    item: &Map<String, Value>,
    mode: DrawMode,
    schema: &SchemaClass,
    world: u8,
    issues: &mut Vec<ImportIssue>,
) {
    let expected = [
        (TYPE_FIELD, mode.type_name().map(Value::from)),
        (CLASS_FIELD, schema.code.map(Value::from)),
        (WORLD_FIELD, Some(Value::from(world))),
    ];
    for (field, expected) in expected {
        let Some(declared) = item.get(field).filter(|v| !v.is_null()) else {
            continue;
        };
        if field == CLASS_FIELD && declared.as_str().map(str::trim) == Some(schema.label) {
            continue;
        }
        let Some(expected) = expected else {
            continue;
        };
        let matches = match (&expected, declared) {
            (Value::Number(e), Value::Number(d)) => e.as_f64() == d.as_f64(),
            (Value::String(e), Value::String(d)) => e == d.trim(),
            _ => false,
        };
        if !matches {
            issues.push(ImportIssue::SystemFieldMismatch {
                field,
                declared: declared.to_string(),
                expected: expected.to_string(),
            });
        }
    }
}

/// A validated item waiting for the batch verdict.
struct Accepted {
    /// The raw item with `Class` normalized to the class code.
    prior: Value,
    schema: &'static SchemaClass,
    mode: DrawMode,
    coords: Vec<WorldPoint>,
    form: FormState,
}

fn check_item(
    item: &Value,
    world: u8,
    options: &ImportOptions,
    report: &mut ItemReport,
) -> Option<Accepted> {
    let Some(obj) = item.as_object() else {
        report
            .issues
            .push(ImportIssue::Structural(format!("item is not an object: {item}")));
        return None;
    };

    let class = match resolve_class(obj, options.fallback_class) {
        Ok(class) => class,
        Err(e) => {
            report.issues.push(ImportIssue::Structural(e));
            return None;
        }
    };
    report.class = Some(class);
    let schema = class.schema();

    let structural = schema.validate_structure(obj);
    if !structural.is_empty() {
        report
            .issues
            .extend(structural.into_iter().map(ImportIssue::Structural));
        return None;
    }

    let mode = match item_mode(schema, obj) {
        Ok(mode) => mode,
        Err(e) => {
            report.issues.push(ImportIssue::Structural(e));
            return None;
        }
    };

    let coords = match schema.geometry_from_payload(item) {
        Ok(coords) => coords,
        Err(e) => {
            report.issues.push(ImportIssue::Structural(e));
            return None;
        }
    };
    if !mode.accepts_count(coords.len()) {
        report.issues.push(ImportIssue::Geometry {
            mode,
            required: mode.min_points(),
            found: coords.len(),
        });
    }

    check_system_fields(obj, mode, schema, world, &mut report.issues);

    let form = schema.hydrate(item);
    report.issues.extend(
        schema
            .validate_required(&form)
            .missing
            .into_iter()
            .map(ImportIssue::MissingRequired),
    );

    if !report.is_ok() {
        return None;
    }
    let mut prior = item.clone();
    if let (Some(obj), Some(code)) = (prior.as_object_mut(), schema.code) {
        if obj.contains_key(CLASS_FIELD) {
            obj.insert(CLASS_FIELD.to_string(), Value::from(code));
        }
    }
    Some(Accepted {
        prior,
        schema,
        mode,
        coords,
        form,
    })
}

/// Validate a batch and insert it only if every item passes.
pub fn import_items(
    store: &mut LayerStore,
    items: &[Value],
    options: &ImportOptions,
) -> ImportReport {
    let mut report = ImportReport::default();

    let Some(world) = resolve_world(&options.world) else {
        report.issues.push(ImportIssue::SystemFieldMismatch {
            field: WORLD_FIELD,
            declared: format!("{:?}", options.world),
            expected: "a known world".to_string(),
        });
        log::warn!("Import rejected: unknown world {:?}", options.world);
        return report;
    };

    let mut accepted = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut item_report = ItemReport {
            index,
            class: None,
            issues: Vec::new(),
        };
        if let Some(ok) = check_item(item, world, options, &mut item_report) {
            accepted.push(ok);
        }
        report.items.push(item_report);
    }

    if !report.ok() {
        log::warn!(
            "Import rejected: {} of {} item(s) failed",
            report.failures().count(),
            items.len()
        );
        return report;
    }

    let records: Vec<NewRecord> = accepted
        .into_iter()
        .map(|a| {
            let ctx = BuildContext::new(&options.world, &options.editor).with_prior(&a.prior);
            let payload = a.schema.build(BuildOp::Import, a.mode, &a.coords, &a.form, &ctx);
            NewRecord {
                mode: a.mode,
                color: options.colors.for_mode(a.mode),
                coords: a.coords,
                class: a.schema.key,
                payload,
            }
        })
        .collect();
    report.inserted = store.insert_batch(records);
    log::info!("Imported {} record(s)", report.inserted.len());
    report
}

/// Parse and import text in one step.
pub fn import_text(store: &mut LayerStore, text: &str, options: &ImportOptions) -> ImportReport {
    match parse_items(text) {
        Ok(items) => import_items(store, &items, options),
        Err(e) => {
            log::warn!("Import rejected: {e}");
            ImportReport {
                issues: vec![ImportIssue::Structural(e)],
                ..ImportReport::default()
            }
        }
    }
}
