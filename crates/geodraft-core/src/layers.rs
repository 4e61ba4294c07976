//! Committed records and their ordering.

use crate::geometry::{DrawMode, SerializableColor, WorldPoint};
use crate::rounding::rounded_payload;
use crate::schema::ClassKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable record identifier. Ids are never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A committed, schema-validated feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub mode: DrawMode,
    pub color: SerializableColor,
    pub coords: Vec<WorldPoint>,
    pub visible: bool,
    pub class: ClassKey,
    /// Output of the class `build`; the only part that is exported.
    pub payload: Value,
}

/// Contents of a record before the store assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub mode: DrawMode,
    pub color: SerializableColor,
    pub coords: Vec<WorldPoint>,
    pub class: ClassKey,
    pub payload: Value,
}

/// Direction for [`LayerStore::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// Towards the front of the list (index 0).
    Up,
    /// Towards the back of the list.
    Down,
}

/// Ordered collection of committed records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerStore {
    records: Vec<Record>,
    next_id: u64,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id)
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Append a record; it starts visible.
    pub fn insert(&mut self, record: NewRecord) -> RecordId {
        let id = self.allocate_id();
        self.records.push(Record {
            id,
            mode: record.mode,
            color: record.color,
            coords: record.coords,
            visible: true,
            class: record.class,
            payload: record.payload,
        });
        id
    }

    /// Append several records in order.
    pub fn insert_batch(&mut self, records: impl IntoIterator<Item = NewRecord>) -> Vec<RecordId> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    /// Replace a record's contents, keeping its id, position and visibility.
    /// Returns false if the id is unknown.
    pub fn replace(&mut self, id: RecordId, record: NewRecord) -> bool {
        let Some(existing) = self.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        existing.mode = record.mode;
        existing.color = record.color;
        existing.coords = record.coords;
        existing.class = record.class;
        existing.payload = record.payload;
        true
    }

    /// Move a record one slot. Returns true if it moved, false at the bounds
    /// or for an unknown id.
    pub fn reorder(&mut self, id: RecordId, direction: ReorderDirection) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        match direction {
            ReorderDirection::Up if pos > 0 => {
                self.records.swap(pos, pos - 1);
                true
            }
            ReorderDirection::Down if pos + 1 < self.records.len() => {
                self.records.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Flip visibility. Returns the new visibility, `None` for unknown ids.
    pub fn toggle_visible(&mut self, id: RecordId) -> Option<bool> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        record.visible = !record.visible;
        Some(record.visible)
    }

    pub fn delete(&mut self, id: RecordId) -> Option<Record> {
        let pos = self.position(id)?;
        Some(self.records.remove(pos))
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    /// Records in list order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Visible records, excluding the one open in the edit session.
    pub fn render_set(&self, editing: Option<RecordId>) -> impl Iterator<Item = (usize, &Record)> {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.visible && Some(r.id) != editing)
    }

    /// Payloads in list order with export rounding applied.
    pub fn export_payloads(&self, step: f64) -> Vec<Value> {
        self.records
            .iter()
            .map(|r| rounded_payload(&r.payload, step))
            .collect()
    }

    /// Exported payloads as a pretty JSON array.
    pub fn export_json(&self, step: f64) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export_payloads(step))
    }

    /// Serialize the whole store.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a store. The id counter never falls behind existing ids.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut store: Self = serde_json::from_str(json)?;
        let max_id = store.records.iter().map(|r| r.id.0).max().unwrap_or(0);
        store.next_id = store.next_id.max(max_id);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> NewRecord {
        NewRecord {
            mode: DrawMode::Point,
            color: SerializableColor::black(),
            coords: vec![WorldPoint::new(0.0, 0.0)],
            class: ClassKey::Default,
            payload: json!({ "name": name }),
        }
    }

    fn names(store: &LayerStore) -> Vec<String> {
        store
            .iter()
            .map(|r| r.payload["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_ids_never_reused() {
        let mut store = LayerStore::new();
        let a = store.insert(record("a"));
        let b = store.insert(record("b"));
        assert!(store.delete(b).is_some());
        let c = store.insert(record("c"));
        assert_ne!(b, c);
        assert!(a < c);
    }

    #[test]
    fn test_reorder_bounds() {
        let mut store = LayerStore::new();
        let ids = store.insert_batch([record("a"), record("b"), record("c")]);

        assert!(!store.reorder(ids[0], ReorderDirection::Up));
        assert!(!store.reorder(ids[2], ReorderDirection::Down));
        assert!(store.reorder(ids[2], ReorderDirection::Up));
        assert_eq!(names(&store), ["a", "c", "b"]);
        assert!(store.reorder(ids[0], ReorderDirection::Down));
        assert_eq!(names(&store), ["c", "a", "b"]);
        assert!(!store.reorder(RecordId(99), ReorderDirection::Up));
    }

    #[test]
    fn test_replace_keeps_position_and_visibility() {
        let mut store = LayerStore::new();
        let ids = store.insert_batch([record("a"), record("b")]);
        store.toggle_visible(ids[0]);
        assert!(store.replace(ids[0], record("z")));
        assert_eq!(names(&store), ["z", "b"]);
        assert_eq!(store.get(ids[0]).map(|r| r.visible), Some(false));
        assert!(!store.replace(RecordId(42), record("q")));
    }

    #[test]
    fn test_render_set_excludes_hidden_and_editing() {
        let mut store = LayerStore::new();
        let ids = store.insert_batch([record("a"), record("b"), record("c")]);
        assert_eq!(store.toggle_visible(ids[1]), Some(false));
        let visible: Vec<_> = store.render_set(Some(ids[2])).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!((visible[0].0, visible[0].1.id), (0, ids[0]));
    }

    #[test]
    fn test_export_rounds_payloads() {
        let mut store = LayerStore::new();
        let mut rec = record("a");
        rec.payload = json!({"coordinate": {"x": -622.8000000000001, "z": 0.25}});
        store.insert(rec);
        let exported = store.export_payloads(0.1);
        assert_eq!(exported[0]["coordinate"]["x"], json!(-622.8));
        let stored = &store.get(RecordId(1)).unwrap().payload;
        assert_eq!(stored["coordinate"]["x"], json!(-622.8000000000001));
        assert!(store.export_json(0.1).unwrap().contains("-622.8"));
    }

    #[test]
    fn test_json_round_trip_keeps_counter() {
        let mut store = LayerStore::new();
        store.insert_batch([record("a"), record("b")]);
        let mut restored = LayerStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.insert(record("c")), RecordId(3));
    }
}
