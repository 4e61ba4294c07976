//! What should be on screen: one set for committed records, one for the
//! active draft. The renderer diffs each set independently.

use crate::geometry::{DrawMode, SerializableColor, WorldPoint};
use crate::layers::{LayerStore, RecordId};
use crate::session::DraftSession;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named rendering container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Committed,
    Draft,
    Endpoint,
    ControlPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Point,
    Line,
    Polygon,
}

impl PrimitiveKind {
    /// Primitive used to draw `count` points of a geometry in `mode`.
    pub fn for_mode(mode: DrawMode, count: usize) -> Option<Self> {
        match (mode, count) {
            (_, 0) | (DrawMode::None, _) => None,
            (DrawMode::Point, _) => Some(PrimitiveKind::Point),
            (DrawMode::Polyline | DrawMode::Polygon, 1) => None,
            (DrawMode::Polyline, _) => Some(PrimitiveKind::Line),
            (DrawMode::Polygon, 2) => Some(PrimitiveKind::Line),
            (DrawMode::Polygon, _) => Some(PrimitiveKind::Polygon),
        }
    }
}

/// Key of a primitive within its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimitiveKey {
    pub container: Container,
    pub index: u64,
}

impl PrimitiveKey {
    pub fn new(container: Container, index: u64) -> Self {
        Self { container, index }
    }

    pub fn record(id: RecordId) -> Self {
        Self::new(Container::Committed, id.0)
    }
}

/// A drawable primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub points: Vec<WorldPoint>,
    pub color: SerializableColor,
    /// Painting order within the container; higher draws on top.
    pub z_index: usize,
}

/// A keyed set of primitives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    pub primitives: BTreeMap<PrimitiveKey, Primitive>,
}

impl VisibleSet {
    /// Visible committed records, minus the one being edited.
    pub fn committed(store: &LayerStore, editing: Option<RecordId>) -> Self {
        let primitives = store
            .render_set(editing)
            .filter_map(|(position, record)| {
                let kind = PrimitiveKind::for_mode(record.mode, record.coords.len())?;
                let primitive = Primitive {
                    kind,
                    points: record.coords.clone(),
                    color: record.color,
                    z_index: position,
                };
                Some((PrimitiveKey::record(record.id), primitive))
            })
            .collect();
        Self { primitives }
    }

    /// Draft geometry with its per-point overlay (endpoint and control points).
    pub fn draft(session: &DraftSession, color: SerializableColor) -> Self {
        let mut primitives = BTreeMap::new();
        let points = session.points();

        if let Some(kind) = PrimitiveKind::for_mode(session.mode(), points.len()) {
            primitives.insert(
                PrimitiveKey::new(Container::Draft, 0),
                Primitive {
                    kind,
                    points: points.to_vec(),
                    color,
                    z_index: 0,
                },
            );
        }

        if let Some(last) = points.last() {
            primitives.insert(
                PrimitiveKey::new(Container::Endpoint, 0),
                Primitive {
                    kind: PrimitiveKind::Point,
                    points: vec![*last],
                    color,
                    z_index: 0,
                },
            );
        }

        for (i, point) in points.iter().enumerate() {
            primitives.insert(
                PrimitiveKey::new(Container::ControlPoints, i as u64),
                Primitive {
                    kind: PrimitiveKind::Point,
                    points: vec![*point],
                    color,
                    z_index: i,
                },
            );
        }

        Self { primitives }
    }

    pub fn get(&self, key: PrimitiveKey) -> Option<&Primitive> {
        self.primitives.get(&key)
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PrimitiveKey, &Primitive)> {
        self.primitives.iter()
    }

    /// Primitives in painting order: by container, then list position.
    pub fn draw_order(&self) -> Vec<(&PrimitiveKey, &Primitive)> {
        let mut ordered: Vec<_> = self.primitives.iter().collect();
        ordered.sort_by_key(|(key, primitive)| (key.container, primitive.z_index, key.index));
        ordered
    }

    /// Number of primitives in a container.
    pub fn count_in(&self, container: Container) -> usize {
        self.primitives
            .keys()
            .filter(|k| k.container == container)
            .count()
    }
}

/// The two independent sets handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSets {
    pub committed: VisibleSet,
    pub draft: VisibleSet,
}
