//! Snap functionality for aligning world points to the grid and assist lines.

use crate::geometry::{DrawMode, WorldPoint};
use kurbo::{Line, ParamCurve, ParamCurveNearest, Point};
use serde::{Deserialize, Serialize};

/// Default distance threshold for assist-line snapping (in world units).
pub const DEFAULT_ASSIST_THRESHOLD: f64 = 0.5;

/// Accuracy passed to kurbo's nearest-point search.
const NEAREST_ACCURACY: f64 = 1e-9;

/// Grid quantization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    /// No grid snapping.
    #[default]
    Off,
    /// Snap to the nearest half block.
    Auto,
    /// Snap to block edges (integers).
    Edge,
    /// Snap to block centers (`k + 0.5`).
    Center,
}

impl GridMode {
    /// Cycle to the next grid mode.
    pub fn next(self) -> Self {
        match self {
            GridMode::Off => GridMode::Auto,
            GridMode::Auto => GridMode::Edge,
            GridMode::Edge => GridMode::Center,
            GridMode::Center => GridMode::Off,
        }
    }

    /// Get display name for this grid mode.
    pub fn name(self) -> &'static str {
        match self {
            GridMode::Off => "off",
            GridMode::Auto => "auto",
            GridMode::Edge => "edge",
            GridMode::Center => "center",
        }
    }

    /// Check if grid snapping is enabled.
    pub fn is_enabled(self) -> bool {
        self != GridMode::Off
    }

    /// Quantize a single coordinate.
    pub fn apply(self, v: f64) -> f64 {
        match self {
            GridMode::Off => v,
            GridMode::Auto => snap_auto(v),
            GridMode::Edge => snap_edge(v),
            GridMode::Center => snap_center(v),
        }
    }

    /// Check whether a coordinate already lies on this grid.
    pub fn is_on_grid(self, v: f64) -> bool {
        !self.is_enabled() || self.apply(v) == v
    }
}

/// Map `-0.0` to `0.0`; leave everything else untouched.
fn normalize_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

/// Round to the nearest 0.5, half away from zero.
pub fn snap_auto(v: f64) -> f64 {
    normalize_zero((v * 2.0).round() / 2.0)
}

/// Round to the nearest integer, half away from zero.
pub fn snap_edge(v: f64) -> f64 {
    normalize_zero(v.round())
}

/// Round to the nearest `k + 0.5`, mirrored around zero.
pub fn snap_center(v: f64) -> f64 {
    let magnitude = v.abs().floor() + 0.5;
    if v < 0.0 { -magnitude } else { magnitude }
}

/// Quantize the plane coordinates of a point. Elevation is never snapped.
pub fn snap_to_grid(point: WorldPoint, mode: GridMode) -> WorldPoint {
    WorldPoint {
        x: mode.apply(point.x),
        z: mode.apply(point.z),
        y: point.y,
    }
}

/// Horizontal axis of a fixed assist line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Z => "z",
        }
    }

    fn get(self, p: WorldPoint) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Z => p.z,
        }
    }

    fn set(self, p: WorldPoint, value: f64) -> WorldPoint {
        match self {
            Axis::X => WorldPoint { x: value, ..p },
            Axis::Z => WorldPoint { z: value, ..p },
        }
    }
}

/// An assist target. At most one is active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssistTarget {
    /// Infinite line `axis = value`.
    Line { axis: Axis, value: f64 },
    /// Two fixed lines, `x = x` and `z = z`.
    Frame { x: f64, z: f64 },
    /// A previously rendered polyline or polygon ring.
    Geometry {
        label: String,
        points: Vec<WorldPoint>,
        closed: bool,
    },
}

impl AssistTarget {
    /// Snap along a drawn path. Polygons test their closing segment; point
    /// and empty geometry give no target.
    pub fn along(label: impl Into<String>, mode: DrawMode, points: &[WorldPoint]) -> Option<Self> {
        let is_path = matches!(mode, DrawMode::Polyline | DrawMode::Polygon);
        if !is_path || points.is_empty() {
            return None;
        }
        Some(AssistTarget::Geometry {
            label: label.into(),
            points: points.to_vec(),
            closed: mode.is_closed(),
        })
    }
}

/// Inputs to [`snap`].
#[derive(Debug, Clone, Copy)]
pub struct SnapContext<'a> {
    pub grid: GridMode,
    pub assist: Option<&'a AssistTarget>,
    pub threshold: f64,
}

impl Default for SnapContext<'_> {
    fn default() -> Self {
        Self {
            grid: GridMode::Off,
            assist: None,
            threshold: DEFAULT_ASSIST_THRESHOLD,
        }
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// The final point (assist, then grid).
    pub point: WorldPoint,
    /// Whether an assist target captured the point.
    pub snapped: bool,
    /// Distance to the nearest assist candidate, when one was evaluated.
    pub distance: Option<f64>,
    /// Human-readable label of the capturing target.
    pub target_label: Option<String>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: WorldPoint) -> Self {
        Self {
            point,
            snapped: false,
            distance: None,
            target_label: None,
        }
    }

    /// Check if an assist target captured the point.
    pub fn is_snapped(&self) -> bool {
        self.snapped
    }
}

/// Snap a raw point: assist target first, then grid quantization.
pub fn snap(raw: WorldPoint, ctx: &SnapContext<'_>) -> SnapResult {
    let mut result = match ctx.assist {
        Some(target) => snap_to_assist(raw, target, ctx.threshold),
        None => SnapResult::none(raw),
    };
    result.point = snap_to_grid(result.point, ctx.grid);
    result
}

/// Snap a point to a single assist target.
pub fn snap_to_assist(point: WorldPoint, target: &AssistTarget, threshold: f64) -> SnapResult {
    match target {
        AssistTarget::Line { axis, value } => snap_to_line(point, *axis, *value, threshold),
        AssistTarget::Frame { x, z } => snap_to_frame(point, *x, *z, threshold),
        AssistTarget::Geometry {
            label,
            points,
            closed,
        } => snap_to_geometry(point, label, points, *closed, threshold),
    }
}

/// Snap the matching coordinate onto an infinite axis-aligned line.
pub fn snap_to_line(point: WorldPoint, axis: Axis, value: f64, threshold: f64) -> SnapResult {
    let distance = (axis.get(point) - value).abs();
    if distance <= threshold {
        SnapResult {
            point: axis.set(point, value),
            snapped: true,
            distance: Some(distance),
            target_label: Some(format!("{} = {}", axis.name(), value)),
        }
    } else {
        SnapResult {
            distance: Some(distance),
            ..SnapResult::none(point)
        }
    }
}

/// Snap against a reference frame. When both lines are in range the closer
/// one wins, with `x` preferred on an exact tie.
pub fn snap_to_frame(point: WorldPoint, x: f64, z: f64, threshold: f64) -> SnapResult {
    let dx = (point.x - x).abs();
    let dz = (point.z - z).abs();
    let (axis, value) = if dx <= dz { (Axis::X, x) } else { (Axis::Z, z) };
    let mut result = snap_to_line(point, axis, value, threshold);
    if result.snapped {
        result.target_label = Some(format!("frame {}", result.target_label.unwrap_or_default()));
    }
    result
}

/// Snap to the nearest point on any segment of a rendered geometry.
pub fn snap_to_geometry(
    point: WorldPoint,
    label: &str,
    points: &[WorldPoint],
    closed: bool,
    threshold: f64,
) -> SnapResult {
    let Some((nearest, distance, segment)) = nearest_on_path(point.plane(), points, closed) else {
        return SnapResult::none(point);
    };

    if distance <= threshold {
        SnapResult {
            point: point.with_plane(nearest),
            snapped: true,
            distance: Some(distance),
            target_label: Some(format!("{label} segment {segment}")),
        }
    } else {
        SnapResult {
            distance: Some(distance),
            ..SnapResult::none(point)
        }
    }
}

/// Nearest plane point on a path, its distance and the segment index.
///
/// A closed path also tests the segment from the last point back to the
/// first. Zero-length segments fall back to their endpoint.
fn nearest_on_path(p: Point, points: &[WorldPoint], closed: bool) -> Option<(Point, f64, usize)> {
    if let [only] = points {
        let q = only.plane();
        return Some((q, q.distance(p), 0));
    }

    let mut segments: Vec<(Point, Point)> = points
        .windows(2)
        .map(|w| (w[0].plane(), w[1].plane()))
        .collect();
    if closed && points.len() > 2 {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            segments.push((last.plane(), first.plane()));
        }
    }

    let mut best: Option<(Point, f64, usize)> = None;
    for (i, (a, b)) in segments.into_iter().enumerate() {
        let q = if a == b {
            a
        } else {
            let line = Line::new(a, b);
            let nearest = line.nearest(p, NEAREST_ACCURACY);
            line.eval(nearest.t)
        };
        let d = q.distance(p);
        if best.is_none_or(|(_, best_d, _)| d < best_d) {
            best = Some((q, d, i));
        }
    }
    best
}
