//! World coordinates, draw modes and record colours.

use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// A point in the surveyed world's coordinate system.
///
/// `x`/`z` span the horizontal plane, `y` is an optional elevation.
/// Equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl WorldPoint {
    /// Create a plane point without elevation.
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z, y: None }
    }

    /// Create a point with an elevation.
    pub fn with_elevation(x: f64, y: f64, z: f64) -> Self {
        Self { x, z, y: Some(y) }
    }

    /// Project onto the horizontal plane as a kurbo point (`x`, `z`).
    pub fn plane(self) -> Point {
        Point::new(self.x, self.z)
    }

    /// Replace the plane coordinates, keeping the elevation.
    pub fn with_plane(self, p: Point) -> Self {
        Self {
            x: p.x,
            z: p.y,
            y: self.y,
        }
    }
}

/// Draw mode of a draft or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    #[default]
    None,
    Point,
    Polyline,
    Polygon,
}

impl DrawMode {
    /// Minimum number of points for a valid geometry in this mode.
    pub fn min_points(self) -> usize {
        match self {
            DrawMode::None => 0,
            DrawMode::Point => 1,
            DrawMode::Polyline => 2,
            DrawMode::Polygon => 3,
        }
    }

    /// Value of the `Type` system field.
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            DrawMode::None => None,
            DrawMode::Point => Some("Points"),
            DrawMode::Polyline => Some("Polyline"),
            DrawMode::Polygon => Some("Polygon"),
        }
    }

    /// Inverse of [`DrawMode::type_name`].
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Points" => Some(DrawMode::Point),
            "Polyline" => Some(DrawMode::Polyline),
            "Polygon" => Some(DrawMode::Polygon),
            _ => None,
        }
    }

    /// Whether geometry in this mode forms a closed ring.
    pub fn is_closed(self) -> bool {
        self == DrawMode::Polygon
    }

    /// Check whether a point count satisfies this mode.
    ///
    /// Point geometry is exactly one point; lines and polygons have a minimum.
    pub fn accepts_count(self, count: usize) -> bool {
        match self {
            DrawMode::None => false,
            DrawMode::Point => count == 1,
            DrawMode::Polyline | DrawMode::Polygon => count >= self.min_points(),
        }
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb` (or `#rrggbbaa` when not opaque).
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}
