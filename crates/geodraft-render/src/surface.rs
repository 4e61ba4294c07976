//! Rendering surface port.

use geodraft_core::{Container, PrimitiveKey, PrimitiveKind, WorldPoint};
use kurbo::{Affine, Point};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Draw failed: {0}")]
    DrawFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// A pointer event in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenEvent {
    pub x: f64,
    pub y: f64,
}

impl ScreenEvent {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Map surface the core draws on.
///
/// The core only issues primitive draw/undraw calls and asks for click
/// positions in world coordinates; everything else belongs to the host.
pub trait RenderSurface {
    /// Draw (or redraw) a primitive under `key`. Within a container,
    /// primitives with a higher `z_index` paint on top.
    fn draw_primitive(
        &mut self,
        key: PrimitiveKey,
        kind: PrimitiveKind,
        points: &[WorldPoint],
        color: Color,
        z_index: usize,
    ) -> RenderResult<()>;

    /// Remove a single primitive.
    fn undraw_primitive(&mut self, key: PrimitiveKey) -> RenderResult<()>;

    /// Remove every primitive in a container.
    fn clear_primitives(&mut self, container: Container) -> RenderResult<()>;

    /// World point under a screen event, if the event hits the map.
    fn world_point_from_screen(&self, event: &ScreenEvent) -> Option<WorldPoint>;
}

/// World plane (`x`, `z`) to screen transform for surfaces with a simple
/// pan/zoom view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    transform: Affine,
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
        }
    }
}

impl ScreenTransform {
    /// Screen = (world - `origin`) * `zoom`.
    pub fn new(origin: Point, zoom: f64) -> Self {
        Self {
            transform: Affine::scale(zoom) * Affine::translate(-origin.to_vec2()),
        }
    }

    pub fn world_to_screen(&self, point: WorldPoint) -> Point {
        self.transform * point.plane()
    }

    /// Inverse mapping. Returns `None` for a degenerate (zero zoom) view.
    pub fn screen_to_world(&self, event: &ScreenEvent) -> Option<WorldPoint> {
        if self.transform.determinant().abs() < f64::EPSILON {
            return None;
        }
        let p = self.transform.inverse() * Point::new(event.x, event.y);
        Some(WorldPoint::new(p.x, p.y))
    }
}
