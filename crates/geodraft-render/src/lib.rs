//! GeoDraft Render Library
//!
//! Rendering surface port and the diff-based scene synchronizer that keeps a
//! host map surface in step with the editor's visible sets.

mod scene;
mod surface;

pub use scene::{COMMITTED_CONTAINERS, DRAFT_CONTAINERS, RenderInstruction, SceneSync, diff};
pub use surface::{RenderResult, RenderSurface, RendererError, ScreenEvent, ScreenTransform};
