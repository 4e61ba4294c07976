//! Diff-based synchronization of the core's visible sets onto a surface.
//!
//! The committed and draft sets are tracked independently. Each sync
//! compares the new set against what was last applied and emits only the
//! draws and undraws needed; the surface never reconciles a merged tree.

use crate::surface::{RenderResult, RenderSurface};
use geodraft_core::{Container, Primitive, PrimitiveKey, VisibleSet, VisibleSets};
use peniko::Color;

/// Containers owned by the committed set.
pub const COMMITTED_CONTAINERS: &[Container] = &[Container::Committed];
/// Containers owned by the draft set.
pub const DRAFT_CONTAINERS: &[Container] =
    &[Container::Draft, Container::Endpoint, Container::ControlPoints];

/// A single surface operation.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderInstruction {
    Draw { key: PrimitiveKey, primitive: Primitive },
    Undraw(PrimitiveKey),
    Clear(Container),
}

impl RenderInstruction {
    /// Execute against a surface.
    pub fn apply(&self, surface: &mut dyn RenderSurface) -> RenderResult<()> {
        match self {
            RenderInstruction::Draw { key, primitive } => surface.draw_primitive(
                *key,
                primitive.kind,
                &primitive.points,
                Color::from(primitive.color),
                primitive.z_index,
            ),
            RenderInstruction::Undraw(key) => surface.undraw_primitive(*key),
            RenderInstruction::Clear(container) => surface.clear_primitives(*container),
        }
    }
}

/// Instructions turning `old` into `new`.
///
/// Draws are issued in painting order. A changed `z_index` redraws the
/// primitive. With no known previous state the owned containers are cleared first.
/// An emptied set clears its containers instead of undrawing one by one.
pub fn diff(
    old: Option<&VisibleSet>,
    new: &VisibleSet,
    containers: &[Container],
) -> Vec<RenderInstruction> {
    let mut out = Vec::new();
    let Some(old) = old else {
        out.extend(containers.iter().map(|c| RenderInstruction::Clear(*c)));
        out.extend(new.draw_order().into_iter().map(|(key, primitive)| RenderInstruction::Draw {
            key: *key,
            primitive: primitive.clone(),
        }));
        return out;
    };

    if new.is_empty() {
        let mut cleared: Vec<Container> = old.iter().map(|(key, _)| key.container).collect();
        cleared.dedup();
        out.extend(cleared.into_iter().map(RenderInstruction::Clear));
        return out;
    }

    for (key, _) in old.iter() {
        if new.get(*key).is_none() {
            out.push(RenderInstruction::Undraw(*key));
        }
    }
    for (key, primitive) in new.draw_order() {
        if old.get(*key) != Some(primitive) {
            out.push(RenderInstruction::Draw {
                key: *key,
                primitive: primitive.clone(),
            });
        }
    }
    out
}

/// Last applied state of one visible set.
#[derive(Debug, Default)]
struct Layer {
    applied: Option<VisibleSet>,
}

impl Layer {
    fn sync(
        &mut self,
        new: &VisibleSet,
        containers: &[Container],
        surface: &mut dyn RenderSurface,
    ) -> RenderResult<usize> {
        let instructions = diff(self.applied.as_ref(), new, containers);
        for instruction in &instructions {
            if let Err(e) = instruction.apply(surface) {
                log::warn!("Render sync failed, forcing full redraw: {e}");
                self.applied = None;
                return Err(e);
            }
        }
        self.applied = Some(new.clone());
        Ok(instructions.len())
    }
}

/// Keeps a surface in step with the editor's visible sets.
#[derive(Debug, Default)]
pub struct SceneSync {
    committed: Layer,
    draft: Layer,
}

impl SceneSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply both sets. Returns the number of instructions issued.
    ///
    /// A failing set is redrawn from scratch on the next sync; the other set
    /// is unaffected.
    pub fn sync(
        &mut self,
        sets: &VisibleSets,
        surface: &mut dyn RenderSurface,
    ) -> RenderResult<usize> {
        let committed = self
            .committed
            .sync(&sets.committed, COMMITTED_CONTAINERS, surface);
        let draft = self.draft.sync(&sets.draft, DRAFT_CONTAINERS, surface);
        let count = committed? + draft?;
        if count > 0 {
            log::debug!("Render sync issued {count} instruction(s)");
        }
        Ok(count)
    }

    /// Forget applied state; the next sync redraws everything.
    pub fn invalidate(&mut self) {
        self.committed.applied = None;
        self.draft.applied = None;
    }
}
