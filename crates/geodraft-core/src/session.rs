//! Draft editing session: the in-progress geometry with undo/redo.

use crate::geometry::{DrawMode, WorldPoint};
use crate::layers::RecordId;
use crate::snap::{SnapContext, SnapResult, snap};

/// State of the draft session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Nothing is being drawn.
    #[default]
    Idle,
    /// A new feature is being drawn.
    Drawing(DrawMode),
    /// A committed record is being edited.
    Editing {
        mode: DrawMode,
        target: RecordId,
        /// The record's geometry when editing started.
        backup: Vec<WorldPoint>,
    },
}

impl SessionState {
    pub fn mode(&self) -> DrawMode {
        match self {
            SessionState::Idle => DrawMode::None,
            SessionState::Drawing(mode) => *mode,
            SessionState::Editing { mode, .. } => *mode,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

/// Owns the draft points and the redo stack.
#[derive(Debug, Clone, Default)]
pub struct DraftSession {
    state: SessionState,
    points: Vec<WorldPoint>,
    redo_stack: Vec<WorldPoint>,
}

impl DraftSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> DrawMode {
        self.state.mode()
    }

    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.points.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Record currently open for editing.
    pub fn editing_target(&self) -> Option<RecordId> {
        match &self.state {
            SessionState::Editing { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn backup(&self) -> Option<&[WorldPoint]> {
        match &self.state {
            SessionState::Editing { backup, .. } => Some(backup),
            _ => None,
        }
    }

    /// Select a draw mode.
    ///
    /// Reselecting the active drawing mode (or selecting `None`) returns to
    /// idle. Any selection discards the current draft.
    pub fn select_mode(&mut self, mode: DrawMode) {
        let reselect = self.state == SessionState::Drawing(mode);
        self.reset();
        if mode != DrawMode::None && !reselect {
            self.state = SessionState::Drawing(mode);
        }
        log::debug!("Draft session mode: {:?}", self.state.mode());
    }

    /// Open a committed record for editing; its geometry becomes the draft.
    pub fn begin_edit(&mut self, target: RecordId, mode: DrawMode, coords: &[WorldPoint]) {
        self.reset();
        self.points = coords.to_vec();
        self.state = SessionState::Editing {
            mode,
            target,
            backup: coords.to_vec(),
        };
        log::debug!("Editing record {target} ({} points)", coords.len());
    }

    /// Append an already snapped point. Returns false when idle.
    ///
    /// In point mode the new point replaces the existing one.
    pub fn add_point(&mut self, point: WorldPoint) -> bool {
        match self.mode() {
            DrawMode::None => return false,
            DrawMode::Point => self.points.clear(),
            DrawMode::Polyline | DrawMode::Polygon => {}
        }
        self.points.push(point);
        self.redo_stack.clear();
        true
    }

    /// Snap a raw point and append the result.
    pub fn add_raw_point(&mut self, raw: WorldPoint, ctx: &SnapContext<'_>) -> Option<SnapResult> {
        if self.state.is_idle() {
            return None;
        }
        let result = snap(raw, ctx);
        if result.is_snapped() {
            log::debug!(
                "Snapped ({}, {}) to {:?}",
                raw.x,
                raw.z,
                result.target_label.as_deref().unwrap_or("grid")
            );
        }
        self.add_point(result.point);
        Some(result)
    }

    /// Move the last point to the redo stack. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        if let Some(point) = self.points.pop() {
            self.redo_stack.push(point);
            true
        } else {
            false
        }
    }

    /// Restore the last undone point. Returns false if there is none.
    pub fn redo(&mut self) -> bool {
        if let Some(point) = self.redo_stack.pop() {
            self.points.push(point);
            true
        } else {
            false
        }
    }

    /// Drop the draft points and redo stack, keeping the session open.
    pub fn clear_overlay(&mut self) {
        self.points.clear();
        self.redo_stack.clear();
    }

    /// Geometry a commit would use: the draft, or the backup when editing
    /// with an empty draft.
    pub fn geometry_for_commit(&self) -> Option<Vec<WorldPoint>> {
        if !self.points.is_empty() {
            return Some(self.points.clone());
        }
        self.backup()
            .filter(|backup| !backup.is_empty())
            .map(<[WorldPoint]>::to_vec)
    }

    /// Abandon the session.
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            log::debug!("Draft session cancelled");
        }
        self.reset();
    }

    /// Close the session after a successful commit.
    pub fn finish(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.points.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::{AssistTarget, Axis, GridMode};

    fn p(x: f64, z: f64) -> WorldPoint {
        WorldPoint::new(x, z)
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut session = DraftSession::new();
        session.select_mode(DrawMode::Polygon);
        for point in [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)] {
            assert!(session.add_point(point));
        }

        assert!(session.undo());
        assert_eq!(session.points().len(), 2);
        assert_eq!(session.redo_len(), 1);

        assert!(session.redo());
        assert_eq!(session.points(), &[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
        assert!(!session.redo());
    }

    #[test]
    fn test_new_point_clears_redo() {
        let mut session = DraftSession::new();
        session.select_mode(DrawMode::Polyline);
        session.add_point(p(0.0, 0.0));
        session.add_point(p(1.0, 0.0));
        session.undo();
        session.add_point(p(2.0, 2.0));
        assert_eq!(session.redo_len(), 0);
        assert!(!session.redo());
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut session = DraftSession::new();
        assert!(!session.undo());
        session.select_mode(DrawMode::Polyline);
        assert!(!session.undo());
        assert!(!session.redo());
    }

    #[test]
    fn test_idle_rejects_points() {
        let mut session = DraftSession::new();
        assert!(!session.add_point(p(0.0, 0.0)));
        assert!(session.add_raw_point(p(0.0, 0.0), &SnapContext::default()).is_none());
    }

    #[test]
    fn test_point_mode_replaces() {
        let mut session = DraftSession::new();
        session.select_mode(DrawMode::Point);
        session.add_point(p(0.0, 0.0));
        session.add_point(p(3.0, 3.0));
        assert_eq!(session.points(), &[p(3.0, 3.0)]);
    }

    #[test]
    fn test_reselect_returns_to_idle() {
        let mut session = DraftSession::new();
        session.select_mode(DrawMode::Polyline);
        session.add_point(p(0.0, 0.0));
        session.select_mode(DrawMode::Polyline);
        assert!(session.state().is_idle());
        assert!(session.points().is_empty());

        session.select_mode(DrawMode::Polyline);
        session.add_point(p(0.0, 0.0));
        session.undo();
        session.select_mode(DrawMode::Polygon);
        assert_eq!(session.state(), &SessionState::Drawing(DrawMode::Polygon));
        assert_eq!(session.redo_len(), 0);
    }

    #[test]
    fn test_edit_backup_used_when_draft_empty() {
        let original = vec![p(1.0, 1.0), p(2.0, 2.0)];
        let mut session = DraftSession::new();
        session.begin_edit(RecordId(4), DrawMode::Polyline, &original);
        assert_eq!(session.editing_target(), Some(RecordId(4)));
        assert_eq!(session.points(), original.as_slice());

        session.undo();
        session.undo();
        assert_eq!(session.geometry_for_commit(), Some(original.clone()));

        session.cancel();
        assert!(session.backup().is_none());
        assert!(session.geometry_for_commit().is_none());
    }

    #[test]
    fn test_clear_overlay_keeps_session_open() {
        let mut session = DraftSession::new();
        session.begin_edit(RecordId(1), DrawMode::Point, &[p(0.0, 0.0)]);
        session.clear_overlay();
        assert!(session.points().is_empty());
        assert_eq!(session.editing_target(), Some(RecordId(1)));
    }

    #[test]
    fn test_raw_points_are_snapped() {
        let assist = AssistTarget::Line {
            axis: Axis::X,
            value: 10.0,
        };
        let ctx = SnapContext {
            grid: GridMode::Edge,
            assist: Some(&assist),
            threshold: 0.5,
        };
        let mut session = DraftSession::new();
        session.select_mode(DrawMode::Polyline);
        let result = session.add_raw_point(p(10.3, 5.2), &ctx).unwrap();
        assert!(result.snapped);
        assert_eq!(session.points(), &[p(10.0, 5.0)]);
    }
}
