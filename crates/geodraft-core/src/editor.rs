//! Editor facade: ties snapping, the draft session, form state, the schema
//! registry and the layer store together.

use crate::config::EditorConfig;
use crate::geometry::{DrawMode, WorldPoint};
use crate::import::{ImportOptions, ImportReport, import_text};
use crate::layers::{LayerStore, NewRecord, Record, RecordId, ReorderDirection};
use crate::preview::{
    DuplicateCheck, DuplicateOutcome, LookupTicket, PreviewError, PreviewIndex, PreviewResult,
    mount_preview, preview_id,
};
use crate::schema::{BuildContext, BuildOp, ClassKey, FormState, MissingEntry, resolve_world};
use crate::session::{DraftSession, SessionState};
use crate::settings::SnapSettings;
use crate::snap::{AssistTarget, GridMode, SnapResult};
use crate::visible::{VisibleSet, VisibleSets};
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Why a commit was rejected. The session stays open.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitError {
    #[error("no draft session is open")]
    Idle,

    #[error("the draft has no points")]
    NothingToCommit,

    #[error("{mode:?} geometry needs {required} point(s), found {found}")]
    Geometry {
        mode: DrawMode,
        required: usize,
        found: usize,
    },

    #[error("class {class:?} cannot be drawn as {mode:?}")]
    ClassMode { class: ClassKey, mode: DrawMode },

    #[error("unknown world {0:?}")]
    UnknownWorld(String),

    #[error("{} required entr(ies) missing", .0.len())]
    MissingRequired(Vec<MissingEntry>),

    #[error("record {0} does not exist")]
    UnknownRecord(RecordId),
}

pub type CommitResult<T> = Result<T, CommitError>;

/// Why a manually entered point was rejected. The draft is untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManualEntryError {
    #[error("no draft session is open")]
    Idle,

    #[error("({x}, {z}) is not on the {} grid", .grid.name())]
    OffGrid { x: f64, z: f64, grid: GridMode },
}

/// The digitizing editor.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    settings: SnapSettings,
    session: DraftSession,
    form: FormState,
    class: ClassKey,
    layers: LayerStore,
    duplicates: DuplicateCheck,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let settings = SnapSettings::new(config.grid_mode, config.assist_threshold);
        let duplicates = DuplicateCheck::new(Duration::from_millis(config.spinner_delay_ms));
        Self {
            config,
            settings,
            session: DraftSession::new(),
            form: FormState::new(),
            class: ClassKey::Default,
            layers: LayerStore::new(),
            duplicates,
        }
    }

    /// Use an existing layer store, e.g. one restored from disk.
    pub fn with_layers(mut self, layers: LayerStore) -> Self {
        self.layers = layers;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn settings(&self) -> &SnapSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SnapSettings {
        &mut self.settings
    }

    pub fn session(&self) -> &DraftSession {
        &self.session
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn class(&self) -> ClassKey {
        self.class
    }

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    pub fn duplicates(&self) -> &DuplicateCheck {
        &self.duplicates
    }

    pub fn set_editor(&mut self, editor: impl Into<String>) {
        self.config.editor = editor.into();
    }

    /// Select a draw mode. Leaving an edit session discards its form.
    pub fn select_mode(&mut self, mode: DrawMode) {
        if self.session.editing_target().is_some() {
            self.form.clear();
        }
        self.session.select_mode(mode);
    }

    pub fn select_class(&mut self, class: ClassKey) {
        self.class = class;
    }

    /// Snap and append a pointer point.
    pub fn add_point(&mut self, raw: WorldPoint) -> Option<SnapResult> {
        let ctx = self.settings.context();
        self.session.add_raw_point(raw, &ctx)
    }

    /// Append a typed-in point. Assist is bypassed; the point must already
    /// lie on the active grid.
    pub fn add_manual_point(&mut self, point: WorldPoint) -> Result<(), ManualEntryError> {
        if self.session.state().is_idle() {
            return Err(ManualEntryError::Idle);
        }
        let grid = self.settings.grid_mode();
        if !grid.is_on_grid(point.x) || !grid.is_on_grid(point.z) {
            return Err(ManualEntryError::OffGrid {
                x: point.x,
                z: point.z,
                grid,
            });
        }
        self.session.add_point(point);
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    /// Abandon the draft and its form.
    pub fn cancel(&mut self) {
        self.session.cancel();
        self.form.clear();
    }

    /// Open a committed record for editing.
    pub fn begin_edit(&mut self, id: RecordId) -> CommitResult<()> {
        let record = self.layers.get(id).ok_or(CommitError::UnknownRecord(id))?;
        self.class = record.class;
        self.form = record.class.schema().hydrate(&record.payload);
        self.session.begin_edit(id, record.mode, &record.coords);
        Ok(())
    }

    /// Validate, build and store the draft.
    pub fn commit(&mut self) -> CommitResult<RecordId> {
        let result = self.try_commit();
        if let Err(e) = &result {
            log::warn!("Commit rejected: {e}");
        }
        result
    }

    fn try_commit(&mut self) -> CommitResult<RecordId> {
        let (mode, target) = match self.session.state() {
            SessionState::Idle => return Err(CommitError::Idle),
            SessionState::Drawing(mode) => (*mode, None),
            SessionState::Editing { mode, target, .. } => (*mode, Some(*target)),
        };
        let coords = self
            .session
            .geometry_for_commit()
            .ok_or(CommitError::NothingToCommit)?;

        let schema = self.class.schema();
        if !schema.accepts_mode(mode) {
            return Err(CommitError::ClassMode {
                class: self.class,
                mode,
            });
        }
        if !mode.accepts_count(coords.len()) {
            return Err(CommitError::Geometry {
                mode,
                required: mode.min_points(),
                found: coords.len(),
            });
        }
        if !schema.is_default() && resolve_world(&self.config.world).is_none() {
            return Err(CommitError::UnknownWorld(self.config.world.clone()));
        }
        schema
            .validate_required(&self.form)
            .into_result()
            .map_err(CommitError::MissingRequired)?;

        let prior = match target {
            Some(id) => Some(self.layers.get(id).ok_or(CommitError::UnknownRecord(id))?),
            None => None,
        };
        let mut ctx = BuildContext::new(&self.config.world, &self.config.editor);
        let op = match prior {
            Some(record) => {
                ctx = ctx.with_prior(&record.payload);
                BuildOp::Edit
            }
            None => BuildOp::Create,
        };
        let payload = schema.build(op, mode, &coords, &self.form, &ctx);
        let record = NewRecord {
            mode,
            color: self.config.colors.for_mode(mode),
            coords,
            class: self.class,
            payload,
        };

        let id = match target {
            Some(id) => {
                self.layers.replace(id, record);
                log::info!("Updated record {id} ({:?})", self.class);
                id
            }
            None => {
                let id = self.layers.insert(record);
                log::info!("Created record {id} ({:?})", self.class);
                id
            }
        };
        self.session.finish();
        self.form.clear();
        Ok(id)
    }

    /// Delete a record. If it is open for editing, the draft overlay is
    /// cleared but the session stays open.
    pub fn delete(&mut self, id: RecordId) -> Option<Record> {
        let record = self.layers.delete(id)?;
        if self.session.editing_target() == Some(id) {
            self.session.clear_overlay();
        }
        log::info!("Deleted record {id}");
        Some(record)
    }

    /// Make a committed path the active assist target. Returns `false` for
    /// unknown records and point geometry.
    pub fn assist_along(&mut self, id: RecordId) -> bool {
        let Some(record) = self.layers.get(id) else {
            return false;
        };
        let label = format!("{} {}", record.class.schema().label, record.id);
        match AssistTarget::along(label, record.mode, &record.coords) {
            Some(target) => {
                self.settings.set_assist(Some(target));
                true
            }
            None => false,
        }
    }

    pub fn reorder(&mut self, id: RecordId, direction: ReorderDirection) -> bool {
        self.layers.reorder(id, direction)
    }

    pub fn toggle_visible(&mut self, id: RecordId) -> Option<bool> {
        self.layers.toggle_visible(id)
    }

    /// Import text into the layer store. Items without `Class` use the
    /// selected class.
    pub fn import_text(&mut self, text: &str) -> ImportReport {
        let options = ImportOptions {
            world: self.config.world.clone(),
            editor: self.config.editor.clone(),
            fallback_class: (self.class != ClassKey::Default).then_some(self.class),
            colors: self.config.colors.clone(),
        };
        import_text(&mut self.layers, text, &options)
    }

    /// Current committed and draft visible sets.
    pub fn visible_sets(&self) -> VisibleSets {
        let color = self.config.colors.for_mode(self.session.mode());
        VisibleSets {
            committed: VisibleSet::committed(&self.layers, self.session.editing_target()),
            draft: VisibleSet::draft(&self.session, color),
        }
    }

    /// Start the duplicate-id check for a record's preview. Mounting stays
    /// disabled until the returned ticket completes or is cancelled.
    pub fn start_duplicate_check(
        &mut self,
        id: RecordId,
        now: Instant,
    ) -> PreviewResult<LookupTicket> {
        let preview = self
            .layers
            .get(id)
            .and_then(preview_id)
            .ok_or_else(|| PreviewError::MissingId(id.to_string()))?;
        Ok(self.duplicates.start(&preview, now))
    }

    /// Deliver a lookup result. Stale or cancelled tickets yield `None`.
    pub fn finish_duplicate_check(
        &mut self,
        ticket: &LookupTicket,
        result: PreviewResult<bool>,
    ) -> Option<DuplicateOutcome> {
        self.duplicates.complete(ticket, result)
    }

    pub fn cancel_duplicate_check(&mut self) {
        self.duplicates.cancel();
    }

    pub fn should_show_spinner(&self, now: Instant) -> bool {
        self.duplicates.should_show_spinner(now)
    }

    /// Mirror a record into the preview index. Refused while a duplicate
    /// check is pending.
    pub async fn mount_preview<I: PreviewIndex + ?Sized>(
        &self,
        index: &I,
        id: RecordId,
    ) -> PreviewResult<String> {
        if !self.duplicates.can_mount() {
            return Err(PreviewError::LookupPending);
        }
        let record = self
            .layers
            .get(id)
            .ok_or_else(|| PreviewError::MissingId(id.to_string()))?;
        mount_preview(index, record).await
    }

    /// Export every payload with the configured rounding step.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        self.layers.export_json(self.config.export_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::testing::{MapIndex, block_on};
    use crate::snap::Axis;
    use crate::visible::Container;

    fn editor() -> Editor {
        let mut editor = Editor::default();
        editor.set_editor("alice");
        editor
    }

    fn fill_station(editor: &mut Editor) {
        let form = editor.form_mut();
        form.set("StationID", "S1");
        form.set("StationName", "North");
        form.set("StationType", "地面");
    }

    #[test]
    fn test_commit_requires_open_session() {
        let mut editor = editor();
        assert_eq!(editor.commit(), Err(CommitError::Idle));
        editor.select_mode(DrawMode::Polyline);
        assert_eq!(editor.commit(), Err(CommitError::NothingToCommit));
    }

    #[test]
    fn test_commit_rejects_short_geometry() {
        let mut editor = editor();
        editor.select_mode(DrawMode::Polygon);
        editor.add_point(WorldPoint::new(0.0, 0.0));
        editor.add_point(WorldPoint::new(1.0, 0.0));
        assert_eq!(
            editor.commit(),
            Err(CommitError::Geometry {
                mode: DrawMode::Polygon,
                required: 3,
                found: 2
            })
        );
        assert_eq!(editor.session().points().len(), 2);
    }

    #[test]
    fn test_missing_required_keeps_session_open() {
        let mut editor = editor();
        editor.select_class(ClassKey::Station);
        editor.select_mode(DrawMode::Point);
        editor.add_point(WorldPoint::new(1.0, 1.0));
        editor.form_mut().set("StationID", "S1");

        match editor.commit() {
            Err(CommitError::MissingRequired(missing)) => {
                let fields: Vec<_> = missing.iter().filter_map(MissingEntry::field).collect();
                assert_eq!(fields, vec!["StationName", "StationType"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(editor.session().mode(), DrawMode::Point);
        assert!(editor.layers().is_empty());
    }

    #[test]
    fn test_class_mode_mismatch() {
        let mut editor = editor();
        editor.select_class(ClassKey::Railway);
        editor.select_mode(DrawMode::Point);
        editor.add_point(WorldPoint::new(1.0, 1.0));
        assert!(matches!(editor.commit(), Err(CommitError::ClassMode { .. })));
    }

    #[test]
    fn test_unknown_world_rejected() {
        let config = EditorConfig {
            world: "mars".to_string(),
            ..EditorConfig::default()
        };
        let mut editor = Editor::new(config);
        editor.select_class(ClassKey::Station);
        editor.select_mode(DrawMode::Point);
        editor.add_point(WorldPoint::new(1.0, 1.0));
        fill_station(&mut editor);
        assert_eq!(editor.commit(), Err(CommitError::UnknownWorld("mars".to_string())));
    }

    #[test]
    fn test_commit_creates_record_and_returns_to_idle() {
        let mut editor = editor();
        editor.select_class(ClassKey::Station);
        editor.select_mode(DrawMode::Point);
        editor.add_point(WorldPoint::new(1.0, 1.0));
        fill_station(&mut editor);

        let id = editor.commit().unwrap();
        assert!(editor.session().state().is_idle());
        assert!(editor.form().is_empty());
        let record = editor.layers().get(id).unwrap();
        assert_eq!(record.payload["CreateBy"], "alice");
        assert_eq!(record.payload["Class"], "STA");
        assert_eq!(record.color, editor.config().colors.for_mode(DrawMode::Point));
    }

    #[test]
    fn test_manual_point_must_be_on_grid() {
        let mut editor = editor();
        assert_eq!(
            editor.add_manual_point(WorldPoint::new(1.0, 1.0)),
            Err(ManualEntryError::Idle)
        );

        editor.settings_mut().set_grid_mode(GridMode::Edge);
        editor.settings_mut().set_assist(Some(AssistTarget::Line {
            axis: Axis::X,
            value: 10.0,
        }));
        editor.select_mode(DrawMode::Polyline);
        assert!(matches!(
            editor.add_manual_point(WorldPoint::new(1.5, 2.0)),
            Err(ManualEntryError::OffGrid { .. })
        ));
        assert!(editor.session().points().is_empty());

        editor.add_manual_point(WorldPoint::new(10.0, -3.0)).unwrap();
        editor.add_manual_point(WorldPoint::new(9.0, 2.0)).unwrap();
        assert_eq!(editor.session().points()[1], WorldPoint::new(9.0, 2.0));
    }

    #[test]
    fn test_delete_editing_record_clears_overlay() {
        let mut editor = editor();
        editor.select_mode(DrawMode::Polyline);
        editor.add_point(WorldPoint::new(0.0, 0.0));
        editor.add_point(WorldPoint::new(1.0, 0.0));
        let id = editor.commit().unwrap();

        editor.begin_edit(id).unwrap();
        assert!(editor.visible_sets().committed.is_empty());
        assert_eq!(editor.visible_sets().draft.count_in(Container::ControlPoints), 2);

        assert!(editor.delete(id).is_some());
        assert!(editor.visible_sets().draft.is_empty());
        assert_eq!(editor.session().editing_target(), Some(id));
        assert_eq!(editor.commit(), Err(CommitError::UnknownRecord(id)));
    }

    #[test]
    fn test_import_uses_selected_class() {
        let mut editor = editor();
        editor.select_class(ClassKey::Station);
        let report = editor.import_text(
            r#"{"StationID": "S9", "StationName": "Port", "StationType": "高架",
                "coordinate": {"x": 1, "z": 2}}"#,
        );
        assert!(report.ok(), "{report:?}");
        assert_eq!(editor.layers().len(), 1);
    }

    #[test]
    fn test_duplicate_check_uses_configured_delay() {
        let config = EditorConfig {
            spinner_delay_ms: 250,
            ..EditorConfig::default()
        };
        let mut editor = Editor::new(config);
        editor.select_class(ClassKey::Station);
        editor.select_mode(DrawMode::Point);
        editor.add_point(WorldPoint::new(1.0, 1.0));
        fill_station(&mut editor);
        let id = editor.commit().unwrap();
        assert_eq!(editor.duplicates().spinner_delay(), Duration::from_millis(250));

        let index = MapIndex::default();
        let t0 = Instant::now();
        let ticket = editor.start_duplicate_check(id, t0).unwrap();
        assert_eq!(ticket.id(), "S1");
        assert!(!editor.should_show_spinner(t0 + Duration::from_millis(249)));
        assert!(editor.should_show_spinner(t0 + Duration::from_millis(250)));
        assert_eq!(
            block_on(editor.mount_preview(&index, id)),
            Err(PreviewError::LookupPending)
        );

        let found = block_on(DuplicateCheck::lookup(&index, &ticket));
        assert_eq!(
            editor.finish_duplicate_check(&ticket, found),
            Some(DuplicateOutcome::Unique)
        );
        assert_eq!(block_on(editor.mount_preview(&index, id)).unwrap(), "S1");
        assert_eq!(
            block_on(editor.mount_preview(&index, id)),
            Err(PreviewError::Duplicate("S1".to_string()))
        );
    }

    #[test]
    fn test_cancelled_duplicate_check_reenables_mount() {
        let mut editor = editor();
        editor.select_class(ClassKey::Station);
        editor.select_mode(DrawMode::Point);
        editor.add_point(WorldPoint::new(1.0, 1.0));
        fill_station(&mut editor);
        let id = editor.commit().unwrap();

        let ticket = editor.start_duplicate_check(id, Instant::now()).unwrap();
        editor.cancel_duplicate_check();
        assert_eq!(editor.finish_duplicate_check(&ticket, Ok(true)), None);
        assert!(editor.duplicates().can_mount());
        assert!(matches!(
            editor.start_duplicate_check(RecordId(99), Instant::now()),
            Err(PreviewError::MissingId(_))
        ));
    }

    #[test]
    fn test_assist_along_committed_polygon() {
        let mut editor = editor();
        editor.select_mode(DrawMode::Polygon);
        for (x, z) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            editor.add_point(WorldPoint::new(x, z));
        }
        let area = editor.commit().unwrap();
        editor.select_mode(DrawMode::Point);
        editor.add_point(WorldPoint::new(5.0, 5.0));
        let stop = editor.commit().unwrap();

        assert!(!editor.assist_along(stop));
        assert!(!editor.assist_along(RecordId(99)));
        assert!(editor.assist_along(area));

        editor.select_mode(DrawMode::Point);
        let result = editor.add_point(WorldPoint::new(0.3, 5.0)).unwrap();
        assert!(result.snapped);
        assert_eq!(result.point, WorldPoint::new(0.0, 5.0));
        assert_eq!(result.target_label.as_deref(), Some("默认 #1 segment 3"));
    }
}
