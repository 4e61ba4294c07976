//! GeoDraft Core Library
//!
//! Platform-agnostic core for digitizing map features: coordinate snapping,
//! the draft editing session, the feature schema registry, the layer store
//! and bulk import.

pub mod config;
pub mod editor;
pub mod geometry;
pub mod import;
pub mod layers;
pub mod preview;
pub mod rounding;
pub mod schema;
pub mod session;
pub mod settings;
pub mod snap;
pub mod visible;

pub use config::{ConfigError, EditorConfig, ModeColors};
pub use editor::{CommitError, Editor, ManualEntryError};
pub use geometry::{DrawMode, SerializableColor, WorldPoint};
pub use import::{
    ImportIssue, ImportOptions, ImportReport, ItemReport, import_items, import_text, parse_items,
};
pub use layers::{LayerStore, NewRecord, Record, RecordId, ReorderDirection};
pub use preview::{DuplicateCheck, DuplicateOutcome, PreviewError, PreviewIndex, mount_preview};
pub use rounding::{DEFAULT_EXPORT_STEP, round_payload, round_to_step};
pub use schema::{
    BuildContext, BuildOp, ClassKey, FieldDef, FieldKind, FormState, MissingEntry, RequiredCheck,
    SchemaClass,
};
pub use session::{DraftSession, SessionState};
pub use settings::{SnapSettings, SnapSettingsEvent, SubscriptionId};
pub use snap::{AssistTarget, Axis, GridMode, SnapContext, SnapResult, snap, snap_to_grid};
pub use visible::{Container, Primitive, PrimitiveKey, PrimitiveKind, VisibleSet, VisibleSets};
