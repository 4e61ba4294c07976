use geodraft_core::{
    AssistTarget, Axis, ClassKey, DrawMode, Editor, EditorConfig, GridMode, ImportIssue,
    MissingEntry, SnapContext, WorldPoint, snap,
};
use serde_json::json;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn editor(grid: GridMode) -> Editor {
    Editor::new(EditorConfig {
        editor: "alice".to_string(),
        grid_mode: grid,
        ..EditorConfig::default()
    })
}

#[test]
fn test_polygon_commit_uses_default_elevation() {
    init_logger();
    let mut editor = editor(GridMode::Edge);
    editor.select_class(ClassKey::Area);
    editor.select_mode(DrawMode::Polygon);
    for (x, z) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)] {
        editor.add_point(WorldPoint::new(x, z));
    }
    let form = editor.form_mut();
    form.set("AreaID", "A1");
    form.set("AreaName", "Harbour");
    form.set("AreaType", "绿地");

    let id = editor.commit().unwrap();
    let payload = &editor.layers().get(id).unwrap().payload;
    assert_eq!(
        payload["Conpoints"],
        json!([[0.0, 64.0, 0.0], [1.0, 64.0, 0.0], [1.0, 64.0, 1.0]])
    );
    assert_eq!(payload["Type"], "Polygon");
    assert_eq!(payload["Class"], "ARE");
}

#[test]
fn test_undo_then_redo_restores_points() {
    init_logger();
    let mut editor = editor(GridMode::Off);
    editor.select_mode(DrawMode::Polygon);
    let points = [
        WorldPoint::new(0.0, 0.0),
        WorldPoint::new(3.0, 0.0),
        WorldPoint::new(3.0, 4.0),
    ];
    for p in points {
        editor.add_point(p);
    }

    assert!(editor.undo());
    assert_eq!(editor.session().points().len(), 2);
    assert_eq!(editor.session().redo_len(), 1);

    assert!(editor.redo());
    assert_eq!(editor.session().points(), points.as_slice());
}

#[test]
fn test_fixed_assist_line() {
    let target = AssistTarget::Line {
        axis: Axis::X,
        value: 10.0,
    };
    let ctx = SnapContext {
        grid: GridMode::Off,
        assist: Some(&target),
        threshold: 0.5,
    };

    let near = snap(WorldPoint::new(10.3, 5.0), &ctx);
    assert!(near.snapped);
    assert_eq!(near.point, WorldPoint::new(10.0, 5.0));

    let far = snap(WorldPoint::new(11.0, 5.0), &ctx);
    assert!(!far.snapped);
    assert_eq!(far.point, WorldPoint::new(11.0, 5.0));
}

#[test]
fn test_import_missing_line_id_rejects_batch() {
    init_logger();
    let mut editor = editor(GridMode::Off);
    let text = r#"[
        {"Class": "RLE", "LineID": "R1", "LineName": "a", "Direction": "上行",
         "PLpoints": [[0, 64, 0], [5, 64, 0]]},
        {"Class": "铁路", "LineName": "b", "Direction": "下行",
         "PLpoints": [[0, 64, 0], [5, 64, 5]]}
    ]"#;

    let report = editor.import_text(text);
    assert!(!report.ok());
    assert!(editor.layers().is_empty());
    assert!(report.inserted.is_empty());

    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 1);
    assert!(failed[0].issues.iter().any(|issue| matches!(
        issue,
        ImportIssue::MissingRequired(MissingEntry::Field { field: "LineID", .. })
    )));
}

#[test]
fn test_edit_without_moving_points_keeps_geometry() {
    init_logger();
    let mut editor = editor(GridMode::Off);
    editor.select_class(ClassKey::Landmark);
    editor.select_mode(DrawMode::Point);
    editor.add_point(WorldPoint::with_elevation(12.25, 70.0, -3.5));
    let form = editor.form_mut();
    form.set("LandmarkID", "L1");
    form.set("LandmarkName", "Old Tower");
    form.set("Category", "建筑");
    let id = editor.commit().unwrap();
    let before = editor.layers().get(id).unwrap().payload.clone();

    editor.set_editor("bob");
    editor.begin_edit(id).unwrap();
    editor.form_mut().set("LandmarkName", "New Tower");
    assert_eq!(editor.commit().unwrap(), id);

    let after = &editor.layers().get(id).unwrap().payload;
    assert_eq!(after["coordinate"], before["coordinate"]);
    assert_eq!(after["coordinate"], json!({"x": 12.25, "z": -3.5, "y": 70.0}));
    assert_eq!(after["CreateBy"], "alice");
    assert_eq!(after["CreateTime"], before["CreateTime"]);
    assert_eq!(after["ModifityBy"], "bob");
    assert_eq!(after["LandmarkName"], "New Tower");
    assert_eq!(editor.layers().len(), 1);
}
