//! Static class definitions.

use super::{ClassKey, FieldDef, GeometryLayout, GroupDef, SchemaClass};
use crate::geometry::DrawMode;

/// Payload key of polyline classes' point list.
const POLYLINE_POINTS: &str = "PLpoints";
/// Payload key of polygon classes' ring.
const POLYGON_POINTS: &str = "Conpoints";
/// Ground elevation used when a drawn point has none.
const GROUND_Y: f64 = 64.0;

const DIRECTIONS: &[&str] = &["上行", "下行", "双向"];

const STATION_LINES: &[FieldDef] = &[
    FieldDef::text("LineID", "线路编号"),
    FieldDef::text("LineName", "线路名称").optional(),
];

const PLATFORM_LINES: &[FieldDef] = &[
    FieldDef::text("LineID", "线路编号"),
    FieldDef::number("Stop", "停站序号").optional(),
    FieldDef::select("Direction", "方向", DIRECTIONS).optional(),
];

const RAILWAY_STATIONS: &[FieldDef] = &[
    FieldDef::text("StationID", "车站编号"),
    FieldDef::number("Mileage", "里程").optional(),
];

const BUILDING_OWNERS: &[FieldDef] = &[
    FieldDef::text("Owner", "业主"),
    FieldDef::text("Since", "起始时间").optional(),
];

static DEFAULT: SchemaClass = SchemaClass {
    key: ClassKey::Default,
    label: "默认",
    code: None,
    mode: None,
    fields: &[],
    groups: &[],
    geometry: GeometryLayout::Echo,
    id_field: None,
};

static STATION: SchemaClass = SchemaClass {
    key: ClassKey::Station,
    label: "车站",
    code: Some("STA"),
    mode: Some(DrawMode::Point),
    fields: &[
        FieldDef::text("StationID", "车站编号"),
        FieldDef::text("StationName", "车站名称"),
        FieldDef::select("StationType", "车站类型", &["地面", "地下", "高架"]),
        FieldDef::boolean("Accessible", "无障碍").optional(),
        FieldDef::text("Note", "备注").optional(),
    ],
    groups: &[GroupDef::optional("lines", "途经线路", STATION_LINES)],
    geometry: GeometryLayout::Coordinate,
    id_field: Some("StationID"),
};

static PLATFORM: SchemaClass = SchemaClass {
    key: ClassKey::Platform,
    label: "站台",
    code: Some("PLF"),
    mode: Some(DrawMode::Point),
    fields: &[
        FieldDef::text("PlatformID", "站台编号"),
        FieldDef::text("PlatformName", "站台名称"),
        FieldDef::text("StationID", "所属车站").optional(),
        FieldDef::number("Height", "站台高度").optional(),
    ],
    groups: &[GroupDef::required("lines", "停靠线路", 1, PLATFORM_LINES)],
    geometry: GeometryLayout::Coordinate,
    id_field: Some("PlatformID"),
};

static LANDMARK: SchemaClass = SchemaClass {
    key: ClassKey::Landmark,
    label: "地标",
    code: Some("LMK"),
    mode: Some(DrawMode::Point),
    fields: &[
        FieldDef::text("LandmarkID", "地标编号"),
        FieldDef::text("LandmarkName", "地标名称"),
        FieldDef::select("Category", "类别", &["自然", "建筑", "纪念", "其他"]),
        FieldDef::text("Description", "描述").optional(),
    ],
    groups: &[],
    geometry: GeometryLayout::Coordinate,
    id_field: Some("LandmarkID"),
};

static RAILWAY: SchemaClass = SchemaClass {
    key: ClassKey::Railway,
    label: "铁路",
    code: Some("RLE"),
    mode: Some(DrawMode::Polyline),
    fields: &[
        FieldDef::text("LineID", "线路编号"),
        FieldDef::text("LineName", "线路名称"),
        FieldDef::text("Bureau", "所属路局").optional(),
        FieldDef::select("Direction", "方向", DIRECTIONS),
        FieldDef::number("Speed", "设计速度").optional(),
        FieldDef::boolean("Electrified", "电气化").optional(),
    ],
    groups: &[GroupDef::optional("stations", "沿线车站", RAILWAY_STATIONS)],
    geometry: GeometryLayout::Path {
        key: POLYLINE_POINTS,
        default_y: GROUND_Y,
    },
    id_field: Some("LineID"),
};

static ROAD: SchemaClass = SchemaClass {
    key: ClassKey::Road,
    label: "道路",
    code: Some("ROD"),
    mode: Some(DrawMode::Polyline),
    fields: &[
        FieldDef::text("RoadID", "道路编号"),
        FieldDef::text("RoadName", "道路名称"),
        FieldDef::select("Grade", "等级", &["主干道", "次干道", "支路", "步道"]),
        FieldDef::number("Width", "宽度").optional(),
        FieldDef::boolean("Oneway", "单行").optional(),
    ],
    groups: &[],
    geometry: GeometryLayout::Path {
        key: POLYLINE_POINTS,
        default_y: GROUND_Y,
    },
    id_field: Some("RoadID"),
};

static AREA: SchemaClass = SchemaClass {
    key: ClassKey::Area,
    label: "区域",
    code: Some("ARE"),
    mode: Some(DrawMode::Polygon),
    fields: &[
        FieldDef::text("AreaID", "区域编号"),
        FieldDef::text("AreaName", "区域名称"),
        FieldDef::select(
            "AreaType",
            "区域类型",
            &["行政区", "住宅区", "商业区", "工业区", "绿地", "水域"],
        ),
        FieldDef::number("Population", "人口").optional(),
    ],
    groups: &[],
    geometry: GeometryLayout::Path {
        key: POLYGON_POINTS,
        default_y: GROUND_Y,
    },
    id_field: Some("AreaID"),
};

static BUILDING: SchemaClass = SchemaClass {
    key: ClassKey::Building,
    label: "建筑",
    code: Some("BUD"),
    mode: Some(DrawMode::Polygon),
    fields: &[
        FieldDef::text("BuildingID", "建筑编号"),
        FieldDef::text("BuildingName", "建筑名称"),
        FieldDef::number("Floors", "层数"),
        FieldDef::number("Height", "高度").optional(),
        FieldDef::select("Usage", "用途", &["住宅", "商业", "公共", "工业"]).optional(),
    ],
    groups: &[GroupDef::optional("owners", "业主", BUILDING_OWNERS)],
    geometry: GeometryLayout::Path {
        key: POLYGON_POINTS,
        default_y: GROUND_Y,
    },
    id_field: Some("BuildingID"),
};

pub(super) fn schema_for(key: ClassKey) -> &'static SchemaClass {
    match key {
        ClassKey::Default => &DEFAULT,
        ClassKey::Station => &STATION,
        ClassKey::Platform => &PLATFORM,
        ClassKey::Landmark => &LANDMARK,
        ClassKey::Railway => &RAILWAY,
        ClassKey::Road => &ROAD,
        ClassKey::Area => &AREA,
        ClassKey::Building => &BUILDING,
    }
}
