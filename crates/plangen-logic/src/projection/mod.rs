//! View projection: blueprint + component filter → scaled 2D drawing.
//!
//! Floors are stacked vertically, top floor first, each drawn at
//! `ProjectionConfig::scale` pixels per foot. Side margins hold the water or
//! electrical riser annotations; the bottom margin holds the terrace, tank and
//! parking panels. Every emitted element carries a stable id and a tag so
//! callers (and tests) can pick the geometry apart again.

pub mod marks;
pub mod wireframe;

pub use wireframe::{project_wireframe, WireframeConfig};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Transform2};
use crate::model::{Blueprint, Floor, Room, RoomType};
use crate::network::{build_electrical, build_plumbing, Level, Network, SegmentClass};

/// Named subset of a blueprint to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentFilter {
    All,
    Floors,
    Flats,
    Corridors,
    SingleFlat,
    Parking,
    Terrace,
    WaterTanks,
    WaterConnections,
    ElectricalConnections,
}

impl ComponentFilter {
    pub const ALL: [ComponentFilter; 10] = [
        ComponentFilter::All,
        ComponentFilter::Floors,
        ComponentFilter::Flats,
        ComponentFilter::Corridors,
        ComponentFilter::SingleFlat,
        ComponentFilter::Parking,
        ComponentFilter::Terrace,
        ComponentFilter::WaterTanks,
        ComponentFilter::WaterConnections,
        ComponentFilter::ElectricalConnections,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentFilter::All => "all",
            ComponentFilter::Floors => "floors",
            ComponentFilter::Flats => "flats",
            ComponentFilter::Corridors => "corridors",
            ComponentFilter::SingleFlat => "single_flat",
            ComponentFilter::Parking => "parking",
            ComponentFilter::Terrace => "terrace",
            ComponentFilter::WaterTanks => "water_tanks",
            ComponentFilter::WaterConnections => "water_connections",
            ComponentFilter::ElectricalConnections => "electrical_connections",
        }
    }

    pub fn parse(tag: &str) -> Option<ComponentFilter> {
        let tag = tag.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|f| f.as_str() == tag)
    }

    /// Views that need room for the bottom panels.
    fn has_bottom_panels(self) -> bool {
        matches!(
            self,
            ComponentFilter::All
                | ComponentFilter::Parking
                | ComponentFilter::Terrace
                | ComponentFilter::WaterTanks
        )
    }

    /// Views that draw floor plates at all.
    fn draws_floors(self) -> bool {
        !matches!(self, ComponentFilter::Terrace | ComponentFilter::WaterTanks)
    }
}

impl std::fmt::Display for ComponentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRequest {
    pub filter: ComponentFilter,
    /// Restrict room-bearing views to one floor.
    pub selected_floor: Option<u32>,
    /// Flat index for `single_flat`; `None` means the first flat.
    pub selected_flat: Option<usize>,
}

impl ViewRequest {
    pub fn new(filter: ComponentFilter) -> Self {
        Self {
            filter,
            selected_floor: None,
            selected_flat: None,
        }
    }

    /// Build a request from the external `-1 = none` convention.
    pub fn from_indices(filter: ComponentFilter, selected_floor: i32, selected_flat: i32) -> Self {
        Self {
            filter,
            selected_floor: u32::try_from(selected_floor).ok(),
            selected_flat: usize::try_from(selected_flat).ok(),
        }
    }

    pub fn with_floor(mut self, floor: u32) -> Self {
        self.selected_floor = Some(floor);
        self
    }

    pub fn with_flat(mut self, flat: usize) -> Self {
        self.selected_flat = Some(flat);
        self
    }
}

/// Room colours and relative wall heights, keyed by room type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub fills: BTreeMap<RoomType, String>,
    pub wall_heights: BTreeMap<RoomType, f64>,
}

fn default_fill(room_type: RoomType) -> &'static str {
    match room_type {
        RoomType::Bedroom => "#a5d6a7",
        RoomType::Living => "#90caf9",
        RoomType::Kitchen => "#ffcc80",
        RoomType::Bathroom => "#80deea",
        RoomType::Corridor => "#e0e0e0",
        RoomType::Staircase => "#bcaaa4",
        RoomType::Elevator => "#b0bec5",
        RoomType::Lobby => "#ce93d8",
        RoomType::Dining => "#fff59d",
        RoomType::Balcony => "#c5e1a5",
        RoomType::Storage => "#d7ccc8",
        RoomType::Utility => "#cfd8dc",
        RoomType::Parking => "#9e9e9e",
        RoomType::Office => "#9fa8da",
        RoomType::Laundry => "#b2ebf2",
        RoomType::Other => "#eeeeee",
    }
}

fn default_wall_height(room_type: RoomType) -> f64 {
    match room_type {
        RoomType::Balcony => 0.35,
        RoomType::Parking => 0.8,
        RoomType::Corridor | RoomType::Lobby => 0.9,
        RoomType::Staircase | RoomType::Elevator => 1.0,
        RoomType::Bedroom
        | RoomType::Living
        | RoomType::Kitchen
        | RoomType::Bathroom
        | RoomType::Dining
        | RoomType::Storage
        | RoomType::Utility
        | RoomType::Office
        | RoomType::Laundry
        | RoomType::Other => 0.85,
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            fills: RoomType::ALL
                .iter()
                .map(|&t| (t, default_fill(t).to_string()))
                .collect(),
            wall_heights: RoomType::ALL
                .iter()
                .map(|&t| (t, default_wall_height(t)))
                .collect(),
        }
    }
}

impl Palette {
    pub fn fill(&self, room_type: RoomType) -> &str {
        self.fills
            .get(&room_type)
            .map(String::as_str)
            .unwrap_or_else(|| default_fill(room_type))
    }

    pub fn wall_height(&self, room_type: RoomType) -> f64 {
        self.wall_heights
            .get(&room_type)
            .copied()
            .unwrap_or_else(|| default_wall_height(room_type))
    }
}

/// Canvas geometry and styling for 2D projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Pixels per foot.
    pub scale: f64,
    pub padding: f64,
    pub floor_gap: f64,
    pub side_margin: f64,
    pub bottom_margin: f64,
    pub palette: Palette,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            scale: 10.0,
            padding: 40.0,
            floor_gap: 60.0,
            side_margin: 140.0,
            bottom_margin: 180.0,
            palette: Palette::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementTag {
    FloorOutline,
    Room,
    FlatOutline,
    Door,
    Window,
    Label,
    TerracePanel,
    TankPanel,
    ParkingPanel,
    PipeSegment,
    PipeNode,
    WireSegment,
    WireNode,
    Edge,
}

impl ElementTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementTag::FloorOutline => "floor_outline",
            ElementTag::Room => "room",
            ElementTag::FlatOutline => "flat_outline",
            ElementTag::Door => "door",
            ElementTag::Window => "window",
            ElementTag::Label => "label",
            ElementTag::TerracePanel => "terrace_panel",
            ElementTag::TankPanel => "tank_panel",
            ElementTag::ParkingPanel => "parking_panel",
            ElementTag::PipeSegment => "pipe_segment",
            ElementTag::PipeNode => "pipe_node",
            ElementTag::WireSegment => "wire_segment",
            ElementTag::WireNode => "wire_node",
            ElementTag::Edge => "edge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Circle { cx: f64, cy: f64, r: f64 },
    Text { x: f64, y: f64, text: String, size: f64 },
}

impl Shape {
    fn rect(r: Rect) -> Self {
        Shape::Rect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }

    /// Axis-aligned bounds; text has none.
    pub fn bounds(&self) -> Option<Rect> {
        match *self {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => Some(Rect::new(x, y, width, height)),
            Shape::Line { x1, y1, x2, y2 } => Some(Rect::new(
                x1.min(x2),
                y1.min(y2),
                (x2 - x1).abs(),
                (y2 - y1).abs(),
            )),
            Shape::Circle { cx, cy, r } => Some(Rect::new(cx - r, cy - r, 2.0 * r, 2.0 * r)),
            Shape::Text { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

impl Style {
    pub fn filled(fill: &str, stroke: &str) -> Self {
        Self {
            fill: Some(fill.to_string()),
            stroke: Some(stroke.to_string()),
            stroke_width: 1.0,
            opacity: 1.0,
            dash: None,
        }
    }

    pub fn stroked(stroke: &str, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke.to_string()),
            stroke_width: width,
            opacity: 1.0,
            dash: None,
        }
    }

    fn text() -> Self {
        Self {
            fill: Some("#333333".to_string()),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
            dash: None,
        }
    }

    fn dashed(mut self, pattern: &str) -> Self {
        self.dash = Some(pattern.to_string());
        self
    }

    fn faded(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub tag: ElementTag,
    pub shape: Shape,
    pub style: Style,
}

/// Renderer-neutral vector drawing, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<Element>,
}

impl Drawing {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    fn push(&mut self, id: impl Into<String>, tag: ElementTag, shape: Shape, style: Style) {
        self.elements.push(Element {
            id: id.into(),
            tag,
            shape,
            style,
        });
    }

    pub fn with_tag(&self, tag: ElementTag) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.tag == tag)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Bounding box of every element with `tag`.
    pub fn bounds_of(&self, tag: ElementTag) -> Option<Rect> {
        let rects: Vec<Rect> = self.with_tag(tag).filter_map(|e| e.shape.bounds()).collect();
        Rect::bounding(rects.iter())
    }
}

/// Pixel placement of each drawn floor.
struct Layout {
    /// (floor index in the blueprint, transform), top floor first.
    panels: Vec<(usize, Transform2)>,
    left: f64,
    plate_w: f64,
    plate_h: f64,
    /// y where the bottom margin starts.
    panels_bottom: f64,
}

impl Layout {
    fn transform_for(&self, floor: u32, blueprint: &Blueprint) -> Option<Transform2> {
        self.panels
            .iter()
            .find(|(i, _)| blueprint.floors[*i].floor == floor)
            .map(|(_, t)| *t)
    }
}

fn visible_floors(blueprint: &Blueprint, request: &ViewRequest) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..blueprint.floors.len())
        .filter(|&i| {
            request
                .selected_floor
                .map_or(true, |f| blueprint.floors[i].floor == f)
        })
        .collect();
    indices.sort_by_key(|&i| std::cmp::Reverse(blueprint.floors[i].floor));
    indices
}

/// Project `blueprint` into a drawing under `request`.
pub fn project(blueprint: &Blueprint, request: &ViewRequest, config: &ProjectionConfig) -> Drawing {
    let filter = request.filter;
    let scale = config.scale;
    let left = if filter == ComponentFilter::WaterConnections {
        config.side_margin
    } else {
        0.0
    };
    let right = if filter == ComponentFilter::ElectricalConnections {
        config.side_margin
    } else {
        0.0
    };
    let bottom = if filter.has_bottom_panels() {
        config.bottom_margin
    } else {
        0.0
    };

    let plate_w = blueprint.width * scale;
    let plate_h = blueprint.depth * scale;
    let floors = visible_floors(blueprint, request);
    let slot = plate_h + config.floor_gap;

    let panels: Vec<(usize, Transform2)> = floors
        .iter()
        .enumerate()
        .map(|(k, &i)| {
            (
                i,
                Transform2::new(scale, config.padding + left, config.padding + k as f64 * slot),
            )
        })
        .collect();
    let layout = Layout {
        panels,
        left,
        plate_w,
        plate_h,
        panels_bottom: config.padding + floors.len() as f64 * slot,
    };

    let mut drawing = Drawing::new(
        2.0 * config.padding + plate_w + left + right,
        2.0 * config.padding + floors.len() as f64 * slot + bottom,
    );

    if filter.draws_floors() {
        for &(i, t) in &layout.panels {
            draw_floor(&mut drawing, &blueprint.floors[i], blueprint, t, request, config);
        }
    }

    match filter {
        ComponentFilter::All => {
            draw_terrace_panel(&mut drawing, blueprint, &layout, config);
            draw_tank_panel(&mut drawing, blueprint, &layout, config);
        }
        ComponentFilter::Terrace => draw_terrace_panel(&mut drawing, blueprint, &layout, config),
        ComponentFilter::WaterTanks => draw_tank_panel(&mut drawing, blueprint, &layout, config),
        ComponentFilter::Parking => {
            draw_parking_panel(&mut drawing, blueprint, &layout, config, request.selected_floor)
        }
        ComponentFilter::WaterConnections => {
            let net = build_plumbing(blueprint);
            draw_network(&mut drawing, &net, blueprint, &layout, config, NetworkStyle::WATER);
        }
        ComponentFilter::ElectricalConnections => {
            let net = build_electrical(blueprint);
            draw_network(&mut drawing, &net, blueprint, &layout, config, NetworkStyle::POWER);
        }
        _ => {}
    }

    drawing
}

/// Whether a room is drawn in this view.
fn room_visible(room: &Room, floor: &Floor, request: &ViewRequest) -> bool {
    match request.filter {
        ComponentFilter::All
        | ComponentFilter::Floors
        | ComponentFilter::WaterConnections
        | ComponentFilter::ElectricalConnections => true,
        ComponentFilter::Flats => room.room_type != RoomType::Corridor,
        ComponentFilter::Corridors => room.room_type == RoomType::Corridor,
        ComponentFilter::Parking => room.room_type == RoomType::Parking,
        ComponentFilter::SingleFlat => floor
            .flats
            .get(request.selected_flat.unwrap_or(0))
            .is_some_and(|flat| flat.contains(&room.id)),
        ComponentFilter::Terrace | ComponentFilter::WaterTanks => false,
    }
}

fn draw_floor(
    drawing: &mut Drawing,
    floor: &Floor,
    blueprint: &Blueprint,
    t: Transform2,
    request: &ViewRequest,
    config: &ProjectionConfig,
) {
    let filter = request.filter;
    let f = floor.floor;
    let plate = t.rect(&blueprint.footprint());

    drawing.push(
        format!("floor-{f}"),
        ElementTag::FloorOutline,
        Shape::rect(plate),
        Style::stroked("#333333", 2.0),
    );
    drawing.push(
        format!("floor-{f}-label"),
        ElementTag::Label,
        Shape::Text {
            x: plate.x,
            y: plate.y - 8.0,
            text: floor.label.clone(),
            size: 14.0,
        },
        Style::text(),
    );

    let connections = matches!(
        filter,
        ComponentFilter::WaterConnections | ComponentFilter::ElectricalConnections
    );
    for room in floor.rooms.iter().filter(|r| room_visible(r, floor, request)) {
        let mut style = Style::filled(config.palette.fill(room.room_type), "#555555");
        if connections {
            style = style.faded(0.25);
        }
        let r = t.rect(&room.rect());
        drawing.push(room.id.clone(), ElementTag::Room, Shape::rect(r), style);
        if !connections && r.width >= 40.0 && r.height >= 20.0 {
            let (cx, cy) = r.center();
            drawing.push(
                format!("{}-label", room.id),
                ElementTag::Label,
                Shape::Text {
                    x: cx,
                    y: cy,
                    text: room.name.clone(),
                    size: 10.0,
                },
                Style::text(),
            );
        }
    }

    let flat_outlines: Vec<usize> = match filter {
        ComponentFilter::All | ComponentFilter::Flats => (0..floor.flats.len()).collect(),
        ComponentFilter::SingleFlat => {
            let k = request.selected_flat.unwrap_or(0);
            if k < floor.flats.len() {
                vec![k]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };
    for k in flat_outlines {
        let flat = &floor.flats[k];
        let rects: Vec<Rect> = floor.flat_rooms(flat).map(|r| r.rect()).collect();
        if let Some(bounds) = Rect::bounding(rects.iter()) {
            drawing.push(
                format!("f{f}-{}", flat.flat_id),
                ElementTag::FlatOutline,
                Shape::rect(t.rect(&bounds)),
                Style::stroked("#d32f2f", 2.0).dashed("6 4"),
            );
        }
    }

    if filter == ComponentFilter::All {
        for door in marks::doors(floor) {
            let (x1, y1) = t.point(door.x1, door.y1);
            let (x2, y2) = t.point(door.x2, door.y2);
            drawing.push(
                format!("door-f{f}-{}", door.room_id),
                ElementTag::Door,
                Shape::Line { x1, y1, x2, y2 },
                Style::stroked("#8d6e63", 3.0),
            );
        }
        let windows = marks::windows(floor, blueprint.width, blueprint.depth);
        for (n, window) in windows.iter().enumerate() {
            let (x1, y1) = t.point(window.x1, window.y1);
            let (x2, y2) = t.point(window.x2, window.y2);
            drawing.push(
                format!("window-f{f}-{n}"),
                ElementTag::Window,
                Shape::Line { x1, y1, x2, y2 },
                Style::stroked("#1e88e5", 3.0),
            );
        }
    }
}

/// Bottom-margin panel slot: 0 = left half, 1 = right half.
fn panel_rect(layout: &Layout, config: &ProjectionConfig, slot: usize) -> Rect {
    let gap = 10.0;
    let w = (layout.plate_w - gap) / 2.0;
    let x = config.padding + layout.left + slot as f64 * (w + gap);
    Rect::new(x, layout.panels_bottom, w, config.bottom_margin - config.padding)
}

fn panel_frame(drawing: &mut Drawing, id: &str, tag: ElementTag, rect: Rect, title: String) {
    drawing.push(id, tag, Shape::rect(rect), Style::filled("#fafafa", "#616161"));
    drawing.push(
        format!("{id}-label"),
        ElementTag::Label,
        Shape::Text {
            x: rect.x + 8.0,
            y: rect.y + 18.0,
            text: title,
            size: 12.0,
        },
        Style::text(),
    );
}

fn draw_terrace_panel(
    drawing: &mut Drawing,
    blueprint: &Blueprint,
    layout: &Layout,
    config: &ProjectionConfig,
) {
    let rect = panel_rect(layout, config, 0);
    let title = match &blueprint.terrace {
        Some(t) => format!(
            "Terrace {:.0} sq ft{}",
            t.area_sqft,
            if t.has_railing { ", railing" } else { "" }
        ),
        None => "Terrace".to_string(),
    };
    panel_frame(drawing, "terrace-panel", ElementTag::TerracePanel, rect, title);
}

fn draw_tank_panel(
    drawing: &mut Drawing,
    blueprint: &Blueprint,
    layout: &Layout,
    config: &ProjectionConfig,
) {
    let rect = panel_rect(layout, config, 1);
    panel_frame(
        drawing,
        "tank-panel",
        ElementTag::TankPanel,
        rect,
        format!("Water tanks: {}", blueprint.water_tanks.len()),
    );
    let r = 12.0_f64.min(rect.width / 12.0);
    for (i, tank) in blueprint.water_tanks.iter().enumerate() {
        let cx = rect.x + 20.0 + i as f64 * (2.0 * r + 8.0);
        if cx + r > rect.right() {
            break;
        }
        let fill = if tank.location == "terrace" {
            "#4fc3f7"
        } else {
            "#0277bd"
        };
        drawing.push(
            tank.id.clone(),
            ElementTag::TankPanel,
            Shape::Circle {
                cx,
                cy: rect.y + rect.height / 2.0,
                r,
            },
            Style::filled(fill, "#01579b"),
        );
    }
}

fn draw_parking_panel(
    drawing: &mut Drawing,
    blueprint: &Blueprint,
    layout: &Layout,
    config: &ProjectionConfig,
    selected_floor: Option<u32>,
) {
    let (count, area) = blueprint
        .rooms()
        .filter(|(f, r)| {
            r.room_type == RoomType::Parking && selected_floor.map_or(true, |s| f.floor == s)
        })
        .fold((0, 0.0), |(n, a), (_, r)| (n + 1, a + r.area()));
    panel_frame(
        drawing,
        "parking-panel",
        ElementTag::ParkingPanel,
        panel_rect(layout, config, 0),
        format!("Parking: {count} area(s), {area:.0} sq ft"),
    );
}

#[derive(Clone, Copy)]
struct NetworkStyle {
    prefix: &'static str,
    colour: &'static str,
    segment_tag: ElementTag,
    node_tag: ElementTag,
}

impl NetworkStyle {
    const WATER: NetworkStyle = NetworkStyle {
        prefix: "pipe",
        colour: "#1565c0",
        segment_tag: ElementTag::PipeSegment,
        node_tag: ElementTag::PipeNode,
    };
    const POWER: NetworkStyle = NetworkStyle {
        prefix: "wire",
        colour: "#f9a825",
        segment_tag: ElementTag::WireSegment,
        node_tag: ElementTag::WireNode,
    };
}

fn draw_network<K>(
    drawing: &mut Drawing,
    net: &Network<K>,
    blueprint: &Blueprint,
    layout: &Layout,
    config: &ProjectionConfig,
    style: NetworkStyle,
) {
    let top_y = config.padding / 2.0;
    let basement_y = (layout.panels_bottom - config.floor_gap / 2.0).max(top_y);
    let x0 = config.padding + layout.left;
    let scale = config.scale;

    let positions: Vec<Option<(f64, f64)>> = net
        .nodes
        .iter()
        .map(|n| match n.level {
            Level::Floor(f) => layout
                .transform_for(f, blueprint)
                .map(|t| t.point(n.x, n.y)),
            Level::Roof if !layout.panels.is_empty() => Some((x0 + n.x * scale, top_y)),
            Level::Basement if !layout.panels.is_empty() => Some((x0 + n.x * scale, basement_y)),
            _ => None,
        })
        .collect();

    for (i, s) in net.segments.iter().enumerate() {
        let (Some(Some((x1, y1))), Some(Some((x2, y2)))) =
            (positions.get(s.from), positions.get(s.to))
        else {
            continue;
        };
        let width = match s.class {
            SegmentClass::Main | SegmentClass::Riser => 3.0,
            SegmentClass::Branch => 2.0,
            SegmentClass::Lateral => 1.0,
        };
        drawing.push(
            format!("{}-seg-{i}", style.prefix),
            style.segment_tag,
            Shape::Line {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            },
            Style::stroked(style.colour, width),
        );
    }
    for (node, pos) in net.nodes.iter().zip(&positions) {
        let Some((cx, cy)) = *pos else {
            continue;
        };
        let r = if node.room_id.is_some() { 3.0 } else { 5.0 };
        drawing.push(
            format!("{}-{}", style.prefix, node.id),
            style.node_tag,
            Shape::Circle { cx, cy, r },
            Style::filled(style.colour, "#263238"),
        );
    }

    let caption = if style.segment_tag == ElementTag::PipeSegment {
        "Water riser"
    } else {
        "Electrical riser"
    };
    let label_x = if style.segment_tag == ElementTag::PipeSegment {
        config.padding
    } else {
        config.padding + layout.left + layout.plate_w + 10.0
    };
    drawing.push(
        format!("{}-caption", style.prefix),
        ElementTag::Label,
        Shape::Text {
            x: label_x,
            y: config.padding + layout.plate_h / 2.0,
            text: caption.to_string(),
            size: 12.0,
        },
        Style::text(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{LayoutStrategy, ProceduralLayout};
    use crate::model::BuildingType;
    use crate::params::BuildingParams;

    fn apartment() -> Blueprint {
        ProceduralLayout
            .generate(&BuildingParams::new(60.0, 40.0, 3, BuildingType::Apartment))
            .unwrap()
    }

    fn room_ids(drawing: &Drawing) -> Vec<&str> {
        drawing.with_tag(ElementTag::Room).map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(ComponentFilter::parse("single-flat"), Some(ComponentFilter::SingleFlat));
        assert_eq!(ComponentFilter::parse("water_tanks"), Some(ComponentFilter::WaterTanks));
        assert_eq!(ComponentFilter::parse("roof"), None);
        for f in ComponentFilter::ALL {
            assert_eq!(ComponentFilter::parse(f.as_str()), Some(f));
        }
    }

    #[test]
    fn test_from_indices_sentinels() {
        let r = ViewRequest::from_indices(ComponentFilter::SingleFlat, -1, 1);
        assert_eq!(r.selected_floor, None);
        assert_eq!(r.selected_flat, Some(1));
    }

    #[test]
    fn test_canvas_size_and_stacking() {
        let bp = apartment();
        let config = ProjectionConfig::default();
        let d = project(&bp, &ViewRequest::new(ComponentFilter::Floors), &config);
        // 2×40 + 600 wide; 2×40 + 3×(400 + 60) tall
        assert_eq!(d.width, 680.0);
        assert_eq!(d.height, 1460.0);
        // top floor is drawn first
        let Shape::Rect { y, .. } = d.element("floor-2").unwrap().shape else {
            panic!("floor outline is a rect");
        };
        assert_eq!(y, 40.0);

        let all = project(&bp, &ViewRequest::new(ComponentFilter::All), &config);
        assert_eq!(all.height, 1640.0);
        let water = project(&bp, &ViewRequest::new(ComponentFilter::WaterConnections), &config);
        assert_eq!(water.width, 820.0);
        let Shape::Rect { x, .. } = water.element("floor-0").unwrap().shape else {
            panic!("floor outline is a rect");
        };
        assert_eq!(x, 180.0);
    }

    #[test]
    fn test_corridors_view() {
        let d = project(
            &apartment(),
            &ViewRequest::new(ComponentFilter::Corridors),
            &ProjectionConfig::default(),
        );
        assert_eq!(room_ids(&d), vec!["f2-corridor", "f1-corridor", "f0-corridor"]);
    }

    #[test]
    fn test_flats_view_hides_corridors() {
        let d = project(
            &apartment(),
            &ViewRequest::new(ComponentFilter::Flats),
            &ProjectionConfig::default(),
        );
        assert!(room_ids(&d).iter().all(|id| !id.ends_with("corridor")));
        assert_eq!(d.with_tag(ElementTag::FlatOutline).count(), 4);
    }

    #[test]
    fn test_selected_floor_restricts() {
        let request = ViewRequest::new(ComponentFilter::Floors).with_floor(1);
        let d = project(&apartment(), &request, &ProjectionConfig::default());
        assert!(room_ids(&d).iter().all(|id| id.starts_with("f1-")));
        assert_eq!(d.with_tag(ElementTag::FloorOutline).count(), 1);
    }

    #[test]
    fn test_single_flat_default_index() {
        let request = ViewRequest::new(ComponentFilter::SingleFlat);
        let d = project(&apartment(), &request, &ProjectionConfig::default());
        let ids = room_ids(&d);
        assert_eq!(ids.len(), 8);
        assert!(ids.iter().all(|id| id.contains("-u1-")));
    }

    #[test]
    fn test_panels() {
        let bp = apartment();
        let config = ProjectionConfig::default();
        let terrace = project(&bp, &ViewRequest::new(ComponentFilter::Terrace), &config);
        assert!(room_ids(&terrace).is_empty());
        assert!(terrace.element("terrace-panel").is_some());

        let tanks = project(&bp, &ViewRequest::new(ComponentFilter::WaterTanks), &config);
        assert!(tanks.element("tank-1").is_some());

        let parking = project(&bp, &ViewRequest::new(ComponentFilter::Parking), &config);
        assert_eq!(room_ids(&parking), vec!["f0-parking"]);
        assert!(parking.element("parking-panel").is_some());
    }

    #[test]
    fn test_parking_panel_counts_selected_floor() {
        let bp = apartment();
        let config = ProjectionConfig::default();
        let panel_title = |request: &ViewRequest| {
            let d = project(&bp, request, &config);
            match &d.element("parking-panel-label").unwrap().shape {
                Shape::Text { text, .. } => text.clone(),
                _ => panic!("panel title is text"),
            }
        };
        let ground = ViewRequest::new(ComponentFilter::Parking).with_floor(0);
        assert!(panel_title(&ground).starts_with("Parking: 1 area(s)"));
        let upper = ViewRequest::new(ComponentFilter::Parking).with_floor(2);
        assert_eq!(panel_title(&upper), "Parking: 0 area(s), 0 sq ft");
    }

    #[test]
    fn test_all_view_has_marks() {
        let d = project(
            &apartment(),
            &ViewRequest::new(ComponentFilter::All),
            &ProjectionConfig::default(),
        );
        assert!(d.with_tag(ElementTag::Door).count() > 0);
        assert!(d.with_tag(ElementTag::Window).count() > 0);
        assert!(d.element("door-f1-f1-u1-living").is_some());
    }

    #[test]
    fn test_connection_views_draw_networks() {
        let bp = apartment();
        let config = ProjectionConfig::default();
        let water = project(&bp, &ViewRequest::new(ComponentFilter::WaterConnections), &config);
        let net = build_plumbing(&bp);
        assert_eq!(water.with_tag(ElementTag::PipeSegment).count(), net.segments.len());
        assert!(water
            .with_tag(ElementTag::Room)
            .all(|e| (e.style.opacity - 0.25).abs() < 1e-9));

        let request = ViewRequest::new(ComponentFilter::ElectricalConnections);
        let power = project(&bp, &request, &config);
        let net = build_electrical(&bp);
        assert_eq!(power.with_tag(ElementTag::WireNode).count(), net.nodes.len());
    }

    #[test]
    fn test_palette_roundtrips_through_json() {
        let config = ProjectionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ProjectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        let partial: ProjectionConfig = serde_json::from_str(r#"{"scale": 5}"#).unwrap();
        assert_eq!(partial.scale, 5.0);
        assert_eq!(partial.palette.fill(RoomType::Kitchen), "#ffcc80");
    }
}
