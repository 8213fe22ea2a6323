//! Isometric wireframe of the whole building.
//!
//! Each room is extruded into a box: its floor slab sits at
//! `floor × storey_height` and its walls rise `storey_height × wall_height`
//! for the room type. The 12 box edges are projected with a standard 30°
//! isometric view into drawing lines.

use serde::{Deserialize, Serialize};

use crate::model::Blueprint;

use super::{Drawing, ElementTag, Palette, Shape, Style};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireframeConfig {
    /// Floor-to-floor height in feet.
    pub storey_height: f64,
    /// Pixels per foot.
    pub scale: f64,
    pub padding: f64,
}

impl Default for WireframeConfig {
    fn default() -> Self {
        Self {
            storey_height: 10.0,
            scale: 6.0,
            padding: 20.0,
        }
    }
}

/// 3D point → 2D isometric, in feet. y grows down-screen, z up.
fn iso(x: f64, y: f64, z: f64) -> (f64, f64) {
    let (sin, cos) = 30f64.to_radians().sin_cos();
    ((x - y) * cos, (x + y) * sin - z)
}

/// Box edges as corner-index pairs; corners 0-3 bottom, 4-7 top.
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

pub fn project_wireframe(
    blueprint: &Blueprint,
    config: &WireframeConfig,
    palette: &Palette,
) -> Drawing {
    let mut lines: Vec<(String, String, (f64, f64), (f64, f64))> = Vec::new();

    for (floor, room) in blueprint.rooms() {
        let z0 = floor.floor as f64 * config.storey_height;
        let z1 = z0 + config.storey_height * palette.wall_height(room.room_type);
        let (x0, y0, x1, y1) = (room.x, room.y, room.x + room.width, room.y + room.height);
        let corners = [
            iso(x0, y0, z0),
            iso(x1, y0, z0),
            iso(x1, y1, z0),
            iso(x0, y1, z0),
            iso(x0, y0, z1),
            iso(x1, y0, z1),
            iso(x1, y1, z1),
            iso(x0, y1, z1),
        ];
        let colour = palette.fill(room.room_type).to_string();
        for (k, &(a, b)) in BOX_EDGES.iter().enumerate() {
            lines.push((
                format!("wf-f{}-{}-{k}", floor.floor, room.id),
                colour.clone(),
                corners[a],
                corners[b],
            ));
        }
    }

    let (mut min_u, mut min_v) = (f64::INFINITY, f64::INFINITY);
    let (mut max_u, mut max_v) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (_, _, a, b) in &lines {
        for (u, v) in [*a, *b] {
            min_u = min_u.min(u);
            min_v = min_v.min(v);
            max_u = max_u.max(u);
            max_v = max_v.max(v);
        }
    }
    if lines.is_empty() {
        return Drawing::new(2.0 * config.padding, 2.0 * config.padding);
    }

    let s = config.scale;
    let pad = config.padding;
    let mut drawing = Drawing::new(
        (max_u - min_u) * s + 2.0 * pad,
        (max_v - min_v) * s + 2.0 * pad,
    );
    let to_px = |(u, v): (f64, f64)| ((u - min_u) * s + pad, (v - min_v) * s + pad);
    for (id, colour, a, b) in lines {
        let (x1, y1) = to_px(a);
        let (x2, y2) = to_px(b);
        drawing.push(
            id,
            ElementTag::Edge,
            Shape::Line { x1, y1, x2, y2 },
            Style::stroked(&colour, 1.0),
        );
    }
    drawing
}
