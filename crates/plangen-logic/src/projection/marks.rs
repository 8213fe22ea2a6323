//! Door and window marks, in floor-local feet.

use crate::model::{Floor, Room, RoomType};

/// How far a wall may sit from the corridor edge and still count as shared.
pub const DOOR_TOLERANCE_FT: f64 = 0.5;
pub const MAX_DOOR_FT: f64 = 3.0;

/// How far a room edge may sit from the plate boundary and still get windows.
pub const WINDOW_TOLERANCE_FT: f64 = 0.5;
pub const MAX_WINDOW_FT: f64 = 4.0;
/// Edges at least this long get two windows.
pub const TWO_WINDOW_EDGE_FT: f64 = 12.0;

/// A straight mark segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub room_id: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Mark {
    pub fn length(&self) -> f64 {
        ((self.x2 - self.x1).powi(2) + (self.y2 - self.y1).powi(2)).sqrt()
    }
}

/// Doors on walls shared with the floor's corridor.
pub fn doors(floor: &Floor) -> Vec<Mark> {
    let Some(corridor) = floor.corridor() else {
        return Vec::new();
    };
    let c = corridor.rect();
    floor
        .rooms
        .iter()
        .filter(|r| r.room_type != RoomType::Corridor)
        .filter_map(|room| {
            let r = room.rect();
            let wall_y = if (r.bottom() - c.y).abs() <= DOOR_TOLERANCE_FT {
                c.y
            } else if (r.y - c.bottom()).abs() <= DOOR_TOLERANCE_FT {
                c.bottom()
            } else {
                return None;
            };
            let overlap = r.x_overlap(&c);
            if overlap <= 0.0 {
                return None;
            }
            let mid = r.x.max(c.x) + overlap / 2.0;
            let half = MAX_DOOR_FT.min(overlap / 2.0) / 2.0;
            Some(Mark {
                room_id: room.id.clone(),
                x1: mid - half,
                y1: wall_y,
                x2: mid + half,
                y2: wall_y,
            })
        })
        .collect()
}

/// Window positions along an edge starting at `start` of `len`.
fn window_spans(start: f64, len: f64) -> Vec<(f64, f64)> {
    let size = MAX_WINDOW_FT.min(len * 0.4);
    let centres: &[f64] = if len >= TWO_WINDOW_EDGE_FT {
        &[1.0 / 3.0, 2.0 / 3.0]
    } else {
        &[0.5]
    };
    centres
        .iter()
        .map(|t| {
            let c = start + len * t;
            (c - size / 2.0, c + size / 2.0)
        })
        .collect()
}

fn room_windows(room: &Room, width: f64, depth: f64) -> Vec<Mark> {
    let r = room.rect();
    let mut marks = Vec::new();
    let mut push = |x1, y1, x2, y2| {
        marks.push(Mark {
            room_id: room.id.clone(),
            x1,
            y1,
            x2,
            y2,
        })
    };
    if r.y <= WINDOW_TOLERANCE_FT {
        for (a, b) in window_spans(r.x, r.width) {
            push(a, r.y, b, r.y);
        }
    }
    if depth - r.bottom() <= WINDOW_TOLERANCE_FT {
        for (a, b) in window_spans(r.x, r.width) {
            push(a, r.bottom(), b, r.bottom());
        }
    }
    if r.x <= WINDOW_TOLERANCE_FT {
        for (a, b) in window_spans(r.y, r.height) {
            push(r.x, a, r.x, b);
        }
    }
    if width - r.right() <= WINDOW_TOLERANCE_FT {
        for (a, b) in window_spans(r.y, r.height) {
            push(r.right(), a, r.right(), b);
        }
    }
    marks
}

/// Windows on every exterior edge of every non-shaft room.
pub fn windows(floor: &Floor, width: f64, depth: f64) -> Vec<Mark> {
    floor
        .rooms
        .iter()
        .filter(|r| !r.room_type.is_shaft())
        .flat_map(|r| room_windows(r, width, depth))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn floor(rooms: Vec<Room>) -> Floor {
        Floor {
            floor: 0,
            label: "Ground Floor".into(),
            rooms,
            flats: Vec::new(),
        }
    }

    fn room(id: &str, rt: RoomType, x: f64, y: f64, w: f64, h: f64) -> Room {
        Room::new(id, id, rt, Rect::new(x, y, w, h))
    }

    #[test]
    fn test_door_on_shared_wall() {
        let f = floor(vec![
            room("c", RoomType::Corridor, 0.0, 10.0, 40.0, 4.0),
            room("above", RoomType::Living, 0.0, 0.0, 20.0, 10.0),
            room("below", RoomType::Bedroom, 10.0, 14.3, 4.0, 10.0),
            room("far", RoomType::Kitchen, 20.0, 0.0, 20.0, 9.0),
        ]);
        let d = doors(&f);
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].room_id, "above");
        // centred on x 0..20, full 3 ft
        assert_eq!((d[0].x1, d[0].x2, d[0].y1), (8.5, 11.5, 10.0));
        // 4 ft overlap → 2 ft door on the corridor's bottom edge
        assert!((d[1].length() - 2.0).abs() < 1e-9);
        assert_eq!(d[1].y1, 14.0);
    }

    #[test]
    fn test_no_corridor_no_doors() {
        let f = floor(vec![room("a", RoomType::Living, 0.0, 0.0, 10.0, 10.0)]);
        assert!(doors(&f).is_empty());
    }

    #[test]
    fn test_windows_on_exterior_edges() {
        let f = floor(vec![
            // top-left corner room: top edge 18 ft (two), left edge 10 ft (one)
            room("corner", RoomType::Living, 0.0, 0.0, 18.0, 10.0),
            // interior room: nothing
            room("inner", RoomType::Storage, 20.0, 5.0, 5.0, 5.0),
            room("lift", RoomType::Elevator, 35.0, 0.0, 5.0, 5.0),
        ]);
        let w = windows(&f, 40.0, 30.0);
        assert_eq!(w.len(), 3);
        assert!(w.iter().all(|m| m.room_id == "corner"));
        assert!((w[0].length() - 4.0).abs() < 1e-9);
        assert!(((w[0].x1 + w[0].x2) / 2.0 - 6.0).abs() < 1e-9);
        // 10 ft edge → 4 ft window centred at 5
        assert_eq!((w[2].x1, w[2].y1, w[2].y2), (0.0, 3.0, 7.0));
    }

    #[test]
    fn test_short_edge_window_scales() {
        let spans = window_spans(0.0, 5.0);
        assert_eq!(spans.len(), 1);
        assert!((spans[0].1 - spans[0].0 - 2.0).abs() < 1e-9);
    }
}
