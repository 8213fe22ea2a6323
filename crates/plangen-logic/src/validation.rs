//! Layout validation for generated blueprints.
//!
//! Pure functions that take a blueprint and return rule violations. Each
//! violation names the rule and the offending room ids so a caller can log
//! it, reject the layout, and fall back to the procedural generator.

use std::collections::HashSet;

use crate::geometry::{approx_eq, Rect};
use crate::model::{Blueprint, Floor, RoomType};

/// Smallest allowed room side, in feet.
pub const MIN_ROOM_DIM_FT: f64 = 3.0;

/// Invariant a layout can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    EmptyFloor,
    Bounds,
    Overlap,
    MinDimension,
    RoomType,
    DuplicateId,
    FlatMembership,
    ShaftAlignment,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::EmptyFloor => "empty_floor",
            Rule::Bounds => "bounds",
            Rule::Overlap => "overlap",
            Rule::MinDimension => "min_dimension",
            Rule::RoomType => "room_type",
            Rule::DuplicateId => "duplicate_id",
            Rule::FlatMembership => "flat_membership",
            Rule::ShaftAlignment => "shaft_alignment",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layout validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{rule} violation: {message}")]
pub struct ValidationError {
    pub rule: Rule,
    pub floor: Option<u32>,
    pub room_ids: Vec<String>,
    pub message: String,
}

impl ValidationError {
    fn new(rule: Rule, floor: Option<u32>, room_ids: Vec<String>, message: String) -> Self {
        Self {
            rule,
            floor,
            room_ids,
            message,
        }
    }
}

// ── A. Per-floor room geometry ──────────────────────────────────────────

/// Every room must lie inside the plate `[0,width]×[0,depth]`.
pub fn check_room_bounds(floor: &Floor, width: f64, depth: f64) -> Vec<ValidationError> {
    let plate = Rect::new(0.0, 0.0, width, depth);
    floor
        .rooms
        .iter()
        .filter(|r| !plate.contains_rect(&r.rect()))
        .map(|r| {
            ValidationError::new(
                Rule::Bounds,
                Some(floor.floor),
                vec![r.id.clone()],
                format!(
                    "room {} extends outside plate: ({:.1},{:.1})→({:.1},{:.1}) vs {}×{}",
                    r.id,
                    r.x,
                    r.y,
                    r.x + r.width,
                    r.y + r.height,
                    width,
                    depth
                ),
            )
        })
        .collect()
}

/// No two rooms on a floor may share positive area. Touching is fine.
pub fn check_room_overlaps(floor: &Floor) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in 0..floor.rooms.len() {
        for j in (i + 1)..floor.rooms.len() {
            let a = &floor.rooms[i];
            let b = &floor.rooms[j];
            if a.rect().overlaps(&b.rect()) {
                errors.push(ValidationError::new(
                    Rule::Overlap,
                    Some(floor.floor),
                    vec![a.id.clone(), b.id.clone()],
                    format!("rooms {} and {} overlap on floor {}", a.id, b.id, floor.floor),
                ));
            }
        }
    }
    errors
}

pub fn check_room_dimensions(floor: &Floor) -> Vec<ValidationError> {
    floor
        .rooms
        .iter()
        .filter(|r| r.width < MIN_ROOM_DIM_FT - 1e-9 || r.height < MIN_ROOM_DIM_FT - 1e-9)
        .map(|r| {
            ValidationError::new(
                Rule::MinDimension,
                Some(floor.floor),
                vec![r.id.clone()],
                format!(
                    "room {} is {:.1}×{:.1}, below the {} ft minimum",
                    r.id, r.width, r.height, MIN_ROOM_DIM_FT
                ),
            )
        })
        .collect()
}

/// Type tags are closed at parse time; what remains to check is context:
/// circulation rooms belong to everyone and can't be part of a flat.
pub fn check_room_types(floor: &Floor) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for flat in &floor.flats {
        for room in floor.flat_rooms(flat) {
            if room.room_type.is_circulation() {
                errors.push(ValidationError::new(
                    Rule::RoomType,
                    Some(floor.floor),
                    vec![room.id.clone()],
                    format!(
                        "{} room {} is listed in flat {}",
                        room.room_type, room.id, flat.flat_id
                    ),
                ));
            }
        }
    }
    errors
}

pub fn check_unique_ids(floor: &Floor) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    floor
        .rooms
        .iter()
        .filter(|r| !seen.insert(r.id.as_str()))
        .map(|r| {
            ValidationError::new(
                Rule::DuplicateId,
                Some(floor.floor),
                vec![r.id.clone()],
                format!("room id {} appears more than once on floor {}", r.id, floor.floor),
            )
        })
        .collect()
}

/// Flats must reference rooms of their own floor, and never share a room.
pub fn check_flat_membership(floor: &Floor) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut claimed: HashSet<&str> = HashSet::new();
    for flat in &floor.flats {
        for id in &flat.rooms {
            if floor.room(id).is_none() {
                errors.push(ValidationError::new(
                    Rule::FlatMembership,
                    Some(floor.floor),
                    vec![id.clone()],
                    format!("flat {} references missing room {}", flat.flat_id, id),
                ));
            } else if !claimed.insert(id.as_str()) {
                errors.push(ValidationError::new(
                    Rule::FlatMembership,
                    Some(floor.floor),
                    vec![id.clone()],
                    format!("room {} belongs to more than one flat", id),
                ));
            }
        }
    }
    errors
}

// ── B. Cross-floor ──────────────────────────────────────────────────────

/// Multi-floor buildings need a staircase and an elevator on every floor,
/// stacked at the same `(x,y)` as on the first floor.
pub fn check_shaft_alignment(blueprint: &Blueprint) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !blueprint.is_multi_floor() {
        return errors;
    }

    for shaft in [RoomType::Staircase, RoomType::Elevator] {
        let mut anchor: Option<(f64, f64, &str)> = None;
        for floor in &blueprint.floors {
            let Some(room) = floor.rooms_of(shaft).next() else {
                errors.push(ValidationError::new(
                    Rule::ShaftAlignment,
                    Some(floor.floor),
                    Vec::new(),
                    format!("floor {} has no {}", floor.floor, shaft),
                ));
                continue;
            };
            match anchor {
                None => anchor = Some((room.x, room.y, room.id.as_str())),
                Some((ax, ay, anchor_id)) => {
                    if !approx_eq(room.x, ax) || !approx_eq(room.y, ay) {
                        errors.push(ValidationError::new(
                            Rule::ShaftAlignment,
                            Some(floor.floor),
                            vec![anchor_id.to_string(), room.id.clone()],
                            format!(
                                "{} {} at ({:.1},{:.1}) is not above/below {} at ({:.1},{:.1})",
                                shaft, room.id, room.x, room.y, anchor_id, ax, ay
                            ),
                        ));
                    }
                }
            }
        }
    }
    errors
}

// ── Master validation ───────────────────────────────────────────────────

/// Run every check and return the combined violations.
pub fn validate_all(blueprint: &Blueprint) -> Vec<ValidationError> {
    let mut all = Vec::new();
    if blueprint.floors.is_empty() {
        all.push(ValidationError::new(
            Rule::EmptyFloor,
            None,
            Vec::new(),
            "blueprint has no floors".to_string(),
        ));
        return all;
    }
    for floor in &blueprint.floors {
        if floor.rooms.is_empty() {
            all.push(ValidationError::new(
                Rule::EmptyFloor,
                Some(floor.floor),
                Vec::new(),
                format!("floor {} has no rooms", floor.floor),
            ));
        }
        all.extend(check_unique_ids(floor));
        all.extend(check_room_dimensions(floor));
        all.extend(check_room_bounds(floor, blueprint.width, blueprint.depth));
        all.extend(check_room_overlaps(floor));
        all.extend(check_room_types(floor));
        all.extend(check_flat_membership(floor));
    }
    all.extend(check_shaft_alignment(blueprint));
    all
}

/// Accept a blueprint, or reject it with its first violation.
pub fn validate(blueprint: Blueprint) -> Result<Blueprint, ValidationError> {
    match validate_all(&blueprint).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(blueprint),
    }
}
