//! Deterministic rule-based floor layout.
//!
//! Every floor gets a full-width corridor through the middle of the plate,
//! splitting it into a top and a bottom band. Multi-floor buildings reserve
//! the bottom-right corner next to the corridor for a staircase and an
//! elevator, stacked on every floor. The remaining band width is divided by
//! fixed fractions that depend on building type and floor.

use crate::geometry::{round1, Rect};
use crate::model::{Blueprint, BuildingType, Flat, Floor, Room, RoomType};
use crate::params::{validate_params, BuildingParams};

use super::{attach_envelope, floor_label, LayoutError, LayoutStrategy};

/// One slot of a band split.
#[derive(Debug, Clone, Copy)]
struct Cell {
    slug: &'static str,
    name: &'static str,
    room_type: RoomType,
    frac: f64,
}

const fn cell(slug: &'static str, name: &'static str, room_type: RoomType, frac: f64) -> Cell {
    Cell {
        slug,
        name,
        room_type,
        frac,
    }
}

const THIRD: f64 = 1.0 / 3.0;

const HOUSE_GROUND_TOP: &[Cell] = &[
    cell("living", "Living Room", RoomType::Living, 0.45),
    cell("dining", "Dining", RoomType::Dining, 0.25),
    cell("kitchen", "Kitchen", RoomType::Kitchen, 0.30),
];
const HOUSE_GROUND_BOTTOM: &[Cell] = &[
    cell("bedroom", "Bedroom", RoomType::Bedroom, 0.50),
    cell("bathroom", "Bathroom", RoomType::Bathroom, 0.25),
    cell("laundry", "Laundry", RoomType::Laundry, 0.25),
];
const HOUSE_UPPER_TOP: &[Cell] = &[
    cell("bedroom1", "Bedroom 1", RoomType::Bedroom, 0.50),
    cell("bedroom2", "Bedroom 2", RoomType::Bedroom, 0.50),
];
const HOUSE_UPPER_BOTTOM: &[Cell] = &[
    cell("bedroom3", "Bedroom 3", RoomType::Bedroom, 0.45),
    cell("bathroom", "Bathroom", RoomType::Bathroom, 0.30),
    cell("balcony", "Balcony", RoomType::Balcony, 0.25),
];
const APARTMENT_GROUND_TOP: &[Cell] = &[
    cell("lobby", "Lobby", RoomType::Lobby, 0.60),
    cell("storage", "Storage", RoomType::Storage, 0.40),
];
const MIXED_USE_GROUND_TOP: &[Cell] = &[
    cell("lobby", "Lobby", RoomType::Lobby, 0.45),
    cell("retail", "Retail", RoomType::Office, 0.30),
    cell("storage", "Storage", RoomType::Storage, 0.25),
];
const SERVICE_GROUND_BOTTOM: &[Cell] = &[
    cell("parking", "Parking", RoomType::Parking, 0.70),
    cell("utility", "Utility", RoomType::Utility, 0.30),
];
const COMMERCIAL_GROUND_TOP: &[Cell] = &[
    cell("lobby", "Lobby", RoomType::Lobby, 0.60),
    cell("reception", "Reception", RoomType::Lobby, 0.40),
];
const COMMERCIAL_UPPER_TOP: &[Cell] = &[
    cell("office1", "Office 1", RoomType::Office, THIRD),
    cell("office2", "Office 2", RoomType::Office, THIRD),
    cell("office3", "Office 3", RoomType::Office, THIRD),
];
const COMMERCIAL_BOTTOM: &[Cell] = &[
    cell("restroom", "Restroom", RoomType::Bathroom, 0.30),
    cell("utility", "Utility", RoomType::Utility, 0.30),
    cell("meeting", "Meeting Room", RoomType::Office, 0.40),
];
const UNIT_TOP: &[Cell] = &[
    cell("living", "Living Room", RoomType::Living, 0.60),
    cell("kitchen", "Kitchen", RoomType::Kitchen, 0.40),
];
const UNIT_BOTTOM: &[Cell] = &[
    cell("bedroom", "Bedroom", RoomType::Bedroom, 0.60),
    cell("bathroom", "Bathroom", RoomType::Bathroom, 0.40),
];

/// What goes into the two bands of one floor.
enum Programme {
    /// Shared rooms split across each band's full usable width.
    Rows {
        top: &'static [Cell],
        bottom: &'static [Cell],
    },
    /// Two mirrored flats, one per half of the usable width.
    Units,
}

fn programme(building_type: BuildingType, floor: u32, floors: u32) -> Programme {
    let ground = floor == 0;
    match building_type {
        BuildingType::House if ground => Programme::Rows {
            top: HOUSE_GROUND_TOP,
            bottom: HOUSE_GROUND_BOTTOM,
        },
        BuildingType::House => Programme::Rows {
            top: HOUSE_UPPER_TOP,
            bottom: HOUSE_UPPER_BOTTOM,
        },
        BuildingType::Commercial if ground => Programme::Rows {
            top: COMMERCIAL_GROUND_TOP,
            bottom: COMMERCIAL_BOTTOM,
        },
        BuildingType::Commercial => Programme::Rows {
            top: COMMERCIAL_UPPER_TOP,
            bottom: COMMERCIAL_BOTTOM,
        },
        BuildingType::Apartment | BuildingType::Residential if ground && floors > 1 => {
            Programme::Rows {
                top: APARTMENT_GROUND_TOP,
                bottom: SERVICE_GROUND_BOTTOM,
            }
        }
        BuildingType::MixedUse if ground && floors > 1 => Programme::Rows {
            top: MIXED_USE_GROUND_TOP,
            bottom: SERVICE_GROUND_BOTTOM,
        },
        BuildingType::Apartment | BuildingType::Residential | BuildingType::MixedUse => {
            Programme::Units
        }
    }
}

/// Corridor and shaft placement shared by every floor of a plate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateFrame {
    pub width: f64,
    pub depth: f64,
    pub corridor: Rect,
    /// Staircase and elevator footprints; `None` on single-floor plates.
    pub shafts: Option<(Rect, Rect)>,
    /// Width left for rooms once the shafts are taken out.
    pub usable_width: f64,
}

impl PlateFrame {
    pub fn new(width: f64, depth: f64, floors: u32) -> Self {
        let ch = round1((depth * 0.12).clamp(3.0, 4.0));
        let cy = round1((depth - ch) / 2.0);
        let corridor = Rect::new(0.0, cy, width, ch);

        if floors <= 1 {
            return Self {
                width,
                depth,
                corridor,
                shafts: None,
                usable_width: width,
            };
        }

        let short = width.min(depth);
        let s = round1((short * 0.2).clamp(4.0, 6.0));
        let e = round1((short * 0.15).clamp(4.0, 5.0));
        let below = corridor.bottom();
        let lift = Rect::new(width - e, below, e, e);
        let stair = Rect::new(lift.x - s, below, s, s);
        Self {
            width,
            depth,
            corridor,
            shafts: Some((stair, lift)),
            usable_width: stair.x,
        }
    }

    /// `(y, height)` of the band above the corridor.
    pub fn top_band(&self) -> (f64, f64) {
        (0.0, self.corridor.y)
    }

    /// `(y, height)` of the band below the corridor.
    pub fn bottom_band(&self) -> (f64, f64) {
        let y = self.corridor.bottom();
        (y, self.depth - y)
    }
}

/// Split `[x0, x1]` by the cells' fractions. Edges snap to tenths of a foot;
/// the last edge is exactly `x1`.
fn split_band(
    prefix: &str,
    label_suffix: &str,
    cells: impl ExactSizeIterator<Item = Cell>,
    x0: f64,
    x1: f64,
    (y, h): (f64, f64),
) -> Vec<Room> {
    let count = cells.len();
    let span = x1 - x0;
    let mut rooms = Vec::with_capacity(count);
    let mut cum = 0.0;
    let mut left = x0;
    for (i, cell) in cells.enumerate() {
        cum += cell.frac;
        let right = if i + 1 == count {
            x1
        } else {
            round1(x0 + span * cum)
        };
        rooms.push(Room::new(
            format!("{prefix}-{}", cell.slug),
            format!("{}{label_suffix}", cell.name),
            cell.room_type,
            Rect::new(left, y, right - left, h),
        ));
        left = right;
    }
    rooms
}

fn layout_floor(frame: &PlateFrame, building_type: BuildingType, floor: u32, floors: u32) -> Floor {
    let prefix = format!("f{floor}");
    let mut rooms = vec![Room::new(
        format!("{prefix}-corridor"),
        "Corridor",
        RoomType::Corridor,
        frame.corridor,
    )];
    let mut flats = Vec::new();
    let uw = frame.usable_width;

    match programme(building_type, floor, floors) {
        Programme::Rows { top, bottom } => {
            rooms.extend(split_band(
                &prefix,
                "",
                top.iter().copied(),
                0.0,
                uw,
                frame.top_band(),
            ));
            rooms.extend(split_band(
                &prefix,
                "",
                bottom.iter().copied(),
                0.0,
                uw,
                frame.bottom_band(),
            ));
        }
        Programme::Units => {
            let half = round1(uw / 2.0);
            for (k, (x0, x1)) in [(0.0, half), (half, uw)].into_iter().enumerate() {
                let n = k + 1;
                let unit_prefix = format!("{prefix}-u{n}");
                let suffix = format!(" (Flat {n})");
                let (mut top, mut bottom) = (UNIT_TOP.to_vec(), UNIT_BOTTOM.to_vec());
                // The second unit mirrors the first about the split line.
                if k == 1 {
                    top.reverse();
                    bottom.reverse();
                }
                let mut unit =
                    split_band(&unit_prefix, &suffix, top.into_iter(), x0, x1, frame.top_band());
                unit.extend(split_band(
                    &unit_prefix,
                    &suffix,
                    bottom.into_iter(),
                    x0,
                    x1,
                    frame.bottom_band(),
                ));
                flats.push(Flat {
                    flat_id: format!("{prefix}-flat{n}"),
                    label: format!("Flat {n}"),
                    rooms: unit.iter().map(|r| r.id.clone()).collect(),
                });
                rooms.extend(unit);
            }
        }
    }

    if let Some((stair, lift)) = frame.shafts {
        rooms.push(Room::new(format!("{prefix}-stair"), "Staircase", RoomType::Staircase, stair));
        rooms.push(Room::new(format!("{prefix}-lift"), "Elevator", RoomType::Elevator, lift));
    }

    Floor {
        floor,
        label: floor_label(floor),
        rooms,
        flats,
    }
}

/// The rule-based fallback strategy. Same inputs, same blueprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralLayout;

impl ProceduralLayout {
    /// Lay out the floors only, without envelope records.
    pub fn floors(
        &self,
        width: f64,
        depth: f64,
        floors: u32,
        building_type: BuildingType,
    ) -> Vec<Floor> {
        let frame = PlateFrame::new(width, depth, floors);
        (0..floors)
            .map(|f| layout_floor(&frame, building_type, f, floors))
            .collect()
    }
}

impl LayoutStrategy for ProceduralLayout {
    fn name(&self) -> &'static str {
        "procedural"
    }

    fn generate(&self, params: &BuildingParams) -> Result<Blueprint, LayoutError> {
        let errors = validate_params(params);
        if !errors.is_empty() {
            return Err(LayoutError::Params(errors));
        }
        let floors = self.floors(params.width, params.depth, params.floors, params.building_type);
        let mut blueprint =
            Blueprint::new(params.width, params.depth, params.building_type, floors);
        attach_envelope(&mut blueprint, params);
        Ok(blueprint)
    }
}
