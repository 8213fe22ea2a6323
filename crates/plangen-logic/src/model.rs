//! Blueprint data model: rooms, flats, floors and building-level records.
//!
//! The serialized field names match the Blueprint document consumed by the
//! viewer and export layers, so a `Blueprint` round-trips through JSON as-is.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Closed set of room functions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Bedroom,
    Living,
    Kitchen,
    Bathroom,
    Corridor,
    Staircase,
    Elevator,
    Lobby,
    Dining,
    Balcony,
    Storage,
    Utility,
    Parking,
    Office,
    Laundry,
    Other,
}

impl RoomType {
    pub const ALL: [RoomType; 16] = [
        RoomType::Bedroom,
        RoomType::Living,
        RoomType::Kitchen,
        RoomType::Bathroom,
        RoomType::Corridor,
        RoomType::Staircase,
        RoomType::Elevator,
        RoomType::Lobby,
        RoomType::Dining,
        RoomType::Balcony,
        RoomType::Storage,
        RoomType::Utility,
        RoomType::Parking,
        RoomType::Office,
        RoomType::Laundry,
        RoomType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Bedroom => "bedroom",
            RoomType::Living => "living",
            RoomType::Kitchen => "kitchen",
            RoomType::Bathroom => "bathroom",
            RoomType::Corridor => "corridor",
            RoomType::Staircase => "staircase",
            RoomType::Elevator => "elevator",
            RoomType::Lobby => "lobby",
            RoomType::Dining => "dining",
            RoomType::Balcony => "balcony",
            RoomType::Storage => "storage",
            RoomType::Utility => "utility",
            RoomType::Parking => "parking",
            RoomType::Office => "office",
            RoomType::Laundry => "laundry",
            RoomType::Other => "other",
        }
    }

    /// Parse a type tag. Accepts the common aliases generators emit
    /// ("lift", "stairs", "toilet", ...); anything else is `None`.
    pub fn parse(tag: &str) -> Option<RoomType> {
        let tag = tag
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == ' ' || c == '-', "_");
        let rt = match tag.as_str() {
            "bedroom" | "master_bedroom" => RoomType::Bedroom,
            "living" | "living_room" => RoomType::Living,
            "kitchen" => RoomType::Kitchen,
            "bathroom" | "toilet" | "restroom" => RoomType::Bathroom,
            "corridor" | "hallway" => RoomType::Corridor,
            "staircase" | "stairs" | "stair" => RoomType::Staircase,
            "elevator" | "lift" => RoomType::Elevator,
            "lobby" | "reception" => RoomType::Lobby,
            "dining" | "dining_room" => RoomType::Dining,
            "balcony" => RoomType::Balcony,
            "storage" | "store" => RoomType::Storage,
            "utility" => RoomType::Utility,
            "parking" | "garage" => RoomType::Parking,
            "office" | "meeting" => RoomType::Office,
            "laundry" => RoomType::Laundry,
            "other" => RoomType::Other,
            _ => return None,
        };
        Some(rt)
    }

    /// Rooms that need a water supply and drain.
    pub fn is_wet(self) -> bool {
        matches!(self, RoomType::Bathroom | RoomType::Kitchen)
    }

    /// Vertical transport shafts that must align across floors.
    pub fn is_shaft(self) -> bool {
        matches!(self, RoomType::Staircase | RoomType::Elevator)
    }

    /// Shared circulation: never part of a flat, never wired as a fixture.
    pub fn is_circulation(self) -> bool {
        matches!(
            self,
            RoomType::Corridor | RoomType::Staircase | RoomType::Elevator
        )
    }

    pub fn is_habitable(self) -> bool {
        matches!(
            self,
            RoomType::Bedroom | RoomType::Living | RoomType::Dining | RoomType::Office
        )
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Building programme requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildingType {
    House,
    Residential,
    Apartment,
    Commercial,
    MixedUse,
}

impl BuildingType {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildingType::House => "house",
            BuildingType::Residential => "residential",
            BuildingType::Apartment => "apartment",
            BuildingType::Commercial => "commercial",
            BuildingType::MixedUse => "mixed-use",
        }
    }

    pub fn parse(tag: &str) -> Option<BuildingType> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "house" => Some(BuildingType::House),
            "residential" => Some(BuildingType::Residential),
            "apartment" => Some(BuildingType::Apartment),
            "commercial" => Some(BuildingType::Commercial),
            "mixed-use" | "mixed_use" | "mixeduse" => Some(BuildingType::MixedUse),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A room, in feet, in floor-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type")]
    pub room_type: RoomType,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        room_type: RoomType,
        rect: Rect,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            room_type,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn centroid(&self) -> (f64, f64) {
        self.rect().center()
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A rentable unit: a set of rooms on one floor, referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flat {
    pub flat_id: String,
    pub label: String,
    pub rooms: Vec<String>,
}

impl Flat {
    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.iter().any(|r| r == room_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub floor: u32,
    pub label: String,
    pub rooms: Vec<Room>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flats: Vec<Flat>,
}

impl Floor {
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// The floor's corridor. Layout rules assume at most one.
    pub fn corridor(&self) -> Option<&Room> {
        self.rooms_of(RoomType::Corridor).next()
    }

    pub fn rooms_of(&self, room_type: RoomType) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(move |r| r.room_type == room_type)
    }

    /// The flat a room belongs to, if any.
    pub fn flat_of(&self, room_id: &str) -> Option<&Flat> {
        self.flats.iter().find(|f| f.contains(room_id))
    }

    /// Rooms of a flat, in floor order. Dangling ids are skipped.
    pub fn flat_rooms<'a>(&'a self, flat: &'a Flat) -> impl Iterator<Item = &'a Room> {
        self.rooms.iter().filter(move |r| flat.contains(&r.id))
    }
}

/// Horizontal corridor band of one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorBand {
    pub floor: u32,
    pub y: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrace {
    pub area_sqft: f64,
    pub has_railing: bool,
    pub water_proofing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roof {
    #[serde(rename = "type")]
    pub roof_type: String,
    pub area_sqft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterTank {
    pub id: String,
    pub capacity_litres: u32,
    pub location: String,
}

/// Logical (not geometric) supply link, e.g. meter → DB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalLine {
    pub id: String,
    #[serde(rename = "type")]
    pub line_type: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterLine {
    pub id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCount {
    pub component: String,
    pub count: u32,
}

/// The generated building. Owns its floors; floors own rooms and flats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub width: f64,
    pub depth: f64,
    pub building_type: BuildingType,
    pub floors: Vec<Floor>,
    #[serde(default)]
    pub corridors: Vec<CorridorBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrace: Option<Terrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roof: Option<Roof>,
    #[serde(default)]
    pub water_tanks: Vec<WaterTank>,
    #[serde(default)]
    pub electrical_lines: Vec<ElectricalLine>,
    #[serde(default)]
    pub water_lines: Vec<WaterLine>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub component_breakdown: Vec<ComponentCount>,
}

impl Blueprint {
    /// A bare blueprint with floors only; envelope records are attached later.
    pub fn new(width: f64, depth: f64, building_type: BuildingType, floors: Vec<Floor>) -> Self {
        Self {
            width,
            depth,
            building_type,
            floors,
            corridors: Vec::new(),
            terrace: None,
            roof: None,
            water_tanks: Vec::new(),
            electrical_lines: Vec::new(),
            water_lines: Vec::new(),
            overview: String::new(),
            component_breakdown: Vec::new(),
        }
    }

    /// The floor plate rectangle `[0,width]×[0,depth]`.
    pub fn footprint(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.depth)
    }

    pub fn floor(&self, index: u32) -> Option<&Floor> {
        self.floors.iter().find(|f| f.floor == index)
    }

    pub fn is_multi_floor(&self) -> bool {
        self.floors.len() > 1
    }

    pub fn room_count(&self) -> usize {
        self.floors.iter().map(|f| f.rooms.len()).sum()
    }

    pub fn rooms(&self) -> impl Iterator<Item = (&Floor, &Room)> {
        self.floors
            .iter()
            .flat_map(|f| f.rooms.iter().map(move |r| (f, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_type_serializes_snake_case() {
        let json = serde_json::to_string(&RoomType::Elevator).unwrap();
        assert_eq!(json, "\"elevator\"");
        let rt: RoomType = serde_json::from_str("\"laundry\"").unwrap();
        assert_eq!(rt, RoomType::Laundry);
        assert!(serde_json::from_str::<RoomType>("\"ballroom\"").is_err());
    }

    #[test]
    fn test_room_type_parse_aliases() {
        assert_eq!(RoomType::parse("Lift"), Some(RoomType::Elevator));
        assert_eq!(RoomType::parse("living room"), Some(RoomType::Living));
        assert_eq!(RoomType::parse("restroom"), Some(RoomType::Bathroom));
        assert_eq!(RoomType::parse("spaceship"), None);
        for rt in RoomType::ALL {
            assert_eq!(RoomType::parse(rt.as_str()), Some(rt));
        }
    }

    #[test]
    fn test_room_type_predicates() {
        assert!(RoomType::Kitchen.is_wet());
        assert!(!RoomType::Laundry.is_wet());
        assert!(RoomType::Elevator.is_shaft());
        assert!(RoomType::Corridor.is_circulation());
        assert!(!RoomType::Lobby.is_circulation());
    }

    #[test]
    fn test_building_type_kebab_case() {
        let json = serde_json::to_string(&BuildingType::MixedUse).unwrap();
        assert_eq!(json, "\"mixed-use\"");
        assert_eq!(BuildingType::parse("mixed_use"), Some(BuildingType::MixedUse));
    }

    #[test]
    fn test_room_json_uses_type_key() {
        let room = Room::new(
            "f0-kitchen",
            "Kitchen",
            RoomType::Kitchen,
            Rect::new(1.0, 2.0, 10.0, 8.0),
        );
        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["type"], "kitchen");
        assert_eq!(value["width"], 10.0);
    }

    #[test]
    fn test_flat_lookup() {
        let floor = Floor {
            floor: 1,
            label: "Floor 1".into(),
            rooms: vec![
                Room::new("a", "A", RoomType::Living, Rect::new(0.0, 0.0, 5.0, 5.0)),
                Room::new("b", "B", RoomType::Corridor, Rect::new(0.0, 5.0, 5.0, 3.0)),
            ],
            flats: vec![Flat {
                flat_id: "f1-flat1".into(),
                label: "Flat 1".into(),
                rooms: vec!["a".into()],
            }],
        };
        assert_eq!(floor.flat_of("a").map(|f| f.flat_id.as_str()), Some("f1-flat1"));
        assert!(floor.flat_of("b").is_none());
        assert_eq!(floor.corridor().map(|r| r.id.as_str()), Some("b"));
    }
}
