//! Building-level records derived from a laid-out blueprint.
//!
//! Corridor bands, terrace, roof, water tanks, the logical supply lines and
//! the summary text. Both layout strategies run this after placing rooms, so
//! the records always describe the rooms actually in the blueprint.

use crate::geometry::round1;
use crate::model::{
    Blueprint, ComponentCount, CorridorBand, ElectricalLine, Roof, Terrace, WaterLine, WaterTank,
};
use crate::params::BuildingParams;

const BASE_TANK_LITRES: u32 = 1000;
const TANK_STEP_LITRES: u32 = 500;
const TANK_STEP_SQFT: f64 = 500.0;

/// Tank capacity in litres for a plate of `area_sqft`.
pub fn tank_capacity(area_sqft: f64) -> u32 {
    BASE_TANK_LITRES + (area_sqft / TANK_STEP_SQFT).floor().max(0.0) as u32 * TANK_STEP_LITRES
}

fn electrical_lines() -> Vec<ElectricalLine> {
    [
        ("main-supply", "3-phase", "meter", "DB"),
        ("lighting", "single-phase", "DB", "all-rooms"),
        ("power", "3-phase", "DB", "heavy-appliances"),
    ]
    .into_iter()
    .map(|(id, line_type, from, to)| ElectricalLine {
        id: id.to_string(),
        line_type: line_type.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    })
    .collect()
}

fn water_lines(supply: &str) -> Vec<WaterLine> {
    [
        ("main-inlet", supply, "overhead-tank"),
        ("distribution", "overhead-tank", "all-flats"),
        ("drainage", "all-flats", "septic/sewer"),
    ]
    .into_iter()
    .map(|(id, from, to)| WaterLine {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    })
    .collect()
}

fn count(component: &str, count: usize) -> ComponentCount {
    ComponentCount {
        component: component.to_string(),
        count: count as u32,
    }
}

/// Fill in every building-level record of `blueprint`. Replaces whatever was
/// there before.
pub fn attach_envelope(blueprint: &mut Blueprint, params: &BuildingParams) {
    let area = round1(blueprint.width * blueprint.depth);
    let floor_count = blueprint.floors.len();

    blueprint.corridors = blueprint
        .floors
        .iter()
        .filter_map(|f| {
            f.corridor().map(|c| CorridorBand {
                floor: f.floor,
                y: c.y,
                height: c.height,
            })
        })
        .collect();

    blueprint.terrace = Some(Terrace {
        area_sqft: area,
        has_railing: true,
        water_proofing: true,
    });
    blueprint.roof = Some(Roof {
        roof_type: if floor_count > 1 {
            "RCC flat roof".to_string()
        } else {
            "Sloped roof".to_string()
        },
        area_sqft: area,
    });

    let capacity = tank_capacity(area);
    blueprint.water_tanks = (0..params.utilities.water_tanks)
        .map(|i| WaterTank {
            id: format!("tank-{}", i + 1),
            capacity_litres: capacity,
            location: if i % 2 == 0 { "terrace" } else { "underground" }.to_string(),
        })
        .collect();

    blueprint.electrical_lines = electrical_lines();
    blueprint.water_lines = water_lines(&params.utilities.water_supply);

    let flats_per_floor = blueprint
        .floors
        .iter()
        .map(|f| f.flats.len())
        .max()
        .unwrap_or(0);
    let total_flats: usize = blueprint.floors.iter().map(|f| f.flats.len()).sum();
    let total_rooms = blueprint.room_count();
    let wet_rooms = blueprint
        .rooms()
        .filter(|(_, r)| r.room_type.is_wet())
        .count();
    let tanks = blueprint.water_tanks.len();

    let mut overview = format!(
        "{}-floor {} building, {}ft x {}ft ({} sq ft per floor). {} total rooms across all floors",
        floor_count,
        blueprint.building_type,
        blueprint.width.round(),
        blueprint.depth.round(),
        area.round(),
        total_rooms,
    );
    if total_flats > 0 {
        overview.push_str(&format!(", {total_flats} flats"));
    }
    overview.push_str(&format!(", {wet_rooms} wet rooms and {tanks} water tank(s)."));
    if let Some(location) = &params.context.location {
        overview.push_str(&format!(" Site: {location}."));
    }
    if let Some(budget) = params.context.budget {
        overview.push_str(&format!(" Budget: {budget:.0}."));
    }
    blueprint.overview = overview;

    blueprint.component_breakdown = vec![
        count("Floors", floor_count),
        count("Flats per floor", flats_per_floor),
        count("Total flats", total_flats),
        count("Total rooms", total_rooms),
        count("Water tanks", tanks),
        count("Wet rooms", wet_rooms),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProceduralLayout;
    use crate::model::BuildingType;
    use crate::params::{SiteContext, Utilities};

    fn floors_only(params: &BuildingParams) -> Blueprint {
        let floors = ProceduralLayout.floors(
            params.width,
            params.depth,
            params.floors,
            params.building_type,
        );
        Blueprint::new(params.width, params.depth, params.building_type, floors)
    }

    #[test]
    fn test_tank_capacity_steps() {
        assert_eq!(tank_capacity(499.0), 1000);
        assert_eq!(tank_capacity(500.0), 1500);
        assert_eq!(tank_capacity(2400.0), 3000);
    }

    #[test]
    fn test_envelope_for_apartment() {
        let params = BuildingParams::new(60.0, 40.0, 3, BuildingType::Apartment).with_utilities(
            Utilities {
                water_tanks: 3,
                water_supply: "borewell".into(),
            },
        );
        let mut bp = floors_only(&params);
        attach_envelope(&mut bp, &params);

        assert_eq!(bp.corridors.len(), 3);
        assert_eq!(bp.corridors[2].y, 18.0);
        assert_eq!(bp.roof.as_ref().unwrap().roof_type, "RCC flat roof");
        assert_eq!(bp.terrace.as_ref().unwrap().area_sqft, 2400.0);
        let locations: Vec<_> = bp.water_tanks.iter().map(|t| t.location.as_str()).collect();
        assert_eq!(locations, vec!["terrace", "underground", "terrace"]);
        assert_eq!(bp.water_tanks[0].id, "tank-1");
        assert_eq!(bp.water_lines[0].from, "borewell");
        assert_eq!(bp.electrical_lines[0].line_type, "3-phase");

        let breakdown: Vec<_> = bp
            .component_breakdown
            .iter()
            .map(|c| (c.component.as_str(), c.count))
            .collect();
        assert!(breakdown.contains(&("Floors", 3)));
        assert!(breakdown.contains(&("Flats per floor", 2)));
        assert!(breakdown.contains(&("Total flats", 4)));
        assert!(breakdown.contains(&("Wet rooms", 8)));
        assert!(bp.overview.starts_with("3-floor apartment building, 60ft x 40ft"));
    }

    #[test]
    fn test_single_floor_roof_and_context() {
        let params = BuildingParams::new(40.0, 30.0, 1, BuildingType::House).with_context(
            SiteContext {
                location: Some("Pune".into()),
                budget: Some(2_500_000.0),
            },
        );
        let mut bp = floors_only(&params);
        attach_envelope(&mut bp, &params);
        assert_eq!(bp.roof.unwrap().roof_type, "Sloped roof");
        assert!(bp.overview.contains("Site: Pune."));
        assert!(bp.overview.contains("Budget: 2500000."));
        assert!(!bp.overview.contains("flats"));
    }
}
