//! Building parameters and their validation.
//!
//! The surrounding wizard collects these values; this module holds the data
//! model and the checks that gate layout generation, independent of any UI.
//!
//! ```
//! use plangen_logic::model::BuildingType;
//! use plangen_logic::params::{validate_params, BuildingParams};
//!
//! let params = BuildingParams::new(40.0, 30.0, 1, BuildingType::House);
//! assert!(validate_params(&params).is_empty());
//!
//! let from_area = BuildingParams::from_area(2000.0, 2, BuildingType::Apartment);
//! assert_eq!(from_area.width, 53.7);
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::round1;
use crate::model::BuildingType;

pub const MIN_WIDTH_FT: f64 = 24.0;
pub const MIN_DEPTH_FT: f64 = 16.0;
pub const MAX_SIDE_FT: f64 = 1000.0;
pub const MAX_FLOORS: u32 = 50;
pub const MAX_WATER_TANKS: u32 = 10;

/// Site utilities that shape the building-level records (tanks, supply lines).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utilities {
    pub water_tanks: u32,
    pub water_supply: String,
}

impl Default for Utilities {
    fn default() -> Self {
        Self {
            water_tanks: 1,
            water_supply: "municipal".to_string(),
        }
    }
}

/// Prose-only hints. Never read by geometry code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteContext {
    pub location: Option<String>,
    pub budget: Option<f64>,
}

/// Envelope and programme of the building to lay out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingParams {
    /// Plate width in feet (x extent).
    pub width: f64,
    /// Plate depth in feet (y extent).
    pub depth: f64,
    pub floors: u32,
    pub building_type: BuildingType,
    #[serde(default)]
    pub utilities: Utilities,
    #[serde(default)]
    pub context: SiteContext,
}

impl BuildingParams {
    pub fn new(width: f64, depth: f64, floors: u32, building_type: BuildingType) -> Self {
        Self {
            width,
            depth,
            floors,
            building_type,
            utilities: Utilities::default(),
            context: SiteContext::default(),
        }
    }

    /// Derive a plate from a per-floor area: the plate is 1.2× wider than a
    /// square of the same area, rounded to tenths of a foot.
    pub fn from_area(area_sqft: f64, floors: u32, building_type: BuildingType) -> Self {
        let width = round1(area_sqft.max(0.0).sqrt() * 1.2);
        let depth = if width > 0.0 {
            round1(area_sqft / width)
        } else {
            0.0
        };
        Self::new(width, depth, floors, building_type)
    }

    pub fn with_context(mut self, context: SiteContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_utilities(mut self, utilities: Utilities) -> Self {
        self.utilities = utilities;
        self
    }

    pub fn plate_area(&self) -> f64 {
        self.width * self.depth
    }
}

/// Parameter validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("width {0} ft is below the 24 ft minimum")]
    WidthTooSmall(f64),
    #[error("depth {0} ft is below the 16 ft minimum")]
    DepthTooSmall(f64),
    #[error("{0} ft exceeds the 1000 ft maximum side length")]
    SideTooLarge(f64),
    #[error("floor count {0} is outside 1..=50")]
    InvalidFloorCount(u32),
    #[error("{0} water tanks exceeds the maximum of 10")]
    TooManyTanks(u32),
    #[error("dimension is not a finite number")]
    NotFinite,
}

/// Validate building parameters, returning all errors found.
pub fn validate_params(params: &BuildingParams) -> Vec<ParamsError> {
    let mut errors = Vec::new();

    if !params.width.is_finite() || !params.depth.is_finite() {
        errors.push(ParamsError::NotFinite);
        return errors;
    }
    if params.width < MIN_WIDTH_FT {
        errors.push(ParamsError::WidthTooSmall(params.width));
    }
    if params.depth < MIN_DEPTH_FT {
        errors.push(ParamsError::DepthTooSmall(params.depth));
    }
    for side in [params.width, params.depth] {
        if side > MAX_SIDE_FT {
            errors.push(ParamsError::SideTooLarge(side));
        }
    }
    if params.floors == 0 || params.floors > MAX_FLOORS {
        errors.push(ParamsError::InvalidFloorCount(params.floors));
    }
    if params.utilities.water_tanks > MAX_WATER_TANKS {
        errors.push(ParamsError::TooManyTanks(params.utilities.water_tanks));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_house_is_valid() {
        let params = BuildingParams::new(40.0, 30.0, 1, BuildingType::House);
        assert!(validate_params(&params).is_empty());
    }

    #[test]
    fn test_from_area_matches_plate_rule() {
        let p = BuildingParams::from_area(2000.0, 2, BuildingType::Residential);
        // sqrt(2000) = 44.72 → ×1.2 = 53.66 → 53.7; 2000 / 53.7 = 37.24 → 37.2
        assert_eq!(p.width, 53.7);
        assert_eq!(p.depth, 37.2);
        assert_eq!(p.floors, 2);
        assert!(validate_params(&p).is_empty());
    }

    #[test]
    fn test_tiny_area_is_rejected() {
        let p = BuildingParams::from_area(100.0, 1, BuildingType::House);
        let errors = validate_params(&p);
        assert!(errors.contains(&ParamsError::WidthTooSmall(12.0)));
    }

    #[test]
    fn test_floor_count_bounds() {
        let mut p = BuildingParams::new(40.0, 30.0, 0, BuildingType::House);
        assert!(validate_params(&p).contains(&ParamsError::InvalidFloorCount(0)));
        p.floors = 51;
        assert!(validate_params(&p).contains(&ParamsError::InvalidFloorCount(51)));
        p.floors = 50;
        assert!(validate_params(&p).is_empty());
    }

    #[test]
    fn test_oversized_and_non_finite() {
        let p = BuildingParams::new(1200.0, 30.0, 1, BuildingType::Commercial);
        assert!(validate_params(&p).contains(&ParamsError::SideTooLarge(1200.0)));
        let p = BuildingParams::new(f64::NAN, 30.0, 1, BuildingType::Commercial);
        assert_eq!(validate_params(&p), vec![ParamsError::NotFinite]);
    }

    #[test]
    fn test_too_many_tanks() {
        let p = BuildingParams::new(40.0, 30.0, 1, BuildingType::House).with_utilities(
            Utilities {
                water_tanks: 11,
                water_supply: "borewell".into(),
            },
        );
        assert_eq!(validate_params(&p), vec![ParamsError::TooManyTanks(11)]);
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let p: BuildingParams = serde_json::from_str(
            r#"{"width": 60, "depth": 40, "floors": 3, "building_type": "apartment"}"#,
        )
        .unwrap();
        assert_eq!(p.building_type, BuildingType::Apartment);
        assert_eq!(p.utilities, Utilities::default());
        assert!(p.context.location.is_none());
    }
}
