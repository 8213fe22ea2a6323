//! Layout generation.
//!
//! Two-stage pipeline behind a single capability:
//!   1. primary strategy (usually the oracle) -- one attempt, validated
//!   2. procedural fallback                   -- deterministic, validated
//!
//! `LayoutPlanner` is the only place that knows about the fallback. The
//! strategies themselves just produce a `Blueprint` or fail.

pub mod envelope;
pub mod oracle;
pub mod procedural;

pub use envelope::attach_envelope;
pub use oracle::{HttpOracle, LayoutOracle, OracleConfig, OracleError, OracleLayout};
pub use procedural::{PlateFrame, ProceduralLayout};

use crate::model::Blueprint;
use crate::params::{validate_params, BuildingParams, ParamsError};
use crate::validation::{validate, ValidationError};

/// Why a layout could not be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout generation failed: {0}")]
    GenerationFailed(String),
    #[error("generated layout is invalid: {0}")]
    Invalid(#[from] ValidationError),
    #[error("invalid building parameters: {}", join_params(.0))]
    Params(Vec<ParamsError>),
}

fn join_params(errors: &[ParamsError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<OracleError> for LayoutError {
    fn from(err: OracleError) -> Self {
        LayoutError::GenerationFailed(err.to_string())
    }
}

/// A way of turning building parameters into a blueprint.
pub trait LayoutStrategy {
    fn name(&self) -> &'static str;
    fn generate(&self, params: &BuildingParams) -> Result<Blueprint, LayoutError>;
}

/// Which strategy produced a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    Oracle,
    Procedural,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLayout {
    pub blueprint: Blueprint,
    pub source: LayoutSource,
    /// Set when a primary strategy was tried and rejected.
    pub fallback_reason: Option<String>,
}

/// Runs the primary strategy once and falls back to the procedural one.
pub struct LayoutPlanner {
    primary: Option<Box<dyn LayoutStrategy>>,
    fallback: ProceduralLayout,
}

impl Default for LayoutPlanner {
    fn default() -> Self {
        Self::procedural()
    }
}

impl LayoutPlanner {
    /// Planner with no primary strategy.
    pub fn procedural() -> Self {
        Self {
            primary: None,
            fallback: ProceduralLayout,
        }
    }

    pub fn with_primary(strategy: impl LayoutStrategy + 'static) -> Self {
        Self {
            primary: Some(Box::new(strategy)),
            fallback: ProceduralLayout,
        }
    }

    pub fn primary_name(&self) -> Option<&'static str> {
        self.primary.as_ref().map(|s| s.name())
    }

    pub fn plan(&self, params: &BuildingParams) -> Result<GeneratedLayout, LayoutError> {
        let errors = validate_params(params);
        if !errors.is_empty() {
            return Err(LayoutError::Params(errors));
        }
        log::info!(
            "Layout request: {} {}×{} ft, {} floor(s), {:.0} sq ft per floor",
            params.building_type,
            params.width,
            params.depth,
            params.floors,
            params.plate_area()
        );

        let mut fallback_reason = None;
        if let Some(primary) = &self.primary {
            match primary
                .generate(params)
                .and_then(|bp| validate(bp).map_err(LayoutError::from))
            {
                Ok(blueprint) => {
                    log::info!(
                        "{} layout accepted: {} rooms",
                        primary.name(),
                        blueprint.room_count()
                    );
                    return Ok(GeneratedLayout {
                        blueprint,
                        source: LayoutSource::Oracle,
                        fallback_reason: None,
                    });
                }
                Err(err) => {
                    log::warn!(
                        "{} layout rejected, falling back to procedural: {}",
                        primary.name(),
                        err
                    );
                    fallback_reason = Some(err.to_string());
                }
            }
        }

        let blueprint = validate(self.fallback.generate(params)?)?;
        log::info!("Procedural layout: {} rooms", blueprint.room_count());
        Ok(GeneratedLayout {
            blueprint,
            source: LayoutSource::Procedural,
            fallback_reason,
        })
    }
}

/// Display label of a floor index.
pub fn floor_label(floor: u32) -> String {
    if floor == 0 {
        "Ground Floor".to_string()
    } else {
        format!("Floor {floor}")
    }
}
