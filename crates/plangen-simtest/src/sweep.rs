//! Invariant sweep over the procedural generator.

use plangen_logic::generation::oracle::FakeOracle;
use plangen_logic::generation::{
    LayoutError, LayoutPlanner, LayoutSource, OracleError, OracleLayout,
};
use plangen_logic::model::{Blueprint, BuildingType, RoomType};
use plangen_logic::network::{build_electrical, build_plumbing, PipeNodeKind, SegmentClass};
use plangen_logic::params::BuildingParams;
use plangen_logic::projection::{
    project, ComponentFilter, ElementTag, ProjectionConfig, Shape, ViewRequest,
};
use plangen_logic::validation::validate_all;

// ── Test harness ────────────────────────────────────────────────────────

pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

const WIDTHS: [f64; 5] = [24.0, 40.0, 60.0, 90.5, 250.0];
const DEPTHS: [f64; 4] = [16.0, 30.0, 40.0, 77.7];
const FLOORS: [u32; 4] = [1, 2, 3, 7];
const BUILDING_TYPES: [BuildingType; 5] = [
    BuildingType::House,
    BuildingType::Residential,
    BuildingType::Apartment,
    BuildingType::Commercial,
    BuildingType::MixedUse,
];

/// Tally of one check over the whole grid; keeps the first failure.
struct Tally {
    name: &'static str,
    runs: usize,
    first_failure: Option<String>,
}

impl Tally {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            runs: 0,
            first_failure: None,
        }
    }

    fn record(&mut self, case: &str, outcome: Result<(), String>) {
        self.runs += 1;
        if let Err(msg) = outcome {
            if self.first_failure.is_none() {
                self.first_failure = Some(format!("{case}: {msg}"));
            }
        }
    }

    fn finish(self) -> TestResult {
        TestResult {
            name: self.name.into(),
            passed: self.first_failure.is_none(),
            detail: self
                .first_failure
                .unwrap_or_else(|| format!("{} layouts", self.runs)),
        }
    }
}

pub fn run(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    // 1. Generator invariants over the grid
    results.extend(sweep_grid(verbose));

    // 2. Parameter rejection
    results.extend(validate_param_rejection());

    // 3. Oracle fallback
    results.extend(validate_oracle_fallback());

    results
}

// ── 1. Grid sweep ───────────────────────────────────────────────────────

fn sweep_grid(verbose: bool) -> Vec<TestResult> {
    println!("--- Procedural grid ---");
    let planner = LayoutPlanner::procedural();
    let config = ProjectionConfig::default();

    let mut generated = Tally::new("grid_generates");
    let mut valid = Tally::new("grid_validates");
    let mut deterministic = Tally::new("grid_deterministic");
    let mut plumbing = Tally::new("grid_plumbing_paths");
    let mut laterals = Tally::new("grid_lateral_removal");
    let mut electrical = Tally::new("grid_electrical_paths");
    let mut round_trip = Tally::new("grid_projection_round_trip");
    let mut single_flat = Tally::new("grid_single_flat");

    for bt in BUILDING_TYPES {
        for w in WIDTHS {
            for d in DEPTHS {
                for floors in FLOORS {
                    let case = format!("{bt} {w}×{d}×{floors}");
                    let params = BuildingParams::new(w, d, floors, bt);
                    let bp = match planner.plan(&params) {
                        Ok(layout) => layout.blueprint,
                        Err(e) => {
                            generated.record(&case, Err(e.to_string()));
                            continue;
                        }
                    };
                    generated.record(&case, Ok(()));
                    if verbose {
                        println!("  {case}: {} rooms", bp.room_count());
                    }

                    valid.record(&case, check_valid(&bp));
                    deterministic.record(&case, check_deterministic(&planner, &params, &bp));
                    plumbing.record(&case, check_plumbing(&bp));
                    laterals.record(&case, check_lateral_removal(&bp));
                    electrical.record(&case, check_electrical(&bp));
                    round_trip.record(&case, check_round_trip(&bp, &config));
                    single_flat.record(&case, check_single_flat(&bp, &config));
                }
            }
        }
    }

    vec![
        generated.finish(),
        valid.finish(),
        deterministic.finish(),
        plumbing.finish(),
        laterals.finish(),
        electrical.finish(),
        round_trip.finish(),
        single_flat.finish(),
    ]
}

fn check_valid(bp: &Blueprint) -> Result<(), String> {
    match validate_all(bp).into_iter().next() {
        Some(err) => Err(err.to_string()),
        None => Ok(()),
    }
}

fn check_deterministic(
    planner: &LayoutPlanner,
    params: &BuildingParams,
    bp: &Blueprint,
) -> Result<(), String> {
    let again = planner.plan(params).map_err(|e| e.to_string())?;
    if &again.blueprint == bp {
        Ok(())
    } else {
        Err("second run differs".into())
    }
}

fn check_plumbing(bp: &Blueprint) -> Result<(), String> {
    let net = build_plumbing(bp);
    if !net.is_tree() {
        return Err("plumbing graph is not a tree".into());
    }
    let tank = net.find("tank").ok_or("no tank node")?;
    let drain = net.find("drain").ok_or("no drain node")?;
    for (floor, room) in bp.rooms().filter(|(_, r)| r.room_type.is_wet()) {
        let ep = net
            .endpoint_for_room(floor.floor, &room.id)
            .ok_or_else(|| format!("{} has no endpoint", room.id))?;
        for (target, what) in [(tank, "tank"), (drain, "drain")] {
            let paths = net.count_paths(ep, target);
            if paths != 1 {
                return Err(format!("{} has {paths} paths to the {what}", room.id));
            }
        }
    }
    Ok(())
}

fn check_lateral_removal(bp: &Blueprint) -> Result<(), String> {
    let net = build_plumbing(bp);
    let tank = net.find("tank").ok_or("no tank node")?;
    let endpoints: Vec<_> = net.nodes_of_kind(PipeNodeKind::Endpoint).collect();
    for lateral in net.segments_of_class(SegmentClass::Lateral) {
        let reach = net.without_segment(lateral).reachable(tank);
        let lost = endpoints.iter().filter(|&&e| !reach[e]).count();
        if lost != 1 {
            return Err(format!("removing lateral {lateral} cut {lost} endpoints"));
        }
    }
    Ok(())
}

fn check_electrical(bp: &Blueprint) -> Result<(), String> {
    let net = build_electrical(bp);
    let meter = net.find("meter").ok_or("no meter node")?;
    for (floor, room) in bp.rooms().filter(|(_, r)| !r.room_type.is_circulation()) {
        let ep = net
            .endpoint_for_room(floor.floor, &room.id)
            .ok_or_else(|| format!("{} is not wired", room.id))?;
        let paths = net.count_paths(ep, meter);
        if paths != 1 {
            return Err(format!("{} has {paths} paths to the meter", room.id));
        }
    }
    Ok(())
}

fn check_round_trip(bp: &Blueprint, config: &ProjectionConfig) -> Result<(), String> {
    let drawing = project(bp, &ViewRequest::new(ComponentFilter::All), config);
    for floor in &bp.floors {
        let id = format!("floor-{}", floor.floor);
        let Some(Shape::Rect { width, height, .. }) = drawing.element(&id).map(|e| &e.shape)
        else {
            return Err(format!("{id} missing"));
        };
        let (w, d) = (width / config.scale, height / config.scale);
        if (w - bp.width).abs() > 1e-6 || (d - bp.depth).abs() > 1e-6 {
            return Err(format!("{id} maps back to {w}×{d}"));
        }
    }
    Ok(())
}

fn check_single_flat(bp: &Blueprint, config: &ProjectionConfig) -> Result<(), String> {
    let drawing = project(bp, &ViewRequest::new(ComponentFilter::SingleFlat), config);
    for element in drawing.with_tag(ElementTag::Room) {
        let in_first_flat = bp
            .floors
            .iter()
            .filter_map(|f| f.flats.first())
            .any(|flat| flat.contains(&element.id));
        if !in_first_flat {
            return Err(format!("{} drawn outside flat 0", element.id));
        }
    }
    Ok(())
}

// ── 2. Parameter rejection ──────────────────────────────────────────────

fn validate_param_rejection() -> Vec<TestResult> {
    println!("--- Parameters ---");
    let planner = LayoutPlanner::procedural();
    let cases = [
        ("params_narrow", BuildingParams::new(20.0, 30.0, 1, BuildingType::House)),
        ("params_shallow", BuildingParams::new(40.0, 10.0, 1, BuildingType::House)),
        ("params_zero_floors", BuildingParams::new(40.0, 30.0, 0, BuildingType::House)),
        ("params_too_tall", BuildingParams::new(40.0, 30.0, 51, BuildingType::Apartment)),
        ("params_nan", BuildingParams::new(f64::NAN, 30.0, 1, BuildingType::House)),
    ];
    cases
        .into_iter()
        .map(|(name, params)| {
            let outcome = planner.plan(&params);
            TestResult {
                name: name.into(),
                passed: matches!(outcome, Err(LayoutError::Params(_))),
                detail: match outcome {
                    Err(e) => e.to_string(),
                    Ok(_) => "accepted".into(),
                },
            }
        })
        .collect()
}

// ── 3. Oracle fallback ──────────────────────────────────────────────────

fn validate_oracle_fallback() -> Vec<TestResult> {
    println!("--- Oracle fallback ---");
    let mut results = Vec::new();
    let params = BuildingParams::new(60.0, 40.0, 3, BuildingType::Apartment);

    let failing = LayoutPlanner::with_primary(OracleLayout::new(FakeOracle::failing(
        OracleError::Timeout(30),
    )));
    let outcome = failing.plan(&params);
    results.push(TestResult {
        name: "oracle_timeout_falls_back".into(),
        passed: matches!(&outcome, Ok(l) if l.source == LayoutSource::Procedural),
        detail: match &outcome {
            Ok(l) => l.fallback_reason.clone().unwrap_or_default(),
            Err(e) => e.to_string(),
        },
    });

    // stair on floor 1 shifted one foot: shafts misaligned
    let misaligned = r#"{"floors": [
        {"rooms": [{"id": "s0", "type": "staircase", "x": 0, "y": 0, "width": 6, "height": 6},
                   {"id": "e0", "type": "elevator", "x": 10, "y": 0, "width": 5, "height": 5}]},
        {"rooms": [{"id": "s1", "type": "staircase", "x": 1, "y": 0, "width": 6, "height": 6},
                   {"id": "e1", "type": "elevator", "x": 10, "y": 0, "width": 5, "height": 5}]},
        {"rooms": [{"id": "s2", "type": "staircase", "x": 0, "y": 0, "width": 6, "height": 6},
                   {"id": "e2", "type": "elevator", "x": 10, "y": 0, "width": 5, "height": 5}]}
    ]}"#;
    let invalid =
        LayoutPlanner::with_primary(OracleLayout::new(FakeOracle::replying(misaligned)));
    let outcome = invalid.plan(&params);
    let ok = matches!(
        &outcome,
        Ok(l) if l.source == LayoutSource::Procedural
            && l.fallback_reason.as_deref().is_some_and(|r| r.contains("shaft"))
    );
    results.push(TestResult {
        name: "oracle_misaligned_shafts_fall_back".into(),
        passed: ok,
        detail: match &outcome {
            Ok(l) => l.fallback_reason.clone().unwrap_or_default(),
            Err(e) => e.to_string(),
        },
    });

    let ground_types = outcome
        .ok()
        .map(|l| {
            l.blueprint.floors[0]
                .rooms
                .iter()
                .filter(|r| r.room_type == RoomType::Parking)
                .count()
        })
        .unwrap_or(0);
    results.push(TestResult {
        name: "oracle_fallback_is_procedural".into(),
        passed: ground_types == 1,
        detail: format!("{ground_types} parking room(s) on the ground floor"),
    });

    results
}
