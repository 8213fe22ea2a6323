//! PlanGen headless harness
//!
//! Runs the layout pipeline entirely in-process: no UI, no persistence.
//! `sweep` re-checks the layout invariants over a fixed parameter grid;
//! `render` plans one building and writes SVG, PNG or JSON.
//!
//! Usage:
//!   cargo run -p plangen-simtest -- sweep --verbose
//!   cargo run -p plangen-simtest -- render --width 60 --depth 40 --floors 3 \
//!       --type apartment --filter water_connections --out plan.svg

mod sweep;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plangen_logic::export::{export_to_file, ExportFormat, ExportTarget};
use plangen_logic::generation::{
    HttpOracle, LayoutPlanner, LayoutSource, OracleConfig, OracleLayout,
};
use plangen_logic::model::BuildingType;
use plangen_logic::network::{build_electrical, build_plumbing, ElecNodeKind, PipeNodeKind};
use plangen_logic::params::{BuildingParams, SiteContext, Utilities};
use plangen_logic::projection::{
    project, project_wireframe, ComponentFilter, ProjectionConfig, ViewRequest, WireframeConfig,
};

/// PlanGen headless harness
#[derive(Parser)]
#[command(name = "plangen-simtest")]
#[command(about = "Invariant sweeps and plan rendering for PlanGen", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check layout invariants over a fixed grid of building parameters
    Sweep {
        /// Print every case, not just failures
        #[arg(long)]
        verbose: bool,
    },

    /// Plan one building and write a drawing or the blueprint
    Render(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Plate width in feet
    #[arg(long, requires = "depth")]
    width: Option<f64>,

    /// Plate depth in feet
    #[arg(long, requires = "width")]
    depth: Option<f64>,

    /// Floor area in square feet (instead of width and depth)
    #[arg(long, conflicts_with_all = ["width", "depth"])]
    area: Option<f64>,

    #[arg(long, default_value_t = 1)]
    floors: u32,

    /// house, residential, apartment, commercial or mixed-use
    #[arg(long = "type", default_value = "house", value_parser = parse_building_type)]
    building_type: BuildingType,

    /// Component filter, e.g. all, floors, single_flat, water_connections
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    filter: ComponentFilter,

    /// Floor to draw (-1 for every floor)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    floor: i32,

    /// Flat index for single_flat (-1 for the first flat)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    flat: i32,

    /// svg, png or json; defaults to the output file's extension
    #[arg(long, value_parser = parse_format)]
    format: Option<ExportFormat>,

    /// Output file
    #[arg(long, short)]
    out: PathBuf,

    /// Projection config JSON (scale, margins, palette)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ask the layout oracle first (needs OPENAI_API_KEY)
    #[arg(long)]
    oracle: bool,

    /// Draw the 3D isometric wireframe instead of the plan
    #[arg(long)]
    wireframe: bool,

    #[arg(long)]
    water_tanks: Option<u32>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    budget: Option<f64>,
}

fn parse_building_type(s: &str) -> Result<BuildingType, String> {
    BuildingType::parse(s).ok_or_else(|| format!("unknown building type '{s}'"))
}

fn parse_filter(s: &str) -> Result<ComponentFilter, String> {
    ComponentFilter::parse(s).ok_or_else(|| format!("unknown component filter '{s}'"))
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(s).ok_or_else(|| format!("unknown export format '{s}'"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sweep { verbose } => {
            if !run_sweep(verbose) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Render(args) => render(&args),
    }
}

fn run_sweep(verbose: bool) -> bool {
    println!("=== PlanGen Layout Harness ===\n");
    let results = sweep::run(verbose);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );
    failed == 0
}

fn building_params(args: &RenderArgs) -> Result<BuildingParams> {
    let mut params = match (args.area, args.width, args.depth) {
        (Some(area), _, _) => BuildingParams::from_area(area, args.floors, args.building_type),
        (None, Some(w), Some(d)) => BuildingParams::new(w, d, args.floors, args.building_type),
        _ => bail!("give either --area or both --width and --depth"),
    };
    if let Some(tanks) = args.water_tanks {
        params = params.with_utilities(Utilities {
            water_tanks: tanks,
            ..Utilities::default()
        });
    }
    Ok(params.with_context(SiteContext {
        location: args.location.clone(),
        budget: args.budget,
    }))
}

fn planner(use_oracle: bool) -> Result<LayoutPlanner> {
    if !use_oracle {
        return Ok(LayoutPlanner::procedural());
    }
    match OracleConfig::from_env() {
        Some(config) => {
            tracing::info!(model = %config.model, "layout oracle enabled");
            let oracle = HttpOracle::new(config).context("building oracle client")?;
            Ok(LayoutPlanner::with_primary(OracleLayout::new(oracle)))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY is not set; using the procedural layout");
            Ok(LayoutPlanner::procedural())
        }
    }
}

fn load_projection_config(path: Option<&Path>) -> Result<ProjectionConfig> {
    let Some(path) = path else {
        return Ok(ProjectionConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading projection config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing projection config {}", path.display()))
}

fn render(args: &RenderArgs) -> Result<()> {
    let params = building_params(args)?;
    let format = match args.format.or_else(|| ExportFormat::from_path(&args.out)) {
        Some(format) => format,
        None => bail!(
            "cannot tell the format of {}; pass --format",
            args.out.display()
        ),
    };
    let config = load_projection_config(args.config.as_deref())?;

    let layout = planner(args.oracle)?.plan(&params)?;
    let bp = &layout.blueprint;
    if let Some(reason) = &layout.fallback_reason {
        tracing::warn!(%reason, "oracle layout rejected");
    }

    let plumbing = build_plumbing(bp);
    let electrical = build_electrical(bp);
    println!(
        "{} layout: {} floor(s), {} rooms, {} flats",
        match layout.source {
            LayoutSource::Oracle => "oracle",
            LayoutSource::Procedural => "procedural",
        },
        bp.floors.len(),
        bp.room_count(),
        bp.floors.iter().map(|f| f.flats.len()).sum::<usize>()
    );
    println!(
        "plumbing: {} fixtures, {} segments; electrical: {} outlets, {} segments",
        plumbing.nodes_of_kind(PipeNodeKind::Endpoint).count(),
        plumbing.segments.len(),
        electrical.nodes_of_kind(ElecNodeKind::Endpoint).count(),
        electrical.segments.len()
    );
    println!("{}", bp.overview);

    if format == ExportFormat::Json {
        export_to_file(ExportTarget::Blueprint(bp), &args.out, format)?;
    } else {
        let drawing = if args.wireframe {
            project_wireframe(bp, &WireframeConfig::default(), &config.palette)
        } else {
            let request = ViewRequest::from_indices(args.filter, args.floor, args.flat);
            project(bp, &request, &config)
        };
        tracing::info!(
            elements = drawing.elements.len(),
            width = drawing.width,
            height = drawing.height,
            "drawing projected"
        );
        export_to_file(ExportTarget::Drawing(&drawing), &args.out, format)?;
    }
    println!("wrote {}", args.out.display());
    Ok(())
}
