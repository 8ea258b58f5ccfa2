use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use formats::{RawGeometrySource, WktOptions, parse_wkt_polygon};
use foundation::{AxisOrder, LngLat};
use ingest::{Pipeline, PipelineConfig, scenarios_by_polygon};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Brownfield parcel geometry pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Input JSON file
    input: PathBuf,

    /// Pipeline configuration (JSON); defaults to S-JTSK input
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Emit renderer GeoJSON instead of the feature set
    #[arg(long)]
    renderer: bool,

    /// Add FAR development scenarios per polygon
    #[arg(long)]
    scenarios: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a GeoJSON FeatureCollection or GeometryCollection in grid metres
    Geojson(IngestArgs),

    /// Ingest a JSON array of site records with `points` or WKT `shape`
    Records(IngestArgs),

    /// Parse one WKT polygon and print its outer ring
    Wkt {
        text: String,

        /// Output pair order: lnglat or latlng
        #[arg(long, default_value = "lnglat")]
        order: AxisOrder,

        /// Keep a closing pair identical to the first
        #[arg(long)]
        keep_closing: bool,
    },

    /// Geographic WGS84 position to grid [x, y]
    #[command(allow_negative_numbers = true)]
    Project {
        lat: f64,
        lng: f64,
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grid [x, y] to geographic WGS84 [lng, lat]
    #[command(allow_negative_numbers = true)]
    Unproject {
        x: f64,
        y: f64,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SourceKind {
    GeoJson,
    Records,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Geojson(args) => ingest(SourceKind::GeoJson, &args),
        Command::Records(args) => ingest(SourceKind::Records, &args),
        Command::Wkt {
            text,
            order,
            keep_closing,
        } => {
            let ring = parse_wkt_polygon(
                &text,
                WktOptions {
                    order,
                    dedupe: !keep_closing,
                },
            )?;
            println!("{}", serde_json::to_string(&ring)?);
            Ok(())
        }
        Command::Project { lat, lng, config } => {
            let pipeline = Pipeline::new(load_config(config.as_deref())?);
            let xy = pipeline.reprojector().try_project(LngLat::new(lng, lat))?;
            println!("{}", serde_json::to_string(&xy)?);
            Ok(())
        }
        Command::Unproject { x, y, config } => {
            let pipeline = Pipeline::new(load_config(config.as_deref())?);
            let geo = pipeline.reprojector().try_reproject([x, y])?;
            println!("{}", serde_json::to_string(&geo)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    })
}

fn ingest(kind: SourceKind, args: &IngestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(load_config(args.config.as_deref())?);

    let text = fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read {}: {e}", args.input.display()))?;
    let source = RawGeometrySource::from_json_str(&text)?;
    match (kind, &source) {
        (SourceKind::GeoJson, RawGeometrySource::GeoJson(_))
        | (SourceKind::Records, RawGeometrySource::Records(_) | RawGeometrySource::Wkt(_)) => {}
        (SourceKind::GeoJson, RawGeometrySource::Records(_) | RawGeometrySource::Wkt(_)) => {
            return Err("input is a record array or WKT; use `brownfield records`".into());
        }
        (SourceKind::Records, RawGeometrySource::GeoJson(_)) => {
            return Err("input is GeoJSON; use `brownfield geojson`".into());
        }
    }

    let polygons = pipeline.normalize_source(source)?;
    let set = pipeline.assemble(&polygons);
    info!(
        input = %args.input.display(),
        features = set.styled_features.len(),
        markers = set.markers.len(),
        "assembled"
    );

    let mut out: Value = if args.renderer {
        set.to_geojson()
    } else {
        serde_json::to_value(&set)?
    };
    if args.scenarios {
        out["developmentScenarios"] = serde_json::to_value(scenarios_by_polygon(&polygons))?;
    }

    let rendered = serde_json::to_string_pretty(&out)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
            eprintln!(
                "wrote {} ({} features)",
                path.display(),
                set.styled_features.len()
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
