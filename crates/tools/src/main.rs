mod replay;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use compute::measure::{UnitLabels, area_label, distance_label};
use formats::map_config::MapConfig;
use foundation::geo::{Datum, GeoPoint, LatLng};
use foundation::math::crs::baidu_resolutions;
use layers::annotation::annotation_source;
use layers::config::LayerConfig;
use layers::fetch::{HttpFetcher, LocalAssets};
use layers::orchestrator::LayerOrchestrator;
use runtime::clock::{Clock, SystemClock};
use streaming::baidu::{BaiduKind, BaiduLayerOptions, create_layer, detect_kind, is_baidu_layer};
use streaming::tile::TileCoord;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Map core utilities: datums, Baidu tiles, measurement, layers")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a coordinate between WGS84, GCJ02 and BD09
    Convert {
        #[arg(long, default_value = "wgs84")]
        from: Datum,
        #[arg(long, default_value = "bd09")]
        to: Datum,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },

    /// Print the Baidu resolution ladder (meters per pixel by zoom)
    Resolutions,

    /// Print the Baidu tile URL(s) for a tile address
    TileUrl {
        /// vec, img_d, img_z, custom, time or img
        #[arg(long, default_value = "vec")]
        kind: BaiduKind,
        #[arg(long)]
        z: u8,
        #[arg(long, allow_negative_numbers = true)]
        x: i64,
        #[arg(long, allow_negative_numbers = true)]
        y: i64,
    },

    /// Measure a path or polygon given as `lat,lng` points
    Measure {
        #[command(subcommand)]
        what: MeasureKind,
        #[arg(long, value_enum, default_value_t = Units::Symbols, global = true)]
        units: Units,
    },

    /// Inspect the tile layers of a map config file
    Layers {
        /// Config path; falls back to $MAP_CONFIG
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Feed a JSON script of mode changes and pointer events through a
    /// drawing session and print the exported features
    Replay {
        script: PathBuf,
        #[arg(long, value_enum, default_value_t = Units::Symbols)]
        units: Units,
    },

    /// Resolve a layer config JSON file and summarise the result
    FetchLayer {
        layer: PathBuf,
        /// Directory local-json paths resolve against
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MeasureKind {
    Distance {
        #[arg(required = true, num_args = 2.., allow_negative_numbers = true)]
        points: Vec<String>,
    },
    Area {
        #[arg(required = true, num_args = 3.., allow_negative_numbers = true)]
        points: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Units {
    Symbols,
    Chinese,
}

impl From<Units> for UnitLabels {
    fn from(value: Units) -> Self {
        match value {
            Units::Symbols => UnitLabels::Symbols,
            Units::Chinese => UnitLabels::Chinese,
        }
    }
}

#[tokio::main]
async fn main() -> CliResult {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Convert { from, to, lat, lng } => convert(from, to, lat, lng),
        Command::Resolutions => {
            for (zoom, r) in baidu_resolutions().iter().enumerate() {
                println!("{zoom:>2} {r}");
            }
            Ok(())
        }
        Command::TileUrl { kind, z, x, y } => tile_url(kind, TileCoord::new(z, x, y)),
        Command::Measure { what, units } => measure(what, units.into()),
        Command::Layers { config } => inspect_layers(config),
        Command::Replay { script, units } => {
            let text = fs::read_to_string(&script)
                .map_err(|e| format!("read {}: {e}", script.display()))?;
            let script: replay::Script = serde_json::from_str(&text)?;
            let features = replay::run(&script, units.into());
            println!("{}", serde_json::to_string_pretty(&features)?);
            Ok(())
        }
        Command::FetchLayer { layer, assets } => fetch_layer(layer, assets).await,
    }
}

fn convert(from: Datum, to: Datum, lat: f64, lng: f64) -> CliResult {
    let out = GeoPoint::new(lat, lng, from).to_datum(to);
    let value = json!({ "datum": out.datum, "lat": out.lat, "lng": out.lng });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn tile_url(kind: BaiduKind, coord: TileCoord) -> CliResult {
    let layer = create_layer(&BaiduLayerOptions::new(kind), SystemClock.now());
    for source in layer.sources() {
        println!("{}", source.tile_url(coord)?);
    }
    Ok(())
}

fn parse_point(text: &str) -> Result<LatLng, String> {
    let (lat, lng) = text
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng but got {text:?}"))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| format!("{text:?}: {e}"))?;
    let lng = lng.trim().parse::<f64>().map_err(|e| format!("{text:?}: {e}"))?;
    Ok(LatLng::new(lat, lng))
}

fn measure(what: MeasureKind, labels: UnitLabels) -> CliResult {
    match what {
        MeasureKind::Distance { points } => {
            let points = points.iter().map(|p| parse_point(p)).collect::<Result<Vec<_>, _>>()?;
            println!("{}", distance_label(&points, labels));
        }
        MeasureKind::Area { points } => {
            let points = points.iter().map(|p| parse_point(p)).collect::<Result<Vec<_>, _>>()?;
            println!("{}", area_label(&points, labels));
        }
    }
    Ok(())
}

fn inspect_layers(config: Option<PathBuf>) -> CliResult {
    let path = config
        .or_else(|| env::var_os("MAP_CONFIG").map(PathBuf::from))
        .ok_or("no config given: pass --config or set MAP_CONFIG")?;
    let config = MapConfig::load(&path)?;
    info!("loaded {} tile layers from {}", config.tile_layers.len(), path.display());

    let default_id = config.default_tile_layer().map(|(id, _)| id.to_string());
    let rows: Vec<_> = config
        .tile_layers
        .iter()
        .map(|(id, layer)| {
            let baidu = is_baidu_layer(&layer.name, &layer.url);
            json!({
                "id": id,
                "name": layer.name,
                "default": default_id.as_deref() == Some(id.as_str()),
                "wms": layer.is_wms(),
                "baidu": baidu.then(|| detect_kind(&layer.name, &layer.url).as_str()),
                "annotation": annotation_source(layer).map(|s| s.url_template),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn fetch_layer(path: PathBuf, assets: Option<PathBuf>) -> CliResult {
    let text = fs::read_to_string(&path).map_err(|e| format!("read {}: {e}", path.display()))?;
    let config = LayerConfig::from_json_str(&text)?;

    let mut orchestrator = LayerOrchestrator::new(Arc::new(HttpFetcher::new()));
    if let Some(root) = assets {
        orchestrator = orchestrator.with_assets(LocalAssets::new(root));
    }
    let layer = orchestrator.resolve(&config).await?;
    let summary = json!({
        "id": config.id,
        "protocol": config.source.protocol(),
        "kind": layer.kind_name(),
        "features": layer.feature_count(),
        "sampleTiles": layer.tile_urls(TileCoord::new(0, 0, 0)).unwrap_or_default(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
