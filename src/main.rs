extern crate log;
pub mod choropleth;
pub mod config;
pub mod error;
pub mod geodata;
use crate::choropleth::events::LayerEvent;
use crate::choropleth::layer::ChoroplethLayer;
use crate::choropleth::metrics::{DecimalFormatter, MetricRow};
use crate::choropleth::render::render_feature_collection;
use crate::config::Config;
use crate::geodata::fetch::DefaultFetcher;
use crate::geodata::loader::LoadStatus;
use anyhow::anyhow;
use clap::Parser;
use std::sync::Arc;
use std::{fs::read_to_string, path::Path};

/// Join metric rows onto geographic shapes and write a styled choropleth layer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: String,
}

fn read_metrics(filepath: &Path) -> anyhow::Result<Vec<MetricRow>> {
    if !filepath.exists() {
        return Err(anyhow!("Metrics file {:?} not found", filepath));
    }
    let contents = read_to_string(filepath)?;
    Ok(serde_yaml::from_str(&contents)?)
}

fn try_main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();

    let args = Args::try_parse()?;
    if !Path::new(&args.config_filepath).exists() {
        return Err(anyhow!("Config file {} not found", &args.config_filepath));
    }
    let config_contents = read_to_string(args.config_filepath)?;
    let config: Config = serde_yaml::from_str(&config_contents)?;

    let mut layer = ChoroplethLayer::new(
        config.layer.source(),
        config.layer.show_all_shapes,
        config.layer.color_ramp()?,
        config.layer.line_weight,
        Arc::new(DecimalFormatter {
            precision: config.value_precision,
        }),
    );
    let events = layer.subscribe();

    if let LoadStatus::Failed(message) = layer.load(&DefaultFetcher::new()) {
        log::warn!("Continuing without shapes: {}", message);
    }

    let metrics = read_metrics(&config.metrics_filepath)?;
    log::info!("Read {} metric rows", metrics.len());
    layer.set_join_field(&config.layer.join_field);
    layer.set_metrics(metrics);

    if let Some(legend) = layer.legend() {
        for swatch in &legend.swatches {
            log::info!("Legend {} {}", swatch.color, swatch.label);
        }
    }
    if let Some(bounds) = layer.bounds() {
        log::info!("Layer bounds {:?} to {:?}", bounds.min(), bounds.max());
    }

    for [x, y] in &config.probe_points {
        layer.pointer_moved(geo::Coord { x: *x, y: *y });
    }
    for event in events.try_iter() {
        match event {
            LayerEvent::ShowTooltip { content, position } => {
                log::info!("Tooltip at {:?}: {}", position, content)
            }
            LayerEvent::HideTooltip => log::info!("No data under probe point"),
            LayerEvent::StyleChanged { unmatched_terms } => log::info!(
                "Style updated, {} unmatched terms",
                unmatched_terms.len()
            ),
            LayerEvent::Select { term } => log::info!("Selected {}", term),
        }
    }

    log::info!("Writing styled layer to {:?}", &config.output_filepath);
    geodata::geojson::write_feature_collection_to_geojson(
        render_feature_collection(&layer),
        &config.output_filepath,
    )?;
    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
