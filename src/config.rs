use std::path::PathBuf;

use anyhow::anyhow;
use serde::Deserialize;

use crate::{
    choropleth::color::{ColorRamp, ColorRampName, Rgb},
    geodata::{loader::GeodataSource, request::Credentials},
};

fn default_line_weight() -> f64 {
    1.0
}

fn default_value_precision() -> usize {
    2
}

#[derive(Deserialize, Debug)]
pub struct LayerConfig {
    /// URL or local path of the GeoJSON/TopoJSON document.
    pub url: String,
    /// `geojson` (default) or `topojson`.
    pub format: Option<String>,
    /// Name of the TopoJSON object holding the shapes.
    pub feature_collection_path: Option<String>,
    pub join_field: String,
    #[serde(default)]
    pub show_all_shapes: bool,
    pub color_ramp: Option<ColorRampName>,
    /// Explicit palette, takes precedence over `color_ramp`.
    pub custom_colors: Option<Vec<Rgb>>,
    #[serde(default = "default_line_weight")]
    pub line_weight: f64,
    pub credentials: Option<Credentials>,
}

impl LayerConfig {
    pub fn source(&self) -> GeodataSource {
        GeodataSource {
            url: self.url.clone(),
            format_type: self.format.clone(),
            feature_collection_path: self.feature_collection_path.clone(),
            credentials: self.credentials.clone(),
        }
    }

    pub fn color_ramp(&self) -> anyhow::Result<ColorRamp> {
        match &self.custom_colors {
            Some(colors) => ColorRamp::new(colors.clone())
                .ok_or_else(|| anyhow!("custom_colors must contain at least one color")),
            None => Ok(ColorRamp::named(
                self.color_ramp.unwrap_or(ColorRampName::YellowToRed),
            )),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub layer: LayerConfig,
    /// YAML or JSON list of `{term, value}` rows.
    pub metrics_filepath: PathBuf,
    pub output_filepath: PathBuf,
    #[serde(default = "default_value_precision")]
    pub value_precision: usize,
    /// Lon/lat points to report tooltips for.
    #[serde(default)]
    pub probe_points: Vec<[f64; 2]>,
}
