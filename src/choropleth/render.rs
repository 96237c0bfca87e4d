use rayon::prelude::*;
use serde_json::{json, Map};

use crate::geodata::feature::Feature;

use super::{layer::ChoroplethLayer, metrics::MetricRow, style::FeatureStyle};

/// GeoJSON of the visible features, with simplestyle paint properties and the joined metric.
pub fn render_feature_collection(layer: &ChoroplethLayer) -> geojson::FeatureCollection {
    let features = layer.features();
    let styled = layer.styled_state();
    let rendered: Vec<geojson::Feature> = layer
        .visible_features()
        .par_iter()
        .filter_map(|feature_id| {
            let feature = features.get(*feature_id)?;
            let (style, metric) = match styled {
                Some(styled) => (
                    styled.style_for(*feature_id),
                    styled.join.joined_metric(*feature_id),
                ),
                None => (FeatureStyle::empty(), None),
            };
            Some(render_feature(feature, &style, metric))
        })
        .collect();
    log::debug!("Rendered {} features", rendered.len());
    rendered.into_iter().collect()
}

fn render_feature(
    feature: &Feature,
    style: &FeatureStyle,
    metric: Option<&MetricRow>,
) -> geojson::Feature {
    let mut properties: Map<String, serde_json::Value> = feature.properties.clone();
    if let Some(fill_color) = style.fill_color {
        properties.insert("fill".to_string(), json!(fill_color.to_hex()));
    }
    properties.insert("fill-opacity".to_string(), json!(style.fill_opacity));
    properties.insert("stroke".to_string(), json!(style.color.to_hex()));
    properties.insert("stroke-width".to_string(), json!(style.weight));
    properties.insert("stroke-opacity".to_string(), json!(style.opacity));
    if let Some(row) = metric {
        properties.insert("joined_term".to_string(), json!(row.term));
        properties.insert("joined_value".to_string(), json!(row.value));
    }
    geojson::Feature {
        bbox: None,
        geometry: feature.geometry.as_ref().map(geojson::Geometry::from),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
