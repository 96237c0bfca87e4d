use super::{
    color::{color_for, ColorRamp, Rgb, ValueRange},
    metrics::MetricRow,
};

const EMPTY_STROKE: Rgb = Rgb(200, 200, 200);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStyle {
    pub fill_color: Option<Rgb>,
    pub weight: f64,
    pub opacity: f64,
    pub color: Rgb,
    pub fill_opacity: f64,
}

impl FeatureStyle {
    /// Style of features without a joined metric.
    pub fn empty() -> Self {
        Self {
            fill_color: None,
            weight: 1.0,
            opacity: 0.6,
            color: EMPTY_STROKE,
            fill_opacity: 0.0,
        }
    }

    pub fn matched(fill_color: Rgb, line_weight: f64) -> Self {
        Self {
            fill_color: Some(fill_color),
            weight: line_weight,
            opacity: 1.0,
            color: Rgb::WHITE,
            fill_opacity: 0.7,
        }
    }
}

pub fn style_for_metric(
    metric: Option<&MetricRow>,
    range: ValueRange,
    colors: &ColorRamp,
    line_weight: f64,
) -> FeatureStyle {
    match metric.and_then(|row| color_for(row.value, range.min, range.max, colors)) {
        Some(fill_color) => FeatureStyle::matched(fill_color, line_weight),
        None => FeatureStyle::empty(),
    }
}
