use std::fmt;

use serde::Deserialize;

use crate::error::ChoroplethError;

use super::metrics::MetricRow;

pub const RAMP_LENGTH: usize = 512;

/// Number of colors picked from a ramp for styling and the legend.
pub const NUM_LEGEND_COLORS: usize = 4;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(
            channel(self.0, other.0),
            channel(self.1, other.1),
            channel(self.2, other.2),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRampName {
    Blues,
    Greens,
    Greys,
    Reds,
    YellowToRed,
    GreenToRed,
}

impl ColorRampName {
    fn stops(&self) -> &'static [Rgb] {
        match self {
            ColorRampName::Blues => &[Rgb(247, 251, 255), Rgb(107, 174, 214), Rgb(8, 48, 107)],
            ColorRampName::Greens => &[Rgb(247, 252, 245), Rgb(116, 196, 118), Rgb(0, 68, 27)],
            ColorRampName::Greys => &[Rgb(255, 255, 255), Rgb(150, 150, 150), Rgb(0, 0, 0)],
            ColorRampName::Reds => &[Rgb(255, 245, 240), Rgb(251, 106, 74), Rgb(103, 0, 13)],
            ColorRampName::YellowToRed => &[Rgb(255, 255, 204), Rgb(253, 141, 60), Rgb(189, 0, 38)],
            ColorRampName::GreenToRed => &[Rgb(0, 104, 55), Rgb(255, 255, 191), Rgb(165, 0, 38)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRamp(Vec<Rgb>);

impl ColorRamp {
    /// Ramp from explicit colors. Returns `None` when `colors` is empty.
    pub fn new(colors: Vec<Rgb>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self(colors))
        }
    }

    pub fn named(name: ColorRampName) -> Self {
        Self(sample_stops(name.stops(), RAMP_LENGTH))
    }

    /// Sample `steps` colors, linearly interpolated between evenly spaced `stops`. Returns
    /// `None` when that would leave the ramp empty.
    pub fn from_stops(stops: &[Rgb], steps: usize) -> Option<Self> {
        if stops.is_empty() || steps == 0 {
            return None;
        }
        Some(Self(sample_stops(stops, steps)))
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pick `count` colors spread over the ramp: its first, its last, and
    /// `ramp[floor(len * i / count)]` in between. At least one color is always picked.
    pub fn legend_colors(&self, count: usize) -> ColorRamp {
        let len = self.0.len();
        let count = count.max(1);
        let mut colors = vec![self.0[0]];
        for i in 1..count.saturating_sub(1) {
            colors.push(self.0[len * i / count]);
        }
        if count > 1 {
            colors.push(self.0[len - 1]);
        }
        ColorRamp(colors)
    }
}

fn sample_stops(stops: &[Rgb], steps: usize) -> Vec<Rgb> {
    if stops.len() < 2 || steps < 2 {
        return stops.iter().copied().take(steps).collect();
    }
    let segments = (stops.len() - 1) as f64;
    (0..steps)
        .map(|step| {
            let position = step as f64 / (steps - 1) as f64 * segments;
            let segment = (position.floor() as usize).min(stops.len() - 2);
            stops[segment].lerp(stops[segment + 1], position - segment as f64)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

pub fn compute_range(metrics: &[MetricRow]) -> Result<ValueRange, ChoroplethError> {
    let first = metrics.first().ok_or(ChoroplethError::EmptyInput)?;
    Ok(metrics.iter().skip(1).fold(
        ValueRange {
            min: first.value,
            max: first.value,
        },
        |range, row| ValueRange {
            min: range.min.min(row.value),
            max: range.max.max(row.value),
        },
    ))
}

/// Quantize `value` within `[min, max]` onto `ramp`.
///
/// A flat range maps to the last color. Otherwise the index is
/// `round(len * fraction) - 1` clamped into the ramp. `None` only for an empty ramp.
pub fn color_for(value: f64, min: f64, max: f64, ramp: &ColorRamp) -> Option<Rgb> {
    let colors = ramp.colors();
    let last = colors.len().checked_sub(1)?;
    if min == max {
        return Some(colors[last]);
    }
    let fraction = (value - min) / (max - min);
    let index = (colors.len() as f64 * fraction).round() - 1.0;
    Some(colors[index.clamp(0.0, last as f64) as usize])
}
