use super::{
    color::{ColorRamp, Rgb, ValueRange},
    metrics::MetricFormatter,
};

/// Quantize scale mapping a continuous domain onto discrete colors, split into equal intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendQuantizer {
    domain: (f64, f64),
    colors: ColorRamp,
}

impl LegendQuantizer {
    /// A flat range falls back to the unit domain.
    pub fn new(range: ValueRange, colors: ColorRamp) -> Self {
        let domain = if range.min != range.max {
            (range.min, range.max)
        } else {
            (0.0, 1.0)
        };
        Self { domain, colors }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn quantize(&self, value: f64) -> Option<Rgb> {
        let (min, max) = self.domain;
        let len = self.colors.len();
        let last = len.checked_sub(1)?;
        let index = (len as f64 * (value - min) / (max - min)).floor();
        Some(self.colors.colors()[index.clamp(0.0, last as f64) as usize])
    }

    /// The `[from, to)` interval mapped onto the color at `index`.
    pub fn invert_extent(&self, index: usize) -> (f64, f64) {
        let (min, max) = self.domain;
        let step = (max - min) / self.colors.len() as f64;
        (min + step * index as f64, min + step * (index + 1) as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendSwatch {
    pub color: Rgb,
    pub from: f64,
    pub to: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub quantizer: LegendQuantizer,
    pub swatches: Vec<LegendSwatch>,
}

impl Legend {
    pub fn new(range: ValueRange, colors: ColorRamp, formatter: &dyn MetricFormatter) -> Self {
        let quantizer = LegendQuantizer::new(range, colors);
        let swatches = quantizer
            .colors
            .colors()
            .iter()
            .enumerate()
            .map(|(index, color)| {
                let (from, to) = quantizer.invert_extent(index);
                LegendSwatch {
                    color: *color,
                    from,
                    to,
                    label: format!("{} – {}", formatter.format(from), formatter.format(to)),
                }
            })
            .collect();
        Self {
            quantizer,
            swatches,
        }
    }
}
