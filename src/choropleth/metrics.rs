use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub term: String,
    pub value: f64,
}

impl MetricRow {
    pub fn new(term: &str, value: f64) -> Self {
        Self {
            term: term.to_string(),
            value,
        }
    }
}

pub trait MetricFormatter: Send + Sync {
    fn format(&self, value: f64) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct DecimalFormatter {
    pub precision: usize,
}

impl Default for DecimalFormatter {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

impl MetricFormatter for DecimalFormatter {
    fn format(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }
}
