use std::collections::{hash_map::Entry, HashMap};

use crate::geodata::feature::FeatureId;

use super::{index::FeatureIndex, metrics::MetricRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Only features matched by a metric row are rendered.
    Inner,
    /// Every feature is rendered, unmatched ones with the empty style.
    LeftOuter,
}

impl JoinMode {
    pub fn from_show_all_shapes(show_all_shapes: bool) -> Self {
        if show_all_shapes {
            JoinMode::LeftOuter
        } else {
            JoinMode::Inner
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinResult {
    pub mode: JoinMode,
    /// Features with a joined metric row, in the order they were matched.
    pub matched_features: Vec<FeatureId>,
    pub unmatched_terms: Vec<String>,
    spatial_layer: Vec<FeatureId>,
    joined: HashMap<FeatureId, MetricRow>,
}

impl JoinResult {
    pub fn spatial_layer(&self) -> &[FeatureId] {
        &self.spatial_layer
    }

    pub fn joined_metric(&self, feature_id: FeatureId) -> Option<&MetricRow> {
        self.joined.get(&feature_id)
    }
}

/// Join `metrics` onto the `feature_count` features behind `index`.
///
/// The result is built from scratch, so features matched by an earlier join carry nothing over.
/// If several rows share a term, the first one is joined.
pub fn join(
    index: &FeatureIndex,
    feature_count: usize,
    metrics: &[MetricRow],
    mode: JoinMode,
) -> JoinResult {
    let mut joined = HashMap::new();
    let mut matched_features = Vec::new();
    let mut unmatched_terms = Vec::new();

    for row in metrics {
        match index.get(&row.term) {
            Some(feature_id) => {
                if let Entry::Vacant(entry) = joined.entry(feature_id) {
                    entry.insert(row.clone());
                    matched_features.push(feature_id);
                }
            }
            None => unmatched_terms.push(row.term.clone()),
        }
    }

    let spatial_layer = match mode {
        JoinMode::Inner => matched_features.clone(),
        JoinMode::LeftOuter => (0..feature_count).collect(),
    };
    log::debug!(
        "Joined {} of {} metric rows on {:?}, {} features in layer",
        matched_features.len(),
        metrics.len(),
        index.join_field(),
        spatial_layer.len()
    );

    JoinResult {
        mode,
        matched_features,
        unmatched_terms,
        spatial_layer,
        joined,
    }
}
