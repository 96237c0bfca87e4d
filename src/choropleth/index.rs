use std::collections::HashMap;

use crate::geodata::feature::{Feature, FeatureId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureIndex {
    join_field: String,
    ids_by_key: HashMap<String, FeatureId>,
}

impl FeatureIndex {
    pub fn join_field(&self) -> &str {
        &self.join_field
    }

    pub fn get(&self, key: &str) -> Option<FeatureId> {
        self.ids_by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ids_by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids_by_key.is_empty()
    }
}

/// Index `features` by the stringified value of `join_field`.
///
/// An empty join field or feature list yields an empty index. When several features share a
/// key, the last one wins and the others are only reachable through the collection.
pub fn build_index(features: &[Feature], join_field: &str) -> FeatureIndex {
    let mut ids_by_key = HashMap::new();
    if !join_field.is_empty() {
        for (feature_id, feature) in features.iter().enumerate() {
            if let Some(key) = feature.join_key(join_field) {
                if let Some(previous) = ids_by_key.insert(key, feature_id) {
                    log::debug!(
                        "Feature {} shadows feature {} for join field {}",
                        feature_id,
                        previous,
                        join_field
                    );
                }
            }
        }
    }
    FeatureIndex {
        join_field: join_field.to_string(),
        ids_by_key,
    }
}
