use geo::{BoundingRect, Intersects};
use rstar::{primitives::GeomWithData, primitives::Rectangle, RTree};

use crate::geodata::feature::{Feature, FeatureId};

type FeatureEnvelope = GeomWithData<Rectangle<[f64; 2]>, FeatureId>;

pub struct FeaturePicker {
    rtree: RTree<FeatureEnvelope>,
}

impl FeaturePicker {
    pub fn new(features: &[Feature], feature_ids: &[FeatureId]) -> Self {
        let envelopes = feature_ids
            .iter()
            .filter_map(|id| {
                let rect = features.get(*id)?.geometry.as_ref()?.bounding_rect()?;
                Some(FeatureEnvelope::new(
                    Rectangle::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    *id,
                ))
            })
            .collect();
        Self {
            rtree: RTree::bulk_load(envelopes),
        }
    }

    /// The feature whose geometry contains `coord`. When several overlap, the one drawn last
    /// (highest id) wins.
    pub fn pick(&self, features: &[Feature], coord: geo::Coord) -> Option<FeatureId> {
        let point = geo::Point::from(coord);
        self.rtree
            .locate_all_at_point(&[coord.x, coord.y])
            .map(|envelope| envelope.data)
            .filter(|id| {
                features
                    .get(*id)
                    .and_then(|feature| feature.geometry.as_ref())
                    .map_or(false, |geometry| geometry.intersects(&point))
            })
            .max()
    }
}
