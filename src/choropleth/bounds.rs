use geo::BoundingRect;

use crate::geodata::feature::{Feature, FeatureId};

/// Bounding rectangle enclosing the geometries of `feature_ids`. Features without geometry are
/// skipped; `None` if nothing has extent.
pub fn features_bounds(features: &[Feature], feature_ids: &[FeatureId]) -> Option<geo::Rect> {
    feature_ids
        .iter()
        .filter_map(|id| features.get(*id))
        .filter_map(|feature| feature.geometry.as_ref())
        .filter_map(|geometry| geometry.bounding_rect())
        .reduce(|bounds, rect| {
            geo::Rect::new(
                geo::Coord {
                    x: bounds.min().x.min(rect.min().x),
                    y: bounds.min().y.min(rect.min().y),
                },
                geo::Coord {
                    x: bounds.max().x.max(rect.max().x),
                    y: bounds.max().y.max(rect.max().y),
                },
            )
        })
}
