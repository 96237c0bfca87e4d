use std::{cmp::Ordering, sync::mpsc::Receiver, sync::Arc};

use serde_json::Value;

use crate::{
    error::ChoroplethError,
    geodata::{
        feature::{Feature, FeatureId},
        fetch::GeodataFetcher,
        loader::{load_features, GeodataSource, LoadStatus},
    },
};

use super::{
    bounds::features_bounds,
    color::{compute_range, ColorRamp, ValueRange, NUM_LEGEND_COLORS},
    events::{EventChannel, LayerEvent},
    index::{build_index, FeatureIndex},
    join::{join, JoinMode, JoinResult},
    legend::Legend,
    metrics::{MetricFormatter, MetricRow},
    picking::FeaturePicker,
    style::{style_for_metric, FeatureStyle},
    term::term_compare,
};

/// Everything a styled layer renders from. Rebuilt as a whole on every styling pass.
pub struct StyledState {
    pub join: Arc<JoinResult>,
    pub range: ValueRange,
    pub colors: ColorRamp,
    pub legend: Legend,
    pub bounds: Option<geo::Rect>,
    pub line_weight: f64,
    picker: FeaturePicker,
}

impl StyledState {
    pub fn style_for(&self, feature_id: FeatureId) -> FeatureStyle {
        style_for_metric(
            self.join.joined_metric(feature_id),
            self.range,
            &self.colors,
            self.line_weight,
        )
    }
}

pub enum StyleState {
    Unstyled,
    Styled(StyledState),
}

struct StyleInputs<'a> {
    features: &'a [Feature],
    metrics: &'a [MetricRow],
    color_ramp: &'a ColorRamp,
    line_weight: f64,
    formatter: &'a dyn MetricFormatter,
}

fn style_layer(
    inputs: &StyleInputs,
    join: Arc<JoinResult>,
) -> Result<StyledState, ChoroplethError> {
    let range = compute_range(inputs.metrics)?;
    let colors = inputs.color_ramp.legend_colors(NUM_LEGEND_COLORS);
    let legend = Legend::new(range, colors.clone(), inputs.formatter);
    let bounds = features_bounds(inputs.features, join.spatial_layer());
    let picker = FeaturePicker::new(inputs.features, join.spatial_layer());
    Ok(StyledState {
        join,
        range,
        colors,
        legend,
        bounds,
        line_weight: inputs.line_weight,
        picker,
    })
}

/// A choropleth layer: geographic features colored by the metric rows joined onto them.
///
/// Every mutating call re-runs the join and styling pipeline before returning, unless
/// rendering is disabled.
pub struct ChoroplethLayer {
    source: GeodataSource,
    show_all_shapes: bool,
    load_status: LoadStatus,
    features: Arc<Vec<Feature>>,
    index: Option<Arc<FeatureIndex>>,
    join_field: Option<String>,
    metrics: Vec<MetricRow>,
    color_ramp: ColorRamp,
    line_weight: f64,
    formatter: Arc<dyn MetricFormatter>,
    rendering_enabled: bool,
    join: Option<Arc<JoinResult>>,
    state: StyleState,
    events: EventChannel,
}

impl ChoroplethLayer {
    pub fn new(
        source: GeodataSource,
        show_all_shapes: bool,
        color_ramp: ColorRamp,
        line_weight: f64,
        formatter: Arc<dyn MetricFormatter>,
    ) -> Self {
        Self {
            source,
            show_all_shapes,
            load_status: LoadStatus::Pending,
            features: Arc::new(Vec::new()),
            index: None,
            join_field: None,
            metrics: Vec::new(),
            color_ramp,
            line_weight,
            formatter,
            rendering_enabled: true,
            join: None,
            state: StyleState::Unstyled,
            events: EventChannel::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.source.url
    }

    pub fn show_all_shapes(&self) -> bool {
        self.show_all_shapes
    }

    pub fn join_mode(&self) -> JoinMode {
        JoinMode::from_show_all_shapes(self.show_all_shapes)
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn metrics(&self) -> &[MetricRow] {
        &self.metrics
    }

    pub fn state(&self) -> &StyleState {
        &self.state
    }

    pub fn styled_state(&self) -> Option<&StyledState> {
        match &self.state {
            StyleState::Styled(styled) => Some(styled),
            StyleState::Unstyled => None,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<LayerEvent> {
        self.events.subscribe()
    }

    /// Load the features of this layer. Only the first call fetches; a failure is recorded in
    /// the load status and the layer carries on without features.
    pub fn load(&mut self, fetcher: &dyn GeodataFetcher) -> &LoadStatus {
        if self.load_status.is_complete() {
            return &self.load_status;
        }
        match load_features(&self.source, fetcher) {
            Ok(features) => {
                log::info!("Loaded {} features from {}", features.len(), self.source.url);
                self.set_features(features);
                self.load_status = LoadStatus::Loaded;
            }
            Err(message) => {
                log::error!("Error downloading vector data: {}", message);
                self.load_status = LoadStatus::Failed(message);
            }
        }
        self.refresh();
        &self.load_status
    }

    fn set_features(&mut self, features: Vec<Feature>) {
        self.features = Arc::new(features);
        self.index = None;
        self.join = None;
    }

    pub fn set_join_field(&mut self, join_field: &str) {
        if self.join_field.as_deref() != Some(join_field) {
            self.join_field = Some(join_field.to_string());
            self.join = None;
        }
        self.refresh();
    }

    pub fn set_metrics(&mut self, metrics: Vec<MetricRow>) {
        self.metrics = metrics;
        self.join = None;
        self.refresh();
    }

    pub fn set_color_ramp(&mut self, color_ramp: ColorRamp) {
        self.color_ramp = color_ramp;
        self.refresh();
    }

    pub fn set_line_weight(&mut self, line_weight: f64) {
        self.line_weight = line_weight;
        self.refresh();
    }

    pub fn set_formatter(&mut self, formatter: Arc<dyn MetricFormatter>) {
        self.formatter = formatter;
        self.refresh();
    }

    /// Freeze the current visual state. Mutations are recorded but not computed.
    pub fn disable_rendering(&mut self) {
        self.rendering_enabled = false;
    }

    /// Re-arm styling. Takes effect on the next mutating call.
    pub fn enable_rendering(&mut self) {
        self.rendering_enabled = true;
    }

    fn refresh(&mut self) {
        if !self.rendering_enabled {
            return;
        }
        let join_field = match &self.join_field {
            Some(join_field) if self.load_status.is_complete() && !self.metrics.is_empty() => {
                join_field.clone()
            }
            _ => {
                self.state = StyleState::Unstyled;
                return;
            }
        };

        let index = match &self.index {
            Some(index) if index.join_field() == join_field => Arc::clone(index),
            _ => {
                let index = Arc::new(build_index(&self.features, &join_field));
                self.index = Some(Arc::clone(&index));
                index
            }
        };
        let join_result = match &self.join {
            Some(join_result) => Arc::clone(join_result),
            None => {
                let join_result = Arc::new(join(
                    &index,
                    self.features.len(),
                    &self.metrics,
                    self.join_mode(),
                ));
                self.join = Some(Arc::clone(&join_result));
                join_result
            }
        };

        let inputs = StyleInputs {
            features: &self.features,
            metrics: &self.metrics,
            color_ramp: &self.color_ramp,
            line_weight: self.line_weight,
            formatter: self.formatter.as_ref(),
        };
        match style_layer(&inputs, join_result) {
            Ok(styled) => {
                let unmatched_terms = styled.join.unmatched_terms.clone();
                if !unmatched_terms.is_empty() {
                    log::warn!(
                        "{} metric terms have no shape for join field {}: {:?}",
                        unmatched_terms.len(),
                        join_field,
                        unmatched_terms
                    );
                }
                self.state = StyleState::Styled(styled);
                self.events.emit(LayerEvent::StyleChanged { unmatched_terms });
            }
            Err(err) => {
                log::debug!("Not styling layer: {}", err);
                self.state = StyleState::Unstyled;
            }
        }
    }

    pub fn visible_features(&self) -> Vec<FeatureId> {
        match &self.state {
            StyleState::Styled(styled) => styled.join.spatial_layer().to_vec(),
            StyleState::Unstyled if self.show_all_shapes => (0..self.features.len()).collect(),
            StyleState::Unstyled => Vec::new(),
        }
    }

    pub fn style_for(&self, feature_id: FeatureId) -> FeatureStyle {
        match &self.state {
            StyleState::Styled(styled) => styled.style_for(feature_id),
            StyleState::Unstyled => FeatureStyle::empty(),
        }
    }

    pub fn joined_metric(&self, feature_id: FeatureId) -> Option<&MetricRow> {
        self.styled_state()
            .and_then(|styled| styled.join.joined_metric(feature_id))
    }

    pub fn bounds(&self) -> Option<geo::Rect> {
        self.styled_state().and_then(|styled| styled.bounds)
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.styled_state().map(|styled| &styled.legend)
    }

    pub fn unmatched_terms(&self) -> &[String] {
        match &self.state {
            StyleState::Styled(styled) => &styled.join.unmatched_terms,
            StyleState::Unstyled => &[],
        }
    }

    fn pick(&self, coord: geo::Coord) -> Option<FeatureId> {
        self.styled_state()
            .and_then(|styled| styled.picker.pick(&self.features, coord))
    }

    fn join_key_value(&self, feature_id: FeatureId) -> Option<&Value> {
        let join_field = self.join_field.as_deref()?;
        self.features.get(feature_id)?.properties.get(join_field)
    }

    /// Tooltip text for the feature under `coord`, if it has a metric row.
    pub fn tooltip_at(&self, coord: geo::Coord) -> Option<String> {
        let key_value = self.join_key_value(self.pick(coord)?);
        let row = self.metrics.iter().find(|row| {
            term_compare(Some(&Value::String(row.term.clone())), key_value)
                == Some(Ordering::Equal)
        })?;
        Some(format!("{}: {}", row.term, self.formatter.format(row.value)))
    }

    pub fn pointer_moved(&mut self, coord: geo::Coord) {
        let event = match self.tooltip_at(coord) {
            Some(content) => LayerEvent::ShowTooltip {
                content,
                position: coord,
            },
            None => LayerEvent::HideTooltip,
        };
        self.events.emit(event);
    }

    pub fn pointer_left(&mut self) {
        self.events.emit(LayerEvent::HideTooltip);
    }

    pub fn clicked(&mut self, coord: geo::Coord) {
        let term = self
            .pick(coord)
            .and_then(|feature_id| self.features[feature_id].join_key(self.join_field.as_deref()?));
        if let Some(term) = term {
            self.events.emit(LayerEvent::Select { term });
        }
    }

    /// A fresh layer for a new data source. The loaded features and their index are shared only
    /// when `source` points at the same URL; otherwise the new layer has to be loaded.
    pub fn clone_for_new_data(
        &self,
        source: GeodataSource,
        show_all_shapes: bool,
        color_ramp: ColorRamp,
        line_weight: f64,
    ) -> ChoroplethLayer {
        let same_url = source.url == self.source.url;
        let mut layer = ChoroplethLayer::new(
            source,
            show_all_shapes,
            color_ramp,
            line_weight,
            Arc::clone(&self.formatter),
        );
        if same_url {
            layer.features = Arc::clone(&self.features);
            layer.index = self.index.clone();
            layer.load_status = self.load_status.clone();
        }
        layer
    }

    /// Whether this layer can take `new_metrics` in place instead of being rebuilt. An inner
    /// layer needs the same term sequence, so one without metrics is never reused.
    pub fn can_reuse_instance_for_new_metrics(
        &self,
        url: &str,
        show_all_shapes: bool,
        new_metrics: &[MetricRow],
    ) -> bool {
        if self.source.url != url || self.show_all_shapes != show_all_shapes {
            return false;
        }
        if show_all_shapes {
            return true;
        }
        !self.metrics.is_empty()
            && self.metrics.len() == new_metrics.len()
            && self
                .metrics
                .iter()
                .zip(new_metrics)
                .all(|(current, new)| current.term == new.term)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use crate::{
        choropleth::{
            color::{ColorRamp, Rgb},
            events::LayerEvent,
            metrics::{DecimalFormatter, MetricRow},
            style::FeatureStyle,
        },
        geodata::{
            loader::{
                tests::{regions_fetcher, REGIONS_URL},
                GeodataSource, LoadStatus,
            },
        },
    };

    use super::{ChoroplethLayer, StyleState};

    fn colors() -> ColorRamp {
        ColorRamp::new(vec![Rgb(0, 0, 0), Rgb(1, 1, 1), Rgb(2, 2, 2), Rgb(3, 3, 3)]).unwrap()
    }

    fn layer(show_all_shapes: bool) -> ChoroplethLayer {
        ChoroplethLayer::new(
            GeodataSource::new(REGIONS_URL),
            show_all_shapes,
            colors(),
            2.0,
            Arc::new(DecimalFormatter { precision: 0 }),
        )
    }

    fn styled_layer(show_all_shapes: bool) -> ChoroplethLayer {
        let mut layer = layer(show_all_shapes);
        layer.load(&regions_fetcher());
        layer.set_join_field("id");
        layer.set_metrics(vec![MetricRow::new("A", 10.0), MetricRow::new("C", 5.0)]);
        layer
    }

    #[test]
    fn test_unstyled_until_inputs_present() {
        let mut layer = layer(false);
        layer.set_join_field("id");
        layer.set_metrics(vec![MetricRow::new("A", 10.0)]);
        assert!(matches!(layer.state(), StyleState::Unstyled));

        layer.load(&regions_fetcher());
        assert_eq!(layer.load_status(), &LoadStatus::Loaded);
        assert!(matches!(layer.state(), StyleState::Styled(_)));
    }

    #[test]
    fn test_inner_layer() {
        let layer = styled_layer(false);
        assert_eq!(layer.visible_features(), vec![0]);
        assert_eq!(layer.unmatched_terms(), &["C".to_string()]);
        assert_eq!(layer.joined_metric(0).unwrap().value, 10.0);
        assert_eq!(layer.joined_metric(1), None);
    }

    #[test]
    fn test_left_outer_layer() {
        let layer = styled_layer(true);
        assert_eq!(layer.visible_features(), vec![0, 1]);
        assert_eq!(layer.style_for(1), FeatureStyle::empty());
        // Range is [5, 10]: 10 maps onto the last color.
        assert_eq!(layer.style_for(0), FeatureStyle::matched(Rgb(3, 3, 3), 2.0));
    }

    #[test]
    fn test_style_changed_reports_unmatched_terms() {
        let mut layer = layer(false);
        let events = layer.subscribe();
        layer.load(&regions_fetcher());
        layer.set_join_field("id");
        layer.set_metrics(vec![MetricRow::new("A", 10.0), MetricRow::new("C", 5.0)]);
        assert_eq!(
            events.try_recv().unwrap(),
            LayerEvent::StyleChanged {
                unmatched_terms: vec!["C".to_string()]
            }
        );
    }

    #[test]
    fn test_new_metrics_drop_stale_joins() {
        let mut layer = styled_layer(true);
        layer.set_metrics(vec![MetricRow::new("B", 1.0)]);
        assert_eq!(layer.joined_metric(0), None);
        assert_eq!(layer.joined_metric(1).unwrap().value, 1.0);
        assert!(layer.unmatched_terms().is_empty());
    }

    #[test]
    fn test_changing_join_field_rejoins() {
        let mut layer = styled_layer(false);
        layer.set_join_field("name");
        assert!(layer.visible_features().is_empty());
        assert_eq!(
            layer.unmatched_terms(),
            &["A".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn test_empty_metrics_unstyle() {
        let mut layer = styled_layer(false);
        layer.set_metrics(Vec::new());
        assert!(matches!(layer.state(), StyleState::Unstyled));
        assert_eq!(layer.joined_metric(0), None);
        assert_eq!(layer.style_for(0), FeatureStyle::empty());
    }

    #[test]
    fn test_style_only_changes_keep_join() {
        let mut layer = styled_layer(false);
        let join_before = Arc::clone(&layer.styled_state().unwrap().join);
        layer.set_line_weight(4.0);
        layer.set_color_ramp(ColorRamp::new(vec![Rgb(9, 9, 9)]).unwrap());
        let styled = layer.styled_state().unwrap();
        assert!(Arc::ptr_eq(&join_before, &styled.join));
        assert_eq!(layer.style_for(0), FeatureStyle::matched(Rgb(9, 9, 9), 4.0));
    }

    #[test]
    fn test_sampled_ramp_styles_matched_features() {
        let mut layer = styled_layer(false);
        layer.set_color_ramp(ColorRamp::from_stops(&[Rgb(0, 0, 0), Rgb(255, 0, 0)], 512).unwrap());
        let styled = layer.styled_state().unwrap();
        assert_eq!(styled.colors.len(), 4);
        assert_eq!(layer.style_for(0), FeatureStyle::matched(Rgb(255, 0, 0), 2.0));
        assert_eq!(layer.legend().unwrap().swatches[0].color, Rgb(0, 0, 0));
    }

    #[test]
    fn test_disabled_rendering_freezes_state() {
        let mut layer = styled_layer(false);
        layer.disable_rendering();
        layer.set_line_weight(5.0);
        layer.set_metrics(vec![MetricRow::new("B", 1.0)]);
        assert_eq!(layer.visible_features(), vec![0]);
        assert_eq!(layer.style_for(0).weight, 2.0);

        layer.enable_rendering();
        assert_eq!(layer.visible_features(), vec![0]);
        layer.set_line_weight(6.0);
        assert_eq!(layer.visible_features(), vec![1]);
        assert_eq!(layer.style_for(1).weight, 6.0);
    }

    #[test]
    fn test_bounds_follow_visible_features() {
        let layer = styled_layer(false);
        let bounds = layer.bounds().unwrap();
        assert_abs_diff_eq!(bounds.min().x, 0.0);
        assert_abs_diff_eq!(bounds.max().x, 1.0);

        let layer = styled_layer(true);
        let bounds = layer.bounds().unwrap();
        assert_abs_diff_eq!(bounds.max().x, 3.0);
    }

    #[test]
    fn test_legend_swatches() {
        let layer = styled_layer(false);
        let legend = layer.legend().unwrap();
        assert_eq!(legend.swatches.len(), 4);
        assert_eq!(legend.swatches[0].label, "5 – 6");
    }

    #[test]
    fn test_failed_load_renders_empty() {
        let mut layer = ChoroplethLayer::new(
            GeodataSource::new("https://example.com/missing.json"),
            true,
            colors(),
            1.0,
            Arc::new(DecimalFormatter::default()),
        );
        let status = layer.load(&regions_fetcher()).clone();
        assert!(matches!(status, LoadStatus::Failed(message) if message.contains("404")));
        layer.set_join_field("id");
        layer.set_metrics(vec![MetricRow::new("A", 1.0)]);
        assert!(layer.visible_features().is_empty());
        assert_eq!(layer.unmatched_terms(), &["A".to_string()]);
    }

    #[test]
    fn test_load_runs_once() {
        let mut layer = layer(false);
        layer.load(&regions_fetcher());
        let empty_fetcher = crate::geodata::loader::tests::StaticFetcher {
            documents: Default::default(),
        };
        assert_eq!(layer.load(&empty_fetcher), &LoadStatus::Loaded);
        assert_eq!(layer.features().len(), 2);
    }

    #[rstest]
    #[case(0.5, 0.5, Some("A: 10"))]
    #[case(2.5, 0.5, None)] // B is visible but has no metric row
    #[case(9.0, 9.0, None)]
    fn test_tooltip(#[case] x: f64, #[case] y: f64, #[case] expected: Option<&str>) {
        let layer = styled_layer(true);
        assert_eq!(
            layer.tooltip_at(geo::Coord { x, y }),
            expected.map(String::from)
        );
    }

    #[test]
    fn test_pointer_and_click_events() {
        let mut layer = styled_layer(true);
        let events = layer.subscribe();
        layer.pointer_moved(geo::Coord { x: 0.5, y: 0.5 });
        layer.pointer_moved(geo::Coord { x: 2.5, y: 0.5 });
        layer.clicked(geo::Coord { x: 2.5, y: 0.5 });
        layer.clicked(geo::Coord { x: 9.0, y: 9.0 });
        layer.pointer_left();

        let received: Vec<LayerEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                LayerEvent::ShowTooltip {
                    content: "A: 10".to_string(),
                    position: geo::Coord { x: 0.5, y: 0.5 },
                },
                LayerEvent::HideTooltip,
                LayerEvent::Select {
                    term: "B".to_string()
                },
                LayerEvent::HideTooltip,
            ]
        );
    }

    #[test]
    fn test_clone_for_same_url_shares_features() {
        let layer = styled_layer(false);
        let clone = layer.clone_for_new_data(GeodataSource::new(REGIONS_URL), true, colors(), 1.0);
        assert_eq!(clone.load_status(), &LoadStatus::Loaded);
        assert!(Arc::ptr_eq(&layer.features, &clone.features));
        assert!(clone.metrics().is_empty());
        assert!(matches!(clone.state(), StyleState::Unstyled));
    }

    #[test]
    fn test_clone_for_other_url_starts_empty() {
        let layer = styled_layer(false);
        let clone = layer.clone_for_new_data(
            GeodataSource::new("https://example.com/other.json"),
            false,
            colors(),
            1.0,
        );
        assert_eq!(clone.load_status(), &LoadStatus::Pending);
        assert!(clone.features().is_empty());
    }

    #[rstest]
    #[case(REGIONS_URL, false, vec![("A", 10.0), ("C", 5.0)], true)]
    #[case(REGIONS_URL, false, vec![("A", 11.0), ("C", 6.0)], true)]
    #[case(REGIONS_URL, false, vec![("C", 5.0), ("A", 10.0)], false)]
    #[case(REGIONS_URL, false, vec![("A", 10.0)], false)]
    #[case(REGIONS_URL, true, vec![("A", 10.0), ("C", 5.0)], false)]
    #[case("https://example.com/other.json", false, vec![("A", 10.0), ("C", 5.0)], false)]
    fn test_can_reuse_inner_layer(
        #[case] url: &str,
        #[case] show_all_shapes: bool,
        #[case] new_metrics: Vec<(&str, f64)>,
        #[case] expected: bool,
    ) {
        let layer = styled_layer(false);
        let new_metrics: Vec<MetricRow> = new_metrics
            .into_iter()
            .map(|(term, value)| MetricRow::new(term, value))
            .collect();
        assert_eq!(
            layer.can_reuse_instance_for_new_metrics(url, show_all_shapes, &new_metrics),
            expected
        );
    }

    #[test]
    fn test_can_reuse_show_all_shapes_layer_with_any_metrics() {
        let layer = styled_layer(true);
        assert!(layer.can_reuse_instance_for_new_metrics(
            REGIONS_URL,
            true,
            &[MetricRow::new("Z", 1.0)]
        ));
    }

    #[rstest]
    #[case(true, true)]
    #[case(false, false)]
    fn test_reuse_of_layer_without_metrics(#[case] show_all_shapes: bool, #[case] expected: bool) {
        let mut layer = layer(show_all_shapes);
        layer.load(&regions_fetcher());
        assert_eq!(
            layer.can_reuse_instance_for_new_metrics(
                REGIONS_URL,
                show_all_shapes,
                &[MetricRow::new("A", 1.0)]
            ),
            expected
        );
    }
}
