use std::str::FromStr;

use geojson::GeoJson;
use topojson::TopoJson;

use crate::error::ChoroplethError;

use super::feature::Feature;

const TOPOJSON_OBJECTS_PREFIX: &str = "objects.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeodataFormat {
    GeoJson,
    /// `feature_collection_path` names the embedded object to convert, e.g. `states` or
    /// `objects.states`.
    TopoJson { feature_collection_path: String },
}

impl GeodataFormat {
    /// Resolve a declared format type. An absent type means GeoJSON.
    pub fn parse(
        format_type: Option<&str>,
        feature_collection_path: Option<&str>,
    ) -> Result<Self, ChoroplethError> {
        match format_type.map(str::to_lowercase).as_deref() {
            None | Some("geojson") => Ok(GeodataFormat::GeoJson),
            Some("topojson") => Ok(GeodataFormat::TopoJson {
                feature_collection_path: feature_collection_path.unwrap_or_default().to_string(),
            }),
            Some(_) => Err(ChoroplethError::UnrecognizedFormat(
                format_type.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn decode(&self, contents: &str) -> Result<Vec<Feature>, ChoroplethError> {
        let feature_collection = match self {
            GeodataFormat::GeoJson => geojson_feature_collection(contents)?,
            GeodataFormat::TopoJson {
                feature_collection_path,
            } => topojson_feature_collection(contents, feature_collection_path)?,
        };
        let num_features = feature_collection.features.len();
        let features = feature_collection
            .features
            .into_iter()
            .map(Feature::try_from)
            .collect::<Result<Vec<Feature>, geojson::Error>>()?;
        log::debug!("Decoded {} features", num_features);
        Ok(features)
    }
}

fn geojson_feature_collection(
    contents: &str,
) -> Result<geojson::FeatureCollection, ChoroplethError> {
    match GeoJson::from_str(contents)? {
        GeoJson::FeatureCollection(feature_collection) => Ok(feature_collection),
        GeoJson::Feature(_) => Err(ChoroplethError::NotAFeatureCollection(
            "Feature".to_string(),
        )),
        GeoJson::Geometry(_) => Err(ChoroplethError::NotAFeatureCollection(
            "Geometry".to_string(),
        )),
    }
}

fn topojson_feature_collection(
    contents: &str,
    feature_collection_path: &str,
) -> Result<geojson::FeatureCollection, ChoroplethError> {
    let topology = match TopoJson::from_str(contents)
        .map_err(|err| ChoroplethError::TopoJson(format!("{:?}", err)))?
    {
        TopoJson::Topology(topology) => topology,
        _ => return Err(ChoroplethError::TopoJson("Expected a Topology".to_string())),
    };
    let object_name = feature_collection_path
        .strip_prefix(TOPOJSON_OBJECTS_PREFIX)
        .unwrap_or(feature_collection_path)
        .to_string();
    if !topology
        .objects
        .iter()
        .any(|object| object.name == object_name)
    {
        return Err(ChoroplethError::MissingTopojsonObject(object_name));
    }
    let converted = topojson::to_geojson(&topology, &object_name)
        .map_err(|err| ChoroplethError::TopoJson(format!("{:?}", err)))?;
    // Re-read through JSON so the result is this crate's geojson type regardless of the
    // geojson version the topojson crate links against.
    let value = serde_json::to_value(&converted)?;
    Ok(serde_json::from_value(value)?)
}
