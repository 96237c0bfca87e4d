use serde_json::{Map, Value};

pub type FeatureId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<geo::Geometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Option<geo::Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// The join key stored under `field`, stringified. Null, missing, array and object values
    /// have no key.
    pub fn join_key(&self, field: &str) -> Option<String> {
        self.properties.get(field).and_then(value_as_key)
    }
}

impl From<geo::Geometry> for Feature {
    fn from(value: geo::Geometry) -> Self {
        Self {
            geometry: Some(value),
            properties: Map::new(),
        }
    }
}

/// Stringify a scalar JSON value the way it would print as an object key.
pub fn value_as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl TryFrom<geojson::Feature> for Feature {
    type Error = geojson::Error;

    fn try_from(feature: geojson::Feature) -> Result<Self, Self::Error> {
        let geometry = match feature.geometry {
            Some(geometry) => Some(geo::Geometry::<f64>::try_from(geometry.value)?),
            None => None,
        };
        Ok(Self {
            geometry,
            properties: feature.properties.unwrap_or_default(),
        })
    }
}
