//! Renderer-neutral feature records: geometry plus a flat property bag.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Point { lon: f64, lat: f64 },
    Polygon { ring: Vec<[f64; 2]> },
}

/// One projected domain record, ready for the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn point(lon: f64, lat: f64, properties: Map<String, Value>) -> Self {
        Self { geometry: Geometry::Point { lon, lat }, properties }
    }

    pub fn polygon(ring: Vec<[f64; 2]>, properties: Map<String, Value>) -> Self {
        Self { geometry: Geometry::Polygon { ring }, properties }
    }

    /// String property accessor; absent or non-string keys yield None.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Numeric property accessor; absent or non-numeric keys yield None.
    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    /// The feature's domain entity id, when present.
    pub fn id(&self) -> Option<&str> {
        self.prop_str("id")
    }
}
