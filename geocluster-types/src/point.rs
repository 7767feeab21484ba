use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A geographic observation: a location, a scalar value and free-form metadata.
///
/// This is the unit of input for the cluster index. The `value` drives color
/// and size encoding; the optional `weight` drives circle packing and falls back
/// to `value` when absent.
///
/// # Examples
///
/// ```
/// use geocluster_types::point::DataPoint;
/// use serde_json::json;
///
/// let county = DataPoint::new("17031", -87.6298, 41.8781, 412.0)
///     .with_weight(5_150_233.0)
///     .with_metadata("NAME", json!("Cook County"));
///
/// assert_eq!(county.metadata["NAME"], "Cook County");
/// assert_eq!(county.pack_weight(), 5_150_233.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Opaque identifier (e.g. a GEOID)
    pub id: String,
    /// Longitude/latitude position
    pub position: Point<f64>,
    /// Scalar value used for encoding and aggregation
    pub value: f64,
    /// Optional packing weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Application metadata (population, region name, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl DataPoint {
    /// Create a new data point from an identifier, coordinates and value.
    ///
    /// # Arguments
    ///
    /// * `id` - Opaque identifier
    /// * `lon` - Longitude in degrees
    /// * `lat` - Latitude in degrees
    /// * `value` - Scalar value
    pub fn new(id: impl Into<String>, lon: f64, lat: f64, value: f64) -> Self {
        Self {
            id: id.into(),
            position: Point::new(lon, lat),
            value,
            weight: None,
            metadata: Map::new(),
        }
    }

    /// Create a data point from an existing `geo::Point`.
    pub fn from_point(id: impl Into<String>, position: Point<f64>, value: f64) -> Self {
        Self {
            id: id.into(),
            position,
            value,
            weight: None,
            metadata: Map::new(),
        }
    }

    /// Set the packing weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get the longitude.
    #[inline]
    pub fn lon(&self) -> f64 {
        self.position.x()
    }

    /// Get the latitude.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.position.y()
    }

    /// Weight used when sizing this point in a circle pack.
    #[inline]
    pub fn pack_weight(&self) -> f64 {
        self.weight.unwrap_or(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pack_weight_falls_back_to_value() {
        let p = DataPoint::new("a", 0.0, 0.0, 12.0);
        assert_eq!(p.pack_weight(), 12.0);

        let p = p.with_weight(3.0);
        assert_eq!(p.pack_weight(), 3.0);
    }

    #[test]
    fn test_serde_skips_empty_fields() {
        let p = DataPoint::new("a", 1.0, 2.0, 3.0);
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("weight").is_none());
        assert!(json.get("metadata").is_none());

        let p = p.with_metadata("population", json!(1200));
        let back: DataPoint = serde_json::from_str(&serde_json::to_string(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }
}
