//! GeoJSON import of input points and export of render primitives.

use crate::error::{ClusterError, Result};
use crate::index::NodeRef;
use crate::layout::RenderPrimitive;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use geocluster_types::point::DataPoint;
use serde_json::json;

/// Property holding the optional packing weight.
pub const WEIGHT_KEY: &str = "weight";

/// Parses a FeatureCollection of Point features into data points.
///
/// The numeric property `value_key` becomes the point value; a missing or
/// non-numeric value becomes `NaN`. Feature ids become point ids, falling back
/// to an `"id"` property and then to the feature's position. Every other
/// property is kept as metadata.
///
/// # Examples
///
/// ```
/// use geocluster::compute::geojson::points_from_geojson;
///
/// let json = r#"{
///     "type": "FeatureCollection",
///     "features": [{
///         "type": "Feature",
///         "id": "nyc",
///         "geometry": { "type": "Point", "coordinates": [-74.006, 40.7128] },
///         "properties": { "cases": 42, "name": "New York" }
///     }]
/// }"#;
///
/// let points = points_from_geojson(json, "cases").unwrap();
/// assert_eq!(points[0].id, "nyc");
/// assert_eq!(points[0].value, 42.0);
/// assert_eq!(points[0].metadata["name"], "New York");
/// ```
pub fn points_from_geojson(geojson: &str, value_key: &str) -> Result<Vec<DataPoint>> {
    let collection: FeatureCollection = geojson
        .parse::<geojson::GeoJson>()
        .and_then(FeatureCollection::try_from)
        .map_err(|e| ClusterError::GeoJson(format!("Failed to parse FeatureCollection: {}", e)))?;

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| data_point_from_feature(feature, idx, value_key))
        .collect()
}

/// Converts a single Point feature into a data point.
pub fn data_point_from_feature(feature: Feature, idx: usize, value_key: &str) -> Result<DataPoint> {
    let coords = match feature.geometry.map(|g| g.value) {
        Some(Value::Point(coords)) => coords,
        Some(_) => {
            return Err(ClusterError::InvalidInput(format!(
                "Feature {} geometry is not a Point",
                idx
            )));
        }
        None => {
            return Err(ClusterError::InvalidInput(format!(
                "Feature {} has no geometry",
                idx
            )));
        }
    };
    if coords.len() < 2 {
        return Err(ClusterError::InvalidInput(format!(
            "Feature {} point must have at least 2 coordinates",
            idx
        )));
    }

    let mut properties = feature.properties.unwrap_or_default();

    let id = match feature.id {
        Some(Id::String(s)) => s,
        Some(Id::Number(n)) => n.to_string(),
        None => match properties.remove("id") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => idx.to_string(),
        },
    };

    let value = properties
        .remove(value_key)
        .and_then(|v| v.as_f64())
        .unwrap_or(f64::NAN);
    let weight = properties.remove(WEIGHT_KEY).and_then(|v| v.as_f64());

    let mut point = DataPoint::new(id, coords[0], coords[1], value);
    point.weight = weight;
    point.metadata = properties;
    Ok(point)
}

/// Converts render primitives to a FeatureCollection of Point features.
///
/// Properties carry the radius in metres (`size`), `color` as `[r, g, b, a]`,
/// the node reference (`kind` plus `index` or `cluster_id`), and the
/// optional `parent` cluster and `label`.
pub fn primitives_to_geojson(primitives: &[RenderPrimitive]) -> FeatureCollection {
    let features = primitives.iter().map(primitive_to_feature).collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Converts render primitives to a GeoJSON string.
pub fn primitives_to_geojson_string(primitives: &[RenderPrimitive]) -> Result<String> {
    Ok(serde_json::to_string(&primitives_to_geojson(primitives))?)
}

fn primitive_to_feature(primitive: &RenderPrimitive) -> Feature {
    let geom = Geometry::new(Value::Point(vec![
        primitive.position.x(),
        primitive.position.y(),
    ]));

    let mut props = JsonObject::new();
    props.insert("size".to_string(), json!(primitive.size));
    props.insert("color".to_string(), json!(primitive.color.to_array()));
    match primitive.node {
        NodeRef::Leaf(index) => {
            props.insert("kind".to_string(), json!("leaf"));
            props.insert("index".to_string(), json!(index));
        }
        NodeRef::Cluster(id) => {
            props.insert("kind".to_string(), json!("cluster"));
            props.insert("cluster_id".to_string(), json!(id.raw()));
        }
    }
    if let Some(parent) = primitive.parent {
        props.insert("parent".to_string(), json!(parent.raw()));
    }
    if let Some(label) = &primitive.label {
        props.insert("label".to_string(), json!(label));
    }

    Feature {
        bbox: None,
        geometry: Some(geom),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}
