//! Validation for geographic coordinates and input points.

use crate::error::{ClusterError, Result};
use geo::Point;
use geocluster_types::point::DataPoint;

/// Validates a 2D point has valid longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::validate_geographic_point;
/// use geo::Point;
///
/// // Valid point
/// let nyc = Point::new(-74.0060, 40.7128);
/// assert!(validate_geographic_point(&nyc).is_ok());
///
/// // Invalid longitude
/// let invalid = Point::new(200.0, 40.0);
/// assert!(validate_geographic_point(&invalid).is_err());
///
/// // Invalid latitude
/// let invalid = Point::new(-74.0, 95.0);
/// assert!(validate_geographic_point(&invalid).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(ClusterError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(ClusterError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(ClusterError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(ClusterError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Validates the coordinates of every input point.
///
/// Values are not checked: `NaN` values are legal and render as the neutral
/// sentinel.
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::validate_data_points;
/// use geocluster::DataPoint;
///
/// let points = vec![
///     DataPoint::new("a", -74.0, 40.7, 1.0),
///     DataPoint::new("b", 999.0, 40.0, 2.0), // Invalid
/// ];
///
/// assert!(validate_data_points(&points).is_err());
/// ```
pub fn validate_data_points(points: &[DataPoint]) -> Result<()> {
    for (idx, point) in points.iter().enumerate() {
        validate_geographic_point(&point.position).map_err(|e| {
            ClusterError::InvalidInput(format!("Point '{}' at index {}: {}", point.id, idx, e))
        })?;
    }
    Ok(())
}

/// Validates a `[min, max]` encoding domain.
pub fn validate_domain(domain: [f64; 2]) -> Result<()> {
    let [min, max] = domain;
    if !min.is_finite() || !max.is_finite() {
        return Err(ClusterError::InvalidConfig(format!(
            "Encoding domain must be finite, got: [{}, {}]",
            min, max
        )));
    }
    if min >= max {
        return Err(ClusterError::InvalidConfig(format!(
            "Encoding domain min ({}) must be < max ({})",
            min, max
        )));
    }
    Ok(())
}
