//! Value encoding, input validation and GeoJSON conversion.
//!
//! These are pure functions over points, values and primitives; nothing here
//! holds state between calls.

pub mod encoding;
pub mod geojson;
pub mod validation;
