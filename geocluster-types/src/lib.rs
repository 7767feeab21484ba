//! # geocluster-types
//!
//! Core data types shared by the geocluster engine and its hosts:
//!
//! - **Point types**: `DataPoint`, a located scalar observation with metadata
//! - **Area types**: `BoundingBox`, `Viewport`
//! - **Color types**: `Rgba`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geocluster_types::point::DataPoint;
//!
//! let hospital = DataPoint::new("36061", -74.0060, 40.7128, 87.5);
//! assert_eq!(hospital.lon(), -74.0060);
//! ```

pub mod bbox;
pub mod color;
pub mod point;
