//! Zoom-aware clustering and layout of geographic point data.
//!
//! Points are grouped into clusters per zoom level by a multi-resolution
//! index, and each cluster's members are laid out around its centroid (grid,
//! circle packing, rings) or summarised as a single icon. The output is a flat
//! list of render primitives for a map host to draw.
//!
//! ```rust
//! use geocluster::{ClusterEngine, DataPoint, EngineConfig, Viewport};
//!
//! let points = vec![
//!     DataPoint::new("a", -74.006, 40.7128, 12.0),
//!     DataPoint::new("b", -74.005, 40.7130, 30.0),
//!     DataPoint::new("c", 2.3522, 48.8566, 7.0),
//! ];
//!
//! let mut engine = ClusterEngine::new();
//! engine.load(points, EngineConfig::default())?;
//! engine.set_viewport(Viewport::world(4.0));
//! assert_eq!(engine.primitives().len(), 3);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod layout;
pub mod picking;
pub mod render;

pub use config::{EngineConfig, RadiusScaling};
pub use engine::{ClusterEngine, EnginePhase, EngineState, ZoomOutcome};
pub use error::{ClusterError, Result};

pub use compute::encoding::{Encoding, Normalization};
pub use index::{ClusterId, ClusterIndex, ClusterNode, ClusterSummary, IndexOptions, NodeRef};
pub use layout::{Layout, LayoutStrategy, RenderPrimitive};
pub use picking::{PickEvent, PickMode, PickTier, Picked};
pub use render::{ClusterLayer, RenderTarget};

pub use geo::Point;
pub use geocluster_types::bbox::{BoundingBox, Viewport};
pub use geocluster_types::color::Rgba;
pub use geocluster_types::point::DataPoint;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterEngine, ClusterError, EngineConfig, Result};

    pub use crate::{BoundingBox, DataPoint, Rgba, Viewport};

    pub use crate::{Encoding, LayoutStrategy, Normalization, RadiusScaling};

    pub use crate::{PickEvent, PickMode, PickTier, Picked, RenderPrimitive};

    pub use crate::{ClusterLayer, RenderTarget};

    pub use geo::Point;
}
