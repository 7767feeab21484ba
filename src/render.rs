//! Boundary to the rendering host.
//!
//! The engine never draws. A host implements [`RenderTarget`] and hands it
//! to a [`ClusterLayer`], which forwards data loads, viewport changes and
//! picks to a [`ClusterEngine`] and pushes primitives to the target whenever
//! they change.

use crate::compute::geojson::primitives_to_geojson;
use crate::config::EngineConfig;
use crate::engine::{ClusterEngine, ZoomOutcome};
use crate::error::Result;
use crate::layout::RenderPrimitive;
use crate::picking::{PickMode, Picked};
use geocluster_types::bbox::Viewport;
use geocluster_types::point::DataPoint;
use geojson::FeatureCollection;

/// Something that can draw render primitives.
pub trait RenderTarget {
    /// Replace everything drawn so far with `primitives`.
    fn render(&mut self, primitives: &[RenderPrimitive]);
}

/// Render target that keeps the last frame as a GeoJSON FeatureCollection.
#[derive(Debug, Clone)]
pub struct GeoJsonTarget {
    frame: FeatureCollection,
}

impl GeoJsonTarget {
    pub fn new() -> Self {
        Self {
            frame: primitives_to_geojson(&[]),
        }
    }

    pub fn frame(&self) -> &FeatureCollection {
        &self.frame
    }
}

impl Default for GeoJsonTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for GeoJsonTarget {
    fn render(&mut self, primitives: &[RenderPrimitive]) {
        self.frame = primitives_to_geojson(primitives);
    }
}

/// Glue between host events, the engine and a render target.
#[derive(Debug)]
pub struct ClusterLayer<T: RenderTarget> {
    engine: ClusterEngine,
    target: T,
}

impl<T: RenderTarget> ClusterLayer<T> {
    pub fn new(target: T) -> Self {
        Self {
            engine: ClusterEngine::new(),
            target,
        }
    }

    /// Load new data. The target is redrawn with whatever the engine now
    /// holds: fresh primitives when a viewport is known, nothing otherwise.
    pub fn set_data(&mut self, points: Vec<DataPoint>, config: EngineConfig) -> Result<()> {
        self.engine.load(points, config)?;
        self.target.render(self.engine.primitives());
        Ok(())
    }

    /// Apply a viewport change; redraws only when the primitives changed.
    pub fn on_viewport(&mut self, viewport: Viewport) -> ZoomOutcome {
        let outcome = self.engine.set_viewport(viewport);
        if outcome == ZoomOutcome::Recomputed {
            self.target.render(self.engine.primitives());
        }
        outcome
    }

    /// Resolve a pick on one of the drawn primitives.
    pub fn on_pick(&self, primitive: &RenderPrimitive, mode: PickMode) -> Picked {
        self.engine.pick_primitive(primitive, mode)
    }

    pub fn engine(&self) -> &ClusterEngine {
        &self.engine
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }
}
