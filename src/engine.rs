//! Cluster layout engine.
//!
//! [`EngineState`] holds the current index, the active config and the
//! primitives computed for the last zoom level. It moves through three
//! phases:
//!
//! - [`EnginePhase::Empty`]: nothing loaded; zoom changes are recorded and ignored
//! - [`EnginePhase::Indexed`]: data loaded, no primitives computed yet
//! - [`EnginePhase::Ready`]: primitives cached for one floored zoom level
//!
//! State only changes through [`load_data`] and [`on_zoom_change`]. Panning
//! never recomputes: the cache covers the whole world and
//! [`visible_primitives`] filters it per viewport.
//!
//! ```rust
//! use geocluster::engine::{self, EnginePhase, EngineState, ZoomOutcome};
//! use geocluster::{DataPoint, EngineConfig};
//!
//! let mut state = EngineState::default();
//! let points = vec![
//!     DataPoint::new("a", 0.0, 0.0, 1.0),
//!     DataPoint::new("b", 0.001, 0.0, 2.0),
//! ];
//! engine::load_data(&mut state, points, EngineConfig::default())?;
//! assert_eq!(state.phase(), EnginePhase::Indexed);
//!
//! assert_eq!(engine::on_zoom_change(&mut state, 3.2), ZoomOutcome::Recomputed);
//! assert_eq!(engine::on_zoom_change(&mut state, 3.9), ZoomOutcome::Unchanged);
//! assert_eq!(state.primitives().len(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

use crate::config::EngineConfig;
use crate::error::Result;
use crate::index::{ClusterIndex, ClusterNode};
use crate::layout::{Layout, RenderPrimitive, leaf_primitive};
use crate::picking::{self, PickEvent, PickMode, Picked};
use geocluster_types::bbox::{BoundingBox, Viewport};
use geocluster_types::point::DataPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Empty,
    Indexed,
    Ready,
}

/// Result of a zoom change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomOutcome {
    /// No data loaded, or the zoom was not a finite number
    Skipped,
    /// Same floored zoom as the cached primitives
    Unchanged,
    /// Primitives were recomputed
    Recomputed,
}

/// Everything the engine knows between host events.
#[derive(Debug, Default)]
pub struct EngineState {
    index: Option<ClusterIndex>,
    config: EngineConfig,
    /// Floored zoom the cached primitives were computed for
    level: Option<f64>,
    primitives: Vec<RenderPrimitive>,
    /// Last zoom reported by the host, finite
    last_zoom: Option<f64>,
    viewport: Option<Viewport>,
}

impl EngineState {
    pub fn phase(&self) -> EnginePhase {
        match (&self.index, self.level) {
            (None, _) => EnginePhase::Empty,
            (Some(_), None) => EnginePhase::Indexed,
            (Some(_), Some(_)) => EnginePhase::Ready,
        }
    }

    pub fn index(&self) -> Option<&ClusterIndex> {
        self.index.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Primitives for the cached zoom level, whole world.
    pub fn primitives(&self) -> &[RenderPrimitive] {
        &self.primitives
    }

    /// Floored zoom the cache was computed for.
    pub fn cached_level(&self) -> Option<f64> {
        self.level
    }

    pub fn last_zoom(&self) -> Option<f64> {
        self.last_zoom
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }
}

/// Replace the loaded data and config.
///
/// The config and points are validated first; on error the previous state is
/// left untouched. On success the index is rebuilt and cached primitives are
/// dropped, so the next [`on_zoom_change`] recomputes.
pub fn load_data(state: &mut EngineState, points: Vec<DataPoint>, config: EngineConfig) -> Result<()> {
    if let Err(e) = config.validate() {
        log::warn!("Rejected engine config: {}", e);
        return Err(e);
    }

    let options = config.index_options(state.last_zoom);
    let index = ClusterIndex::build(points, options)?;

    log::debug!(
        "Loaded {} points (radius {}, layout {})",
        index.len(),
        index.options().radius,
        config.layout.name()
    );

    state.index = Some(index);
    state.config = config;
    state.level = None;
    state.primitives.clear();
    Ok(())
}

/// React to a zoom change with the configured layout.
pub fn on_zoom_change(state: &mut EngineState, zoom: f64) -> ZoomOutcome {
    let layout = state.config.layout.clone();
    on_zoom_change_with(state, zoom, &layout)
}

/// React to a zoom change, laying clusters out with `layout`.
///
/// Recomputes only when `floor(zoom)` differs from the cached level.
pub fn on_zoom_change_with(state: &mut EngineState, zoom: f64, layout: &impl Layout) -> ZoomOutcome {
    if !zoom.is_finite() {
        log::warn!("Ignoring non-finite zoom {}", zoom);
        return ZoomOutcome::Skipped;
    }
    state.last_zoom = Some(zoom);

    let Some(index) = state.index.as_ref() else {
        log::trace!("Zoom {} ignored, no data loaded", zoom);
        return ZoomOutcome::Skipped;
    };

    let level = zoom.floor();
    if state.level == Some(level) {
        log::trace!("Zoom {} stays on level {}", zoom, level);
        return ZoomOutcome::Unchanged;
    }

    state.primitives = layout_level(index, &state.config, level, layout);
    state.level = Some(level);

    log::debug!(
        "Recomputed {} primitives at zoom level {}",
        state.primitives.len(),
        level
    );
    ZoomOutcome::Recomputed
}

fn layout_level(
    index: &ClusterIndex,
    config: &EngineConfig,
    zoom: f64,
    layout: &impl Layout,
) -> Vec<RenderPrimitive> {
    let nodes = index.get_clusters(&BoundingBox::GLOBE, zoom);
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        match node {
            ClusterNode::Leaf(leaf) => out.push(leaf_primitive(&leaf, &config.encoding)),
            ClusterNode::Cluster(cluster) => {
                if !layout.needs_members() {
                    out.extend(layout.expand(&cluster, &[], zoom, &config.encoding));
                    continue;
                }
                let members = match index.get_leaves(cluster.id, config.leaf_limit, 0) {
                    Ok(members) => members,
                    Err(e) => {
                        log::warn!("Skipping cluster {}: {}", cluster.id, e);
                        continue;
                    }
                };
                if members.len() < cluster.count {
                    log::debug!(
                        "Cluster {} has {} points, laying out the first {}",
                        cluster.id,
                        cluster.count,
                        members.len()
                    );
                }
                out.extend(layout.expand(&cluster, &members, zoom, &config.encoding));
            }
        }
    }
    out
}

/// Cached primitives whose position falls inside `bbox`.
pub fn visible_primitives<'a>(state: &'a EngineState, bbox: &BoundingBox) -> Vec<&'a RenderPrimitive> {
    state
        .primitives
        .iter()
        .filter(|p| bbox.contains_point(&p.position))
        .collect()
}

/// Owning wrapper around [`EngineState`] driven by host events.
#[derive(Debug, Default)]
pub struct ClusterEngine {
    state: EngineState,
}

impl ClusterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load data; recomputes right away when a viewport is already known.
    pub fn load(&mut self, points: Vec<DataPoint>, config: EngineConfig) -> Result<()> {
        load_data(&mut self.state, points, config)?;
        if let Some(viewport) = self.state.viewport {
            on_zoom_change(&mut self.state, viewport.zoom);
        }
        Ok(())
    }

    /// Apply a viewport event from the host.
    pub fn set_viewport(&mut self, viewport: Viewport) -> ZoomOutcome {
        self.state.viewport = Some(viewport);
        on_zoom_change(&mut self.state, viewport.zoom)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn phase(&self) -> EnginePhase {
        self.state.phase()
    }

    pub fn primitives(&self) -> &[RenderPrimitive] {
        self.state.primitives()
    }

    /// Primitives inside the last viewport, or all of them before any viewport.
    ///
    /// A viewport deserialized without bounds covers the whole globe, so
    /// polar primitives stay visible.
    pub fn visible(&self) -> Vec<&RenderPrimitive> {
        match self.state.viewport {
            Some(viewport) => visible_primitives(&self.state, &viewport.bounds),
            None => self.state.primitives.iter().collect(),
        }
    }

    /// Resolve a pick event against the loaded data.
    pub fn pick(&self, event: &PickEvent) -> Picked {
        picking::resolve(self.state.index(), event, self.state.config.pick_limit)
    }

    /// Resolve a pick on `primitive`, honouring the configured pick tier.
    pub fn pick_primitive(&self, primitive: &RenderPrimitive, mode: PickMode) -> Picked {
        let event = PickEvent::from_primitive(primitive, mode, self.state.config.pick_tier);
        self.pick(&event)
    }
}
