//! Layout strategies: turning a cluster and its members into render positions.
//!
//! Every strategy implements [`Layout::expand`]. [`LayoutStrategy`] is the
//! tagged variant selected by configuration and dispatches to one of:
//!
//! - [`GridLayout`]: members snapped to a square grid around the centroid
//! - [`PackLayout`]: members circle-packed by weight around the centroid
//! - [`RadialLayout`]: members on concentric rings, true positions when zoomed in
//! - [`SummaryLayout`]: one icon per cluster
//!
//! Synthetic offsets are computed in kilometres that shrink as zoom grows
//! ([`ZoomFalloff`]) and converted to degrees with a local equirectangular
//! approximation at the cluster's latitude. All strategies are pure and
//! deterministic.

pub mod circle;
pub mod grid;
pub mod pack;
pub mod radial;
pub mod summary;

pub use grid::GridLayout;
pub use pack::PackLayout;
pub use radial::RadialLayout;
pub use summary::SummaryLayout;

use crate::compute::encoding::Encoding;
use crate::error::{ClusterError, Result};
use crate::index::projection::meters_to_degrees;
use crate::index::{ClusterId, ClusterSummary, Leaf, LeafNode, NodeRef};
use geo::Point;
use geocluster_types::color::Rgba;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The engine's output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPrimitive {
    /// Render position, possibly offset from the true location
    pub position: Point,
    /// Radius in metres
    pub size: f64,
    pub color: Rgba,
    /// Node this primitive stands for
    pub node: NodeRef,
    /// Cluster an expanded member was laid out from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ClusterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Converts a cluster's members into render primitives.
pub trait Layout {
    /// Lay out `members` of `cluster` at `zoom`.
    ///
    /// `members` may be a capped sample of the cluster's leaves. Implementations
    /// must return identical output for identical input.
    fn expand(
        &self,
        cluster: &ClusterSummary,
        members: &[Leaf<'_>],
        zoom: f64,
        encoding: &Encoding,
    ) -> Vec<RenderPrimitive>;

    /// Whether [`expand`](Layout::expand) reads `members`. When `false` the
    /// engine skips fetching leaves.
    fn needs_members(&self) -> bool {
        true
    }
}

/// Configured layout strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LayoutStrategy {
    Grid(GridLayout),
    Pack(PackLayout),
    Radial(RadialLayout),
    Summary(SummaryLayout),
}

impl LayoutStrategy {
    pub fn grid() -> Self {
        LayoutStrategy::Grid(GridLayout::default())
    }

    pub fn pack() -> Self {
        LayoutStrategy::Pack(PackLayout::default())
    }

    pub fn radial() -> Self {
        LayoutStrategy::Radial(RadialLayout::default())
    }

    pub fn summary() -> Self {
        LayoutStrategy::Summary(SummaryLayout::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayoutStrategy::Grid(_) => "grid",
            LayoutStrategy::Pack(_) => "pack",
            LayoutStrategy::Radial(_) => "radial",
            LayoutStrategy::Summary(_) => "summary",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            LayoutStrategy::Grid(l) => {
                l.spacing.validate()?;
                validate_threshold(l.direct_above)
            }
            LayoutStrategy::Pack(l) => {
                l.spacing.validate()?;
                if !(l.cell_size.is_finite() && l.cell_size > 0.0) {
                    return Err(ClusterError::InvalidConfig(format!(
                        "Pack cell size must be positive, got: {}",
                        l.cell_size
                    )));
                }
                if !(l.padding.is_finite() && l.padding >= 0.0) {
                    return Err(ClusterError::InvalidConfig(format!(
                        "Pack padding must be non-negative, got: {}",
                        l.padding
                    )));
                }
                validate_threshold(Some(l.direct_above))
            }
            LayoutStrategy::Radial(l) => {
                l.spacing.validate()?;
                validate_threshold(Some(l.threshold))
            }
            LayoutStrategy::Summary(l) => {
                if !(l.log_divisor.is_finite() && l.log_divisor > 0.0) {
                    return Err(ClusterError::InvalidConfig(format!(
                        "Summary log divisor must be positive, got: {}",
                        l.log_divisor
                    )));
                }
                Ok(())
            }
        }
    }
}

impl Default for LayoutStrategy {
    fn default() -> Self {
        Self::grid()
    }
}

impl Layout for LayoutStrategy {
    fn expand(
        &self,
        cluster: &ClusterSummary,
        members: &[Leaf<'_>],
        zoom: f64,
        encoding: &Encoding,
    ) -> Vec<RenderPrimitive> {
        match self {
            LayoutStrategy::Grid(l) => l.expand(cluster, members, zoom, encoding),
            LayoutStrategy::Pack(l) => l.expand(cluster, members, zoom, encoding),
            LayoutStrategy::Radial(l) => l.expand(cluster, members, zoom, encoding),
            LayoutStrategy::Summary(l) => l.expand(cluster, members, zoom, encoding),
        }
    }

    fn needs_members(&self) -> bool {
        !matches!(self, LayoutStrategy::Summary(_))
    }
}

fn validate_threshold(threshold: Option<f64>) -> Result<()> {
    match threshold {
        Some(t) if t.is_nan() => Err(ClusterError::InvalidConfig(
            "Zoom threshold must not be NaN".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Distance between neighbouring laid-out members as a function of zoom:
/// `base_km / 2^(zoom / decay)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoomFalloff {
    /// Spacing at zoom 0, in kilometres
    pub base_km: f64,
    /// Zoom levels per halving of the spacing
    pub decay: f64,
}

impl ZoomFalloff {
    pub const fn new(base_km: f64, decay: f64) -> Self {
        Self { base_km, decay }
    }

    pub fn step_km(&self, zoom: f64) -> f64 {
        self.base_km / 2f64.powf(zoom / self.decay)
    }

    pub fn step_meters(&self, zoom: f64) -> f64 {
        self.step_km(zoom) * 1_000.0
    }

    /// One step as (longitude, latitude) degrees at `lat`.
    pub fn step_degrees(&self, zoom: f64, lat: f64) -> (f64, f64) {
        meters_to_degrees(self.step_meters(zoom), lat)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_km.is_finite() && self.base_km > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "Layout spacing must be positive, got: {} km",
                self.base_km
            )));
        }
        if !(self.decay.is_finite() && self.decay > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "Layout spacing decay must be positive, got: {}",
                self.decay
            )));
        }
        Ok(())
    }
}

/// Primitive for a singleton node at its true position.
pub fn leaf_primitive(leaf: &LeafNode, encoding: &Encoding) -> RenderPrimitive {
    RenderPrimitive {
        position: leaf.position,
        size: encoding.size_for(leaf.value, None),
        color: encoding.color_for(leaf.value, None),
        node: NodeRef::Leaf(leaf.index),
        parent: None,
        label: None,
    }
}

/// Primitive for a member of `parent` drawn at `position`.
///
/// Members whose value encodes as missing get zero size whatever `size` the
/// layout reserved for them.
pub(crate) fn member_primitive(
    member: &Leaf<'_>,
    position: Point,
    size: f64,
    encoding: &Encoding,
    parent: ClusterId,
) -> RenderPrimitive {
    let size = match encoding.normalize(member.value, None) {
        Some(_) => size,
        None => 0.0,
    };
    RenderPrimitive {
        position,
        size,
        color: encoding.color_for(member.value, None),
        node: NodeRef::Leaf(member.index),
        parent: Some(parent),
        label: None,
    }
}

/// Members at their true geographic positions.
pub(crate) fn direct_positions(
    cluster: &ClusterSummary,
    members: &[Leaf<'_>],
    encoding: &Encoding,
) -> Vec<RenderPrimitive> {
    members
        .iter()
        .map(|m| {
            member_primitive(
                m,
                m.position,
                encoding.size_for(m.value, None),
                encoding,
                cluster.id,
            )
        })
        .collect()
}

/// Member indices ordered by ascending value; `NaN` last, ties keep input order.
pub(crate) fn ascending_by_value(members: &[Leaf<'_>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..members.len()).collect();
    order.sort_by(|&a, &b| nan_last(members[a].value, members[b].value));
    order
}

pub(crate) fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
