//! Resolving host pick events back to data.

use crate::index::{ClusterId, ClusterIndex, ClusterSummary, NodeRef};
use crate::layout::RenderPrimitive;
use geocluster_types::point::DataPoint;
use serde::{Deserialize, Serialize};

/// Kind of interaction that produced a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickMode {
    /// Pointer over a primitive
    Hover,
    /// Click / tap
    Select,
}

/// Whether picking an expanded cluster member resolves to the member itself
/// or to the cluster it was laid out from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PickTier {
    #[default]
    Leaf,
    Cluster,
}

/// A pick reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickEvent {
    pub node: NodeRef,
    pub mode: PickMode,
}

impl PickEvent {
    pub fn new(node: NodeRef, mode: PickMode) -> Self {
        Self { node, mode }
    }

    pub fn hover(node: NodeRef) -> Self {
        Self::new(node, PickMode::Hover)
    }

    pub fn select(node: NodeRef) -> Self {
        Self::new(node, PickMode::Select)
    }

    /// Event for a picked primitive, honouring `tier` for expanded members.
    pub fn from_primitive(primitive: &RenderPrimitive, mode: PickMode, tier: PickTier) -> Self {
        let node = match (tier, primitive.parent) {
            (PickTier::Cluster, Some(parent)) => NodeRef::Cluster(parent),
            _ => primitive.node,
        };
        Self::new(node, mode)
    }
}

/// What a pick resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Picked {
    /// A single input point
    Point(DataPoint),
    /// Leaves of a selected cluster, capped
    Points(Vec<DataPoint>),
    /// Aggregate of a hovered cluster
    Summary(ClusterSummary),
    /// Nothing under the pointer, or a reference that no longer resolves
    Nothing,
}

impl Picked {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Picked::Nothing)
    }
}

/// Resolve `event` against `index`.
///
/// A leaf resolves to its point regardless of mode. A hovered cluster
/// resolves to its summary without touching its leaves; a selected cluster
/// to at most `limit` of its points. References that do not exist in `index`
/// (for instance left over from a previous load) resolve to
/// [`Picked::Nothing`].
pub fn resolve(index: Option<&ClusterIndex>, event: &PickEvent, limit: usize) -> Picked {
    let Some(index) = index else {
        return Picked::Nothing;
    };

    match (event.node, event.mode) {
        (NodeRef::Leaf(i), _) => index
            .point(i)
            .cloned()
            .map_or(Picked::Nothing, Picked::Point),
        (NodeRef::Cluster(id), PickMode::Hover) => {
            index.cluster(id).map_or(Picked::Nothing, Picked::Summary)
        }
        (NodeRef::Cluster(id), PickMode::Select) => select_cluster(index, id, limit),
    }
}

fn select_cluster(index: &ClusterIndex, id: ClusterId, limit: usize) -> Picked {
    match index.get_leaves(id, limit, 0) {
        Ok(leaves) => Picked::Points(leaves.into_iter().map(|l| l.point.clone()).collect()),
        Err(e) => {
            log::debug!("Pick on cluster {} did not resolve: {}", id, e);
            Picked::Nothing
        }
    }
}
