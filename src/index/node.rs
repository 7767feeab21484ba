//! Public node types returned by cluster index queries.

use geo::Point;
use geocluster_types::point::DataPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

const ZOOM_BITS: u64 = 5;
const ZOOM_MASK: u64 = (1 << ZOOM_BITS) - 1;
const INDEX_BITS: u64 = 32;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;
const GENERATION_SHIFT: u64 = ZOOM_BITS + INDEX_BITS;

/// Build generations wrap at this mask; ids stay within 53 bits so they
/// survive a round trip through JSON numbers.
pub(crate) const GENERATION_MASK: u32 = (1 << 16) - 1;

/// Highest zoom level a [`ClusterId`] can encode.
pub const MAX_ENCODABLE_ZOOM: u8 = ZOOM_MASK as u8;

/// Stable identifier of a cluster within one index build.
///
/// Packs the zoom level the cluster was formed at, its position in that level
/// and the generation of the build that produced it, so members can be
/// re-fetched without any lookup table. An id handed to a different build
/// does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u64);

impl ClusterId {
    pub(crate) fn new(generation: u32, zoom: u8, index: usize) -> Self {
        debug_assert!(u64::from(zoom) <= ZOOM_MASK);
        debug_assert!(index as u64 <= INDEX_MASK);
        Self(
            (u64::from(generation & GENERATION_MASK) << GENERATION_SHIFT)
                | ((index as u64 & INDEX_MASK) << ZOOM_BITS)
                | u64::from(zoom),
        )
    }

    /// Rebuild an id from its raw representation (e.g. one handed back by a host).
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Zoom level at which this cluster was formed.
    pub fn zoom(self) -> u8 {
        (self.0 & ZOOM_MASK) as u8
    }

    /// Generation of the index build this id belongs to.
    pub fn generation(self) -> u32 {
        (self.0 >> GENERATION_SHIFT) as u32
    }

    pub(crate) fn index(self) -> usize {
        ((self.0 >> ZOOM_BITS) & INDEX_MASK) as usize
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Back-reference from a rendered primitive to the index node it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeRef {
    /// Index of an input point
    Leaf(usize),
    Cluster(ClusterId),
}

/// A single input point as seen at some zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    /// Position of the point in the input set
    pub index: usize,
    pub position: Point,
    pub value: f64,
}

/// Aggregate view of a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: ClusterId,
    /// Count-weighted centroid (computed in mercator space)
    pub position: Point,
    /// Sum of member values
    pub value: f64,
    /// Number of input points under this cluster
    pub count: usize,
}

/// A node returned by [`ClusterIndex::get_clusters`](super::ClusterIndex::get_clusters).
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterNode {
    Leaf(LeafNode),
    Cluster(ClusterSummary),
}

impl ClusterNode {
    pub fn position(&self) -> Point {
        match self {
            ClusterNode::Leaf(leaf) => leaf.position,
            ClusterNode::Cluster(cluster) => cluster.position,
        }
    }

    /// Own value for a leaf, aggregate value for a cluster.
    pub fn value(&self) -> f64 {
        match self {
            ClusterNode::Leaf(leaf) => leaf.value,
            ClusterNode::Cluster(cluster) => cluster.value,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            ClusterNode::Leaf(_) => 1,
            ClusterNode::Cluster(cluster) => cluster.count,
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        match self {
            ClusterNode::Leaf(leaf) => NodeRef::Leaf(leaf.index),
            ClusterNode::Cluster(cluster) => NodeRef::Cluster(cluster.id),
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, ClusterNode::Cluster(_))
    }
}

/// A borrowed input point together with its index in the input set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf<'a> {
    pub index: usize,
    pub point: &'a DataPoint,
}

impl Deref for Leaf<'_> {
    type Target = DataPoint;

    fn deref(&self) -> &DataPoint {
        self.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_id_packing() {
        let id = ClusterId::new(42, 7, 12_345);
        assert_eq!(id.generation(), 42);
        assert_eq!(id.zoom(), 7);
        assert_eq!(id.index(), 12_345);
        assert_eq!(ClusterId::from_raw(id.raw()), id);

        let id = ClusterId::new(GENERATION_MASK, MAX_ENCODABLE_ZOOM, u32::MAX as usize);
        assert_eq!(id.generation(), GENERATION_MASK);
        assert_eq!(id.zoom(), MAX_ENCODABLE_ZOOM);
        assert_eq!(id.index(), u32::MAX as usize);
        assert!(id.raw() < 1 << 53);
    }

    #[test]
    fn test_generation_wraps() {
        let id = ClusterId::new(GENERATION_MASK + 3, 1, 1);
        assert_eq!(id.generation(), 2);
        assert_ne!(id, ClusterId::new(3, 1, 1));
    }

    #[test]
    fn test_node_ref_serde() {
        let json = serde_json::to_string(&NodeRef::Leaf(3)).unwrap();
        assert_eq!(json, r#"{"kind":"leaf","id":3}"#);
        let back: NodeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeRef::Leaf(3));
    }
}
