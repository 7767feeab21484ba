//! One icon per cluster.

use super::{Layout, RenderPrimitive};
use crate::compute::encoding::Encoding;
use crate::index::{ClusterSummary, Leaf, NodeRef};
use serde::{Deserialize, Serialize};

/// A single primitive at the cluster centroid, sized up with the logarithm of
/// the member count and labelled with the encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryLayout {
    /// Size grows by `ln(count) / log_divisor`
    pub log_divisor: f64,
}

impl Default for SummaryLayout {
    fn default() -> Self {
        Self { log_divisor: 8.0 }
    }
}

impl Layout for SummaryLayout {
    fn expand(
        &self,
        cluster: &ClusterSummary,
        _members: &[Leaf<'_>],
        _zoom: f64,
        encoding: &Encoding,
    ) -> Vec<RenderPrimitive> {
        let count = Some(cluster.count);
        let growth = 1.0 + (cluster.count.max(1) as f64).ln() / self.log_divisor;
        vec![RenderPrimitive {
            position: cluster.position,
            size: encoding.size_for(cluster.value, count) * growth,
            color: encoding.color_for(cluster.value, count),
            node: NodeRef::Cluster(cluster.id),
            parent: None,
            label: encoding.label_for(cluster.value, count),
        }]
    }

    fn needs_members(&self) -> bool {
        false
    }
}
