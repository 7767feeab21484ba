//! Circle-packing layout.

use super::circle::{self, Circle};
use super::{Layout, RenderPrimitive, ZoomFalloff, direct_positions, member_primitive, nan_last};
use crate::compute::encoding::Encoding;
use crate::index::{ClusterSummary, Leaf};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Members packed as non-overlapping circles with area proportional to their
/// weight, centred on the cluster centroid.
///
/// The packing happens in an abstract square of side `ceil(sqrt(n)) *
/// cell_size`; one abstract unit spans `spacing.step_km(zoom)` kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackLayout {
    /// Abstract units per grid cell of the packing square
    pub cell_size: f64,
    /// Gap between neighbouring circles, in abstract units
    pub padding: f64,
    pub spacing: ZoomFalloff,
    /// Above this zoom members are drawn at their true positions
    pub direct_above: f64,
}

impl Default for PackLayout {
    fn default() -> Self {
        Self {
            cell_size: 12.0,
            padding: 3.0,
            spacing: ZoomFalloff::new(10.0, 1.8),
            direct_above: 20.0,
        }
    }
}

impl PackLayout {
    /// Packed circles for `members`, in member order, within a square of
    /// side [`dimension`](Self::dimension).
    pub fn circles(&self, members: &[Leaf<'_>]) -> Vec<Circle> {
        let n = members.len();
        if n == 0 {
            return Vec::new();
        }

        // Heaviest first, as circle packing expects
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            nan_last(-members[a].pack_weight(), -members[b].pack_weight())
        });

        let radii = radii(order.iter().map(|&i| members[i].pack_weight()));
        let packed = circle::pack(&radii, self.dimension(n), self.padding);

        let mut out = vec![Circle::new(0.0, 0.0, 0.0); n];
        for (slot, &i) in order.iter().enumerate() {
            out[i] = packed[slot];
        }
        out
    }

    pub fn dimension(&self, n: usize) -> f64 {
        (n as f64).sqrt().ceil() * self.cell_size
    }
}

/// Radius `sqrt(weight)` per member. Weights that are missing or not positive
/// get a small fraction of the largest radius; all-empty weights pack uniformly.
fn radii(weights: impl Iterator<Item = f64>) -> Vec<f64> {
    let raw: Vec<Option<f64>> = weights
        .map(|w| (w.is_finite() && w > 0.0).then(|| w.sqrt()))
        .collect();
    let max = raw.iter().flatten().copied().fold(0.0, f64::max);
    if max == 0.0 {
        return vec![1.0; raw.len()];
    }
    let floor = max * 0.05;
    raw.into_iter().map(|r| r.unwrap_or(floor)).collect()
}

impl Layout for PackLayout {
    fn expand(
        &self,
        cluster: &ClusterSummary,
        members: &[Leaf<'_>],
        zoom: f64,
        encoding: &Encoding,
    ) -> Vec<RenderPrimitive> {
        if zoom > self.direct_above {
            return direct_positions(cluster, members, encoding);
        }
        if members.is_empty() {
            return Vec::new();
        }

        let dim = self.dimension(members.len());
        let half = dim / 2.0;
        let (cx, cy) = cluster.position.x_y();
        let (dx, dy) = self.spacing.step_degrees(zoom, cy);
        let unit_meters = self.spacing.step_meters(zoom);

        members
            .iter()
            .zip(self.circles(members))
            .map(|(member, c)| {
                let position = Point::new(cx + dx * (c.x - half), cy - dy * (c.y - half));
                member_primitive(member, position, c.r * unit_meters, encoding, cluster.id)
            })
            .collect()
    }
}
