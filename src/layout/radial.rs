//! Concentric-ring layout.

use super::{
    Layout, RenderPrimitive, ZoomFalloff, ascending_by_value, direct_positions, member_primitive,
};
use crate::compute::encoding::Encoding;
use crate::index::{ClusterSummary, Leaf};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Members on rings around the centroid while zoomed out, at their true
/// positions past `threshold`.
///
/// The lowest-valued member takes the centre; ring `k` holds up to `6k`
/// members, spaced evenly, with one spacing step between rings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadialLayout {
    pub threshold: f64,
    pub spacing: ZoomFalloff,
}

impl Default for RadialLayout {
    fn default() -> Self {
        Self {
            threshold: 11.0,
            spacing: ZoomFalloff::new(100.0, 1.8),
        }
    }
}

/// Ring number and unit-circle offset of each of `n` slots.
fn ring_slots(n: usize) -> Vec<(usize, f64, f64)> {
    let mut slots = Vec::with_capacity(n);
    if n == 0 {
        return slots;
    }
    slots.push((0, 0.0, 0.0));

    let mut ring = 1;
    while slots.len() < n {
        let on_ring = (6 * ring).min(n - slots.len());
        for p in 0..on_ring {
            let angle = TAU * p as f64 / on_ring as f64;
            slots.push((ring, angle.cos(), angle.sin()));
        }
        ring += 1;
    }
    slots
}

impl Layout for RadialLayout {
    fn expand(
        &self,
        cluster: &ClusterSummary,
        members: &[Leaf<'_>],
        zoom: f64,
        encoding: &Encoding,
    ) -> Vec<RenderPrimitive> {
        if zoom > self.threshold {
            return direct_positions(cluster, members, encoding);
        }

        let (cx, cy) = cluster.position.x_y();
        let (dx, dy) = self.spacing.step_degrees(zoom, cy);

        ascending_by_value(members)
            .into_iter()
            .zip(ring_slots(members.len()))
            .map(|(i, (ring, ux, uy))| {
                let member = &members[i];
                let k = ring as f64;
                let position = Point::new(cx + dx * k * ux, cy + dy * k * uy);
                member_primitive(
                    member,
                    position,
                    encoding.size_for(member.value, None),
                    encoding,
                    cluster.id,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{cluster_at, leaves};
    use super::*;
    use crate::index::NodeRef;
    use geocluster_types::point::DataPoint;

    #[test]
    fn test_ring_capacities() {
        let slots = ring_slots(20);
        let per_ring = |r: usize| slots.iter().filter(|s| s.0 == r).count();
        assert_eq!(per_ring(0), 1);
        assert_eq!(per_ring(1), 6);
        assert_eq!(per_ring(2), 12);
        assert_eq!(per_ring(3), 1);
        assert!(ring_slots(0).is_empty());
    }

    #[test]
    fn test_lowest_value_at_centre() {
        let points: Vec<DataPoint> = [4.0, 2.0, 9.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(format!("p{i}"), 2.35, 48.85, *v))
            .collect();
        let members = leaves(&points);
        let cluster = cluster_at(2.35, 48.85, 4);
        let out = RadialLayout::default().expand(&cluster, &members, 5.0, &Encoding::default());

        assert_eq!(out.len(), 4);
        assert_eq!(out[0].node, NodeRef::Leaf(3));
        assert_eq!(out[0].position, cluster.position);

        let step = RadialLayout::default().spacing.step_degrees(5.0, 48.85).1;
        for p in &out[1..] {
            let dlat = p.position.y() - 48.85;
            assert!(dlat.abs() <= step + 1e-12);
            assert_ne!(p.position, cluster.position);
        }
    }

    #[test]
    fn test_true_positions_past_threshold() {
        let points = vec![
            DataPoint::new("a", 2.35, 48.85, 1.0),
            DataPoint::new("b", 2.36, 48.86, 2.0),
        ];
        let members = leaves(&points);
        let cluster = cluster_at(2.355, 48.855, 2);
        let out = RadialLayout::default().expand(&cluster, &members, 12.0, &Encoding::default());
        assert_eq!(out[0].position, points[0].position);
        assert_eq!(out[1].position, points[1].position);
    }
}
