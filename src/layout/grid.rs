//! Square grid layout.

use super::{
    Layout, RenderPrimitive, ZoomFalloff, ascending_by_value, direct_positions, member_primitive,
};
use crate::compute::encoding::Encoding;
use crate::index::{ClusterSummary, Leaf};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Members on a `ceil(sqrt(n))`-wide square grid centred on the cluster
/// centroid, filled row by row in ascending value order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridLayout {
    /// Distance between neighbouring cells
    pub spacing: ZoomFalloff,
    /// Above this zoom members are drawn at their true positions
    pub direct_above: Option<f64>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            spacing: ZoomFalloff::new(100.0, 1.8),
            direct_above: None,
        }
    }
}

impl GridLayout {
    /// Side length of the square grid for `n` members.
    pub fn dimension(n: usize) -> usize {
        (n as f64).sqrt().ceil() as usize
    }
}

impl Layout for GridLayout {
    fn expand(
        &self,
        cluster: &ClusterSummary,
        members: &[Leaf<'_>],
        zoom: f64,
        encoding: &Encoding,
    ) -> Vec<RenderPrimitive> {
        if self.direct_above.is_some_and(|t| zoom > t) {
            return direct_positions(cluster, members, encoding);
        }
        if members.is_empty() {
            return Vec::new();
        }

        let d = Self::dimension(members.len());
        let (cx, cy) = cluster.position.x_y();
        let (dx, dy) = self.spacing.step_degrees(zoom, cy);
        let offset = (d - 1) as f64 / 2.0;

        ascending_by_value(members)
            .into_iter()
            .enumerate()
            .map(|(slot, i)| {
                let member = &members[i];
                let col = (slot % d) as f64 - offset;
                let row = (slot / d) as f64 - offset;
                let position = Point::new(cx + dx * col, cy - dy * row);
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
    use geo::{Distance, Haversine};
    use geocluster_types::point::DataPoint;

    fn nine_members() -> Vec<DataPoint> {
        // Values deliberately out of order
        [5.0, 1.0, 9.0, 3.0, 7.0, 2.0, 8.0, 4.0, 6.0]
            .iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(format!("p{i}"), -105.0, 40.0, *v))
            .collect()
    }

    #[test]
    fn test_three_by_three_is_centred() {
        let points = nine_members();
        let members = leaves(&points);
        let cluster = cluster_at(-105.0, 40.0, 9);
        let out = GridLayout::default().expand(&cluster, &members, 5.0, &Encoding::default());

        assert_eq!(out.len(), 9);
        let mean_x = out.iter().map(|p| p.position.x()).sum::<f64>() / 9.0;
        let mean_y = out.iter().map(|p| p.position.y()).sum::<f64>() / 9.0;
        assert!((mean_x - -105.0).abs() < 1e-9);
        assert!((mean_y - 40.0).abs() < 1e-9);

        // Middle slot sits exactly on the centroid
        assert_eq!(out[4].position, Point::new(-105.0, 40.0));
        for p in &out {
            assert_eq!(p.parent, Some(cluster.id));
        }
    }

    #[test]
    fn test_grid_filled_in_ascending_value_order() {
        let points = nine_members();
        let members = leaves(&points);
        let cluster = cluster_at(-105.0, 40.0, 9);
        let out = GridLayout::default().expand(&cluster, &members, 5.0, &Encoding::default());

        let values: Vec<f64> = out
            .iter()
            .map(|p| match p.node {
                NodeRef::Leaf(i) => points[i].value,
                NodeRef::Cluster(_) => panic!("grid emits leaves"),
            })
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);

        // First row is north of the centroid, first column west of it
        assert!(out[0].position.y() > 40.0);
        assert!(out[0].position.x() < -105.0);
    }

    #[test]
    fn test_uniform_spacing_in_metres() {
        let points = nine_members();
        let members = leaves(&points);
        let cluster = cluster_at(-105.0, 40.0, 9);
        let layout = GridLayout::default();
        let out = layout.expand(&cluster, &members, 5.0, &Encoding::default());
        let expected = layout.spacing.step_meters(5.0);

        let east = Haversine.distance(out[3].position, out[4].position);
        let south = Haversine.distance(out[1].position, out[4].position);
        assert!((east / expected - 1.0).abs() < 0.01, "east {east} vs {expected}");
        assert!((south / expected - 1.0).abs() < 0.01, "south {south} vs {expected}");
    }

    #[test]
    fn test_spacing_shrinks_with_zoom() {
        let points = nine_members();
        let members = leaves(&points);
        let cluster = cluster_at(-105.0, 40.0, 9);
        let layout = GridLayout::default();
        let spread = |zoom: f64| {
            let out = layout.expand(&cluster, &members, zoom, &Encoding::default());
            out[8].position.x() - out[0].position.x()
        };
        assert!(spread(8.0) < spread(4.0));
    }

    #[test]
    fn test_partial_grid_and_direct_threshold() {
        let points: Vec<DataPoint> = nine_members().into_iter().take(5).collect();
        let members = leaves(&points);
        let cluster = cluster_at(-105.0, 40.0, 5);
        assert_eq!(GridLayout::dimension(5), 3);

        let out = GridLayout::default().expand(&cluster, &members, 5.0, &Encoding::default());
        assert_eq!(out.len(), 5);

        let layout = GridLayout {
            direct_above: Some(10.0),
            ..GridLayout::default()
        };
        let out = layout.expand(&cluster, &members, 12.0, &Encoding::default());
        for (p, m) in out.iter().zip(&members) {
            assert_eq!(p.position, m.position);
        }
    }
}
