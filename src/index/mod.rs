//! Multi-resolution spatial cluster index.
//!
//! Points are projected into the Web-Mercator unit square and clustered
//! greedily, level by level, from the finest zoom down to the coarsest. Every
//! level keeps its own R-tree so that bounding box queries at any zoom are a
//! single envelope lookup.
//!
//! 1. **Leaf level**: level `max_zoom` holds the raw input points.
//! 2. **Aggregation**: level `z` is produced from level `z + 1` by merging every
//!    node with its unvisited neighbours within `radius / (extent * 2^z)`.
//! 3. **Lineage**: each cluster records the indices of its children in the
//!    next finer level, which makes leaf retrieval a depth-first walk.
//!
//! Building is `O(n log n)` per level; queries are cheap. Rebuild only when the
//! point set or the radius changes.
//!
//! ```rust
//! use geocluster::index::{ClusterIndex, IndexOptions};
//! use geocluster::{BoundingBox, DataPoint};
//!
//! let points = vec![
//!     DataPoint::new("a", 0.0, 0.0, 1.0),
//!     DataPoint::new("b", 0.001, 0.0, 2.0),
//! ];
//! let index = ClusterIndex::build(points, IndexOptions::default())?;
//! let nodes = index.get_clusters(&BoundingBox::WORLD, 2.0);
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].count(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod node;
pub mod projection;

pub use node::{ClusterId, ClusterNode, ClusterSummary, Leaf, LeafNode, NodeRef};

use crate::compute::validation::validate_data_points;
use crate::error::{ClusterError, Result};
use geo::Point;
use geocluster_types::bbox::BoundingBox;
use geocluster_types::point::DataPoint;
use node::{GENERATION_MASK, MAX_ENCODABLE_ZOOM};
use projection::{lat_y, lng_x, wrap_lng, x_lng, y_lat};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, Ordering};

type IndexedCoord = GeomWithData<[f64; 2], u32>;

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(0);

/// Parameters of an index build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexOptions {
    /// Cluster radius in pixels of a tile of `extent` pixels
    #[serde(default = "IndexOptions::default_radius")]
    pub radius: f64,

    /// Tile extent the radius is expressed against
    #[serde(default = "IndexOptions::default_extent")]
    pub extent: f64,

    /// Coarsest zoom level that gets its own cluster level
    #[serde(default)]
    pub min_zoom: u8,

    /// Zoom at and above which every node is a leaf
    #[serde(default = "IndexOptions::default_max_zoom")]
    pub max_zoom: u8,

    /// Minimum number of points to form a cluster
    #[serde(default = "IndexOptions::default_min_points")]
    pub min_points: usize,
}

impl IndexOptions {
    const fn default_radius() -> f64 {
        40.0
    }

    const fn default_extent() -> f64 {
        512.0
    }

    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_min_points() -> usize {
        2
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_zoom(mut self, min_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "Radius must be positive and finite, got: {}",
                self.radius
            )));
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "Extent must be positive and finite, got: {}",
                self.extent
            )));
        }
        if self.max_zoom > MAX_ENCODABLE_ZOOM - 1 {
            return Err(ClusterError::InvalidConfig(format!(
                "max_zoom must be at most {}, got: {}",
                MAX_ENCODABLE_ZOOM - 1,
                self.max_zoom
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ClusterError::InvalidConfig(format!(
                "min_zoom ({}) must be <= max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.min_points == 0 {
            return Err(ClusterError::InvalidConfig(
                "min_points must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            min_points: Self::default_min_points(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeSource {
    Point(u32),
    Cluster(ClusterId),
}

#[derive(Debug, Clone)]
struct IndexedNode {
    x: f64,
    y: f64,
    count: usize,
    value: f64,
    source: NodeSource,
}

#[derive(Debug, Default)]
struct Level {
    nodes: Vec<IndexedNode>,
    tree: RTree<IndexedCoord>,
    /// Children (indices into the next finer level) of clusters formed here
    children: FxHashMap<u32, SmallVec<[u32; 4]>>,
}

impl Level {
    fn from_nodes(nodes: Vec<IndexedNode>, children: FxHashMap<u32, SmallVec<[u32; 4]>>) -> Self {
        let coords = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| GeomWithData::new([n.x, n.y], i as u32))
            .collect();
        Self {
            tree: RTree::bulk_load(coords),
            nodes,
            children,
        }
    }

    /// Node indices within `r` of `(x, y)`, in ascending order.
    fn within(&self, x: f64, y: f64, r: f64) -> SmallVec<[u32; 16]> {
        let mut ids: SmallVec<[u32; 16]> = self
            .tree
            .locate_within_distance([x, y], r * r)
            .map(|c| c.data)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Immutable multi-resolution cluster index over a point set.
#[derive(Debug)]
pub struct ClusterIndex {
    points: Vec<DataPoint>,
    options: IndexOptions,
    /// Stamped into every cluster id of this build
    generation: u32,
    /// `levels[z]` holds the nodes visible at zoom `z`
    levels: Vec<Level>,
}

impl ClusterIndex {
    /// Build an index over `points`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidConfig`] for invalid options and
    /// [`ClusterError::InvalidInput`] for points with invalid coordinates.
    pub fn build(points: Vec<DataPoint>, options: IndexOptions) -> Result<Self> {
        options.validate()?;
        validate_data_points(&points)?;
        if points.len() > u32::MAX as usize {
            return Err(ClusterError::InvalidInput(format!(
                "Too many points for one index: {}",
                points.len()
            )));
        }

        let max_zoom = usize::from(options.max_zoom);
        let min_zoom = usize::from(options.min_zoom);
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed) & GENERATION_MASK;

        let leaves: Vec<IndexedNode> = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedNode {
                x: lng_x(p.lon()),
                y: lat_y(p.lat()),
                count: 1,
                value: p.value,
                source: NodeSource::Point(i as u32),
            })
            .collect();

        let mut levels: Vec<Level> = (0..=max_zoom).map(|_| Level::default()).collect();
        levels[max_zoom] = Level::from_nodes(leaves, FxHashMap::default());

        for zoom in (min_zoom..max_zoom).rev() {
            let (nodes, children) = cluster_level(&levels[zoom + 1], generation, zoom as u8, &options);
            levels[zoom] = Level::from_nodes(nodes, children);
        }

        log::debug!(
            "Built cluster index generation {}: {} points, zoom {}..={}, {} nodes at coarsest level",
            generation,
            points.len(),
            min_zoom,
            max_zoom,
            levels[min_zoom].nodes.len()
        );

        Ok(Self {
            points,
            options,
            generation,
            levels,
        })
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Build generation carried by every [`ClusterId`] of this index.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of input points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Input point by index.
    pub fn point(&self, index: usize) -> Option<&DataPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Clamp a continuous zoom to the level used for queries.
    pub fn level_for_zoom(&self, zoom: f64) -> u8 {
        let min = f64::from(self.options.min_zoom);
        let max = f64::from(self.options.max_zoom);
        if zoom.is_nan() {
            return self.options.min_zoom;
        }
        zoom.floor().clamp(min, max) as u8
    }

    /// Nodes intersecting `bbox` at `zoom`, ordered by their position in the level.
    ///
    /// Longitudes are normalised; a box whose west edge lies east of its east
    /// edge is treated as crossing the antimeridian. Non-finite boxes and
    /// boxes whose south edge lies north of their north edge yield no nodes.
    pub fn get_clusters(&self, bbox: &BoundingBox, zoom: f64) -> Vec<ClusterNode> {
        if !bbox.is_finite() {
            log::warn!("Rejecting cluster query with non-finite bounding box");
            return Vec::new();
        }
        if bbox.south > bbox.north {
            log::warn!(
                "Rejecting cluster query with south ({}) above north ({})",
                bbox.south,
                bbox.north
            );
            return Vec::new();
        }

        let min_lat = bbox.south.clamp(-90.0, 90.0);
        let max_lat = bbox.north.clamp(-90.0, 90.0);

        let (min_lng, max_lng) = if bbox.east - bbox.west >= 360.0 {
            (-180.0, 180.0)
        } else {
            let min_lng = wrap_lng(bbox.west);
            let max_lng = if bbox.east == 180.0 {
                180.0
            } else {
                wrap_lng(bbox.east)
            };
            if min_lng > max_lng {
                let mut eastern = self.get_clusters(
                    &BoundingBox::new(min_lng, min_lat, 180.0, max_lat),
                    zoom,
                );
                let western = self.get_clusters(
                    &BoundingBox::new(-180.0, min_lat, max_lng, max_lat),
                    zoom,
                );
                eastern.extend(western);
                return eastern;
            }
            (min_lng, max_lng)
        };

        let level = &self.levels[usize::from(self.level_for_zoom(zoom))];
        let envelope = AABB::from_corners(
            [lng_x(min_lng), lat_y(max_lat)],
            [lng_x(max_lng), lat_y(min_lat)],
        );
        let mut ids: Vec<u32> = level
            .tree
            .locate_in_envelope(&envelope)
            .map(|c| c.data)
            .collect();
        ids.sort_unstable();

        ids.into_iter()
            .map(|i| self.public_node(&level.nodes[i as usize]))
            .collect()
    }

    /// Summary of a cluster by id.
    pub fn cluster(&self, id: ClusterId) -> Option<ClusterSummary> {
        let node = self.cluster_node(id)?;
        Some(ClusterSummary {
            id,
            position: node_position(node),
            value: node.value,
            count: node.count,
        })
    }

    /// Direct children of a cluster, one zoom level finer.
    pub fn get_children(&self, id: ClusterId) -> Result<Vec<ClusterNode>> {
        let children = self.children_of(id)?;
        let finer = &self.levels[usize::from(id.zoom()) + 1];
        Ok(children
            .iter()
            .map(|&i| self.public_node(&finer.nodes[i as usize]))
            .collect())
    }

    /// Up to `limit` input points under a cluster, skipping the first `offset`.
    ///
    /// The result is a cap: when the cluster holds more than `offset + limit`
    /// points the remainder is silently omitted.
    pub fn get_leaves(&self, id: ClusterId, limit: usize, offset: usize) -> Result<Vec<Leaf<'_>>> {
        let mut leaves = Vec::with_capacity(limit.min(1024));
        let mut skipped = 0;
        if limit > 0 {
            self.append_leaves(&mut leaves, id, limit, offset, &mut skipped)?;
        }
        Ok(leaves)
    }

    /// Zoom level at which a cluster splits into its children.
    pub fn expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        self.children_of(id)?;
        Ok(id.zoom() + 1)
    }

    fn cluster_node(&self, id: ClusterId) -> Option<&IndexedNode> {
        if id.generation() != self.generation {
            return None;
        }
        let level = self.levels.get(usize::from(id.zoom()))?;
        let node = level.nodes.get(id.index())?;
        match node.source {
            NodeSource::Cluster(own) if own == id => Some(node),
            _ => None,
        }
    }

    fn children_of(&self, id: ClusterId) -> Result<&SmallVec<[u32; 4]>> {
        self.cluster_node(id)
            .and_then(|_| {
                self.levels[usize::from(id.zoom())]
                    .children
                    .get(&(id.index() as u32))
            })
            .ok_or(ClusterError::ClusterNotFound(id))
    }

    fn append_leaves<'a>(
        &'a self,
        out: &mut Vec<Leaf<'a>>,
        id: ClusterId,
        limit: usize,
        offset: usize,
        skipped: &mut usize,
    ) -> Result<()> {
        let children = self.children_of(id)?;
        let finer = &self.levels[usize::from(id.zoom()) + 1];

        for &child in children {
            let node = &finer.nodes[child as usize];
            match node.source {
                NodeSource::Cluster(child_id) => {
                    if *skipped + node.count <= offset {
                        *skipped += node.count;
                    } else {
                        self.append_leaves(out, child_id, limit, offset, skipped)?;
                    }
                }
                NodeSource::Point(p) => {
                    if *skipped < offset {
                        *skipped += 1;
                    } else {
                        let index = p as usize;
                        out.push(Leaf {
                            index,
                            point: &self.points[index],
                        });
                    }
                }
            }
            if out.len() >= limit {
                break;
            }
        }
        Ok(())
    }

    fn public_node(&self, node: &IndexedNode) -> ClusterNode {
        match node.source {
            NodeSource::Point(p) => {
                let point = &self.points[p as usize];
                ClusterNode::Leaf(LeafNode {
                    index: p as usize,
                    position: point.position,
                    value: point.value,
                })
            }
            NodeSource::Cluster(id) => ClusterNode::Cluster(ClusterSummary {
                id,
                position: node_position(node),
                value: node.value,
                count: node.count,
            }),
        }
    }
}

fn node_position(node: &IndexedNode) -> Point {
    Point::new(x_lng(node.x), y_lat(node.y))
}

/// Aggregate `finer` into the nodes of level `zoom`.
fn cluster_level(
    finer: &Level,
    generation: u32,
    zoom: u8,
    options: &IndexOptions,
) -> (Vec<IndexedNode>, FxHashMap<u32, SmallVec<[u32; 4]>>) {
    let r = options.radius / (options.extent * 2f64.powi(i32::from(zoom)));
    let mut visited = vec![false; finer.nodes.len()];
    let mut nodes = Vec::with_capacity(finer.nodes.len());
    let mut children = FxHashMap::default();

    for i in 0..finer.nodes.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let seed = &finer.nodes[i];

        let neighbors: SmallVec<[u32; 16]> = finer
            .within(seed.x, seed.y, r)
            .into_iter()
            .filter(|&j| !visited[j as usize])
            .collect();

        let count: usize =
            seed.count + neighbors.iter().map(|&j| finer.nodes[j as usize].count).sum::<usize>();

        if !neighbors.is_empty() && count >= options.min_points {
            let id = ClusterId::new(generation, zoom, nodes.len());
            let mut wx = seed.x * seed.count as f64;
            let mut wy = seed.y * seed.count as f64;
            let mut value = seed.value;
            let mut members: SmallVec<[u32; 4]> = SmallVec::with_capacity(neighbors.len() + 1);
            members.push(i as u32);

            for &j in &neighbors {
                let b = &finer.nodes[j as usize];
                visited[j as usize] = true;
                wx += b.x * b.count as f64;
                wy += b.y * b.count as f64;
                value += b.value;
                members.push(j);
            }

            children.insert(nodes.len() as u32, members);
            nodes.push(IndexedNode {
                x: wx / count as f64,
                y: wy / count as f64,
                count,
                value,
                source: NodeSource::Cluster(id),
            });
        } else {
            nodes.push(seed.clone());
            for &j in &neighbors {
                visited[j as usize] = true;
                nodes.push(finer.nodes[j as usize].clone());
            }
        }
    }

    (nodes, children)
}
