use geocluster::engine::{self, EngineState};
use geocluster::index::{ClusterIndex, IndexOptions};
use geocluster::layout::{GridLayout, PackLayout};
use geocluster::{
    BoundingBox, ClusterNode, DataPoint, EngineConfig, LayoutStrategy, NodeRef, Rgba, ZoomOutcome,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic scatter of `n` points in a few dense spots.
fn scattered(n: usize) -> Vec<DataPoint> {
    let centres = [(-74.0, 40.7), (2.35, 48.85), (139.7, 35.7), (-58.4, -34.6)];
    (0..n)
        .map(|i| {
            let (lon, lat) = centres[i % centres.len()];
            let a = (i * 7919 % 1000) as f64 / 1000.0 - 0.5;
            let b = (i * 104_729 % 1000) as f64 / 1000.0 - 0.5;
            DataPoint::new(format!("p{i}"), lon + a * 2.0, lat + b * 2.0, (i % 97) as f64)
        })
        .collect()
}

#[test]
fn test_four_point_scenario() {
    init_logging();
    let points = vec![
        DataPoint::new("a", 0.0, 0.0, 1.0),
        DataPoint::new("b", 0.001, 0.0, 2.0),
        DataPoint::new("c", 0.0, 0.001, 3.0),
        DataPoint::new("d", 10.0, 10.0, 100.0),
    ];
    let options = IndexOptions::default().with_radius(50.0).with_max_zoom(16);
    let index = ClusterIndex::build(points, options).unwrap();

    let nodes = index.get_clusters(&BoundingBox::WORLD, 2.0);
    assert_eq!(nodes.len(), 2);

    let cluster = nodes
        .iter()
        .find_map(|n| match n {
            ClusterNode::Cluster(c) => Some(c),
            ClusterNode::Leaf(_) => None,
        })
        .expect("one cluster");
    assert_eq!(cluster.count, 3);
    assert_eq!(cluster.value, 6.0);

    let leaf = nodes
        .iter()
        .find_map(|n| match n {
            ClusterNode::Leaf(l) => Some(l),
            ClusterNode::Cluster(_) => None,
        })
        .expect("one leaf");
    assert_eq!(index.point(leaf.index).unwrap().id, "d");
    assert_eq!(leaf.value, 100.0);
}

#[test]
fn test_cluster_count_never_grows_when_zooming_out() {
    init_logging();
    let index = ClusterIndex::build(scattered(2_000), IndexOptions::default()).unwrap();

    let mut previous = usize::MAX;
    for zoom in (0..=16).rev() {
        let n = index.get_clusters(&BoundingBox::WORLD, f64::from(zoom)).len();
        assert!(n <= previous, "zoom {zoom}: {n} > {previous}");
        previous = n;
    }

    let all_leaves = index.get_clusters(&BoundingBox::WORLD, 16.0);
    assert_eq!(all_leaves.len(), 2_000);
    assert!(all_leaves.iter().all(|n| !n.is_cluster()));
}

#[test]
fn test_aggregates_are_additive() {
    let points = scattered(500);
    let index = ClusterIndex::build(points, IndexOptions::default()).unwrap();

    for zoom in [1.0, 4.0, 9.0] {
        let nodes = index.get_clusters(&BoundingBox::WORLD, zoom);
        assert_eq!(nodes.iter().map(ClusterNode::count).sum::<usize>(), 500);

        for node in nodes {
            let ClusterNode::Cluster(cluster) = node else {
                continue;
            };
            let leaves = index.get_leaves(cluster.id, usize::MAX, 0).unwrap();
            assert_eq!(leaves.len(), cluster.count);
            let sum: f64 = leaves.iter().map(|l| l.value).sum();
            assert!((sum - cluster.value).abs() < 1e-6);

            let children = index.get_children(cluster.id).unwrap();
            assert_eq!(children.iter().map(ClusterNode::count).sum::<usize>(), cluster.count);
        }
    }
}

#[test]
fn test_grid_scenario_through_engine() {
    init_logging();
    let points: Vec<DataPoint> = (0..9)
        .map(|i| DataPoint::new(format!("g{i}"), 8.5 + 0.0001 * i as f64, 47.37, (9 - i) as f64))
        .collect();

    let mut state = EngineState::default();
    let config = EngineConfig::default().with_layout(LayoutStrategy::grid());
    engine::load_data(&mut state, points, config).unwrap();
    assert_eq!(engine::on_zoom_change(&mut state, 6.3), ZoomOutcome::Recomputed);

    let primitives = state.primitives();
    assert_eq!(primitives.len(), 9);

    let centroid_x = primitives.iter().map(|p| p.position.x()).sum::<f64>() / 9.0;
    let centroid_y = primitives.iter().map(|p| p.position.y()).sum::<f64>() / 9.0;
    let centre = primitives[4].position;
    assert!((centroid_x - centre.x()).abs() < 1e-9);
    assert!((centroid_y - centre.y()).abs() < 1e-9);

    // Uniform column and row spacing
    let dx = primitives[1].position.x() - primitives[0].position.x();
    let dy = primitives[0].position.y() - primitives[3].position.y();
    for row in 0..3 {
        for col in 0..3 {
            let p = primitives[row * 3 + col].position;
            assert!((p.x() - (primitives[0].position.x() + dx * col as f64)).abs() < 1e-9);
            assert!((p.y() - (primitives[0].position.y() - dy * row as f64)).abs() < 1e-9);
        }
    }

    // Ascending value: the point with value 1 is "g8"
    assert_eq!(primitives[0].node, NodeRef::Leaf(8));
}

#[test]
fn test_pack_uses_true_positions_above_threshold() {
    init_logging();
    // About ten centimetres apart: one cluster at zoom 21 with max_zoom 24
    let points: Vec<DataPoint> = (0..5)
        .map(|i| DataPoint::new(format!("k{i}"), 151.2093 + 0.000001 * i as f64, -33.8688, 1.0))
        .collect();
    let config = EngineConfig::default()
        .with_max_zoom(24)
        .with_layout(LayoutStrategy::Pack(PackLayout::default()));

    let mut state = EngineState::default();
    engine::load_data(&mut state, points.clone(), config).unwrap();
    engine::on_zoom_change(&mut state, 21.0);

    let primitives = state.primitives();
    assert_eq!(primitives.len(), 5);
    assert!(primitives.iter().all(|p| p.parent.is_some()));
    for p in primitives {
        let NodeRef::Leaf(i) = p.node else {
            panic!("members render as leaves");
        };
        assert_eq!(p.position, points[i].position);
    }

    // Below the threshold the same members are packed around the centroid
    engine::on_zoom_change(&mut state, 19.0);
    let moved = state
        .primitives()
        .iter()
        .filter(|p| matches!(p.node, NodeRef::Leaf(i) if p.position != points[i].position))
        .count();
    assert!(moved > 0);
}

#[test]
fn test_missing_values_render_as_sentinel() {
    let points = vec![
        DataPoint::new("ok", 10.0, 10.0, 50.0),
        DataPoint::new("missing", -10.0, -10.0, f64::NAN),
    ];
    let mut state = EngineState::default();
    engine::load_data(&mut state, points, EngineConfig::default()).unwrap();
    engine::on_zoom_change(&mut state, 16.0);

    let missing = state
        .primitives()
        .iter()
        .find(|p| p.node == NodeRef::Leaf(1))
        .unwrap();
    assert_eq!([missing.color.r, missing.color.g, missing.color.b], [0, 0, 0]);
    assert_eq!(missing.color, Rgba::BLACK);
    assert_eq!(missing.size, 0.0);
}

#[test]
fn test_layout_is_deterministic_across_loads() {
    let run = |layout: LayoutStrategy| {
        let mut state = EngineState::default();
        let config = EngineConfig::default().with_layout(layout);
        engine::load_data(&mut state, scattered(300), config).unwrap();
        engine::on_zoom_change(&mut state, 5.0);
        state.primitives().to_vec()
    };

    for layout in [
        LayoutStrategy::Grid(GridLayout::default()),
        LayoutStrategy::pack(),
        LayoutStrategy::radial(),
        LayoutStrategy::summary(),
    ] {
        assert_eq!(run(layout.clone()), run(layout));
    }
}
