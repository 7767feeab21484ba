use geocluster::compute::geojson::{points_from_geojson, primitives_to_geojson};
use geocluster::engine::{self, EnginePhase, EngineState};
use geocluster::index::{ClusterIndex, IndexOptions};
use geocluster::render::GeoJsonTarget;
use geocluster::{
    BoundingBox, ClusterEngine, ClusterError, ClusterLayer, ClusterNode, DataPoint, EngineConfig,
    NodeRef, PickEvent, PickMode, PickTier, Picked, Viewport, ZoomOutcome,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Test 1: Empty dataset
#[test]
fn test_empty_dataset() {
    init_logging();
    let mut state = EngineState::default();
    engine::load_data(&mut state, Vec::new(), EngineConfig::default()).unwrap();
    assert_eq!(engine::on_zoom_change(&mut state, 4.0), ZoomOutcome::Recomputed);
    assert_eq!(state.phase(), EnginePhase::Ready);
    assert!(state.primitives().is_empty());
}

/// Test 2: Clusters straddling the antimeridian
#[test]
fn test_antimeridian_queries() {
    init_logging();
    let points = vec![
        DataPoint::new("fiji", 179.9, -17.0, 1.0),
        DataPoint::new("samoa", -179.9, -17.0, 2.0),
        DataPoint::new("lima", -77.0, -12.0, 3.0),
    ];
    let index = ClusterIndex::build(points, IndexOptions::default()).unwrap();

    let pacific = BoundingBox::new(170.0, -30.0, -170.0, 0.0);
    assert!(pacific.crosses_antimeridian());
    let nodes = index.get_clusters(&pacific, 16.0);
    assert_eq!(nodes.len(), 2);

    let mut ids: Vec<&str> = nodes
        .iter()
        .map(|n| match n {
            ClusterNode::Leaf(l) => index.point(l.index).unwrap().id.as_str(),
            ClusterNode::Cluster(_) => panic!("zoom 16 has no clusters"),
        })
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["fiji", "samoa"]);

    // Wider than the world means everything
    let everywhere = BoundingBox::new(-200.0, -90.0, 200.0, 90.0);
    assert_eq!(index.get_clusters(&everywhere, 16.0).len(), 3);
}

/// Test 3: Extreme latitudes survive the mercator clamp
#[test]
fn test_polar_points_are_rendered() {
    let points = vec![
        DataPoint::new("north", 0.0, 89.9, 1.0),
        DataPoint::new("south", 0.0, -89.9, 1.0),
        DataPoint::new("equator", 0.0, 0.0, 1.0),
    ];
    let mut state = EngineState::default();
    engine::load_data(&mut state, points, EngineConfig::default()).unwrap();
    engine::on_zoom_change(&mut state, 16.0);
    assert_eq!(state.primitives().len(), 3);
}

/// Test 4: Invalid input is reported with the offending point
#[test]
fn test_invalid_input_names_point() {
    let points = vec![
        DataPoint::new("fine", 0.0, 0.0, 1.0),
        DataPoint::new("broken", f64::NAN, 0.0, 1.0),
    ];
    let mut engine = ClusterEngine::new();
    match engine.load(points, EngineConfig::default()) {
        Err(ClusterError::InvalidInput(msg)) => assert!(msg.contains("broken")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(engine.phase(), EnginePhase::Empty);
}

/// Test 5: Non-finite zoom and bbox are ignored
#[test]
fn test_non_finite_inputs() {
    let mut engine = ClusterEngine::new();
    engine
        .load(vec![DataPoint::new("a", 1.0, 1.0, 1.0)], EngineConfig::default())
        .unwrap();
    assert_eq!(engine.set_viewport(Viewport::world(f64::NAN)), ZoomOutcome::Skipped);
    assert_eq!(engine.phase(), EnginePhase::Indexed);

    let index = engine.state().index().unwrap();
    let nan_box = BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0);
    assert!(index.get_clusters(&nan_box, 3.0).is_empty());
}

/// Test 6: Picks after a reload do not resolve against the new data
#[test]
fn test_stale_pick_after_reload() {
    let many: Vec<DataPoint> = (0..50)
        .map(|i| DataPoint::new(format!("p{i}"), 0.0001 * i as f64, 0.0, 1.0))
        .collect();
    let mut engine = ClusterEngine::new();
    engine.set_viewport(Viewport::world(3.0));
    engine.load(many, EngineConfig::default()).unwrap();

    let member = engine
        .primitives()
        .iter()
        .find(|p| p.parent.is_some())
        .cloned()
        .unwrap();
    let parent = member.parent.unwrap();
    let hover = PickEvent::from_primitive(&member, PickMode::Hover, PickTier::Cluster);
    assert!(matches!(engine.pick(&hover), Picked::Summary(s) if s.id == parent));

    engine
        .load(vec![DataPoint::new("solo", 5.0, 5.0, 1.0)], EngineConfig::default())
        .unwrap();
    assert!(engine.pick(&hover).is_nothing());
    assert!(engine.pick(&PickEvent::select(NodeRef::Leaf(30))).is_nothing());
}

/// Test 7: Cluster ids from a previous load miss even when the new data
/// produces a cluster in the same slot
#[test]
fn test_cluster_pick_from_previous_load() {
    let cluster_of = |prefix: &str| -> Vec<DataPoint> {
        (0..40)
            .map(|i| DataPoint::new(format!("{prefix}{i}"), 0.0001 * i as f64, 0.0, 1.0))
            .collect()
    };
    let mut engine = ClusterEngine::new();
    engine.set_viewport(Viewport::world(3.0));
    engine.load(cluster_of("old"), EngineConfig::default()).unwrap();

    let old_id = engine
        .primitives()
        .iter()
        .find_map(|p| p.parent)
        .unwrap();
    let select = PickEvent::select(NodeRef::Cluster(old_id));
    assert!(matches!(engine.pick(&select), Picked::Points(p) if p[0].id.starts_with("old")));

    engine.load(cluster_of("new"), EngineConfig::default()).unwrap();
    let new_id = engine
        .primitives()
        .iter()
        .find_map(|p| p.parent)
        .unwrap();
    assert_eq!(new_id.zoom(), old_id.zoom());
    assert_ne!(new_id, old_id);

    assert!(engine.pick(&select).is_nothing());
    assert!(engine.pick(&PickEvent::hover(NodeRef::Cluster(old_id))).is_nothing());
    assert!(matches!(
        engine.pick(&PickEvent::select(NodeRef::Cluster(new_id))),
        Picked::Points(p) if p[0].id.starts_with("new")
    ));
}

/// Test 8: GeoJSON in, GeoJSON out
#[test]
fn test_geojson_round_through_layer() {
    init_logging();
    let input = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "id": "h1",
              "geometry": { "type": "Point", "coordinates": [-0.1276, 51.5072] },
              "properties": { "occupancy": 80 } },
            { "type": "Feature", "id": "h2",
              "geometry": { "type": "Point", "coordinates": [-0.1270, 51.5075] },
              "properties": { "occupancy": 20 } },
            { "type": "Feature", "id": "h3",
              "geometry": { "type": "Point", "coordinates": [-3.1883, 55.9533] },
              "properties": {} }
        ]
    }"#;
    let points = points_from_geojson(input, "occupancy").unwrap();
    assert!(points[2].value.is_nan());

    let mut layer = ClusterLayer::new(GeoJsonTarget::new());
    layer.on_viewport(Viewport::world(5.0));
    layer.set_data(points, EngineConfig::default()).unwrap();

    let frame = layer.target().frame();
    assert_eq!(frame.features.len(), 3);
    let expanded = frame
        .features
        .iter()
        .filter(|f| f.properties.as_ref().is_some_and(|p| p.contains_key("parent")))
        .count();
    assert_eq!(expanded, 2);

    let exported = primitives_to_geojson(layer.engine().primitives());
    assert_eq!(exported, *frame);
}
