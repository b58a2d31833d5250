use canvas_engine::*;
use canvas_geometry::{Size, Vec2};
use canvas_layout::{Connection, LayoutStatus, LayoutType, NodeSpec};
use canvas_snap::{
    AlignmentKind, AnalysisConfig, Axis, DistributionConfig, MagneticProbe, MagneticTarget,
    SelectionItem, SnapTarget, SnapTargetKind,
};
use futures::StreamExt;
use tracing_test::traced_test;

fn chain(n: usize) -> (Vec<NodeSpec>, Vec<Connection>) {
    let nodes = (0..n)
        .map(|i| NodeSpec::new(format!("n{i}"), Vec2::ZERO, Size::new(60.0, 40.0)))
        .collect();
    let connections = (1..n)
        .map(|i| Connection::new(format!("n{}", i - 1), format!("n{i}")))
        .collect();
    (nodes, connections)
}

#[test]
fn test_every_layout_through_the_engine() {
    let mut engine = CanvasEngine::default();
    let (nodes, connections) = chain(6);
    engine.set_layout_nodes(&nodes, &connections).unwrap();
    for kind in LayoutType::ALL {
        let result = engine.execute_layout(kind);
        assert_eq!(result.status, LayoutStatus::Ok, "{kind}");
        assert_eq!(result.nodes.len(), 6);
    }
}

#[test]
fn test_suggestions_leave_registration_alone() {
    let mut engine = CanvasEngine::default();
    let (nodes, connections) = chain(5);
    engine.set_layout_nodes(&nodes[..2], &[]).unwrap();
    let suggestions = engine
        .generate_layout_suggestions(&nodes, &connections)
        .unwrap();
    assert!(!suggestions.is_empty());
    assert_eq!(engine.layout().graph().nodes.len(), 2);
}

#[test]
fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("canvas-engine-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"snap": {"snap_threshold": 4}, "cache_capacity": 2}"#).unwrap();
    let config = EngineConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let engine = CanvasEngine::new(config).unwrap();
    assert_eq!(engine.snap().config().snap_threshold, 4.0);
    assert_eq!(engine.layout().config().cache.capacity, 2);
    assert_eq!(engine.analyzer().config().cache_capacity, 2);
}

#[test]
fn test_drag_session_updates_magnetic_targets() {
    let mut engine = CanvasEngine::default();
    engine
        .register_items(&[
            SelectionItem::from_rect("a", 0.0, 0.0, 20.0, 20.0),
            SelectionItem::from_rect("b", 500.0, 500.0, 20.0, 20.0),
        ])
        .unwrap();
    let mut session = engine.begin_batch_drag(&["a"], Vec2::ZERO).unwrap();
    session.snapping = false;
    engine
        .update_batch_drag(&mut session, Vec2::new(300.0, 0.0))
        .unwrap();
    let updates = engine.end_batch_drag(session).unwrap();
    assert_eq!(updates[0].position, Vec2::new(300.0, 0.0));

    // the moved item's left edge now attracts at x = 300
    let probe = MagneticProbe::at(Vec2::new(296.0, 900.0));
    let result = engine.calculate_magnetic(&probe).unwrap();
    assert_eq!(result.snap_point, Some(Vec2::new(300.0, 900.0)));
}

#[traced_test]
#[test]
fn test_truncated_analysis_is_published() {
    let mut engine = CanvasEngine::new(EngineConfig {
        analysis: AnalysisConfig {
            max_analysis_items: 2,
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    let mut rx = engine.events().channel();
    let items: Vec<_> = (0..4)
        .map(|i| SelectionItem::from_rect(format!("i{i}"), i as f64 * 30.0, 0.0, 20.0, 20.0))
        .collect();
    engine.analyze_space_relations(&items).unwrap();
    let updates = engine
        .apply_distribution(&items, &DistributionConfig::default(), Axis::Horizontal)
        .unwrap();
    assert_eq!(updates.len(), 4);

    let first = futures::executor::block_on(rx.next()).unwrap();
    assert_eq!(
        first,
        CanvasEvent::SpaceAnalysed {
            items: 2,
            truncated: true
        }
    );
    assert!(logs_contain("space analysis truncated"));
}

#[test]
fn test_fast_pointer_reaches_custom_target() {
    let mut engine = CanvasEngine::default();
    engine.add_snap_target(SnapTarget::vertical(SnapTargetKind::Guide, 700.0, 1.0));
    engine
        .magnetic_mut()
        .add_target(MagneticTarget::new(
            "far",
            SnapTarget::point(SnapTargetKind::Object, Vec2::new(5000.0, 5000.0), 1.0),
        ))
        .unwrap();
    assert_eq!(engine.magnetic().len(), 2);

    let at = Vec2::new(660.0, 0.0);
    let resting = engine.calculate_magnetic(&MagneticProbe::at(at)).unwrap();
    assert!(resting.contributions.is_empty());
    let fast = engine
        .calculate_magnetic(&MagneticProbe::at(at).with_velocity(Vec2::new(2000.0, 0.0)))
        .unwrap();
    assert!(fast.snap_distance > resting.snap_distance);
    assert_eq!(fast.snap_point, Some(Vec2::new(700.0, 0.0)));
}

#[test]
fn test_user_choices_shift_rankings() {
    let mut engine = CanvasEngine::default();
    let (nodes, _) = chain(4);
    let flow_score = |engine: &CanvasEngine| {
        engine
            .generate_layout_suggestions(&nodes, &[])
            .unwrap()
            .iter()
            .find(|s| s.kind == LayoutType::Flow)
            .map(|s| s.score)
            .unwrap()
    };
    let before = flow_score(&engine);
    for _ in 0..10 {
        engine.record_layout_choice(LayoutType::Flow);
    }
    assert!(flow_score(&engine) > before);

    let items = vec![
        SelectionItem::from_rect("a", 0.0, 0.0, 20.0, 20.0),
        SelectionItem::from_rect("b", 40.0, 7.0, 20.0, 20.0),
    ];
    let analysis = engine.analyze_space_relations(&items).unwrap();
    let top_score = |engine: &CanvasEngine| {
        engine
            .ranked_alignments(&analysis)
            .iter()
            .find(|r| r.suggestion.kind == AlignmentKind::Top)
            .map(|r| r.score)
            .unwrap()
    };
    let before = top_score(&engine);
    for _ in 0..5 {
        engine.record_alignment_feedback(AlignmentKind::Top, false);
    }
    assert!(top_score(&engine) < before);
}
