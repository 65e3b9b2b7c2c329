//! Property tests for history and document round trips.

use modelgraph::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Step {
    AddStart(String, i32, i32),
    AddExecute(String),
    Link(usize, usize),
    Rename(usize, String),
    Disable(usize),
    Remove(usize),
    AddBoundary(String),
}

fn step() -> impl Strategy<Value = Step> {
    let name = "[A-Za-z][A-Za-z0-9]{0,6}";
    prop_oneof![
        (name, -40i32..40, -40i32..40).prop_map(|(n, x, y)| Step::AddStart(n, x, y)),
        name.prop_map(Step::AddExecute),
        (0usize..8, 0usize..8).prop_map(|(a, b)| Step::Link(a, b)),
        (0usize..8, name).prop_map(|(i, n)| Step::Rename(i, n)),
        (0usize..8).prop_map(Step::Disable),
        (0usize..8).prop_map(Step::Remove),
        name.prop_map(Step::AddBoundary),
    ]
}

fn pick(ms: &ModelSystem, index: usize) -> Option<NodeId> {
    let nodes = ms.nodes();
    if nodes.is_empty() {
        None
    } else {
        Some(nodes[index % nodes.len()].id())
    }
}

/// Apply one step; steps that make no sense for the current tree are skipped.
fn apply(session: &EditingSession, step: &Step) -> bool {
    let global = session.global_boundary();
    let snapshot = session.snapshot();
    let result = match step {
        Step::AddStart(name, x, y) => session
            .add_start(global, name, None, Position::new(*x as f64 / 4.0, *y as f64 / 4.0))
            .map(|_| ()),
        Step::AddExecute(name) => session
            .add_registered_node(global, name, Execute::NAME)
            .map(|_| ()),
        Step::Link(a, b) => match (pick(&snapshot, *a), pick(&snapshot, *b)) {
            (Some(origin), Some(destination)) => {
                let hook = snapshot.node(origin).unwrap().hooks()[0].name.clone();
                session.add_link(origin, &hook, destination).map(|_| ())
            }
            _ => return false,
        },
        Step::Rename(i, name) => match pick(&snapshot, *i) {
            Some(node) => session.rename(node, name),
            None => return false,
        },
        Step::Disable(i) => match pick(&snapshot, *i) {
            Some(node) => session.set_disabled(node, true),
            None => return false,
        },
        Step::Remove(i) => match pick(&snapshot, *i) {
            Some(node) => session.remove_node(node),
            None => return false,
        },
        Step::AddBoundary(name) => session.add_boundary(global, name).map(|_| ()),
    };
    result.is_ok()
}

/// Node attributes in preorder, with the type by name.
fn attributes(ms: &ModelSystem) -> Vec<(String, Option<String>, Position, bool, Option<String>, Option<String>)> {
    ms.nodes()
        .into_iter()
        .map(|node| {
            (
                node.name().to_string(),
                node.description().map(str::to_string),
                node.position(),
                node.is_disabled(),
                node.parameter().map(str::to_string),
                node.type_name().map(str::to_string),
            )
        })
        .collect()
}

/// Links as (origin, hook, destination), with nodes named by preorder index.
fn wiring(ms: &ModelSystem) -> Vec<(usize, String, usize)> {
    let order: Vec<NodeId> = ms.nodes().iter().map(|node| node.id()).collect();
    let index = |id: NodeId| order.iter().position(|n| *n == id).unwrap();
    let mut links: Vec<(usize, String, usize)> = ms
        .links()
        .into_iter()
        .map(|link| {
            (
                index(link.origin.node_id),
                link.origin.hook_name.clone(),
                index(link.destination),
            )
        })
        .collect();
    links.sort();
    links
}

fn boundary_paths(ms: &ModelSystem) -> Vec<String> {
    let mut paths: Vec<String> = ms
        .boundary_ids()
        .into_iter()
        .map(|id| ms.full_path(id).unwrap())
        .collect();
    paths.sort();
    paths
}

fn links_hold(ms: &ModelSystem) -> bool {
    ms.links()
        .into_iter()
        .all(|link| ms.check_existing_link(link).is_ok())
}

fn open(depth: usize) -> EditingSession {
    let mut config = EngineConfig::default();
    config.history.depth = depth;
    EditingSession::open(
        ModelSystem::new(),
        Arc::new(HookCatalog::with_builtins()),
        &SessionController::new_shared(),
        config,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn failed_edits_leave_the_tree_unchanged(steps in prop::collection::vec(step(), 1..24)) {
        let session = open(64);
        for step in &steps {
            let before = session.snapshot();
            if !apply(&session, step) {
                prop_assert_eq!(session.snapshot(), before);
            }
        }
    }

    #[test]
    fn undo_all_then_redo_all(steps in prop::collection::vec(step(), 1..24)) {
        let session = open(64);
        let mut states = vec![session.snapshot()];
        for step in &steps {
            if apply(&session, step) {
                states.push(session.snapshot());
            }
        }

        for expected in states.iter().rev().skip(1) {
            session.undo().unwrap();
            prop_assert_eq!(&session.snapshot(), expected);
        }
        prop_assert!(!session.can_undo());

        for expected in states.iter().skip(1) {
            session.redo().unwrap();
            prop_assert_eq!(&session.snapshot(), expected);
        }
    }

    #[test]
    fn redo_after_an_interleaved_edit_keeps_links_valid(
        steps in prop::collection::vec(step(), 1..24),
        undone in 1usize..8,
        interleaved in step(),
    ) {
        let session = open(64);
        for step in &steps {
            apply(&session, step);
        }
        for _ in 0..undone {
            if session.undo().is_err() {
                break;
            }
        }
        apply(&session, &interleaved);

        while session.can_redo() {
            let before = session.snapshot();
            match session.redo() {
                Ok(()) => prop_assert!(links_hold(&session.snapshot())),
                Err(_) => prop_assert_eq!(session.snapshot(), before),
            }
        }
        let report = ValidationPipeline::minimal_pipeline().validate(&session.snapshot(), session.catalog());
        prop_assert!(report.can_save());
    }

    #[test]
    fn documents_round_trip(steps in prop::collection::vec(step(), 1..24)) {
        let session = open(64);
        for step in &steps {
            apply(&session, step);
        }

        let codec = GraphCodec::new();
        let original = session.snapshot();
        let bytes = codec.to_bytes(&original).unwrap();
        let loaded = codec.from_bytes(original.id(), &bytes, session.catalog()).unwrap();

        prop_assert_eq!(attributes(&loaded), attributes(&original));
        prop_assert_eq!(wiring(&loaded), wiring(&original));
        prop_assert_eq!(boundary_paths(&loaded), boundary_paths(&original));
        prop_assert_eq!(codec.to_bytes(&loaded).unwrap(), bytes);
    }
}
