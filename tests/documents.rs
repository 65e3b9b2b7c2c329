//! Saving, loading and exporting model system documents.

use modelgraph::prelude::*;
use std::sync::Arc;

fn document(model_system: &ModelSystem) -> ModelSystemDocument {
    GraphCodec::new().encode(model_system).unwrap()
}

fn build(session: &EditingSession) {
    let global = session.global_boundary();
    session
        .batch(|editor| {
            let entry = editor.add_start(global, "Entry", Some("main"), Position::new(1.5, -2.0))?;
            let run = editor.add_registered_node(global, "Run", Execute::NAME)?;
            editor.add_link(entry, START_HOOK, run)?;

            let zone = editor.add_boundary(global, "Zone")?;
            let ignore = editor.add_registered_node(zone, "Ignore", IgnoreResult::NAME)?;
            let label = editor.add_registered_node(zone, "Label", "modelgraph.BasicParameter<String>")?;
            editor.set_parameter_value(label, "hello")?;
            editor.set_disabled(label, true)?;
            editor.add_link(run, "ToExecute", ignore)?;
            editor.add_link(ignore, "ToGet", label)?;
            Ok(())
        })
        .unwrap();
}

#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let catalog = Arc::new(HookCatalog::with_builtins());
    let controller = SessionController::new_shared();

    let session = EditingSession::open(
        ModelSystem::new(),
        Arc::clone(&catalog),
        &controller,
        EngineConfig::default(),
    )
    .unwrap();
    build(&session);
    session.save(&store).unwrap();
    let id = session.id();
    let original = session.close();

    assert!(store.path_for(id).exists());
    let reopened =
        EditingSession::load(id, &store, catalog, &controller, EngineConfig::default()).unwrap();
    assert_eq!(document(&reopened.snapshot()), document(&original));
    reopened.read(|ms| {
        let zone = ms.child_named(ms.global_boundary(), "Zone").unwrap();
        assert_eq!(ms.full_path(zone.id()).unwrap(), "global.Zone");
        assert_eq!(zone.node_count(), 2);
    });
}

#[test]
fn export_fails_while_a_session_is_open() {
    let store = MemoryStore::new();
    let controller = SessionController::new_shared();
    let session = EditingSession::open(
        ModelSystem::new(),
        Arc::new(HookCatalog::with_builtins()),
        &controller,
        EngineConfig::default(),
    )
    .unwrap();
    build(&session);
    session.save(&store).unwrap();
    let id = session.id();

    assert!(matches!(
        controller.export(id, &store),
        Err(EditError::SessionBusy(_))
    ));

    session.close();
    let bytes = controller.export(id, &store).unwrap();
    let exported = ModelSystemDocument::from_json(std::str::from_utf8(&bytes).unwrap()).unwrap();
    assert_eq!(exported.version, Some(modelgraph::graph::FORMAT_VERSION));
}

#[test]
fn failed_load_releases_the_model_system() {
    let store = MemoryStore::new();
    let controller = SessionController::new_shared();
    let id = ModelSystemId::new();
    let json = r#"{"Version":"1.0.0","Types":[],"Boundary":{"Name":"global",
        "Starts":[{"Name":"A","Index":0},{"Name":"B","Index":0}]}}"#;
    store.persist(id, json.as_bytes()).unwrap();

    let result = EditingSession::load(
        id,
        &store,
        Arc::new(HookCatalog::with_builtins()),
        &controller,
        EngineConfig::default(),
    );

    assert!(matches!(
        result,
        Err(EditError::Codec(CodecError::DuplicateIndex(0)))
    ));
    assert!(!controller.is_open(id));
}

#[test]
fn load_of_missing_document() {
    let store = MemoryStore::new();
    let controller = SessionController::new_shared();
    let result = EditingSession::load(
        ModelSystemId::new(),
        &store,
        Arc::new(HookCatalog::with_builtins()),
        &controller,
        EngineConfig::default(),
    );
    assert!(matches!(
        result,
        Err(EditError::Persistence(PersistenceError::NotFound(_)))
    ));
}

#[test]
fn compact_documents_load_the_same() {
    let catalog = Arc::new(HookCatalog::with_builtins());
    let controller = SessionController::new_shared();
    let config = EngineConfig::from_toml_str("[document]\npretty = false\n").unwrap();
    let session =
        EditingSession::open(ModelSystem::new(), Arc::clone(&catalog), &controller, config).unwrap();
    build(&session);

    let store = MemoryStore::new();
    session.save(&store).unwrap();
    let bytes = store.load(session.id()).unwrap();
    assert!(!bytes.contains(&b'\n'));

    let loaded = GraphCodec::new()
        .from_bytes(session.id(), &bytes, &catalog)
        .unwrap();
    assert_eq!(document(&loaded), document(&session.snapshot()));
}
