//! Modelgraph CLI
//!
//! A small command-line front end for inspecting the catalog and model system
//! documents.

use anyhow::{bail, Context, Result};
use modelgraph::prelude::*;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = program_name(&args);
    let Some(command) = args.get(1) else {
        print_usage(program);
        return Ok(());
    };

    let config = match std::env::var("MODELGRAPH_CONFIG") {
        Ok(path) => EngineConfig::load(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => EngineConfig::default(),
    };

    match command.as_str() {
        "catalog" => list_types(),
        "demo" => {
            let Some(dir) = args.get(2) else {
                bail!("Please specify an output directory");
            };
            demo(Path::new(dir), config)
        }
        "inspect" => {
            let Some(file) = args.get(2) else {
                bail!("Please specify a document to inspect");
            };
            inspect(Path::new(file))
        }
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        other => {
            print_usage(program);
            bail!("Unknown command: {}", other)
        }
    }
}

/// Name to show in usage text. The argument list may be empty.
fn program_name(args: &[String]) -> &str {
    args.first().map_or("modelgraph", String::as_str)
}

fn print_usage(program: &str) {
    println!("Modelgraph v{}", modelgraph::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  catalog           List the built-in module types");
    println!("  demo <dir>        Build a sample model system and save it to <dir>");
    println!("  inspect <file>    Load a document and report on its contents");
    println!("  help              Show this help message");
    println!();
    println!("Set MODELGRAPH_CONFIG to a TOML file to override engine settings.");
}

fn list_types() -> Result<()> {
    let catalog = HookCatalog::with_builtins();
    println!("Module types ({} total):", catalog.len());
    println!();

    for module_type in catalog.types() {
        println!("  {}", module_type.name);
        if !module_type.description.is_empty() {
            println!("      {}", module_type.description);
        }
        for hook in &module_type.hooks {
            println!("      - {}", hook);
        }
    }
    Ok(())
}

fn demo(dir: &Path, config: EngineConfig) -> Result<()> {
    let catalog = Arc::new(HookCatalog::with_builtins());
    let controller = SessionController::new_shared();
    let session = EditingSession::open(ModelSystem::new(), catalog, &controller, config)?;
    let global = session.global_boundary();

    session.batch(|editor| {
        let entry = editor.add_start(global, "Entry", Some("Runs the model"), Position::new(0.0, 0.0))?;
        let work = editor.add_registered_node(global, "Work", Execute::NAME)?;
        editor.move_node(work, 200.0, 0.0)?;
        editor.add_link(entry, START_HOOK, work)?;

        let zone = editor.add_boundary(global, "Zone")?;
        let ignore = editor.add_registered_node(zone, "Discard", IgnoreResult::NAME)?;
        editor.add_link(work, "ToExecute", ignore)?;
        Ok(())
    })?;

    let store = FileStore::new(dir);
    session.save(&store)?;
    println!("Saved {}", store.path_for(session.id()).display());
    Ok(())
}

fn inspect(file: &Path) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let id = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<uuid::Uuid>().ok())
        .map(ModelSystemId::from_uuid)
        .unwrap_or_default();

    let catalog = HookCatalog::with_builtins();
    let model_system = GraphCodec::new().from_bytes(id, &bytes, &catalog)?;

    println!("Model system {}", model_system.id());
    for boundary in model_system.boundaries() {
        let path = model_system.full_path(boundary.id())?;
        println!(
            "  {}: {} node(s), {} link(s)",
            path,
            boundary.node_count(),
            boundary.link_count()
        );
    }

    let report = ValidationPipeline::default().validate(&model_system, &catalog);
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("No problems found");
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}
