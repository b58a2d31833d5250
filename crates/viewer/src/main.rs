//! Headless canvas viewer.
//!
//! Lays out a JSON scene with any of the layout strategies, prints the
//! result as JSON and optionally writes an SVG preview.

mod args;
mod scene;
mod svg;

use anyhow::{Context, Result};
use canvas_engine::{CanvasEngine, EngineConfig, items_from_layout};
use canvas_layout::{LayoutResult, LayoutStatus};
use canvas_snap::AlignmentGuide;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, USAGE, parse_args};
use crate::scene::Scene;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Guides each node would show if it were dropped where the layout put it.
fn resting_guides(engine: &CanvasEngine, result: &LayoutResult) -> Result<Vec<AlignmentGuide>> {
    let mut guides = Vec::new();
    for node in result.nodes.iter().filter(|n| !n.fixed) {
        let snap = engine.calculate_snap_position(node.position, Some(&node.id), &[])?;
        if snap.displacement.length() == 0.0 {
            guides.extend(snap.guides);
        }
    }
    Ok(guides)
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading configuration `{}`", path.display()))?,
        None => EngineConfig::default(),
    };
    let scene = Scene::load(&args.scene)?;

    let mut engine = CanvasEngine::new(config)?;
    engine
        .set_layout_nodes(&scene.nodes, &scene.connections)
        .context("invalid scene")?;
    let result = engine.execute_layout(args.layout);
    if let LayoutStatus::Failed { reason } = &result.status {
        tracing::warn!(layout = %args.layout, %reason, "layout failed; printing input positions");
    }

    let mut guides = Vec::new();
    let output = if args.analyze {
        let items = items_from_layout(&result);
        engine.register_items(&items)?;
        guides = resting_guides(&engine, &result)?;
        let analysis = engine.analyze_space_relations(&items)?;
        let ranked = engine.ranked_alignments(&analysis);
        json!({ "layout": result, "analysis": analysis, "ranked_alignments": ranked })
    } else {
        serde_json::to_value(&result)?
    };

    if let Some(path) = &args.svg {
        let svg = svg::render(&result, &scene.links(), &guides);
        std::fs::write(path, svg)
            .with_context(|| format!("failed to write SVG `{}`", path.display()))?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        print!("{USAGE}");
        return Ok(());
    };
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_layout::LayoutType;
    use std::path::PathBuf;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/pipeline.json")
    }

    #[test]
    fn test_run_writes_svg() {
        let out = std::env::temp_dir().join(format!("canvas-viewer-{}.svg", std::process::id()));
        let args = Args {
            scene: fixture(),
            layout: LayoutType::Hierarchical,
            config: None,
            svg: Some(out.clone()),
            analyze: true,
        };
        run(&args).unwrap();
        let svg = std::fs::read_to_string(&out).unwrap();
        std::fs::remove_file(&out).unwrap();
        assert_eq!(svg.matches("<text").count(), 5);
        assert_eq!(svg.matches("<path").count(), 4);
    }

    #[test]
    fn test_resting_guides_on_grid_layout() {
        let scene = Scene::load(&fixture()).unwrap();
        let mut engine = CanvasEngine::default();
        engine.set_layout_nodes(&scene.nodes, &scene.connections).unwrap();
        let result = engine.execute_layout(LayoutType::Grid);
        engine.register_items(&items_from_layout(&result)).unwrap();
        // grid cells share left edges, so resting nodes line up with a neighbour
        assert!(!resting_guides(&engine, &result).unwrap().is_empty());
    }

    #[test]
    fn test_missing_scene() {
        let args = Args {
            scene: PathBuf::from("/nonexistent/scene.json"),
            layout: LayoutType::Grid,
            config: None,
            svg: None,
            analyze: false,
        };
        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read scene"));
    }
}
