//! Kenos CLI - bake and inspect light trees for JSON scene descriptions.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use kenos::lighting::{visibility_for, LightmapBuffers};
use kenos::scene::load_scene;
use kenos::{LightingConfig, LightingEngine, Scene, SceneGeometry};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    if let Err(e) = run(&filtered_args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn run(args: &[&str]) -> anyhow::Result<()> {
    match args[0] {
        "bake" | "b" => {
            let Some(&scene_path) = args.get(1) else {
                bail!("missing scene argument\nUsage: kenos bake <scene.json> [--config cfg.json] [--out dir]");
            };
            let config_path = flag_value(args, "--config")?;
            let out_dir = flag_value(args, "--out")?;
            cmd_bake(scene_path, config_path, out_dir)
        }

        "vis" => {
            if args.len() < 3 {
                bail!("missing arguments\nUsage: kenos vis <scene.json> <triangle>");
            }
            let triangle: usize = args[2]
                .parse()
                .with_context(|| format!("invalid triangle index '{}'", args[2]))?;
            cmd_vis(args[1], triangle)
        }

        "tree" | "t" => {
            let Some(&scene_path) = args.get(1) else {
                bail!("missing scene argument\nUsage: kenos tree <scene.json>");
            };
            cmd_tree(scene_path)
        }

        "version" | "-V" | "--version" => {
            println!(
                "kenos {} (built {} {})",
                env!("CARGO_PKG_VERSION"),
                env!("KENOS_BUILD_DATE"),
                env!("KENOS_BUILD_TIME")
            );
            Ok(())
        }

        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        other => {
            print_help();
            bail!("unknown command: {other}")
        }
    }
}

/// Value following `flag`, if the flag is present.
fn flag_value<'a>(args: &[&'a str], flag: &str) -> anyhow::Result<Option<&'a str>> {
    match args.iter().position(|&a| a == flag) {
        None => Ok(None),
        Some(i) => match args.get(i + 1) {
            Some(v) if !v.starts_with("--") => Ok(Some(*v)),
            _ => bail!("{flag} needs a value"),
        },
    }
}

fn print_help() {
    println!("kenos - light tree global illumination baker");
    println!();
    println!("USAGE:");
    println!("    kenos [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    b, bake <scene> [--config <cfg>] [--out <dir>]");
    println!("                                  Build and flatten the light tree");
    println!("    vis     <scene> <triangle>    Show what one triangle can light");
    println!("    t, tree <scene>               Print every RDF node");
    println!("    version                       Show version and build date");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("EXAMPLES:");
    println!("    kenos bake room.json --out baked/     # Write directories.bin, lightmap.bin");
    println!("    kenos vis room.json 12                # Visibility of triangle 12");
    println!("    kenos -v tree room.json               # Dump the tree with debug logs");
    println!();
    println!("NOTES:");
    println!("    - RUST_LOG overrides -v/-vv/-q");
}

fn load(scene_path: &str) -> anyhow::Result<Scene> {
    load_scene(scene_path).with_context(|| format!("failed to load scene {scene_path}"))
}

fn cmd_bake(scene_path: &str, config_path: Option<&str>, out_dir: Option<&str>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(p) => LightingConfig::load(p).with_context(|| format!("failed to load config {p}"))?,
        None => LightingConfig::default(),
    };
    let scene = load(scene_path)?;

    let mut engine = LightingEngine::new(config)?;
    let tree = engine.build_light_tree(&scene);
    let (roots, nodes, iterations, truncated) =
        (tree.roots.len(), tree.node_count(), tree.iterations, tree.truncated);
    let buffers = engine.update_final_rdf_buffer(&scene)?;

    println!("Scene: {}", scene.name());
    println!("Triangles: {}", scene.triangle_count());
    println!("Roots: {roots}");
    println!("RDF nodes: {nodes}");
    println!("Iterations: {iterations}{}", if truncated { " (truncated)" } else { "" });
    println!("Lights: {}", buffers.stats.lights);
    println!("Dropped lights: {}", buffers.stats.dropped_lights);

    if let Some(dir) = out_dir {
        let summary = serde_json::json!({
            "sceneName": scene.name(),
            "triangles": scene.triangle_count(),
            "roots": roots,
            "nodes": nodes,
            "iterations": iterations,
            "truncated": truncated,
            "lights": buffers.stats.lights,
            "droppedLights": buffers.stats.dropped_lights,
            "maxSurfaceLights": buffers.max_lights_per_surface,
        });
        write_bake(Path::new(dir), &buffers, &summary)?;
        println!("Written: {dir}");
    }
    Ok(())
}

fn write_bake(dir: &Path, buffers: &LightmapBuffers, summary: &serde_json::Value) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    fs::write(dir.join("directories.bin"), buffers.directories_bytes())?;
    fs::write(dir.join("lightmap.bin"), buffers.lights_bytes())?;
    fs::write(dir.join("summary.json"), serde_json::to_string_pretty(summary)?)?;
    tracing::debug!(dir = %dir.display(), "bake written");
    Ok(())
}

fn cmd_vis(scene_path: &str, triangle: usize) -> anyhow::Result<()> {
    let scene = load(scene_path)?;
    scene.try_triangle(triangle)?;

    let vis = visibility_for(&scene, triangle, LightingConfig::default().plane_epsilon);
    println!("Triangle {triangle} (object {})", scene.object_index_of(triangle));
    println!("Visible objects ({}): {:?}", vis.visible_objects.len(), vis.visible_objects.as_slice());
    println!("Visible surfaces ({}): {:?}", vis.visible_surfaces.len(), vis.visible_surfaces);
    Ok(())
}

fn cmd_tree(scene_path: &str) -> anyhow::Result<()> {
    let scene = load(scene_path)?;
    let mut engine = LightingEngine::new(LightingConfig::default())?;
    let tree = engine.build_light_tree(&scene);

    for (i, node) in tree.jumble.iter() {
        let indent = "  ".repeat(node.bounce as usize);
        let parent = node.parent.map_or_else(|| "-".to_string(), |p| p.to_string());
        println!(
            "{indent}[{i}] tri={} bounce={} parent={parent} brightness={:.3} color=({:.3}, {:.3}, {:.3})",
            node.directory, node.bounce, node.light_brightness, node.color.x, node.color.y, node.color.z
        );
    }
    println!(
        "{} nodes, {} roots{}",
        tree.node_count(),
        tree.roots.len(),
        if tree.truncated { ", truncated" } else { "" }
    );
    Ok(())
}
