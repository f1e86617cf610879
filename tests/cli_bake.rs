//! End-to-end runs of the `kenos` binary on fixture scenes.

use std::path::PathBuf;
use std::process::Command;

use kenos::lighting::{PackedDirectory, SurfLight};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn kenos() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kenos"))
}

#[test]
fn test_bake_writes_buffers() {
    let out = TempDir::new().expect("Failed to create temp dir");
    let status = kenos()
        .arg("-q")
        .arg("bake")
        .arg(fixture("pair.json"))
        .arg("--out")
        .arg(out.path())
        .output()
        .expect("Failed to run kenos");
    assert!(status.status.success(), "{}", String::from_utf8_lossy(&status.stderr));

    let dirs = std::fs::read(out.path().join("directories.bin")).unwrap();
    let lights = std::fs::read(out.path().join("lightmap.bin")).unwrap();
    assert_eq!(dirs.len(), 2 * std::mem::size_of::<PackedDirectory>());
    assert_eq!(lights.len(), 2 * 16 * std::mem::size_of::<SurfLight>());

    let dirs: Vec<PackedDirectory> = bytemuck::pod_collect_to_vec(&dirs);
    let lights: Vec<SurfLight> = bytemuck::pod_collect_to_vec(&lights);
    assert_eq!(dirs[0].num_lights, 1);
    assert_eq!(dirs[1].num_lights, 0);
    assert_eq!(dirs[1].emissive, 1.0);
    assert_eq!(lights[0].caster_index, 1);
    assert_eq!(lights[0].brightness, 1.0);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["sceneName"], "pair");
    assert_eq!(summary["roots"], 1);
    assert_eq!(summary["nodes"], 2);
    assert_eq!(summary["truncated"], false);
}

#[test]
fn test_bake_with_config() {
    let out = TempDir::new().expect("Failed to create temp dir");
    let status = kenos()
        .args(["-q", "bake"])
        .arg(fixture("pair.json"))
        .arg("--config")
        .arg(fixture("capacity.json"))
        .arg("--out")
        .arg(out.path().join("nested"))
        .output()
        .expect("Failed to run kenos");
    assert!(status.status.success());

    let lights = std::fs::read(out.path().join("nested/lightmap.bin")).unwrap();
    assert_eq!(lights.len(), 2 * 2 * std::mem::size_of::<SurfLight>());
    let summary = std::fs::read_to_string(out.path().join("nested/summary.json")).unwrap();
    assert!(summary.contains("\"maxSurfaceLights\": 2"));
}

#[test]
fn test_vis_and_tree_commands() {
    let vis = kenos()
        .args(["-q", "vis"])
        .arg(fixture("pair.json"))
        .arg("1")
        .output()
        .expect("Failed to run kenos");
    assert!(vis.status.success());
    let text = String::from_utf8_lossy(&vis.stdout);
    assert!(text.contains("Visible surfaces (1): [0]"), "{text}");

    let tree = kenos()
        .args(["-q", "tree"])
        .arg(fixture("pair.json"))
        .output()
        .expect("Failed to run kenos");
    assert!(tree.status.success());
    assert!(String::from_utf8_lossy(&tree.stdout).contains("2 nodes, 1 roots"));
}

#[test]
fn test_errors_exit_nonzero() {
    let missing = kenos()
        .args(["-q", "bake", "/no/such/scene.json"])
        .output()
        .expect("Failed to run kenos");
    assert_eq!(missing.status.code(), Some(1));

    let out_of_range = kenos()
        .args(["-q", "vis"])
        .arg(fixture("pair.json"))
        .arg("7")
        .output()
        .expect("Failed to run kenos");
    assert_eq!(out_of_range.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out_of_range.stderr).contains("out of range"));

    let unknown = kenos().arg("frobnicate").output().expect("Failed to run kenos");
    assert_eq!(unknown.status.code(), Some(1));
}
