use std::io::Write;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::NamedTempFile;

fn write_scene() -> NamedTempFile {
    let scene = r#"<scene name="workbench">
  <camera>
    <position>0 1 4</position>
  </camera>
  <light type="spot">
    <position>0 3 0</position>
    <direction>0 -1 0</direction>
    <cutoff>12.5</cutoff>
    <outer-cutoff>17.5</outer-cutoff>
  </light>
  <object>
    <name>Crate</name>
    <material>coral</material>
  </object>
  <object>
    <name>Bench</name>
    <mesh>models/bench.obj</mesh>
  </object>
</scene>
"#;
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(scene.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn summary_mode_prints_the_scene_inventory() {
    let scene = write_scene();
    let mut cmd = Command::cargo_bin("lightbox").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains(
            "Loaded scene \"workbench\" with 2 objects (spot light)",
        ))
        .stdout(contains(" - Crate (cube)"))
        .stdout(contains(" - Bench (models/bench.obj)"));
}

#[test]
fn built_in_demos_run_headless() {
    let mut cmd = Command::cargo_bin("lightbox").expect("binary exists");
    cmd.arg("--demo").arg("point").arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("with 10 objects (point light)"))
        .stdout(contains(" - Cube0 (cube)"));
}

#[test]
fn unknown_demo_fails_with_the_candidate_list() {
    let mut cmd = Command::cargo_bin("lightbox").expect("binary exists");
    cmd.arg("--demo").arg("bloom").arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("unknown demo: bloom"));
}

#[test]
fn unknown_flags_are_rejected() {
    let mut cmd = Command::cargo_bin("lightbox").expect("binary exists");
    cmd.arg("--frames");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --frames"));
}

#[test]
fn malformed_scene_xml_is_a_fatal_error() {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(b"<scene><object></object></scene>")
        .expect("write scene");
    let mut cmd = Command::cargo_bin("lightbox").expect("binary exists");
    cmd.arg(tmp.path()).arg("--summary-only");
    cmd.assert().failure().stderr(contains("failed to parse"));
}
