//! CLI integration tests for hotbuild.
//!
//! These tests drive the binary against small project trees on disk.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the hotbuild binary command, isolated from the user's global config.
fn hotbuild(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hotbuild").unwrap();
    cmd.env("HOME", home).env_remove("CXX");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, contents).unwrap();
}

/// A `program` that includes a header paired with its own implementation.
fn scene_project() -> TempDir {
    let tmp = temp_dir();
    write(tmp.path(), "hotbuild.toml", "[project]\nroot = \"program\"\n");
    write(
        tmp.path(),
        "src/program.cpp",
        "#include \"scene.h\"\nint main() { return 0; }\n",
    );
    write(tmp.path(), "src/scene.h", "#include \"vec.h\"\n");
    write(tmp.path(), "src/scene.cpp", "#include \"scene.h\"\n");
    write(tmp.path(), "src/vec.h", "struct vec { float x, y; };\n");
    tmp
}

// ============================================================================
// hotbuild --help
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = temp_dir();
    hotbuild(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("walk"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("test"));
}

#[test]
fn test_quiet_and_verbose_conflict() {
    let tmp = temp_dir();
    hotbuild(tmp.path())
        .args(["walk", "--quiet", "--verbose"])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

// ============================================================================
// hotbuild walk
// ============================================================================

#[test]
fn test_walk_prints_graph() {
    let tmp = scene_project();
    hotbuild(tmp.path())
        .arg("walk")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("program (4 file(s))"))
        .stdout(predicate::str::contains("src/scene.cpp => out/scene.o"))
        .stdout(predicate::str::contains("-> src/vec.h"));
}

#[test]
fn test_walk_from_subdirectory_finds_project() {
    let tmp = scene_project();
    hotbuild(tmp.path())
        .arg("walk")
        .current_dir(tmp.path().join("src"))
        .assert()
        .success()
        .stdout(predicate::str::contains("program (4 file(s))"));
}

#[test]
fn test_walk_json() {
    let tmp = scene_project();
    let output = hotbuild(tmp.path())
        .args(["walk", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["root"], "program");
    assert_eq!(json["files"].as_array().unwrap().len(), 4);
    assert_eq!(json["units"].as_array().unwrap().len(), 2);
    assert_eq!(json["cycles"].as_array().unwrap().len(), 0);
}

#[test]
fn test_walk_with_explicit_config() {
    let tmp = scene_project();
    let elsewhere = temp_dir();
    hotbuild(tmp.path())
        .args(["walk", "--config"])
        .arg(tmp.path().join("hotbuild.toml"))
        .current_dir(elsewhere.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("program (4 file(s))"));
}

#[test]
fn test_walk_missing_root_fails_with_help() {
    let tmp = temp_dir();
    write(tmp.path(), "src/other.cpp", "\n");
    hotbuild(tmp.path())
        .arg("walk")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("root component `program`"))
        .stderr(predicate::str::contains("help:"));
}

#[test]
fn test_walk_unresolvable_include_fails() {
    let tmp = temp_dir();
    write(tmp.path(), "src/program.cpp", "#include \"missing.h\"\n");
    hotbuild(tmp.path())
        .arg("walk")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.h"));
}

#[test]
fn test_walk_rejects_broken_config() {
    let tmp = scene_project();
    write(tmp.path(), "hotbuild.toml", "[project\n");
    hotbuild(tmp.path())
        .arg("walk")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

// ============================================================================
// hotbuild run
// ============================================================================

#[test]
fn test_run_with_missing_compiler_fails() {
    let tmp = scene_project();
    write(
        tmp.path(),
        "hotbuild.toml",
        "[project]\nroot = \"program\"\n\n[toolchain]\ncc = \"/nonexistent/c++\"\n",
    );
    hotbuild(tmp.path())
        .arg("run")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not compile"));

    // The marker never outlives a step.
    assert!(!tmp.path().join("out").join(lock_name()).exists());
}

fn lock_name() -> &'static str {
    if cfg!(windows) {
        "game.dll.lock"
    } else {
        "libgame.so.lock"
    }
}

/// A compiler driver that writes a small shell program to whatever `-o` names.
#[cfg(unix)]
fn fake_compiler(root: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = root.join("fake-cc");
    fs::write(
        &path,
        r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf '#!/bin/sh\necho "hello from $(basename "$PWD")" "$@"\nexit 7\n' > "$out"
chmod +x "$out"
"#,
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_run_builds_and_launches_program() {
    let tmp = scene_project();
    let cc = fake_compiler(tmp.path());
    write(
        tmp.path(),
        "hotbuild.toml",
        &format!(
            "[project]\nroot = \"program\"\n\n[toolchain]\ncc = \"{}\"\n",
            cc.display()
        ),
    );

    hotbuild(tmp.path())
        .args(["run", "--", "--level", "1"])
        .current_dir(tmp.path())
        .assert()
        .code(7)
        .stdout(predicate::str::contains("hello from out --level 1"));

    assert!(tmp.path().join("out/program.o").exists());
    assert!(tmp.path().join("out/scene.o").exists());
    assert!(tmp.path().join("out/program").exists());

    // A second run finds nothing stale.
    hotbuild(tmp.path())
        .arg("run")
        .current_dir(tmp.path())
        .assert()
        .code(7)
        .stderr(predicate::str::contains("is up to date"));
}
