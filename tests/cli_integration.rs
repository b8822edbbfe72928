//! CLI integration tests for Gantry.
//!
//! These tests exercise the CLI against scaffolded projects and fake NDK
//! installations; nothing here invokes a real ndk-build.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the gantry binary command.
fn gantry() -> Command {
    Command::cargo_bin("gantry").unwrap()
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Scaffold a fake NDK root containing the given toolchain directories.
fn fake_ndk(tmp: &TempDir, toolchains: &[&str]) -> std::path::PathBuf {
    let root = tmp.path().join("android-ndk");
    fs::create_dir_all(&root).unwrap();
    for name in toolchains {
        fs::create_dir_all(root.join("toolchains").join(name)).unwrap();
    }
    root
}

fn write_manifest(dir: &Path, contents: &str) {
    fs::write(dir.join("Gantry.toml"), contents).unwrap();
}

// ============================================================================
// gantry build
// ============================================================================

#[test]
fn test_build_without_manifest_fails() {
    let tmp = temp_dir();

    gantry()
        .args(["build"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Gantry.toml"));
}

#[test]
fn test_build_plan_emits_descriptor_json() {
    let tmp = temp_dir();
    let project = tmp.path().join("project");
    fs::create_dir_all(project.join("prebuilt")).unwrap();
    fs::write(project.join("prebuilt/libfoo.a"), b"ar").unwrap();
    fs::write(project.join("prebuilt/libbar.so"), b"elf").unwrap();

    write_manifest(
        &project,
        r#"
[project]
group = "com.example"
name = "hello-jni"
version = "1.0.0"

[ndk]
architectures = "armeabi"
use-header-archives = false

[[dependencies]]
group = "com.example.deps"
name = "foo"
version = "1.0"
type = "a"
classifier = "armeabi"
file = "prebuilt/libfoo.a"

[[dependencies]]
group = "com.example.deps"
name = "bar"
version = "1.0"
type = "so"
classifier = "armeabi"
file = "prebuilt/libbar.so"
"#,
    );

    let ndk = fake_ndk(&tmp, &["arm-linux-androideabi-4.9"]);

    gantry()
        .args(["build", "--plan"])
        .arg("--ndk-path")
        .arg(&ndk)
        .current_dir(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"architecture\": \"armeabi\""))
        .stdout(predicate::str::contains("\"stanzas\": 2"))
        .stdout(predicate::str::contains("\"static_libraries\""))
        .stdout(predicate::str::contains("foo"))
        .stdout(predicate::str::contains("bar"));
}

#[test]
fn test_build_skip_configuration() {
    let tmp = temp_dir();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();

    write_manifest(
        &project,
        "[project]\ngroup = \"g\"\nname = \"n\"\nversion = \"1\"\n[ndk]\nskip = true\n",
    );

    // No NDK anywhere, but skip means nothing is attempted.
    gantry()
        .args(["build"])
        .current_dir(&project)
        .assert()
        .success();
}

#[test]
fn test_build_with_invalid_ndk_path_fails_with_configuration_error() {
    let tmp = temp_dir();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();

    write_manifest(
        &project,
        "[project]\ngroup = \"g\"\nname = \"n\"\nversion = \"1\"\n",
    );

    gantry()
        .args(["build", "--ndk-path", "/nonexistent/ndk"])
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

// ============================================================================
// gantry toolchain
// ============================================================================

#[test]
fn test_toolchain_resolves_preferred_candidate() {
    let tmp = temp_dir();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();

    write_manifest(
        &project,
        "[project]\ngroup = \"g\"\nname = \"n\"\nversion = \"1\"\n\
         [ndk]\narchitectures = \"x86\"\n",
    );

    let ndk = fake_ndk(&tmp, &["x86-4.4.3", "x86-4.6"]);

    gantry()
        .args(["toolchain"])
        .arg("--ndk-path")
        .arg(&ndk)
        .current_dir(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("x86: x86-4.6"));
}

#[test]
fn test_toolchain_mapping_wins_without_installation() {
    let tmp = temp_dir();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();

    write_manifest(
        &project,
        "[project]\ngroup = \"g\"\nname = \"n\"\nversion = \"1\"\n\
         [ndk]\narchitectures = \"x86\"\n\
         [ndk.toolchains]\nx86 = \"x86-9.9\"\n",
    );

    // The NDK has no x86 toolchain at all; the mapping still wins.
    let ndk = fake_ndk(&tmp, &[]);

    gantry()
        .args(["toolchain"])
        .arg("--ndk-path")
        .arg(&ndk)
        .current_dir(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("x86: x86-9.9"));
}

#[test]
fn test_toolchain_unknown_architecture_fails() {
    let tmp = temp_dir();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();

    write_manifest(
        &project,
        "[project]\ngroup = \"g\"\nname = \"n\"\nversion = \"1\"\n",
    );

    let ndk = fake_ndk(&tmp, &["x86-4.6"]);

    gantry()
        .args(["toolchain", "--architecture", "sparc"])
        .arg("--ndk-path")
        .arg(&ndk)
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported architecture"));
}

// ============================================================================
// gantry clean
// ============================================================================

#[test]
fn test_clean_removes_build_outputs() {
    let tmp = temp_dir();
    let project = tmp.path().join("project");
    fs::create_dir_all(project.join("target/ndk-build")).unwrap();
    fs::create_dir_all(project.join("target/obj")).unwrap();
    fs::create_dir_all(project.join("target/ndk-libs")).unwrap();

    write_manifest(
        &project,
        "[project]\ngroup = \"g\"\nname = \"n\"\nversion = \"1\"\n",
    );

    gantry()
        .args(["clean"])
        .current_dir(&project)
        .assert()
        .success();

    assert!(!project.join("target/ndk-build").exists());
    assert!(!project.join("target/obj").exists());
    // Libraries survive unless --libraries is passed.
    assert!(project.join("target/ndk-libs").exists());

    gantry()
        .args(["clean", "--libraries"])
        .current_dir(&project)
        .assert()
        .success();
    assert!(!project.join("target/ndk-libs").exists());
}

// ============================================================================
// gantry completions
// ============================================================================

#[test]
fn test_completions_bash() {
    gantry()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gantry"));
}
