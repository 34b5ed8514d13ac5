//! CLI integration tests for colcon-rebar3.
//!
//! Builds run against a fake `rebar3` shell script selected through
//! `REBAR3_COMMAND`, so no Erlang installation is needed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the colcon-rebar3 binary command.
fn colcon_rebar3() -> Command {
    let mut cmd = Command::cargo_bin("colcon-rebar3").unwrap();
    // Keep user configuration out of the tests
    cmd.env("HOME", "/nonexistent").env_remove("REBAR3_COMMAND");
    cmd
}

fn add_package(root: &Path, name: &str, config: &str) -> PathBuf {
    let dir = root.join("src").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("rebar.config"), config).unwrap();
    dir
}

// ============================================================================
// colcon-rebar3 identify
// ============================================================================

#[test]
fn test_identify_reports_ros2_dependencies() {
    let tmp = TempDir::new().unwrap();
    let dir = add_package(
        tmp.path(),
        "talker",
        "{deps, [{rclerl, {ros2, []}}, {jsx, \"3.1.0\"}, {std_msgs, {ros2, []}}]}.",
    );

    colcon_rebar3()
        .args(["identify", "--json"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"talker\""))
        .stdout(predicate::str::contains("\"type\": \"rebar3\""))
        .stdout(predicate::str::contains("rclerl"))
        .stdout(predicate::str::contains("std_msgs"))
        .stdout(predicate::str::contains("jsx").not());
}

#[test]
fn test_identify_not_a_package() {
    let tmp = TempDir::new().unwrap();

    colcon_rebar3()
        .arg("identify")
        .arg(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("not a rebar3 package"));
}

#[test]
fn test_identify_other_type_is_left_alone() {
    let tmp = TempDir::new().unwrap();
    let dir = add_package(tmp.path(), "mixed", "{deps, []}.");

    colcon_rebar3()
        .args(["identify", "--type", "cmake", "--json"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"cmake\""))
        .stdout(predicate::str::contains("\"name\": null"));
}

// ============================================================================
// colcon-rebar3 scan
// ============================================================================

#[test]
fn test_scan_lists_packages_in_build_order() {
    let tmp = TempDir::new().unwrap();
    add_package(tmp.path(), "app", "{deps, [{lib_b, {ros2, []}}]}.");
    add_package(tmp.path(), "lib_b", "{deps, [{lib_a, {ros2, []}}]}.");
    add_package(tmp.path(), "lib_a", "{deps, []}.");

    let output = colcon_rebar3()
        .arg("scan")
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(names, ["lib_a", "lib_b", "app"]);
}

#[test]
fn test_scan_reports_cycles() {
    let tmp = TempDir::new().unwrap();
    add_package(tmp.path(), "ping", "{deps, [{pong, {ros2, []}}]}.");
    add_package(tmp.path(), "pong", "{deps, [{ping, {ros2, []}}]}.");

    colcon_rebar3()
        .arg("scan")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency cycle"));
}

// ============================================================================
// colcon-rebar3 build
// ============================================================================

#[cfg(unix)]
fn fake_rebar3(dir: &Path, compile_exit: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-rebar3");
    let script = format!(
        r##"#!/bin/sh
echo "$@" >> "{log}"
case "$1" in
  compile)
    echo "===> Compiling demo"
    exit {compile_exit} ;;
  release)
    mkdir -p _build/default/rel/demo/bin
    echo "#!/bin/sh" > _build/default/rel/demo/bin/demo
    exit 0 ;;
esac
"##,
        log = dir.join("calls.log").display(),
        compile_exit = compile_exit
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_build_installs_release_and_hooks() {
    let tmp = TempDir::new().unwrap();
    let source = add_package(tmp.path(), "demo", "{deps, []}.");
    let rebar3 = fake_rebar3(tmp.path(), 0);
    let install = tmp.path().join("install/demo");

    colcon_rebar3()
        .env("REBAR3_COMMAND", &rebar3)
        .current_dir(tmp.path())
        .arg("build")
        .arg(&source)
        .args(["--build-base", "build/demo", "--install-base", "install/demo"])
        .args(["--rebar3-release-args", " --relname", "demo"])
        .assert()
        .success();

    assert!(install.join("lib/demo/demo/bin/demo").is_file());
    assert!(install
        .join("share/ament_index/resource_index/packages/demo")
        .is_file());
    assert!(install
        .join("share/demo/hook/rebar3_demo_ament_prefix_path.dsv")
        .is_file());
    assert!(install.join("share/demo/package.sh").is_file());

    let calls = fs::read_to_string(tmp.path().join("calls.log")).unwrap();
    assert_eq!(calls, "compile\nrelease --relname demo\n");
}

#[cfg(unix)]
#[test]
fn test_build_propagates_compile_exit_code() {
    let tmp = TempDir::new().unwrap();
    let source = add_package(tmp.path(), "demo", "{deps, []}.");
    let rebar3 = fake_rebar3(tmp.path(), 3);

    colcon_rebar3()
        .env("REBAR3_COMMAND", &rebar3)
        .arg("build")
        .arg(&source)
        .arg("--build-base")
        .arg(tmp.path().join("build"))
        .arg("--install-base")
        .arg(tmp.path().join("install"))
        .assert()
        .code(3);

    assert!(!tmp.path().join("install/lib/demo").exists());
    let calls = fs::read_to_string(tmp.path().join("calls.log")).unwrap();
    assert_eq!(calls, "compile\n");
}

#[cfg(unix)]
#[test]
fn test_build_json_events() {
    let tmp = TempDir::new().unwrap();
    let source = add_package(tmp.path(), "demo", "{deps, []}.");
    let rebar3 = fake_rebar3(tmp.path(), 0);

    colcon_rebar3()
        .env("REBAR3_COMMAND", &rebar3)
        .arg("build")
        .arg(&source)
        .arg("--build-base")
        .arg(tmp.path().join("build"))
        .arg("--install-base")
        .arg(tmp.path().join("install"))
        .args(["--message-format", "json", "--skip-hook-creation"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""reason":"build-started""#))
        .stdout(predicate::str::contains(r#""marker":"build binary""#))
        .stdout(predicate::str::contains(r#""success":true"#));

    assert!(!tmp.path().join("install/share/demo").exists());
}

#[cfg(unix)]
#[test]
fn test_build_json_stdout_is_only_events() {
    let tmp = TempDir::new().unwrap();
    let source = add_package(tmp.path(), "demo", "{deps, []}.");
    let rebar3 = fake_rebar3(tmp.path(), 0);

    let output = colcon_rebar3()
        .env("REBAR3_COMMAND", &rebar3)
        .arg("build")
        .arg(&source)
        .arg("--build-base")
        .arg(tmp.path().join("build"))
        .arg("--install-base")
        .arg(tmp.path().join("install"))
        .args(["--message-format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let reasons: Vec<String> = stdout
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line)
                .unwrap_or_else(|e| panic!("not a JSON event: {:?} ({})", line, e));
            event["reason"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(reasons.first().map(String::as_str), Some("build-started"));
    assert_eq!(reasons.last().map(String::as_str), Some("build-finished"));

    // rebar3's own output still reaches the user
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("===> Compiling demo"));
}

#[cfg(unix)]
#[test]
fn test_build_missing_dependency_fails_in_prepare() {
    let tmp = TempDir::new().unwrap();
    let source = add_package(tmp.path(), "demo", "{deps, [{msgs, {ros2, []}}]}.");
    let rebar3 = fake_rebar3(tmp.path(), 0);

    colcon_rebar3()
        .env("REBAR3_COMMAND", &rebar3)
        .arg("build")
        .arg(&source)
        .arg("--build-base")
        .arg(tmp.path().join("build"))
        .arg("--install-base")
        .arg(tmp.path().join("install"))
        .arg("--dependency")
        .arg(format!("msgs={}", tmp.path().join("install/msgs").display()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("has `msgs` been built?"));

    assert!(!tmp.path().join("calls.log").exists());
}

#[test]
fn test_build_without_rebar3() {
    let tmp = TempDir::new().unwrap();
    let source = add_package(tmp.path(), "demo", "{deps, []}.");

    colcon_rebar3()
        .env("PATH", tmp.path())
        .arg("build")
        .arg(&source)
        .arg("--build-base")
        .arg(tmp.path().join("build"))
        .arg("--install-base")
        .arg(tmp.path().join("install"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("REBAR3_COMMAND"));
}

#[test]
fn test_build_not_a_package() {
    let tmp = TempDir::new().unwrap();

    colcon_rebar3()
        .arg("build")
        .arg(tmp.path())
        .args(["--build-base", "b", "--install-base", "i"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a rebar3 package"));
}

// ============================================================================
// colcon-rebar3 completions
// ============================================================================

#[test]
fn test_completions_bash() {
    colcon_rebar3()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("colcon-rebar3"));
}
