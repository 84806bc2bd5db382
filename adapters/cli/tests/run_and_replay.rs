use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

const LEVEL: &str = r#"
name = "cli-corridor"
food_requirement = 1
map = ["P.f.E"]
"#;

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("turtle-cli-{test}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch directory");
    dir
}

fn turtle(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_turtle"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch turtle binary")
}

fn field<'a>(stdout: &'a str, name: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(&format!("{name}: ")))
        .unwrap_or_else(|| panic!("missing '{name}' in output:\n{stdout}"))
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 scratch path")
}

#[test]
fn recorded_run_replays_to_the_same_fingerprint() {
    let dir = scratch_dir("replay");
    let level = dir.join("level.toml");
    let recording = dir.join("run.rec");
    fs::write(&level, LEVEL).expect("write level");

    let output = turtle(&[
        "run",
        "--level",
        path_arg(&level),
        "--inputs",
        "eeee",
        "--record-out",
        path_arg(&recording),
    ]);
    assert!(output.status.success(), "run failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(field(&stdout, "status"), "won");
    assert_eq!(field(&stdout, "food remaining"), "0");
    assert!(field(&stdout, "recording").starts_with("turtle:v1:4:"));
    let fingerprint = field(&stdout, "fingerprint").to_owned();

    let output = turtle(&[
        "replay",
        "--level",
        path_arg(&level),
        "--recording",
        path_arg(&recording),
        "--expect",
        &fingerprint,
    ]);
    assert!(output.status.success(), "replay failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(field(&stdout, "status"), "won");
    assert_eq!(field(&stdout, "fingerprint"), fingerprint);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn replay_rejects_a_mismatched_fingerprint() {
    let dir = scratch_dir("mismatch");
    let level = dir.join("level.toml");
    let recording = dir.join("run.rec");
    fs::write(&level, LEVEL).expect("write level");

    let output = turtle(&[
        "run",
        "--level",
        path_arg(&level),
        "--inputs",
        "ee",
        "--record-out",
        path_arg(&recording),
    ]);
    assert!(output.status.success(), "run failed: {output:?}");

    let output = turtle(&[
        "replay",
        "--level",
        path_arg(&level),
        "--recording",
        path_arg(&recording),
        "--expect",
        "00",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fingerprint mismatch"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn malformed_level_reports_context() {
    let dir = scratch_dir("malformed");
    let level = dir.join("level.toml");
    fs::write(&level, "map = [\"P?\"]").expect("write level");

    let output = turtle(&["run", "--level", path_arg(&level)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not parse level"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(dir);
}
