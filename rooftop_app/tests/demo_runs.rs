use std::process::Command;

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::tempdir;

fn run_demo(demo: &str, snapshot: &str, command_log: &str) -> Result<std::process::Output> {
    Command::new(env!("CARGO_BIN_EXE_rooftop_app"))
        .args([
            "--demo",
            demo,
            "--snapshot-json",
            snapshot,
            "--command-log-json",
            command_log,
        ])
        .output()
        .with_context(|| format!("executing rooftop_app {demo} demo"))
}

fn count_enables(commands: &[Value], clip: &str) -> usize {
    commands
        .iter()
        .filter(|command| {
            let payload = &command["payload"];
            payload["op"] == "enable_animation" && payload["name"] == clip
        })
        .count()
}

#[test]
fn curtains_demo_waves_open_and_closed() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary output directory")?;
    let snapshot_path = temp_dir.path().join("snapshot.json");
    let log_path = temp_dir.path().join("commands.json");

    let output = run_demo(
        "curtains",
        snapshot_path.to_str().context("snapshot path is not valid UTF-8")?,
        log_path.to_str().context("command log path is not valid UTF-8")?,
    )?;
    assert!(
        output.status.success(),
        "rooftop_app exited with {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Saved scene snapshot to"),
        "snapshot marker missing from output: {stdout}"
    );
    assert!(
        stdout.contains("Saved command log to"),
        "command log marker missing from output: {stdout}"
    );

    let snapshot: Value = serde_json::from_str(
        &std::fs::read_to_string(&snapshot_path).context("reading snapshot JSON")?,
    )
    .context("parsing snapshot JSON")?;
    assert_eq!(snapshot["counts"]["pending"], 0);
    assert_eq!(snapshot["counts"]["rejected"], 0);
    assert_eq!(snapshot["roster"].as_array().map(Vec::len), Some(1));

    let commands: Vec<Value> = serde_json::from_str(
        &std::fs::read_to_string(&log_path).context("reading command log JSON")?,
    )
    .context("parsing command log JSON")?;
    // One full open wave and one full close wave across the animated panels.
    assert_eq!(count_enables(&commands, "Open"), 18);
    assert_eq!(count_enables(&commands, "Close"), 18);

    Ok(())
}

#[test]
fn windows_demo_ends_on_the_checker_pattern() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary output directory")?;
    let snapshot_path = temp_dir.path().join("snapshot.json");
    let log_path = temp_dir.path().join("commands.json");

    let output = run_demo(
        "windows",
        snapshot_path.to_str().context("snapshot path is not valid UTF-8")?,
        log_path.to_str().context("command log path is not valid UTF-8")?,
    )?;
    assert!(
        output.status.success(),
        "rooftop_app exited with {:?}",
        output.status
    );

    let snapshot: Value = serde_json::from_str(
        &std::fs::read_to_string(&snapshot_path).context("reading snapshot JSON")?,
    )
    .context("parsing snapshot JSON")?;

    let checker = rooftop_scene::windows::resolve_pattern("checker");
    let buildings = snapshot["buildings"]
        .as_array()
        .context("snapshot has no buildings array")?;
    assert_eq!(buildings.len(), 3);
    for building in buildings {
        assert_eq!(
            building["pattern"].as_str(),
            Some(checker),
            "building {} did not land on the checker pattern",
            building["name"]
        );
    }

    Ok(())
}
