use std::fs;
use std::process::Command;

#[derive(Debug, PartialEq)]
struct Summary {
    total_running_minutes: u64,
    swaps: u64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_dynamics() {
    let baseline = run_and_parse_summary(&["--scenario", "scenarios/baseline.toml"]);
    let congested = run_and_parse_summary(&["--scenario", "scenarios/congested.toml"]);
    let rush = run_and_parse_summary(&["--scenario", "scenarios/morning_rush.toml"]);

    assert!(baseline.total_running_minutes > 0);
    assert_ne!(
        baseline, congested,
        "expected baseline and congested runs to differ"
    );
    assert!(
        rush.swaps > baseline.swaps,
        "expected the morning window to add swaps: baseline={baseline:?}, rush={rush:?}"
    );
}

#[test]
fn baseline_file_matches_baseline_preset() {
    let file = run_and_parse_summary(&["--scenario", "scenarios/baseline.toml"]);
    let preset = run_and_parse_summary(&["--preset", "baseline"]);
    assert_eq!(file, preset);
}

#[test]
fn every_preset_runs() {
    for preset in ["baseline", "hysteresis", "congested", "milp_benchmark"] {
        let summary = run_and_parse_summary(&["--preset", preset]);
        assert!(summary.total_running_minutes > 0, "{preset}: {summary:?}");
    }
}

#[test]
fn telemetry_export_has_one_row_per_tick() {
    let path = std::env::temp_dir().join(format!("swap-sim-telemetry-{}.csv", std::process::id()));
    let path_str = path.to_string_lossy().to_string();
    run_and_parse_summary(&["--preset", "milp_benchmark", "--telemetry-out", &path_str]);

    let csv = fs::read_to_string(&path).expect("telemetry file should exist");
    let _ = fs::remove_file(&path);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 721);
    assert!(lines[0].starts_with("tick,minute,total_running_minutes"));
}

#[test]
fn invalid_scenario_exits_with_field_errors() {
    let path = std::env::temp_dir().join(format!("swap-sim-invalid-{}.toml", std::process::id()));
    fs::write(&path, "[policy]\nlow_threshold = 90.0\nhigh_threshold = 50.0\nmax_queue_length = 0\n")
        .expect("temp file should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_swap-sim"))
        .args(["--scenario", &path.to_string_lossy()])
        .output()
        .expect("swap-sim process should run");
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("policy.low_threshold"), "stderr: {stderr}");
    assert!(stderr.contains("policy.max_queue_length"), "stderr: {stderr}");
}

#[test]
fn sweep_prints_one_line_per_threshold() {
    let output = Command::new(env!("CARGO_BIN_EXE_swap-sim"))
        .args(["--preset", "milp_benchmark", "--sweep", "25:45:10"])
        .output()
        .expect("swap-sim process should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().filter(|l| l.starts_with("low=")).count(), 3);
}

fn run_and_parse_summary(args: &[&str]) -> Summary {
    let output = Command::new(env!("CARGO_BIN_EXE_swap-sim"))
        .args(args)
        .output()
        .expect("swap-sim process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Summary {
        total_running_minutes: parse_metric(&stdout, "Total running time:", "min"),
        swaps: parse_metric(&stdout, "Swaps:", ""),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> u64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing summary line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid summary format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<u64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from summary line `{line}`"))
}
