//! Swap simulator entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use swap_sim::benchmark::{self, BenchmarkParams, FixedBaseline};
use swap_sim::config::ScenarioConfig;
use swap_sim::io::export::{export_snapshots, export_swaps, export_trace};

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    telemetry_out: Option<String>,
    swaps_out: Option<String>,
    trace_out: Option<String>,
    sweep: Option<Vec<f32>>,
    baseline_minutes: Option<u64>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("swap-sim: EV fleet battery-swap station simulator");
    eprintln!();
    eprintln!("Usage: swap-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>           Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>             Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --telemetry-out <path>      Export per-tick snapshots to CSV");
    eprintln!("  --swaps-out <path>          Export swap events to CSV");
    eprintln!("  --trace-out <path>          Export per-vehicle state trace to CSV");
    eprintln!("  --sweep <from:to:step>      Sweep the low threshold instead of a single run");
    eprintln!("  --baseline-minutes <u64>    Compare against an optimal total running time");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                     Start REST API server after simulation");
        eprintln!("  --port <u16>                API server port (default: 3000)");
    }
    eprintln!("  --help                      Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    args.get(i)
        .map(String::as_str)
        .unwrap_or_else(|| fail(format!("{flag} requires {what} argument")))
}

fn parse_sweep(arg: &str) -> Vec<f32> {
    let parts: Vec<f32> = arg
        .split(':')
        .map(|p| {
            p.trim()
                .parse::<f32>()
                .unwrap_or_else(|_| fail(format!("--sweep value \"{arg}\" is not from:to:step")))
        })
        .collect();
    let &[from, to, step] = parts.as_slice() else {
        fail(format!("--sweep value \"{arg}\" is not from:to:step"));
    };
    benchmark::sweep_range(from, to, step).unwrap_or_else(|e| fail(e))
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        telemetry_out: None,
        swaps_out: None,
        trace_out: None,
        sweep: None,
        baseline_minutes: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(value(&args, i, flag, "a path").to_string());
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(value(&args, i, flag, "a name").to_string());
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(value(&args, i, flag, "a path").to_string());
            }
            "--swaps-out" => {
                i += 1;
                cli.swaps_out = Some(value(&args, i, flag, "a path").to_string());
            }
            "--trace-out" => {
                i += 1;
                cli.trace_out = Some(value(&args, i, flag, "a path").to_string());
            }
            "--sweep" => {
                i += 1;
                cli.sweep = Some(parse_sweep(value(&args, i, flag, "a from:to:step")));
            }
            "--baseline-minutes" => {
                i += 1;
                let v = value(&args, i, flag, "a u64");
                let minutes = v
                    .parse::<u64>()
                    .unwrap_or_else(|_| fail(format!("--baseline-minutes value \"{v}\" is not a valid u64")));
                cli.baseline_minutes = Some(minutes);
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let v = value(&args, i, flag, "a u16");
                cli.port = v
                    .parse::<u16>()
                    .unwrap_or_else(|_| fail(format!("--port value \"{v}\" is not a valid u16")));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_scenario(cli: &CliArgs) -> ScenarioConfig {
    // --scenario takes priority, then --preset, then baseline default
    let loaded = if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if cli.trace_out.is_some() {
        scenario.simulation.record_vehicle_trace = true;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    scenario
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let scenario = load_scenario(&cli);

    if let Some(ref lows) = cli.sweep {
        let points = benchmark::threshold_sweep(&scenario, lows).unwrap_or_else(|e| fail(e));
        for p in &points {
            println!("{p}");
        }
        return;
    }

    let mut engine = scenario.engine().unwrap_or_else(|e| fail(e));
    let run = engine.run_while(|_| true);
    let summary = engine.summary();
    println!("{summary}");

    let sim_config = engine.config().clone();
    if let Some(minutes) = cli.baseline_minutes {
        let params = BenchmarkParams::from(&sim_config);
        match benchmark::compare(&summary, &params, &FixedBaseline(minutes)) {
            Ok(cmp) => println!("Baseline:              {cmp}"),
            Err(e) => fail(e),
        }
    }

    let output = engine.into_output();
    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_snapshots(&output.snapshots, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        eprintln!("Telemetry written to {path}");
    }
    if let Some(ref path) = cli.swaps_out {
        if let Err(e) = export_swaps(&output.swaps, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        eprintln!("Swap events written to {path}");
    }
    if let Some(ref path) = cli.trace_out {
        if let Err(e) = export_trace(&output.trace, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        eprintln!("Vehicle trace written to {path}");
    }

    if let Err(e) = run {
        fail(e);
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(swap_sim::api::AppState::new(sim_config, output));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(format!("failed to create tokio runtime: {e}")));
        if let Err(e) = rt.block_on(swap_sim::api::serve(state, addr)) {
            fail(format!("server error: {e}"));
        }
    }
}
