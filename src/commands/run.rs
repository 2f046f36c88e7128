use crate::cli::validate_run_options;
use crate::config::{resolve_unmount_command, Config, RunOptions};
use crate::error::{MirrorcheckError, Result};
use crate::mount;
use crate::report::{RunReport, ScenarioReport};
use crate::scenarios;
use rand::Rng;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// `run` subcommand inputs, straight from the CLI.
pub struct RunArgs {
    pub fs_binary: PathBuf,
    pub scenario: Vec<String>,
    pub seed: Option<u64>,
    pub iterations: Option<u64>,
    pub delay_probability: Option<f64>,
    pub error_probability: Option<f64>,
    pub read_iterations: Option<u64>,
    pub file_size: Option<u64>,
    pub json: bool,
    pub porcelain: bool,
}

/// Config file defaults overridden by CLI flags, seed drawn if not supplied.
pub fn build_run_options(config: &Config, args: &RunArgs) -> Result<RunOptions> {
    let opts = RunOptions {
        fs_binary: args.fs_binary.clone(),
        iterations: args.iterations.unwrap_or_else(|| config.stress.get_iterations()),
        delay_probability: args
            .delay_probability
            .unwrap_or_else(|| config.stress.get_delay_probability()),
        error_probability: args
            .error_probability
            .unwrap_or_else(|| config.stress.get_error_probability()),
        file_count: config.fixture.get_file_count(),
        file_size: args.file_size.unwrap_or_else(|| config.fixture.get_file_size()),
        read_iterations: args
            .read_iterations
            .unwrap_or_else(|| config.driver.get_read_iterations()),
        interleaved_read_iterations: config.driver.get_interleaved_read_iterations(),
        ready_timeout: Duration::from_millis(config.mount.get_ready_timeout_ms()),
        unmount_command: resolve_unmount_command(config),
        seed: args.seed.unwrap_or_else(|| rand::rng().random()),
    };

    validate_run_options(&opts)?;
    Ok(opts)
}

/// Run the selected scenarios sequentially and collect their outcomes. A
/// scenario failure is recorded and the remaining scenarios still run; the
/// oracle inside each scenario is what fails fast.
pub fn execute_scenarios(opts: &RunOptions, selected: &[String]) -> Result<RunReport> {
    let scenarios: Vec<_> = if selected.is_empty() {
        scenarios::all().iter().collect()
    } else {
        scenarios::resolve(selected)?
    };

    let mut reports = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        tracing::info!("Running scenario '{}' (seed {})", scenario.name, opts.seed);
        let started_at = chrono::Utc::now();
        let start = Instant::now();

        let outcome = scenario.run(opts);
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                tracing::info!("Scenario '{}' passed in {}ms", scenario.name, duration_ms);
                reports.push(ScenarioReport::passed(
                    scenario.name,
                    opts.seed,
                    started_at,
                    duration_ms,
                ));
            }
            Err(e) => {
                tracing::error!("Scenario '{}' failed: {}", scenario.name, e);
                reports.push(ScenarioReport::failed(
                    scenario.name,
                    opts.seed,
                    started_at,
                    duration_ms,
                    e.to_string(),
                ));
            }
        }
    }

    Ok(RunReport::new(opts.seed, reports))
}

/// Full `run` command: resolve options, race the scenario sweep against
/// Ctrl-C (releasing any live mounts on interrupt), print the report.
pub async fn run_command(config: Config, args: RunArgs) -> Result<RunReport> {
    let opts = build_run_options(&config, &args)?;
    let selected = args.scenario.clone();

    let handle = {
        let opts = opts.clone();
        tokio::task::spawn_blocking(move || execute_scenarios(&opts, &selected))
    };

    let report = tokio::select! {
        result = handle => result
            .map_err(|e| MirrorcheckError::Config(format!("Scenario task panicked: {}", e)))??,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            mount::emergency_cleanup();
            std::process::exit(130);
        }
    };

    if args.json {
        report.print_json()?;
    } else if args.porcelain {
        report.print_porcelain();
    } else {
        report.print_human();
    }

    Ok(report)
}
