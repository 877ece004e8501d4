use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sir_report::{
    create_timestamped_run_dir, resolve_scenarios, simulate_all, write_report, ReportOptions,
    ScenarioOverrides,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Deterministic SIR outbreak simulator")]
struct Cli {
    /// Scenario file (TOML); defaults to ./scenarios.toml, then the built-in scenarios
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory; each run gets a timestamped subdirectory
    #[arg(long, env = "SIR_OUTPUT_BASE", default_value = "output-sir")]
    output: PathBuf,

    /// Skip PNG chart rendering
    #[arg(long, default_value_t = false)]
    no_plots: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    #[command(flatten)]
    overrides: ScenarioOverrides,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut scenarios = resolve_scenarios(cli.config.as_deref())?;
    if cli.overrides.is_set() {
        let base = scenarios.first().context("no scenario to apply overrides to")?;
        let custom = cli.overrides.apply(base)?;
        scenarios = vec![custom];
    }

    let runs = simulate_all(&scenarios);
    let run_dir = create_timestamped_run_dir(&cli.output)?;
    let report = write_report(&runs, &ReportOptions { plots: !cli.no_plots }, &run_dir)?;

    println!(
        "{:<52} {:>6} {:>12} {:>8} {:>12} {:>7}",
        "scenario", "R0", "peak I", "peak t", "final R", "clamps"
    );
    for summary in &report.scenarios {
        let r0 = summary
            .basic_reproduction_number
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<52} {:>6} {:>12.0} {:>8.1} {:>12.0} {:>7}",
            summary.name,
            r0,
            summary.peak_infected,
            summary.peak_time,
            summary.final_recovered,
            summary.instability_count
        );
    }

    println!("Run directory: {}", report.output_dir.display());
    println!("Summary: {}", report.summary_path.display());
    if let Some(path) = &report.comparison_plot_path {
        println!("Comparison plot: {}", path.display());
    }

    Ok(())
}
