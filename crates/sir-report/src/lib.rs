//! Scenario runner and reporter for `sir-model`.
//!
//! Loads named scenarios, runs them in parallel, and writes one CSV per
//! trajectory, per-scenario and comparison charts, and a JSON summary.

pub mod output;
pub mod plot;
pub mod scenario;

use std::fs;
use std::path::Path;

use anyhow::Context;
use rayon::prelude::*;
use sir_model::{SirEngine, Trajectory};
use tracing::{info, warn};

pub use output::{create_timestamped_run_dir, Report, ScenarioFiles, ScenarioSummary};
pub use scenario::{
    builtin_scenarios, load_scenarios, parse_scenarios, resolve_scenarios, Scenario,
    ScenarioOverrides, SeriesColor,
};

/// A scenario together with its simulated trajectory.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub scenario: Scenario,
    pub trajectory: Trajectory,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Render PNG charts alongside the CSV and JSON output
    pub plots: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { plots: true }
    }
}

/// Run every scenario; runs are independent and execute in parallel.
pub fn simulate_all(scenarios: &[Scenario]) -> Vec<ScenarioRun> {
    let engine = SirEngine::new();
    scenarios
        .par_iter()
        .map(|scenario| ScenarioRun {
            scenario: scenario.clone(),
            trajectory: engine.run(&scenario.model),
        })
        .collect()
}

/// Write all artifacts for `runs` into `output_dir`.
pub fn write_report(
    runs: &[ScenarioRun],
    options: &ReportOptions,
    output_dir: &Path,
) -> anyhow::Result<Report> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let mut summaries = Vec::with_capacity(runs.len());
    for (idx, run) in runs.iter().enumerate() {
        let stem = format!("scenario_{:02}_{}", idx + 1, run.scenario.slug());
        let csv_path = output_dir.join(format!("{stem}.csv"));
        output::write_trajectory_csv(&csv_path, &run.trajectory)?;

        let plot_path = if options.plots {
            let path = output_dir.join(format!("{stem}.png"));
            plot::plot_scenario(run, &path)
                .with_context(|| format!("failed to render chart for {}", run.scenario.name))?;
            Some(path)
        } else {
            None
        };

        if !run.trajectory.is_stable() {
            warn!(
                scenario = %run.scenario.name,
                clamps = run.trajectory.instability_count(),
                "trajectory contains clamped steps; values after the first clamp reflect step size, not the model"
            );
        }
        info!(scenario = %run.scenario.name, csv = %csv_path.display(), "wrote scenario output");

        summaries.push(ScenarioSummary::from_run(run, ScenarioFiles { csv_path, plot_path }));
    }

    let comparison_plot_path = if options.plots && !runs.is_empty() {
        let path = output_dir.join("comparison_infected.png");
        plot::plot_comparison(runs, &path).context("failed to render comparison chart")?;
        Some(path)
    } else {
        None
    };

    let report = Report {
        output_dir: output_dir.to_path_buf(),
        summary_path: output_dir.join("summary.json"),
        comparison_plot_path,
        scenarios: summaries,
    };
    output::write_summary(&report.summary_path, &report)?;
    info!(dir = %output_dir.display(), "report written");

    Ok(report)
}
