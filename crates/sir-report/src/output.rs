use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use sir_model::{SimulationConfig, Trajectory};

use crate::ScenarioRun;

/// One CSV row of a trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryRow {
    pub step: usize,
    pub t: f64,
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioFiles {
    pub csv_path: PathBuf,
    pub plot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub config: SimulationConfig,
    pub basic_reproduction_number: Option<f64>,
    pub peak_infected: f64,
    pub peak_time: f64,
    pub final_susceptible: f64,
    pub final_infected: f64,
    pub final_recovered: f64,
    pub attack_rate: f64,
    pub instability_count: usize,
    pub first_instability_time: Option<f64>,
    pub files: ScenarioFiles,
}

impl ScenarioSummary {
    pub fn from_run(run: &ScenarioRun, files: ScenarioFiles) -> Self {
        let traj = &run.trajectory;
        let (peak_infected, peak_time) = traj
            .peak_infected()
            .map(|s| (s.infected, s.t))
            .unwrap_or((0.0, 0.0));
        let (final_susceptible, final_infected, final_recovered) = traj
            .final_state()
            .map(|s| (s.susceptible, s.infected, s.recovered))
            .unwrap_or((0.0, 0.0, 0.0));

        Self {
            name: run.scenario.name.clone(),
            config: run.scenario.model.clone(),
            basic_reproduction_number: run.scenario.model.basic_reproduction_number(),
            peak_infected,
            peak_time,
            final_susceptible,
            final_infected,
            final_recovered,
            attack_rate: traj.attack_rate(),
            instability_count: traj.instability_count(),
            first_instability_time: traj.instabilities().first().map(|w| w.time),
            files,
        }
    }
}

/// Everything written for one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
    pub comparison_plot_path: Option<PathBuf>,
    pub scenarios: Vec<ScenarioSummary>,
}

/// Create `base_dir/<UTC timestamp>`, suffixing `-01`, `-02`... on collision.
pub fn create_timestamped_run_dir(base_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(base_dir)
        .with_context(|| format!("failed to create output base directory {}", base_dir.display()))?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let mut run_dir = base_dir.join(&timestamp);
    let mut counter: usize = 1;
    while run_dir.exists() {
        run_dir = base_dir.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;
    Ok(run_dir)
}

pub fn write_trajectory_csv(path: &Path, trajectory: &Trajectory) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open CSV path {}", path.display()))?;

    for (step, state) in trajectory.iter().enumerate() {
        writer.serialize(TrajectoryRow {
            step,
            t: state.t,
            susceptible: state.susceptible,
            infected: state.infected,
            recovered: state.recovered,
        })?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, report: &Report) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(report)?;
    fs::write(path, data).with_context(|| format!("failed to write summary {}", path.display()))?;
    Ok(())
}
