use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use sir_model::{Intervention, SimulationConfig, SimulationParams};

const BUILTIN_SCENARIOS: &str = include_str!("../configs/scenarios.toml");

/// Series colour of a scenario in the comparison chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Red,
    Blue,
    Green,
    Purple,
    Orange,
    Black,
}

impl SeriesColor {
    pub fn rgb(self) -> RGBColor {
        match self {
            SeriesColor::Red => RGBColor(214, 39, 40),
            SeriesColor::Blue => RGBColor(31, 119, 180),
            SeriesColor::Green => RGBColor(44, 160, 44),
            SeriesColor::Purple => RGBColor(148, 103, 189),
            SeriesColor::Orange => RGBColor(255, 127, 14),
            SeriesColor::Black => RGBColor(0, 0, 0),
        }
    }
}

/// Named, coloured model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: SeriesColor,
    pub model: SimulationConfig,
}

fn default_color() -> SeriesColor {
    SeriesColor::Black
}

impl Scenario {
    /// File-name friendly form of the scenario name.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for ch in self.name.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
            } else if !slug.ends_with('-') && !slug.is_empty() {
                slug.push('-');
            }
        }
        let trimmed = slug.trim_end_matches('-');
        let mut out: String = trimmed.chars().take(48).collect();
        while out.ends_with('-') {
            out.pop();
        }
        if out.is_empty() {
            out.push_str("scenario");
        }
        out
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    #[serde(rename = "scenario", default)]
    scenarios: Vec<Scenario>,
}

/// Parse a scenario list from TOML text. Every model is validated.
pub fn parse_scenarios(raw: &str) -> anyhow::Result<Vec<Scenario>> {
    let file: ScenarioFile = toml::from_str(raw)?;
    if file.scenarios.is_empty() {
        bail!("scenario file defines no [[scenario]] entries");
    }
    Ok(file.scenarios)
}

pub fn load_scenarios(path: &Path) -> anyhow::Result<Vec<Scenario>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file {}", path.display()))?;
    parse_scenarios(&raw).with_context(|| format!("invalid scenario file {}", path.display()))
}

/// The four comparison scenarios shipped with the crate.
pub fn builtin_scenarios() -> anyhow::Result<Vec<Scenario>> {
    parse_scenarios(BUILTIN_SCENARIOS).context("built-in scenario file is invalid")
}

/// Explicit path, then `./scenarios.toml`, then the built-in list.
pub fn resolve_scenarios(path: Option<&Path>) -> anyhow::Result<Vec<Scenario>> {
    if let Some(path) = path {
        return load_scenarios(path);
    }

    let cwd_config = PathBuf::from("scenarios.toml");
    if cwd_config.exists() {
        return load_scenarios(&cwd_config);
    }

    builtin_scenarios()
}

/// Single-run overrides applied on top of a base scenario.
#[derive(Debug, Clone, Default, Args)]
pub struct ScenarioOverrides {
    /// Scenario name for the overridden run
    #[arg(long)]
    pub name: Option<String>,

    /// Total population N
    #[arg(long)]
    pub population: Option<f64>,

    /// Initial infected I(0)
    #[arg(long)]
    pub infected: Option<f64>,

    /// Initial recovered R(0)
    #[arg(long)]
    pub recovered: Option<f64>,

    /// Transmission rate beta
    #[arg(long)]
    pub beta: Option<f64>,

    /// Recovery rate gamma
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Integration step
    #[arg(long, conflicts_with = "total_time")]
    pub time_step: Option<f64>,

    /// Simulated horizon; the step becomes total_time / steps
    #[arg(long)]
    pub total_time: Option<f64>,

    /// Number of integration steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Time at which beta switches to --intervention-beta
    #[arg(long, requires = "intervention_beta")]
    pub intervention_time: Option<f64>,

    /// Transmission rate after the intervention
    #[arg(long, requires = "intervention_time")]
    pub intervention_beta: Option<f64>,
}

impl ScenarioOverrides {
    pub fn is_set(&self) -> bool {
        self.name.is_some()
            || self.population.is_some()
            || self.infected.is_some()
            || self.recovered.is_some()
            || self.beta.is_some()
            || self.gamma.is_some()
            || self.time_step.is_some()
            || self.total_time.is_some()
            || self.steps.is_some()
            || self.intervention_time.is_some()
            || self.intervention_beta.is_some()
    }

    /// Build a new scenario from `base` with every set field replaced.
    pub fn apply(&self, base: &Scenario) -> anyhow::Result<Scenario> {
        if self.time_step.is_some() && self.total_time.is_some() {
            bail!("time_step and total_time overrides are mutually exclusive");
        }

        let mut params = SimulationParams::from(base.model.clone());

        if let Some(v) = self.population {
            params.population_size = v;
        }
        if let Some(v) = self.infected {
            params.initial_infected = v;
        }
        if let Some(v) = self.recovered {
            params.initial_recovered = v;
        }
        if let Some(v) = self.beta {
            params.transmission_rate = v;
        }
        if let Some(v) = self.gamma {
            params.recovery_rate = v;
        }
        if let Some(v) = self.time_step {
            params.time_step = v;
        }
        if let Some(v) = self.steps {
            params.num_steps = v;
        }
        if let (Some(start_time), Some(rate)) = (self.intervention_time, self.intervention_beta) {
            params.intervention = Some(Intervention::new(start_time, rate));
        }

        let model = match self.total_time {
            Some(total_time) => {
                let config = SimulationConfig::from_horizon(
                    params.population_size,
                    params.initial_infected,
                    params.initial_recovered,
                    params.transmission_rate,
                    params.recovery_rate,
                    total_time,
                    params.num_steps,
                )?;
                match params.intervention {
                    Some(intervention) => config.with_intervention(intervention)?,
                    None => config,
                }
            }
            None => SimulationConfig::try_from(params)?,
        };

        Ok(Scenario {
            name: self.name.clone().unwrap_or_else(|| format!("{} (custom)", base.name)),
            color: base.color,
            model,
        })
    }
}
