//! Error types for configuration validation

use thiserror::Error;

/// Rejection raised while building a [`SimulationConfig`](crate::SimulationConfig).
///
/// Always fatal for the run being configured; the caller has to supply
/// corrected parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidConfigError {
    #[error("population_size must be finite and > 0, got {0}")]
    NonPositivePopulation(f64),
    #[error("{field} must be finite and >= 0, got {value}")]
    NegativeOrNonFinite { field: &'static str, value: f64 },
    #[error(
        "initial_infected ({infected}) + initial_recovered ({recovered}) exceeds population_size ({population})"
    )]
    InitialExceedsPopulation {
        infected: f64,
        recovered: f64,
        population: f64,
    },
    #[error("time_step must be finite and > 0, got {0}")]
    NonPositiveTimeStep(f64),
    #[error("total_time must be finite and > 0, got {0}")]
    NonPositiveHorizon(f64),
    #[error("num_steps must be at least 1")]
    NoSteps,
    #[error("num_steps {requested} exceeds the maximum of {max}")]
    TooManySteps { requested: usize, max: usize },
}
