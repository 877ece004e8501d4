//! SIR - Susceptible / Infected / Recovered outbreak simulation
//!
//! A deterministic compartmental model of a closed population, advanced with
//! explicit Euler steps. The crate is pure computation: a validated
//! [`SimulationConfig`] goes in, a [`Trajectory`] comes out. Writing tables
//! or charts is left to callers.
//!
//! ```
//! let config = sir_model::build_config(1000.0, 1.0, 0.0, 0.3, 0.1, 1.0, 160)?;
//! let trajectory = sir_model::run(&config);
//! assert_eq!(trajectory.len(), 161);
//! # Ok::<(), sir_model::InvalidConfigError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod trajectory;

// Re-export main types
pub use config::{Intervention, SimulationConfig, SimulationParams, MAX_STEPS};
pub use engine::{SirEngine, StepOutcome, CONSERVATION_TOLERANCE};
pub use error::InvalidConfigError;
pub use state::{Compartment, SimulationState};
pub use trajectory::{NumericInstabilityWarning, Trajectory};

/// Validate the seven run parameters into a [`SimulationConfig`].
pub fn build_config(
    population_size: f64,
    initial_infected: f64,
    initial_recovered: f64,
    transmission_rate: f64,
    recovery_rate: f64,
    time_step: f64,
    num_steps: usize,
) -> Result<SimulationConfig, InvalidConfigError> {
    SimulationConfig::new(
        population_size,
        initial_infected,
        initial_recovered,
        transmission_rate,
        recovery_rate,
        time_step,
        num_steps,
    )
}

/// Run `config` to completion with a fresh [`SirEngine`].
pub fn run(config: &SimulationConfig) -> Trajectory {
    SirEngine::new().run(config)
}
