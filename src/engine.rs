//! SIR engine
//!
//! Advances the SIR system with explicit Euler steps:
//!
//! ```text
//! f_inf = beta(t) * S * I / N * dt
//! f_rec = gamma * I * dt
//! S' = S - f_inf
//! I' = I + f_inf - f_rec
//! R' = R + f_rec
//! ```
//!
//! Both flows are taken from the same snapshot. A flow larger than the
//! compartment it drains is limited to that compartment's content, so the
//! excess never reaches the receiving compartment and S + I + R stays equal
//! to N.

use tracing::{debug, warn};

use crate::config::SimulationConfig;
use crate::state::{Compartment, SimulationState};
use crate::trajectory::{NumericInstabilityWarning, Trajectory};

/// Relative tolerance of the per-step conservation check.
pub const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Result of a single Euler step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// State after the step
    pub state: SimulationState,
    susceptible_clamp: Option<NumericInstabilityWarning>,
    infected_clamp: Option<NumericInstabilityWarning>,
}

impl StepOutcome {
    /// Clamp events raised by this step, susceptible first.
    pub fn warnings(&self) -> impl Iterator<Item = NumericInstabilityWarning> {
        self.susceptible_clamp.into_iter().chain(self.infected_clamp)
    }

    pub fn was_clamped(&self) -> bool {
        self.susceptible_clamp.is_some() || self.infected_clamp.is_some()
    }
}

/// Stateless SIR integrator.
///
/// Holds no fields; every [`run`](SirEngine::run) is independent, so one
/// engine can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SirEngine;

impl SirEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run the full simulation described by `config`.
    ///
    /// Returns `num_steps + 1` states. Clamp events are collected in the
    /// trajectory and logged; the first at `warn`, the rest at `debug`.
    ///
    /// # Panics
    /// If S + I + R drifts from N by more than [`CONSERVATION_TOLERANCE`]
    /// (relative). That can only come from a defect in the update rule.
    pub fn run(&self, config: &SimulationConfig) -> Trajectory {
        let n = config.population_size();
        let steps = config.num_steps();
        debug!(
            population = n,
            steps,
            time_step = config.time_step(),
            "starting SIR run"
        );

        let mut states = Vec::with_capacity(steps + 1);
        let mut instabilities = Vec::new();

        let mut current = SimulationState::new(
            0.0,
            config.initial_susceptible(),
            config.initial_infected(),
            config.initial_recovered(),
        );
        states.push(current);

        for k in 0..steps {
            let outcome = self.step(config, &current, k);

            for warning in outcome.warnings() {
                if instabilities.is_empty() {
                    warn!(
                        step = warning.step,
                        time = warning.time,
                        compartment = %warning.compartment,
                        overshoot = warning.overshoot,
                        "numeric instability: compartment clamped to zero, reduce time_step"
                    );
                } else {
                    debug!(%warning, "numeric instability");
                }
                instabilities.push(warning);
            }

            let total = outcome.state.total();
            assert!(
                (total - n).abs() <= CONSERVATION_TOLERANCE * n,
                "population not conserved at step {}: S + I + R = {total}, N = {n}",
                k + 1
            );

            current = outcome.state;
            states.push(current);
        }

        debug!(
            instabilities = instabilities.len(),
            final_infected = current.infected,
            "SIR run completed"
        );

        Trajectory::new(n, states, instabilities)
    }

    /// Advance `current`, the state at step `step`, to step `step + 1`.
    pub fn step(
        &self,
        config: &SimulationConfig,
        current: &SimulationState,
        step: usize,
    ) -> StepOutcome {
        let n = config.population_size();
        let dt = config.time_step();
        let beta = config.transmission_rate_at(current.t);
        let gamma = config.recovery_rate();

        let s = current.susceptible;
        let i = current.infected;
        let r = current.recovered;

        // i / n <= 1 keeps the product finite wherever the true flow is.
        let mut infection = if i == 0.0 || beta == 0.0 {
            0.0
        } else {
            beta * (i / n) * s * dt
        };
        let mut recovery = if i == 0.0 || gamma == 0.0 {
            0.0
        } else {
            gamma * i * dt
        };

        let next_step = step + 1;
        let t_next = next_step as f64 * dt;

        let mut susceptible_clamp = None;
        if infection > s {
            susceptible_clamp = Some(NumericInstabilityWarning {
                step: next_step,
                time: t_next,
                compartment: Compartment::Susceptible,
                overshoot: infection - s,
            });
            infection = s;
        }

        let infected_pool = i + infection;
        let mut infected_clamp = None;
        if recovery > infected_pool {
            infected_clamp = Some(NumericInstabilityWarning {
                step: next_step,
                time: t_next,
                compartment: Compartment::Infected,
                overshoot: recovery - infected_pool,
            });
            recovery = infected_pool;
        }

        StepOutcome {
            state: SimulationState::new(
                t_next,
                s - infection,
                infected_pool - recovery,
                r + recovery,
            ),
            susceptible_clamp,
            infected_clamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::Intervention;

    #[test]
    fn test_concrete_single_step() {
        let cfg = SimulationConfig::new(1000.0, 1.0, 0.0, 0.3, 0.1, 1.0, 1).unwrap();
        let traj = SirEngine::new().run(&cfg);

        assert_eq!(traj.len(), 2);
        assert_eq!(traj.states()[0], SimulationState::new(0.0, 999.0, 1.0, 0.0));

        let s1 = traj.states()[1];
        assert_eq!(s1.t, 1.0);
        assert_relative_eq!(s1.susceptible, 998.7003, epsilon = 1e-9);
        assert_relative_eq!(s1.infected, 1.1997, epsilon = 1e-9);
        assert_relative_eq!(s1.recovered, 0.1, epsilon = 1e-12);
        assert_relative_eq!(s1.total(), 1000.0, epsilon = 1e-9);
        assert!(traj.is_stable());
    }

    #[test]
    fn test_step_uses_snapshot() {
        let cfg = SimulationConfig::new(100.0, 10.0, 0.0, 0.5, 0.2, 0.5, 4).unwrap();
        let current = SimulationState::new(0.0, 90.0, 10.0, 0.0);
        let outcome = SirEngine::new().step(&cfg, &current, 0);

        let infection = 0.5 * 90.0 * 10.0 / 100.0 * 0.5;
        let recovery = 0.2 * 10.0 * 0.5;
        assert_relative_eq!(outcome.state.susceptible, 90.0 - infection);
        assert_relative_eq!(outcome.state.infected, 10.0 + infection - recovery);
        assert_relative_eq!(outcome.state.recovered, recovery);
        assert!(!outcome.was_clamped());
    }

    #[test]
    fn test_recovery_clamp_conserves_population() {
        // gamma * dt = 3 drains I three times over in one step.
        let cfg = SimulationConfig::new(100.0, 20.0, 0.0, 0.1, 1.5, 2.0, 5).unwrap();
        let traj = SirEngine::new().run(&cfg);

        assert!(traj.instability_count() >= 1);
        let first = traj.instabilities()[0];
        assert_eq!(first.compartment, Compartment::Infected);
        assert_eq!(first.step, 1);
        assert!(first.overshoot > 0.0);

        for state in &traj {
            assert!(state.is_non_negative());
            assert_relative_eq!(state.total(), 100.0, epsilon = 1e-9);
        }
        assert_eq!(traj.states()[1].infected, 0.0);
    }

    #[test]
    fn test_infection_clamp_conserves_population() {
        // beta * I / N * dt = 4 drains S four times over.
        let cfg = SimulationConfig::new(100.0, 80.0, 0.0, 5.0, 0.0, 1.0, 3).unwrap();
        let traj = SirEngine::new().run(&cfg);

        let first = traj.instabilities()[0];
        assert_eq!(first.compartment, Compartment::Susceptible);
        assert_eq!(traj.states()[1].susceptible, 0.0);
        assert_eq!(traj.states()[1].infected, 100.0);
        for state in &traj {
            assert!(state.is_non_negative());
            assert_relative_eq!(state.total(), 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_intervention_lowers_transmission() {
        let base = SimulationConfig::new(10_000.0, 10.0, 0.0, 0.5, 0.1, 1.0, 100).unwrap();
        let with_lockdown = base
            .clone()
            .with_intervention(Intervention::new(10.0, 0.05))
            .unwrap();

        let engine = SirEngine::new();
        let free = engine.run(&base);
        let locked = engine.run(&with_lockdown);

        // Identical until the first step that starts at t = 10.
        assert_eq!(free.states()[..=10], locked.states()[..=10]);
        assert!(locked.states()[11].susceptible > free.states()[11].susceptible);
        assert!(
            locked.peak_infected().unwrap().infected < free.peak_infected().unwrap().infected
        );
    }

    #[test]
    fn test_huge_rates_without_infected_stay_constant() {
        let cfg = SimulationConfig::new(1e10, 0.0, 0.0, 1e300, 0.1, 1.0, 3).unwrap();
        let traj = SirEngine::new().run(&cfg);

        assert!(traj.is_stable());
        for state in &traj {
            assert_eq!(state.susceptible, 1e10);
            assert_eq!(state.infected, 0.0);
            assert_eq!(state.recovered, 0.0);
        }
    }

    #[test]
    fn test_huge_population_flow_is_not_clamped() {
        let cfg = SimulationConfig::new(1e200, 0.5e200, 0.0, 0.1, 0.1, 1.0, 1).unwrap();
        let traj = SirEngine::new().run(&cfg);

        assert!(traj.is_stable());
        let s1 = traj.states()[1];
        // S1 = S0 - beta * (I0 / N) * S0 = 0.5e200 * (1 - 0.05)
        assert_relative_eq!(s1.susceptible, 4.75e199, max_relative = 1e-12);
        assert_relative_eq!(s1.infected, 0.5e200 + 0.025e200 - 0.05e200, max_relative = 1e-12);
        assert_relative_eq!(s1.total(), 1e200, max_relative = 1e-12);
    }

    #[test]
    fn test_engine_is_reusable_across_threads() {
        let cfg = SimulationConfig::new(5_000.0, 5.0, 0.0, 0.4, 0.1, 0.5, 400).unwrap();
        let engine = SirEngine::new();
        let expected = engine.run(&cfg);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| engine.run(&cfg))).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
