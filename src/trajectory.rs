//! Trajectory of a completed run and the instability warnings raised while
//! producing it.

use serde::Serialize;
use thiserror::Error;

use crate::state::{Compartment, SimulationState};

/// Clamp-to-zero event of the explicit Euler update.
///
/// Raised when a step would have driven `compartment` below zero. Values
/// after this point are an artifact of the step size rather than model
/// truth; the run still completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Error)]
#[error(
    "step {step} (t = {time}): {compartment} would have fallen to -{overshoot}; clamped to zero, time_step is too coarse for these rates"
)]
pub struct NumericInstabilityWarning {
    /// Index of the trajectory entry produced by the clamped step
    pub step: usize,
    /// Time of that entry
    pub time: f64,
    /// Compartment that was clamped
    pub compartment: Compartment,
    /// Amount by which the unclamped update undershot zero
    pub overshoot: f64,
}

/// Full record of a run, `num_steps + 1` states indexed by step number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    population_size: f64,
    states: Vec<SimulationState>,
    instabilities: Vec<NumericInstabilityWarning>,
}

impl Trajectory {
    pub(crate) fn new(
        population_size: f64,
        states: Vec<SimulationState>,
        instabilities: Vec<NumericInstabilityWarning>,
    ) -> Self {
        Self {
            population_size,
            states,
            instabilities,
        }
    }

    pub fn population_size(&self) -> f64 {
        self.population_size
    }

    pub fn states(&self) -> &[SimulationState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, step: usize) -> Option<&SimulationState> {
        self.states.get(step)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimulationState> {
        self.states.iter()
    }

    /// State at step 0
    pub fn initial(&self) -> Option<&SimulationState> {
        self.states.first()
    }

    /// State after the last step
    pub fn final_state(&self) -> Option<&SimulationState> {
        self.states.last()
    }

    pub fn instabilities(&self) -> &[NumericInstabilityWarning] {
        &self.instabilities
    }

    pub fn instability_count(&self) -> usize {
        self.instabilities.len()
    }

    /// True when the clamp guard never fired
    pub fn is_stable(&self) -> bool {
        self.instabilities.is_empty()
    }

    /// Earliest state with the maximum infected count
    pub fn peak_infected(&self) -> Option<&SimulationState> {
        self.states.iter().fold(None, |best, state| match best {
            Some(b) if b.infected >= state.infected => Some(b),
            _ => Some(state),
        })
    }

    /// Fraction of the population that moved into R over the run.
    pub fn attack_rate(&self) -> f64 {
        match (self.initial(), self.final_state()) {
            (Some(first), Some(last)) => (last.recovered - first.recovered) / self.population_size,
            _ => 0.0,
        }
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a SimulationState;
    type IntoIter = std::slice::Iter<'a, SimulationState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}
