//! SIR state representation
//!
//! One point of a trajectory: time plus the three compartments
//! - susceptible: not yet infected
//! - infected: currently infectious
//! - recovered: removed from transmission

use std::fmt;

use serde::{Deserialize, Serialize};

/// Disease compartment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compartment {
    Susceptible,
    Infected,
    Recovered,
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compartment::Susceptible => "susceptible",
            Compartment::Infected => "infected",
            Compartment::Recovered => "recovered",
        };
        f.write_str(name)
    }
}

/// State of the population at time `t`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Simulated time
    pub t: f64,
    /// Susceptible count (S)
    pub susceptible: f64,
    /// Infected count (I)
    pub infected: f64,
    /// Recovered count (R)
    pub recovered: f64,
}

impl SimulationState {
    /// Create a new state
    pub fn new(t: f64, susceptible: f64, infected: f64, recovered: f64) -> Self {
        Self {
            t,
            susceptible,
            infected,
            recovered,
        }
    }

    /// S + I + R
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    /// Value of a single compartment
    pub fn get(&self, compartment: Compartment) -> f64 {
        match compartment {
            Compartment::Susceptible => self.susceptible,
            Compartment::Infected => self.infected,
            Compartment::Recovered => self.recovered,
        }
    }

    /// True when every compartment is >= 0
    pub fn is_non_negative(&self) -> bool {
        self.susceptible >= 0.0 && self.infected >= 0.0 && self.recovered >= 0.0
    }
}
