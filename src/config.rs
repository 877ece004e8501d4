//! Simulation configuration
//!
//! [`SimulationConfig`] is the validated, immutable parameter set that fully
//! determines a run. Every constructor validates; there is no way to obtain
//! a config that violates its invariants.

use serde::{Deserialize, Serialize};

use crate::error::InvalidConfigError;

/// Upper bound on `num_steps`. Larger runs are refused at build time.
pub const MAX_STEPS: usize = 10_000_000;

/// Step change of the transmission rate at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    /// Time from which the new rate applies
    pub start_time: f64,
    /// Transmission rate (beta) after the intervention
    pub transmission_rate: f64,
}

impl Intervention {
    pub fn new(start_time: f64, transmission_rate: f64) -> Self {
        Self {
            start_time,
            transmission_rate,
        }
    }

    fn validate(&self) -> Result<(), InvalidConfigError> {
        check_non_negative("intervention.start_time", self.start_time)?;
        check_non_negative("intervention.transmission_rate", self.transmission_rate)
    }
}

/// Unvalidated mirror of [`SimulationConfig`], used as its serde shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationParams {
    pub population_size: f64,
    pub initial_infected: f64,
    pub initial_recovered: f64,
    pub transmission_rate: f64,
    pub recovery_rate: f64,
    pub time_step: f64,
    pub num_steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervention: Option<Intervention>,
}

/// Validated parameters and initial state of an SIR run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimulationParams", into = "SimulationParams")]
pub struct SimulationConfig {
    population_size: f64,
    initial_infected: f64,
    initial_recovered: f64,
    transmission_rate: f64,
    recovery_rate: f64,
    time_step: f64,
    num_steps: usize,
    intervention: Option<Intervention>,
}

impl SimulationConfig {
    /// Build and validate a config.
    ///
    /// # Errors
    /// [`InvalidConfigError`] for a non-positive population, negative or
    /// non-finite rates or initial values, `initial_infected +
    /// initial_recovered > population_size`, a non-positive `time_step`, or
    /// `num_steps` outside `1..=MAX_STEPS`.
    pub fn new(
        population_size: f64,
        initial_infected: f64,
        initial_recovered: f64,
        transmission_rate: f64,
        recovery_rate: f64,
        time_step: f64,
        num_steps: usize,
    ) -> Result<Self, InvalidConfigError> {
        let config = Self {
            population_size,
            initial_infected,
            initial_recovered,
            transmission_rate,
            recovery_rate,
            time_step,
            num_steps,
            intervention: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a config from a total horizon, with `time_step = total_time / num_steps`.
    pub fn from_horizon(
        population_size: f64,
        initial_infected: f64,
        initial_recovered: f64,
        transmission_rate: f64,
        recovery_rate: f64,
        total_time: f64,
        num_steps: usize,
    ) -> Result<Self, InvalidConfigError> {
        if !(total_time.is_finite() && total_time > 0.0) {
            return Err(InvalidConfigError::NonPositiveHorizon(total_time));
        }
        if num_steps == 0 {
            return Err(InvalidConfigError::NoSteps);
        }

        Self::new(
            population_size,
            initial_infected,
            initial_recovered,
            transmission_rate,
            recovery_rate,
            total_time / num_steps as f64,
            num_steps,
        )
    }

    /// Return a copy of this config with a transmission-rate intervention.
    pub fn with_intervention(self, intervention: Intervention) -> Result<Self, InvalidConfigError> {
        intervention.validate()?;
        Ok(Self {
            intervention: Some(intervention),
            ..self
        })
    }

    fn validate(&self) -> Result<(), InvalidConfigError> {
        if !(self.population_size.is_finite() && self.population_size > 0.0) {
            return Err(InvalidConfigError::NonPositivePopulation(self.population_size));
        }
        check_non_negative("initial_infected", self.initial_infected)?;
        check_non_negative("initial_recovered", self.initial_recovered)?;
        if self.initial_infected + self.initial_recovered > self.population_size {
            return Err(InvalidConfigError::InitialExceedsPopulation {
                infected: self.initial_infected,
                recovered: self.initial_recovered,
                population: self.population_size,
            });
        }

        check_non_negative("transmission_rate", self.transmission_rate)?;
        check_non_negative("recovery_rate", self.recovery_rate)?;

        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(InvalidConfigError::NonPositiveTimeStep(self.time_step));
        }
        if self.num_steps == 0 {
            return Err(InvalidConfigError::NoSteps);
        }
        if self.num_steps > MAX_STEPS {
            return Err(InvalidConfigError::TooManySteps {
                requested: self.num_steps,
                max: MAX_STEPS,
            });
        }

        if let Some(intervention) = &self.intervention {
            intervention.validate()?;
        }
        Ok(())
    }

    pub fn population_size(&self) -> f64 {
        self.population_size
    }

    pub fn initial_infected(&self) -> f64 {
        self.initial_infected
    }

    pub fn initial_recovered(&self) -> f64 {
        self.initial_recovered
    }

    /// `N - I0 - R0`, floored at zero against rounding.
    pub fn initial_susceptible(&self) -> f64 {
        (self.population_size - self.initial_infected - self.initial_recovered).max(0.0)
    }

    pub fn transmission_rate(&self) -> f64 {
        self.transmission_rate
    }

    pub fn recovery_rate(&self) -> f64 {
        self.recovery_rate
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn intervention(&self) -> Option<&Intervention> {
        self.intervention.as_ref()
    }

    /// Simulated horizon, `num_steps * time_step`.
    pub fn total_time(&self) -> f64 {
        self.num_steps as f64 * self.time_step
    }

    /// Transmission rate in effect for a step starting at `t`.
    pub fn transmission_rate_at(&self, t: f64) -> f64 {
        match &self.intervention {
            Some(intervention) if t >= intervention.start_time => intervention.transmission_rate,
            _ => self.transmission_rate,
        }
    }

    /// Basic reproduction number `beta / gamma`, from the initial transmission rate.
    ///
    /// `None` when the recovery rate is zero.
    pub fn basic_reproduction_number(&self) -> Option<f64> {
        if self.recovery_rate > 0.0 {
            Some(self.transmission_rate / self.recovery_rate)
        } else {
            None
        }
    }
}

impl TryFrom<SimulationParams> for SimulationConfig {
    type Error = InvalidConfigError;

    fn try_from(params: SimulationParams) -> Result<Self, Self::Error> {
        let config = Self::new(
            params.population_size,
            params.initial_infected,
            params.initial_recovered,
            params.transmission_rate,
            params.recovery_rate,
            params.time_step,
            params.num_steps,
        )?;
        match params.intervention {
            Some(intervention) => config.with_intervention(intervention),
            None => Ok(config),
        }
    }
}

impl From<SimulationConfig> for SimulationParams {
    fn from(config: SimulationConfig) -> Self {
        Self {
            population_size: config.population_size,
            initial_infected: config.initial_infected,
            initial_recovered: config.initial_recovered,
            transmission_rate: config.transmission_rate,
            recovery_rate: config.recovery_rate,
            time_step: config.time_step,
            num_steps: config.num_steps,
            intervention: config.intervention,
        }
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), InvalidConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InvalidConfigError::NegativeOrNonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SimulationConfig {
        SimulationConfig::new(1000.0, 1.0, 0.0, 0.3, 0.1, 1.0, 10).unwrap()
    }

    #[test]
    fn test_valid_config_accessors() {
        let cfg = base();
        assert_eq!(cfg.population_size(), 1000.0);
        assert_eq!(cfg.initial_susceptible(), 999.0);
        assert_eq!(cfg.total_time(), 10.0);
        assert!(cfg.intervention().is_none());
    }

    #[test]
    fn test_initial_exceeds_population_rejected() {
        let err = SimulationConfig::new(4.0, 5.0, 0.0, 0.3, 0.1, 1.0, 10).unwrap_err();
        assert!(matches!(err, InvalidConfigError::InitialExceedsPopulation { .. }));

        let err = SimulationConfig::new(10.0, 6.0, 5.0, 0.3, 0.1, 1.0, 10).unwrap_err();
        assert!(matches!(err, InvalidConfigError::InitialExceedsPopulation { .. }));
    }

    #[test]
    fn test_initial_filling_population_is_accepted() {
        let cfg = SimulationConfig::new(10.0, 4.0, 6.0, 0.3, 0.1, 1.0, 10).unwrap();
        assert_eq!(cfg.initial_susceptible(), 0.0);
    }

    #[test]
    fn test_bad_rates_rejected() {
        for (beta, gamma) in [(-0.1, 0.1), (0.1, -0.1), (f64::NAN, 0.1), (0.1, f64::INFINITY)] {
            let err = SimulationConfig::new(100.0, 1.0, 0.0, beta, gamma, 1.0, 10).unwrap_err();
            assert!(matches!(err, InvalidConfigError::NegativeOrNonFinite { .. }));
        }
    }

    #[test]
    fn test_bad_population_and_initials_rejected() {
        assert_eq!(
            SimulationConfig::new(0.0, 0.0, 0.0, 0.3, 0.1, 1.0, 10).unwrap_err(),
            InvalidConfigError::NonPositivePopulation(0.0)
        );
        assert!(SimulationConfig::new(-5.0, 0.0, 0.0, 0.3, 0.1, 1.0, 10).is_err());
        assert!(SimulationConfig::new(100.0, -1.0, 0.0, 0.3, 0.1, 1.0, 10).is_err());
        assert!(SimulationConfig::new(100.0, 1.0, -1.0, 0.3, 0.1, 1.0, 10).is_err());
    }

    #[test]
    fn test_bad_steps_rejected() {
        assert_eq!(
            SimulationConfig::new(100.0, 1.0, 0.0, 0.3, 0.1, 0.0, 10).unwrap_err(),
            InvalidConfigError::NonPositiveTimeStep(0.0)
        );
        assert!(SimulationConfig::new(100.0, 1.0, 0.0, 0.3, 0.1, -1.0, 10).is_err());
        assert_eq!(
            SimulationConfig::new(100.0, 1.0, 0.0, 0.3, 0.1, 1.0, 0).unwrap_err(),
            InvalidConfigError::NoSteps
        );
        assert!(matches!(
            SimulationConfig::new(100.0, 1.0, 0.0, 0.3, 0.1, 1.0, MAX_STEPS + 1).unwrap_err(),
            InvalidConfigError::TooManySteps { .. }
        ));
    }

    #[test]
    fn test_from_horizon_derives_time_step() {
        let cfg = SimulationConfig::from_horizon(100.0, 1.0, 0.0, 0.3, 0.1, 50.0, 200).unwrap();
        assert_eq!(cfg.time_step(), 0.25);
        assert_eq!(cfg.num_steps(), 200);

        assert_eq!(
            SimulationConfig::from_horizon(100.0, 1.0, 0.0, 0.3, 0.1, 0.0, 200).unwrap_err(),
            InvalidConfigError::NonPositiveHorizon(0.0)
        );
    }

    #[test]
    fn test_intervention_switches_rate() {
        let cfg = base().with_intervention(Intervention::new(5.0, 0.05)).unwrap();
        assert_eq!(cfg.transmission_rate_at(4.0), 0.3);
        assert_eq!(cfg.transmission_rate_at(5.0), 0.05);
        assert_eq!(cfg.transmission_rate_at(9.0), 0.05);
        assert!(base().with_intervention(Intervention::new(5.0, -1.0)).is_err());
    }

    #[test]
    fn test_basic_reproduction_number() {
        assert!((base().basic_reproduction_number().unwrap() - 3.0).abs() < 1e-12);
        let no_recovery = SimulationConfig::new(100.0, 1.0, 0.0, 0.3, 0.0, 1.0, 10).unwrap();
        assert_eq!(no_recovery.basic_reproduction_number(), None);
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let cfg = base().with_intervention(Intervention::new(3.0, 0.1)).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);

        let invalid = r#"{"population_size":4.0,"initial_infected":5.0,"initial_recovered":0.0,
            "transmission_rate":0.3,"recovery_rate":0.1,"time_step":1.0,"num_steps":1}"#;
        assert!(serde_json::from_str::<SimulationConfig>(invalid).is_err());
    }
}
