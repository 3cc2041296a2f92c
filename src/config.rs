//! Run configuration for the evolutionary loop.

use crate::error::{Error, Result};
use crate::gp::memory::{Memory, WritePolicy};
use crate::gp::op::Operator;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Probability that the generator places a terminal before reaching its depth budget.
pub const TERMINAL_PROBABILITY: f64 = 0.3;

/// Probability of attempting one crossover per generation when crossover is enabled.
pub const CROSSOVER_PROBABILITY: f64 = 0.5;

/// Scores closer than this are considered tied under `Ranking::Parsimony`.
pub const PARSIMONY_TOLERANCE: f64 = 0.01;

/// How the population is ordered before truncation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Order strictly by score.
    Score,
    /// Order by score, preferring the smaller tree when scores are within
    /// `PARSIMONY_TOLERANCE` of each other.
    Parsimony,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub initial_max_depth: usize,
    pub max_depth: usize,
    pub episodes_per_evaluation: usize,
    pub generation_count: u32,
    /// Enables the `read`/`write` operators and withholds velocity from the trees.
    pub partially_observable: bool,
    pub use_crossover: bool,
    pub memory_window_size: usize,
    pub memory_write: WritePolicy,
    pub ranking: Ranking,
    /// Forwarded to `Environment::update` on every step.
    pub animate: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            initial_max_depth: 1,
            max_depth: 10,
            episodes_per_evaluation: 20,
            generation_count: 100,
            partially_observable: true,
            use_crossover: true,
            memory_window_size: 4,
            memory_write: WritePolicy::Fill,
            ranking: Ranking::Score,
            animate: false,
        }
    }
}

impl EvolutionConfig {
    /// Parse and validate a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EvolutionConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(Error::Configuration(
                "population_size must be at least 2".to_string(),
            ));
        }
        if self.episodes_per_evaluation == 0 {
            return Err(Error::Configuration(
                "episodes_per_evaluation must be at least 1".to_string(),
            ));
        }
        if self.memory_window_size == 0 {
            return Err(Error::Configuration(
                "memory_window_size must be at least 1".to_string(),
            ));
        }
        if self.initial_max_depth > self.max_depth {
            return Err(Error::Configuration(format!(
                "initial_max_depth ({}) exceeds max_depth ({})",
                self.initial_max_depth, self.max_depth
            )));
        }
        Ok(())
    }

    /// The operators the generator may place.
    pub fn operators(&self) -> &'static [Operator] {
        Operator::enabled(self.partially_observable)
    }

    /// A fresh, zeroed memory register sized and configured for this run.
    pub fn memory(&self) -> Memory {
        Memory::new(self.memory_window_size, self.memory_write)
    }
}
