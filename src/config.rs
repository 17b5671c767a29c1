//! Configuration for the board, the learner and the training schedule.
//!
//! Every struct deserializes with defaults for missing fields, so a config
//! file only needs to name what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Board geometry and episode limits, in pixel units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    /// Size of one cell; every position is a multiple of it.
    pub block_size: i32,
    /// Episodes end with `Loop` once the move counter exceeds this.
    pub max_moves: u32,
    /// Rejection-sampling budget for placing a food or wall.
    pub placement_attempts: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            block_size: 20,
            max_moves: 1000,
            placement_attempts: 10_000,
        }
    }
}

impl GameConfig {
    pub fn new(width: i32, height: i32, block_size: i32) -> Self {
        Self {
            width,
            height,
            block_size,
            ..Default::default()
        }
    }

    pub fn columns(&self) -> i32 {
        self.width / self.block_size
    }

    pub fn rows(&self) -> i32 {
        self.height / self.block_size
    }

    pub fn cell_count(&self) -> usize {
        (self.columns() * self.rows()) as usize
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.block_size <= 0 {
            return Err(format!(
                "block_size must be positive, got {}",
                self.block_size
            ));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(format!(
                "board must be non-empty, got {}x{}",
                self.width, self.height
            ));
        }
        if self.width % self.block_size != 0 || self.height % self.block_size != 0 {
            return Err(format!(
                "board {}x{} is not a multiple of block_size {}",
                self.width, self.height, self.block_size
            ));
        }
        if self.placement_attempts == 0 {
            return Err("placement_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Reward for each kind of transition credited by the backward update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    pub death: f64,
    pub good_food: f64,
    pub bad_food: f64,
    pub closer: f64,
    pub farther: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            death: -100.0,
            good_food: 50.0,
            bad_food: -25.0,
            closer: 15.0,
            farther: -15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub learning_rate: f64,
    pub discount: f64,
    pub rewards: Rewards,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.75,
            discount: 0.5,
            rewards: Rewards::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(format!(
                "learning_rate must be in [0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(format!(
                "discount must be in [0, 1], got {}",
                self.discount
            ));
        }
        Ok(())
    }
}

/// Exploration rate per batch: `initial` for the first `explore_batches`
/// batches, `final_epsilon` afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpsilonSchedule {
    pub initial: f64,
    pub explore_batches: usize,
    pub final_epsilon: f64,
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self {
            initial: 0.1,
            explore_batches: 2,
            final_epsilon: 0.0,
        }
    }
}

impl EpsilonSchedule {
    pub fn epsilon_for(&self, batch: usize) -> f64 {
        if batch < self.explore_batches {
            self.initial
        } else {
            self.final_epsilon
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Episodes per batch; the table is saved at the end of every batch.
    pub batch_size: usize,
    pub total_batches: usize,
    pub epsilon: EpsilonSchedule,
    /// Window for the moving-average score series.
    pub average_window: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            total_batches: 15,
            epsilon: EpsilonSchedule::default(),
            average_window: 50,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.total_batches == 0 {
            return Err("total_batches must be at least 1".to_string());
        }
        if self.average_window == 0 {
            return Err("average_window must be at least 1".to_string());
        }
        for (name, value) in [
            ("epsilon.initial", self.epsilon.initial),
            ("epsilon.final_epsilon", self.epsilon.final_epsilon),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
}

impl Config {
    /// Read a JSON config file. Missing sections keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|source| Error::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.game
            .validate()
            .and_then(|_| self.agent.validate())
            .and_then(|_| self.training.validate())
            .map_err(Error::InvalidConfig)
    }
}
