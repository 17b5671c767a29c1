//! Snake on a block grid with good food, bad food and growing walls, played
//! by a tabular Q-learning agent.

pub mod agent;
pub mod config;
pub mod draw;
pub mod error;
pub mod game;
pub mod pos;
pub mod qtable;
pub mod runner;
pub mod state;
pub mod stats;

pub use agent::{Agent, Transition, transition_reward};
pub use config::{AgentConfig, Config, EpsilonSchedule, GameConfig, Rewards, TrainingConfig};
pub use draw::AsciiRenderer;
pub use error::{Error, Result};
pub use game::{Dir, GridWorld, StepOutcome, TerminationReason};
pub use pos::Position;
pub use qtable::QTable;
pub use runner::{BatchReport, EpisodeReport, EpisodeRunner, Evaluation, Render};
pub use state::{Observation, Signature, StateEncoder};
pub use stats::{TrainingStats, format_reasons};
