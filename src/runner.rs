//! Episode orchestration: reset, drive the step loop, hand the finished
//! trajectory to the agent, and keep the per-batch bookkeeping.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::agent::Agent;
use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::game::{GridWorld, TerminationReason};
use crate::stats::{TrainingStats, format_reasons};

/// Receives the board after every move. Nothing it does feeds back into the
/// simulation.
pub trait Render {
    fn render(&mut self, world: &GridWorld);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeReport {
    pub score: i32,
    pub reason: TerminationReason,
    pub moves: u32,
}

/// Greedy play results, tallied apart from the training statistics.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub episodes: Vec<EpisodeReport>,
    pub stats: TrainingStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub batch: usize,
    pub epsilon: f64,
    pub reasons: Vec<(TerminationReason, usize)>,
    pub mean_score: f64,
}

pub struct EpisodeRunner {
    world: GridWorld,
    agent: Agent,
    config: TrainingConfig,
    stats: TrainingStats,
    save_path: Option<PathBuf>,
    renderer: Option<Box<dyn Render>>,
    learn: bool,
}

impl EpisodeRunner {
    pub fn new(world: GridWorld, agent: Agent, config: TrainingConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        let stats = TrainingStats::new(config.average_window);
        Ok(Self {
            world,
            agent,
            config,
            stats,
            save_path: None,
            renderer: None,
            learn: true,
        })
    }

    /// Save the q-table here at the end of every batch.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Render>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Play one episode to termination. When learning is on, the agent's
    /// batch update runs once on the finished trajectory.
    pub fn run_episode(&mut self) -> Result<EpisodeReport> {
        self.world.reset()?;
        self.agent.reset();

        loop {
            let dir = self.agent.act(
                &self.world.body,
                self.world.good_food,
                self.world.bad_food,
                &self.world.walls,
            );
            let outcome = self.world.step(dir)?;
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.render(&self.world);
            }

            if let Some(reason) = outcome.reason {
                if self.learn {
                    self.agent.update_from_episode(Some(reason));
                }
                let report = EpisodeReport {
                    score: outcome.score,
                    reason,
                    moves: self.world.move_count,
                };
                self.stats.record_episode(report.score, report.moves, reason);
                debug!(
                    episode = self.stats.total_episodes(),
                    score = report.score,
                    moves = report.moves,
                    reason = %reason,
                    "episode finished"
                );
                return Ok(report);
            }
        }
    }

    /// Run `batch_size` episodes at the scheduled epsilon, then save.
    pub fn run_batch(&mut self, batch: usize) -> Result<BatchReport> {
        let epsilon = self.config.epsilon.epsilon_for(batch);
        self.agent.set_epsilon(epsilon);

        for _ in 0..self.config.batch_size {
            self.run_episode()?;
        }

        if let Some(path) = &self.save_path {
            self.agent.qtable().save_path(path)?;
        }

        let reasons = self.stats.end_batch();
        let report = BatchReport {
            batch,
            epsilon,
            reasons,
            mean_score: self.stats.mean_recent_score(),
        };
        info!(
            batch,
            epsilon,
            reasons = %format_reasons(&report.reasons),
            "{}",
            self.stats.format_summary()
        );
        Ok(report)
    }

    pub fn train(&mut self) -> Result<Vec<BatchReport>> {
        (0..self.config.total_batches)
            .map(|batch| self.run_batch(batch))
            .collect()
    }

    /// Greedy play without learning or saving. Training statistics are left
    /// as they were.
    pub fn evaluate(&mut self, episodes: usize) -> Result<Evaluation> {
        let (epsilon, learn) = (self.agent.epsilon(), self.learn);
        let training = std::mem::replace(
            &mut self.stats,
            TrainingStats::new(self.config.average_window),
        );
        self.agent.set_epsilon(0.0);
        self.learn = false;

        let reports: Result<Vec<_>> = (0..episodes).map(|_| self.run_episode()).collect();

        self.agent.set_epsilon(epsilon);
        self.learn = learn;
        let stats = std::mem::replace(&mut self.stats, training);
        Ok(Evaluation {
            episodes: reports?,
            stats,
        })
    }
}
