//! Tabular Q-learning agent.
//!
//! The agent only records `(observation, action)` pairs while an episode
//! runs. All learning happens once the episode is over, in a single pass
//! over the trajectory from the newest step to the oldest.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{AgentConfig, GameConfig, Rewards};
use crate::game::{Dir, TerminationReason};
use crate::pos::Position;
use crate::qtable::QTable;
use crate::state::{Observation, StateEncoder};

/// One recorded step of the current episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub observation: Observation,
    pub action: usize,
}

pub struct Agent {
    epsilon: f64,
    config: AgentConfig,
    encoder: StateEncoder,
    qtable: QTable,
    history: Vec<Transition>,
    rng: SmallRng,
}

impl Agent {
    pub fn new(game: &GameConfig, config: AgentConfig, qtable: QTable) -> Self {
        Self::with_rng(game, config, qtable, SmallRng::from_entropy())
    }

    pub fn with_seed(game: &GameConfig, config: AgentConfig, qtable: QTable, seed: u64) -> Self {
        Self::with_rng(game, config, qtable, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(game: &GameConfig, config: AgentConfig, qtable: QTable, rng: SmallRng) -> Self {
        Self {
            epsilon: 0.0,
            config,
            encoder: StateEncoder::from_config(game),
            qtable,
            history: Vec::new(),
            rng,
        }
    }

    /// Forget the current trajectory.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn qtable(&self) -> &QTable {
        &self.qtable
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Pick a move with probability `epsilon` at random, otherwise greedily,
    /// and record it. `snake` is tail first and must hold at least the head.
    pub fn act(
        &mut self,
        snake: &[Position],
        food: Position,
        bad_food: Position,
        walls: &[Position],
    ) -> Dir {
        debug_assert!(!snake.is_empty(), "snake must have a head");
        let observation = self.encoder.encode(snake, food, bad_food, walls);
        let action = if self.rng.r#gen::<f64>() < self.epsilon {
            self.rng.gen_range(0..Dir::ALL.len())
        } else {
            self.qtable.best_action(&observation.signature)
        };
        self.history.push(Transition {
            observation,
            action,
        });
        Dir::ALL[action]
    }

    /// Apply the Bellman backup over the recorded trajectory, newest first.
    ///
    /// With a terminal `reason` the newest step gets the death reward and no
    /// future term. Every consecutive pair then gets a one-step backup with
    /// the reward picked by [`transition_reward`].
    pub fn update_from_episode(&mut self, reason: Option<TerminationReason>) {
        let Some(last) = self.history.last().copied() else {
            return;
        };
        let lr = self.config.learning_rate;

        if reason.is_some() {
            let sig = &last.observation.signature;
            let q = self.qtable.get(sig)[last.action];
            let value = (1.0 - lr) * q + lr * self.config.rewards.death;
            self.qtable.update(sig, last.action, value);
        }

        for i in (0..self.history.len() - 1).rev() {
            let prev = self.history[i];
            let next = &self.history[i + 1].observation;
            let reward = transition_reward(&self.config.rewards, &prev.observation, next);

            let sig = &prev.observation.signature;
            let q = self.qtable.get(sig)[prev.action];
            let future = self.qtable.max_value(&next.signature);
            let value = (1.0 - lr) * q + lr * (reward + self.config.discount * future);
            self.qtable.update(sig, prev.action, value);
        }

        debug!(
            steps = self.history.len(),
            reason = ?reason,
            states = self.qtable.len(),
            "applied episode update"
        );
    }
}

/// Reward for moving from `prev` to `next`. Food events take precedence over
/// distance shaping.
pub fn transition_reward(rewards: &Rewards, prev: &Observation, next: &Observation) -> f64 {
    let (x_prev, y_prev) = prev.distance;
    let (x_next, y_next) = next.distance;
    if prev.food != next.food {
        rewards.good_food
    } else if prev.bad_food != next.bad_food {
        rewards.bad_food
    } else if x_prev.abs() > x_next.abs() || y_prev.abs() > y_next.abs() {
        rewards.closer
    } else {
        rewards.farther
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Signature;

    const LR: f64 = 0.75;
    const DISCOUNT: f64 = 0.5;

    fn agent() -> Agent {
        Agent::with_seed(&GameConfig::default(), AgentConfig::default(), QTable::new(), 5)
    }

    fn observe(agent: &Agent, head: Position, food: Position, bad: Position) -> Observation {
        agent.encoder.encode(&[head], food, bad, &[])
    }

    fn sig_of(agent: &Agent, head: Position, food: Position, bad: Position) -> Signature {
        observe(agent, head, food, bad).signature
    }

    #[test]
    fn test_greedy_act_records_history() {
        let mut a = agent();
        let food = Position::new(300, 200);
        let bad = Position::new(0, 0);
        let head = Position::new(200, 200);
        let sig = sig_of(&a, head, food, bad);
        a.qtable.update(&sig, 1, 5.0);

        let dir = a.act(&[head], food, bad, &[]);
        assert_eq!(dir, Dir::Right);
        assert_eq!(a.history().len(), 1);
        assert_eq!(a.history()[0].action, 1);
        assert_eq!(a.history()[0].observation.signature, sig);
    }

    #[test]
    fn test_unseen_state_picks_first_action() {
        let mut a = agent();
        let dir = a.act(&[Position::new(200, 200)], Position::new(0, 0), Position::new(380, 0), &[]);
        assert_eq!(dir, Dir::Left);
        assert!(a.qtable().is_empty());
    }

    #[test]
    fn test_full_exploration_covers_all_actions() {
        let mut a = agent();
        a.set_epsilon(1.0);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let dir = a.act(&[Position::new(200, 200)], Position::new(0, 0), Position::new(380, 0), &[]);
            seen[dir.index()] = true;
        }
        assert_eq!(seen, [true; 4]);
        assert_eq!(a.history().len(), 200);
    }

    #[test]
    #[should_panic]
    fn test_act_without_a_head_panics() {
        let mut a = agent();
        a.act(&[], Position::new(0, 0), Position::new(380, 0), &[]);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut a = agent();
        a.act(&[Position::new(200, 200)], Position::new(0, 0), Position::new(380, 0), &[]);
        a.reset();
        assert!(a.history().is_empty());
    }

    #[test]
    fn test_empty_trajectory_is_noop() {
        let mut a = agent();
        a.update_from_episode(Some(TerminationReason::OffScreen));
        assert!(a.qtable().is_empty());
    }

    #[test]
    fn test_single_step_terminal() {
        let mut a = agent();
        let head = Position::new(0, 200);
        a.act(&[head], Position::new(200, 200), Position::new(380, 0), &[]);
        a.update_from_episode(Some(TerminationReason::OffScreen));

        let sig = a.history()[0].observation.signature;
        let action = a.history()[0].action;
        assert_eq!(a.qtable().get(&sig)[action], LR * -100.0);
        assert_eq!(a.qtable().len(), 1);
    }

    #[test]
    fn test_single_step_without_reason_is_noop() {
        let mut a = agent();
        a.act(&[Position::new(200, 200)], Position::new(0, 0), Position::new(380, 0), &[]);
        a.update_from_episode(None);
        assert!(a.qtable().is_empty());
    }

    #[test]
    fn test_reward_precedence() {
        let a = agent();
        let rewards = Rewards::default();
        let bad = Position::new(380, 0);
        let food = Position::new(300, 200);

        let prev = observe(&a, Position::new(200, 200), food, bad);
        let closer = observe(&a, Position::new(220, 200), food, bad);
        let farther = observe(&a, Position::new(180, 200), food, bad);
        let sideways = observe(&a, Position::new(200, 220), food, bad);
        assert_eq!(transition_reward(&rewards, &prev, &closer), 15.0);
        assert_eq!(transition_reward(&rewards, &prev, &farther), -15.0);
        assert_eq!(transition_reward(&rewards, &prev, &sideways), -15.0);

        // Food moved: good-food reward beats the distance improvement.
        let ate = observe(&a, Position::new(220, 200), Position::new(0, 0), Position::new(40, 40));
        assert_eq!(transition_reward(&rewards, &prev, &ate), 50.0);

        let ate_bad = observe(&a, Position::new(220, 200), food, Position::new(40, 40));
        assert_eq!(transition_reward(&rewards, &prev, &ate_bad), -25.0);
    }

    #[test]
    fn test_backward_pass_uses_updated_future_values() {
        let mut a = agent();
        let food = Position::new(300, 200);
        let bad = Position::new(380, 0);
        let walls = [Position::new(240, 220)];
        let heads = [
            Position::new(200, 200),
            Position::new(220, 200),
            Position::new(240, 200),
        ];
        let sigs: Vec<_> = heads
            .iter()
            .map(|h| a.encoder.encode(&[*h], food, bad, &walls).signature)
            .collect();
        assert_eq!(sigs[0], sigs[1]);
        assert_ne!(sigs[1], sigs[2]);
        a.qtable.update(&sigs[2], 1, 40.0);
        a.qtable.update(&sigs[2], 3, 20.0);

        for head in heads {
            a.act(&[head], food, bad, &walls);
        }
        let actions: Vec<_> = a.history().iter().map(|t| t.action).collect();
        assert_eq!(actions, [0, 0, 1]);

        a.update_from_episode(Some(TerminationReason::WallCollision));

        // Terminal step: 0.25 * 40 + 0.75 * -100.
        assert_eq!(a.qtable().get(&sigs[2]), [0.0, -65.0, 0.0, 20.0]);
        // (1 -> 2) moved closer and sees max 20 left after the terminal update:
        // 0.75 * (15 + 0.5 * 20) = 18.75. Then (0 -> 1) shares the signature
        // and sees that fresh 18.75 both as its own value and as the future.
        let expected = (1.0 - LR) * 18.75 + LR * (15.0 + DISCOUNT * 18.75);
        assert_eq!(a.qtable().get(&sigs[0])[0], expected);
    }

    #[test]
    fn test_non_terminal_update_skips_death_reward() {
        let mut a = agent();
        let food = Position::new(300, 200);
        let bad = Position::new(380, 0);
        a.act(&[Position::new(200, 200)], food, bad, &[]);
        a.act(&[Position::new(180, 200)], food, bad, &[]);
        a.update_from_episode(None);

        let s0 = a.history()[0].observation.signature;
        assert_eq!(a.qtable().get(&s0)[0], LR * -15.0);
    }
}
