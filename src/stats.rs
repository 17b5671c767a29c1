//! Training statistics: score history, per-batch termination reasons, and
//! the moving-average score series.

use std::collections::VecDeque;

use crate::game::TerminationReason;

#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Every episode's final score, oldest first.
    scores: Vec<i32>,
    /// Scores inside the rolling window.
    recent: VecDeque<i32>,
    /// Reasons seen since the last [`TrainingStats::end_batch`].
    batch_reasons: [usize; TerminationReason::ALL.len()],
    total_episodes: usize,
    total_moves: u64,
    high_score: i32,
    window_size: usize,
}

impl TrainingStats {
    pub fn new(window_size: usize) -> Self {
        Self {
            scores: Vec::new(),
            recent: VecDeque::with_capacity(window_size),
            batch_reasons: [0; TerminationReason::ALL.len()],
            total_episodes: 0,
            total_moves: 0,
            high_score: 0,
            window_size,
        }
    }

    pub fn record_episode(&mut self, score: i32, moves: u32, reason: TerminationReason) {
        self.scores.push(score);
        if self.recent.len() >= self.window_size {
            self.recent.pop_front();
        }
        self.recent.push_back(score);
        self.batch_reasons[reason_slot(reason)] += 1;
        self.total_episodes += 1;
        self.total_moves += u64::from(moves);
        self.high_score = self.high_score.max(score);
    }

    /// Reason counts for the current batch, in [`TerminationReason::ALL`] order.
    pub fn reason_counts(&self) -> Vec<(TerminationReason, usize)> {
        TerminationReason::ALL
            .iter()
            .map(|r| (*r, self.batch_reasons[reason_slot(*r)]))
            .collect()
    }

    /// Return the current batch's reason counts and start a new batch.
    pub fn end_batch(&mut self) -> Vec<(TerminationReason, usize)> {
        let counts = self.reason_counts();
        self.batch_reasons = [0; TerminationReason::ALL.len()];
        counts
    }

    pub fn scores(&self) -> &[i32] {
        &self.scores
    }

    /// Mean score of each run of `window` consecutive episodes, one value per
    /// start index in `0..len - window`.
    pub fn moving_average(&self, window: usize) -> Vec<f64> {
        if window == 0 || self.scores.len() <= window {
            return Vec::new();
        }
        (0..self.scores.len() - window)
            .map(|start| {
                let sum: i64 = self.scores[start..start + window]
                    .iter()
                    .map(|&s| i64::from(s))
                    .sum();
                sum as f64 / window as f64
            })
            .collect()
    }

    pub fn mean_recent_score(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().map(|&s| f64::from(s)).sum::<f64>() / self.recent.len() as f64
        }
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_moves(&self) -> u64 {
        self.total_moves
    }

    pub fn high_score(&self) -> i32 {
        self.high_score
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Moves: {} | Score({}): {:.2} | Best: {}",
            self.total_episodes,
            self.total_moves,
            self.window_size,
            self.mean_recent_score(),
            self.high_score,
        )
    }
}

fn reason_slot(reason: TerminationReason) -> usize {
    match reason {
        TerminationReason::Loop => 0,
        TerminationReason::OffScreen => 1,
        TerminationReason::BadFood => 2,
        TerminationReason::SelfCollision => 3,
        TerminationReason::WallCollision => 4,
    }
}

/// Render reason counts as `Loop: 3, Off-Screen: 1, ...`.
pub fn format_reasons(counts: &[(TerminationReason, usize)]) -> String {
    counts
        .iter()
        .map(|(reason, n)| format!("{reason}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}
