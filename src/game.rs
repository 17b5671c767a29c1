use std::fmt;

use ahash::AHashSet;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::pos::Position;

/// Compass moves, in action-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Left,
    Right,
    Up,
    Down,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Left, Dir::Right, Dir::Up, Dir::Down];

    pub fn index(self) -> usize {
        match self {
            Dir::Left => 0,
            Dir::Right => 1,
            Dir::Up => 2,
            Dir::Down => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Dir> {
        Dir::ALL.get(index).copied()
    }

    pub fn symbol(self) -> char {
        match self {
            Dir::Left => 'L',
            Dir::Right => 'R',
            Dir::Up => 'U',
            Dir::Down => 'D',
        }
    }

    pub fn delta(self, block: i32) -> (i32, i32) {
        match self {
            Dir::Left => (-block, 0),
            Dir::Right => (block, 0),
            Dir::Up => (0, -block),
            Dir::Down => (0, block),
        }
    }
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    Loop,
    OffScreen,
    BadFood,
    SelfCollision,
    WallCollision,
}

impl TerminationReason {
    pub const ALL: [TerminationReason; 5] = [
        TerminationReason::Loop,
        TerminationReason::OffScreen,
        TerminationReason::BadFood,
        TerminationReason::SelfCollision,
        TerminationReason::WallCollision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::Loop => "Loop",
            TerminationReason::OffScreen => "Off-Screen",
            TerminationReason::BadFood => "Bad Food",
            TerminationReason::SelfCollision => "Self-Collision",
            TerminationReason::WallCollision => "Wall-Collision",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single [`GridWorld::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub terminated: bool,
    pub reason: Option<TerminationReason>,
    pub score: i32,
}

/// The snake board: body, both foods, the walls that grow with every good
/// food, and the episode counters.
#[derive(Debug)]
pub struct GridWorld {
    pub config: GameConfig,
    /// Tail first, head last.
    pub body: Vec<Position>,
    pub good_food: Position,
    pub bad_food: Position,
    pub walls: Vec<Position>,
    pub score: i32,
    pub move_count: u32,
    /// Length the body is trimmed back to after each move.
    pub target_len: usize,
    rng: SmallRng,
}

impl GridWorld {
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: SmallRng) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        let start = Self::start_position(&config);
        let mut world = Self {
            config,
            body: vec![start],
            good_food: start,
            bad_food: start,
            walls: Vec::new(),
            score: 0,
            move_count: 0,
            target_len: 1,
            rng,
        };
        world.reset()?;
        Ok(world)
    }

    /// Block-aligned centre of the board.
    pub fn start_position(config: &GameConfig) -> Position {
        Position::new(
            config.columns() / 2 * config.block_size,
            config.rows() / 2 * config.block_size,
        )
    }

    /// Start a fresh episode: a one-cell snake in the centre, no walls, and
    /// both foods placed off the snake.
    pub fn reset(&mut self) -> Result<()> {
        self.body = vec![Self::start_position(&self.config)];
        self.target_len = 1;
        self.walls.clear();
        self.score = 0;
        self.move_count = 0;
        self.good_food = random_free_cell(&mut self.rng, &self.config, &[&self.body])?;
        self.bad_food = random_free_cell(
            &mut self.rng,
            &self.config,
            &[&self.body, &[self.good_food]],
        )?;
        Ok(())
    }

    pub fn head(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.config.width && pos.y >= 0 && pos.y < self.config.height
    }

    /// Advance one move. Every check runs in order against the new head; when
    /// several end the episode, the last one names the reason.
    pub fn step(&mut self, dir: Dir) -> Result<StepOutcome> {
        let (dx, dy) = dir.delta(self.config.block_size);
        let head = self.head().moved_by(dx, dy);
        self.body.push(head);
        let mut reason = None;

        self.move_count += 1;
        if self.move_count > self.config.max_moves {
            reason = Some(TerminationReason::Loop);
        }

        if !self.in_bounds(head) {
            reason = Some(TerminationReason::OffScreen);
        }

        if head == self.bad_food {
            self.bad_food = random_free_cell(
                &mut self.rng,
                &self.config,
                &[&self.body, &self.walls, &[self.good_food]],
            )?;
            self.score -= 2;
        }
        if self.score < 0 {
            reason = Some(TerminationReason::BadFood);
        }

        if self.body[..self.body.len() - 1].contains(&head) {
            reason = Some(TerminationReason::SelfCollision);
        }

        if self.walls.contains(&head) {
            reason = Some(TerminationReason::WallCollision);
        }

        if head == self.good_food {
            let wall = random_free_cell(&mut self.rng, &self.config, &[&self.body, &self.walls])?;
            self.walls.push(wall);
            self.good_food =
                random_free_cell(&mut self.rng, &self.config, &[&self.body, &self.walls])?;
            self.bad_food = random_free_cell(
                &mut self.rng,
                &self.config,
                &[&self.body, &self.walls, &[self.good_food]],
            )?;
            self.target_len += 1;
            self.score += 1;
        }

        if self.body.len() > self.target_len {
            self.body.remove(0);
        }

        trace!(dir = %dir.symbol(), ?head, score = self.score, ?reason, "step");
        Ok(StepOutcome {
            terminated: reason.is_some(),
            reason,
            score: self.score,
        })
    }
}

/// Rejection-sample a block-aligned cell outside every slice in `occupied`.
///
/// Fails with [`Error::BoardFull`] straight away when the occupied cells
/// already cover the board, and with [`Error::PlacementExhausted`] once the
/// attempt budget is spent.
pub fn random_free_cell<R: Rng>(
    rng: &mut R,
    config: &GameConfig,
    occupied: &[&[Position]],
) -> Result<Position> {
    let block = config.block_size;
    let taken: AHashSet<Position> = occupied
        .iter()
        .flat_map(|cells| cells.iter().copied())
        .filter(|p| {
            p.x >= 0
                && p.y >= 0
                && p.x < config.width
                && p.y < config.height
                && p.x % block == 0
                && p.y % block == 0
        })
        .collect();
    if taken.len() >= config.cell_count() {
        return Err(Error::BoardFull {
            cells: config.cell_count(),
        });
    }

    for _ in 0..config.placement_attempts {
        let p = Position::new(
            rng.gen_range(0..config.columns()) * block,
            rng.gen_range(0..config.rows()) * block,
        );
        if !taken.contains(&p) {
            return Ok(p);
        }
    }
    Err(Error::PlacementExhausted {
        attempts: config.placement_attempts,
    })
}
