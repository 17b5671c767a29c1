//! Discretisation of the board into the key the q-table is indexed by.
//!
//! A [`Signature`] keeps only which side the good food lies on and which of
//! the four neighbouring cells are blocked. [`Observation`] pairs it with the
//! raw data the backward update needs to pick a reward.

use std::fmt;

use crate::config::GameConfig;
use crate::pos::Position;

/// Food column relative to the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Right,
    Same,
}

impl Horizontal {
    fn from_delta(dx: i32) -> Self {
        match dx.signum() {
            1 => Horizontal::Right,
            -1 => Horizontal::Left,
            _ => Horizontal::Same,
        }
    }

    fn code(self) -> &'static str {
        match self {
            Horizontal::Left => "0",
            Horizontal::Right => "1",
            Horizontal::Same => "NA",
        }
    }
}

/// Food row relative to the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    Up,
    Down,
    Same,
}

impl Vertical {
    fn from_delta(dy: i32) -> Self {
        match dy.signum() {
            1 => Vertical::Down,
            -1 => Vertical::Up,
            _ => Vertical::Same,
        }
    }

    fn code(self) -> &'static str {
        match self {
            Vertical::Up => "2",
            Vertical::Down => "3",
            Vertical::Same => "NA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupancy {
    Free,
    Blocked,
}

impl Occupancy {
    fn code(self) -> char {
        match self {
            Occupancy::Free => '0',
            Occupancy::Blocked => '1',
        }
    }
}

/// The learned-state key. Equality and hashing cover only the discretised
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub food_x: Horizontal,
    pub food_y: Vertical,
    /// Left, right, up, down.
    pub surroundings: [Occupancy; 4],
}

impl Signature {
    /// Upper bound on distinct signatures: 3 x 3 x 2^4.
    pub const SPACE: usize = 144;

    pub fn surroundings_code(&self) -> String {
        self.surroundings.iter().map(|o| o.code()).collect()
    }

    /// Table key, e.g. `('1', 'NA', '0100')`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "('{}', '{}', '{}')",
            self.food_x.code(),
            self.food_y.code(),
            self.surroundings_code()
        )
    }
}

/// A signature plus the raw geometry it was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub signature: Signature,
    /// Good food minus head, before discretisation.
    pub distance: (i32, i32),
    pub food: Position,
    pub bad_food: Position,
}

/// Turns board geometry into an [`Observation`]. Holds only the board
/// dimensions; encoding is a pure function of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEncoder {
    width: i32,
    height: i32,
    block: i32,
}

impl StateEncoder {
    pub fn new(width: i32, height: i32, block: i32) -> Self {
        Self {
            width,
            height,
            block,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.width, config.height, config.block_size)
    }

    /// `snake` is tail first, head last, and must not be empty.
    pub fn encode(
        &self,
        snake: &[Position],
        food: Position,
        bad_food: Position,
        walls: &[Position],
    ) -> Observation {
        debug_assert!(!snake.is_empty(), "snake must have a head");
        let head = snake[snake.len() - 1];
        let body = &snake[..snake.len() - 1];
        let distance = head.delta_to(food);

        let surroundings = head.neighbours(self.block).map(|sq| {
            let off_screen = sq.x < 0 || sq.y < 0 || sq.x >= self.width || sq.y >= self.height;
            if off_screen || sq == bad_food || body.contains(&sq) || walls.contains(&sq) {
                Occupancy::Blocked
            } else {
                Occupancy::Free
            }
        });

        Observation {
            signature: Signature {
                food_x: Horizontal::from_delta(distance.0),
                food_y: Vertical::from_delta(distance.1),
                surroundings,
            },
            distance,
            food,
            bad_food,
        }
    }
}
