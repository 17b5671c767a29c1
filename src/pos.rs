/// A cell on the board, in pixel units. Live entities always sit on multiples
/// of the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Signed offset from `self` to `other`.
    pub fn delta_to(&self, other: Position) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// The four neighbours one block away, in action order: left, right, up, down.
    pub fn neighbours(&self, block: i32) -> [Position; 4] {
        [
            self.moved_by(-block, 0),
            self.moved_by(block, 0),
            self.moved_by(0, -block),
            self.moved_by(0, block),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_to() {
        let head = Position::new(200, 200);
        assert_eq!(head.delta_to(Position::new(220, 180)), (20, -20));
        assert_eq!(head.delta_to(head), (0, 0));
    }

    #[test]
    fn test_neighbour_order() {
        let p = Position::new(40, 40);
        assert_eq!(
            p.neighbours(20),
            [
                Position::new(20, 40),
                Position::new(60, 40),
                Position::new(40, 20),
                Position::new(40, 60),
            ]
        );
    }
}
