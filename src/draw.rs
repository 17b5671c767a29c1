use std::io::Write;

use tracing::warn;

use crate::game::GridWorld;
use crate::pos::Position;
use crate::runner::Render;

const HEAD: char = '@';
const BODY: char = 'o';
const GOOD_FOOD: char = '*';
const BAD_FOOD: char = 'x';
const WALL: char = '#';
const EMPTY: char = '.';

/// Render the board as text rows, one character per cell, framed by a border.
pub fn render_frame(world: &GridWorld) -> Vec<String> {
    let block = world.config.block_size;
    let cols = world.config.columns();
    let rows = world.config.rows();
    let head = world.head();

    let mut lines = Vec::with_capacity(rows as usize + 3);
    let border = format!("+{}+", "-".repeat(cols as usize));
    lines.push(border.clone());

    for row in 0..rows {
        let mut line = String::with_capacity(cols as usize + 2);
        line.push('|');
        for col in 0..cols {
            let p = Position::new(col * block, row * block);
            // Head first: on a collision move it sits on top of whatever it hit.
            let glyph = if p == head {
                HEAD
            } else if world.body.contains(&p) {
                BODY
            } else if world.walls.contains(&p) {
                WALL
            } else if p == world.good_food {
                GOOD_FOOD
            } else if p == world.bad_food {
                BAD_FOOD
            } else {
                EMPTY
            };
            line.push(glyph);
        }
        line.push('|');
        lines.push(line);
    }

    lines.push(border);
    lines.push(format!(
        "Score: {}  Length: {}  Moves: {}",
        world.score,
        world.body.len(),
        world.move_count
    ));
    lines
}

/// Prints every frame to a writer, stdout by default.
pub struct AsciiRenderer<W: Write> {
    out: W,
}

impl AsciiRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Render for AsciiRenderer<W> {
    fn render(&mut self, world: &GridWorld) {
        let frame = render_frame(world).join("\n");
        if let Err(e) = writeln!(self.out, "{frame}\n").and_then(|_| self.out.flush()) {
            warn!(error = %e, "failed to draw frame");
        }
    }
}
