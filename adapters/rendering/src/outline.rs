//! Alternate wall presentation that draws walls as connected outlines.
//!
//! This renderer works at logical resolution and is independent from the
//! decorated raster produced by [`crate::Buffer`].

use mirkwood_core::{BitBoard, Direction, CELL_COUNT, GRID_SIZE};

/// Glyph used for a wall without wall neighbours.
pub const ISOLATED_WALL: char = '▓';

/// Outline glyphs of a board, indexed by `[row][column]`; `None` marks open cells.
pub type OutlineGrid = [[Option<char>; GRID_SIZE as usize]; GRID_SIZE as usize];

/// Selects the box-drawing glyph that connects a wall to its wall neighbours.
///
/// A single connection is drawn as a straight line through the cell.
#[must_use]
pub const fn select_box_char(up: bool, down: bool, left: bool, right: bool) -> char {
    match (up, down, left, right) {
        (false, false, false, false) => ISOLATED_WALL,
        (true, true, true, true) => '┼',
        (true, true, true, false) => '┤',
        (true, true, false, true) => '├',
        (true, false, true, true) => '┴',
        (false, true, true, true) => '┬',
        (true, false, true, false) => '┘',
        (true, false, false, true) => '└',
        (false, true, true, false) => '┐',
        (false, true, false, true) => '┌',
        (_, _, false, false) => '│',
        (false, false, _, _) => '─',
    }
}

/// Draws every wall of `walls` as an outline glyph.
///
/// Cells beyond the board edge count as open ground.
#[must_use]
pub fn outline_walls(walls: BitBoard) -> OutlineGrid {
    let wall_above = walls.shifted(Direction::South);
    let wall_below = walls.shifted(Direction::North);
    let wall_left = walls.shifted(Direction::East);
    let wall_right = walls.shifted(Direction::West);

    let mut grid: OutlineGrid = [[None; GRID_SIZE as usize]; GRID_SIZE as usize];
    for bit in walls.bits().filter(|bit| *bit < CELL_COUNT) {
        let row = usize::from(bit / GRID_SIZE);
        let column = usize::from(bit % GRID_SIZE);
        grid[row][column] = Some(select_box_char(
            wall_above.contains(bit),
            wall_below.contains(bit),
            wall_left.contains(bit),
            wall_right.contains(bit),
        ));
    }
    grid
}
