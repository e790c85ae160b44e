//! Incremental translation of a maze state into a decorated cell grid.
//!
//! Each frame runs two passes. [`Buffer::contextualize`] compares the 64
//! logical cells against the stored context and flags the ones that changed;
//! [`Buffer::raster`] expands only the flagged cells into their blocks. A
//! block is `x_res × y_res` cells, and its decoration falls off towards any
//! edge shared with a block of a different identity.

use glam::UVec2;
use log::{debug, trace};
use mirkwood_core::{bit_to_coords, coords_to_bit, BitBoard, CELL_COUNT, GRID_SIZE};
use mirkwood_world::{query, State};

use crate::{Cell, ContextCell, RenderingError};

const LOGICAL_CELLS: usize = CELL_COUNT as usize;

/// Upper bound on the number of cells a buffer may hold.
pub const MAX_CELLS: usize = 1 << 24;

/// Render target owned by a single driver and mutated only through compositing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buffer {
    resolution: UVec2,
    size: UVec2,
    context: [ContextCell; LOGICAL_CELLS],
    dirty: BitBoard,
    cells: Vec<Cell>,
}

impl Buffer {
    /// Allocates a buffer whose blocks are `x_res` cells wide and `y_res` cells tall.
    ///
    /// Returns an error when either resolution is zero or the grid would
    /// exceed [`MAX_CELLS`].
    pub fn new(x_res: u32, y_res: u32) -> Result<Self, RenderingError> {
        let invalid = RenderingError::InvalidResolution { x_res, y_res };
        if x_res == 0 || y_res == 0 {
            return Err(invalid);
        }

        let grid = u32::from(GRID_SIZE);
        let (Some(width), Some(height)) = (x_res.checked_mul(grid), y_res.checked_mul(grid)) else {
            return Err(invalid);
        };
        let cell_count = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(width, height)| width.checked_mul(height))
            .filter(|count| *count <= MAX_CELLS)
            .ok_or(invalid)?;

        Ok(Self {
            resolution: UVec2::new(x_res, y_res),
            size: UVec2::new(width, height),
            context: [ContextCell::RESERVED; LOGICAL_CELLS],
            dirty: BitBoard::EMPTY,
            cells: vec![Cell::default(); cell_count],
        })
    }

    /// Width of a block in cells.
    #[must_use]
    pub const fn x_res(&self) -> u32 {
        self.resolution.x
    }

    /// Height of a block in cells.
    #[must_use]
    pub const fn y_res(&self) -> u32 {
        self.resolution.y
    }

    /// Width of the cell grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.size.x
    }

    /// Height of the cell grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.size.y
    }

    /// Logical cells whose blocks are stale.
    #[must_use]
    pub const fn dirty(&self) -> BitBoard {
        self.dirty
    }

    /// Stored context of a logical cell.
    #[must_use]
    pub fn context(&self, bit: u8) -> Option<ContextCell> {
        self.context.get(usize::from(bit)).copied()
    }

    /// Every cell in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterates over the rows of the cell grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width() as usize)
    }

    /// Cell at column `x`, row `y` of the cell grid.
    #[must_use]
    pub fn cell(&self, x: u32, y: u32) -> Option<Cell> {
        self.cell_at(UVec2::new(x, y))
    }

    /// Cell at `position` of the cell grid.
    #[must_use]
    pub fn cell_at(&self, position: UVec2) -> Option<Cell> {
        if position.x >= self.width() || position.y >= self.height() {
            return None;
        }
        let index = position.y as usize * self.width() as usize + position.x as usize;
        self.cells.get(index).copied()
    }

    /// Brings the buffer up to date with `state`.
    ///
    /// Returns the number of logical cells that were re-rasterised; calling it
    /// again with an unchanged state returns zero and touches nothing.
    pub fn composite(&mut self, state: &State) -> usize {
        self.contextualize(state);
        self.raster()
    }

    /// Refreshes the logical context from `state` and flags stale blocks.
    ///
    /// A block is stale when its own context changed, or when a neighbouring
    /// block changed identity, since its decoration depends on that neighbour.
    pub fn contextualize(&mut self, state: &State) {
        let walls = query::walls(state);
        let position = state.position();
        let marks = state.marks();
        let visited = state.visited_path();

        let mut changed = BitBoard::EMPTY;
        let mut reshaped = BitBoard::EMPTY;
        for bit in 0..CELL_COUNT {
            let next = ContextCell::derive(bit, walls, position, marks, visited);
            let slot = &mut self.context[usize::from(bit)];
            if *slot == next {
                continue;
            }
            if slot.identity != next.identity {
                reshaped |= BitBoard::from_bit(bit);
            }
            *slot = next;
            changed |= BitBoard::from_bit(bit);
        }

        self.dirty |= changed | reshaped.neighbours();
        trace!(
            "contextualize: {} changed, {} dirty",
            changed.count(),
            self.dirty.count()
        );
    }

    /// Rasterises every stale block and clears the dirty set.
    ///
    /// Returns the number of blocks that were rasterised.
    pub fn raster(&mut self) -> usize {
        let dirty = self.dirty;
        let x_res = self.resolution.x;
        let y_res = self.resolution.y;
        let width = self.width() as usize;
        let context = &self.context;
        let cells = &mut self.cells;

        for bit in dirty.bits() {
            let (row, column) = bit_to_coords(bit);
            let block = context[usize::from(bit)];
            let same = |neighbour: Option<u8>| {
                neighbour.map_or(false, |other| {
                    context[usize::from(other)].identity == block.identity
                })
            };

            let top = same(row.checked_sub(1).map(|above| coords_to_bit(above, column)));
            let bottom = same((row + 1 < GRID_SIZE).then(|| coords_to_bit(row + 1, column)));
            let left = same(column.checked_sub(1).map(|before| coords_to_bit(row, before)));
            let right = same((column + 1 < GRID_SIZE).then(|| coords_to_bit(row, column + 1)));

            let base = block.to_cell();
            let origin_x = u32::from(column) * x_res;
            let origin_y = u32::from(row) * y_res;
            for y_off in 0..y_res {
                let y_level = axis_decoration(y_off, y_res, top, bottom);
                let row_start = (origin_y + y_off) as usize * width;
                for x_off in 0..x_res {
                    let x_level = axis_decoration(x_off, x_res, left, right);
                    let index = row_start + (origin_x + x_off) as usize;
                    cells[index] = base.with_decoration(y_level.min(x_level));
                }
            }
        }

        self.dirty = BitBoard::EMPTY;
        let rastered = dirty.count() as usize;
        if rastered > 0 {
            debug!("rasterised {rastered} block(s)");
        }
        rastered
    }
}

/// Decoration level of the cell `offset` cells into a block of length `res`
/// along one axis.
///
/// `before_same` and `after_same` report whether the neighbouring blocks on
/// either side share the block's identity; a missing neighbour at the grid
/// edge counts as different. The level rises by one per cell away from every
/// differing edge and saturates at [`Cell::MAX_DECORATION`].
#[must_use]
pub fn axis_decoration(offset: u32, res: u32, before_same: bool, after_same: bool) -> u8 {
    let from_start = offset;
    let from_end = res.saturating_sub(1).saturating_sub(offset);
    let max = u32::from(Cell::MAX_DECORATION);

    let level = match (before_same, after_same) {
        (false, false) => from_start.min(from_end),
        (false, true) => from_start,
        (true, false) => from_end,
        (true, true) => max,
    };
    level.min(max) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellIdentity;
    use mirkwood_core::{Direction, LevelBlueprint};

    fn sample_state() -> State {
        State::materialize(&LevelBlueprint::sample()).expect("sample level is valid")
    }

    fn block(buffer: &Buffer, bit: u8) -> Vec<Cell> {
        let (row, column) = bit_to_coords(bit);
        let mut cells = Vec::new();
        for y in 0..buffer.y_res() {
            for x in 0..buffer.x_res() {
                let cell = buffer
                    .cell(u32::from(column) * buffer.x_res() + x, u32::from(row) * buffer.y_res() + y)
                    .expect("cell inside grid");
                cells.push(cell);
            }
        }
        cells
    }

    #[test]
    fn buffer_creation_rejects_zero_resolution() {
        assert_eq!(
            Buffer::new(0, 3),
            Err(RenderingError::InvalidResolution { x_res: 0, y_res: 3 })
        );
    }

    #[test]
    fn buffer_creation_rejects_oversized_resolution() {
        for (x_res, y_res) in [(u32::MAX, 1), (1, u32::MAX), (600_000_000, 1), (4096, 4096)] {
            assert_eq!(
                Buffer::new(x_res, y_res),
                Err(RenderingError::InvalidResolution { x_res, y_res }),
                "{x_res}x{y_res} must be rejected"
            );
        }
    }

    #[test]
    fn buffer_creation_accepts_the_largest_grid() {
        let buffer = Buffer::new(512, 512).expect("exactly MAX_CELLS cells");

        assert_eq!(buffer.cells().len(), MAX_CELLS);
        assert_eq!((buffer.width(), buffer.height()), (4096, 4096));
    }

    #[test]
    fn new_buffer_is_sized_and_neutral() {
        let buffer = Buffer::new(12, 5).expect("valid resolution");

        assert_eq!(buffer.width(), 96);
        assert_eq!(buffer.height(), 40);
        assert_eq!(buffer.cells().len(), 96 * 40);
        assert_eq!(buffer.rows().count(), 40);
        assert!(buffer.cells().iter().all(|cell| *cell == Cell::default()));
        assert_eq!(buffer.context(0), Some(ContextCell::RESERVED));
        assert_eq!(buffer.context(64), None);
        assert!(buffer.cell(96, 0).is_none());
    }

    #[test]
    fn first_composite_rasterises_every_block() {
        let mut buffer = Buffer::new(3, 2).expect("valid resolution");

        assert_eq!(buffer.composite(&sample_state()), 64);
        assert!(buffer.dirty().is_empty());
        assert_eq!(
            buffer.context(1),
            Some(ContextCell::new(CellIdentity::Player, false, true))
        );
    }

    #[test]
    fn second_composite_with_same_state_is_a_no_op() {
        let state = sample_state();
        let mut buffer = Buffer::new(4, 3).expect("valid resolution");
        let _ = buffer.composite(&state);
        let snapshot = buffer.clone();

        assert_eq!(buffer.composite(&state), 0);
        assert!(buffer.dirty().is_empty());
        assert_eq!(buffer, snapshot);
    }

    #[test]
    fn move_dirties_changed_cells_and_their_neighbours() {
        let state = sample_state();
        let mut buffer = Buffer::new(2, 2).expect("valid resolution");
        let _ = buffer.composite(&state);

        let moved = state.move_to(Direction::South).expect("open cell");
        buffer.contextualize(&moved);

        let changed = BitBoard::from_bit(1) | BitBoard::from_bit(9);
        assert_eq!(buffer.dirty(), changed | changed.neighbours());
        assert_eq!(buffer.raster(), buffer_dirty_count(changed));
    }

    fn buffer_dirty_count(changed: BitBoard) -> usize {
        (changed | changed.neighbours()).count() as usize
    }

    #[test]
    fn mark_only_dirties_the_marked_cell() {
        let state = sample_state();
        let mut buffer = Buffer::new(2, 2).expect("valid resolution");
        let _ = buffer.composite(&state);

        buffer.contextualize(&state.toggle_mark());

        assert_eq!(buffer.dirty(), BitBoard::from_bit(1));
        assert!(block(&buffer, 1).iter().all(|cell| !cell.is_marked()));
        assert_eq!(buffer.raster(), 1);
        assert!(block(&buffer, 1).iter().all(|cell| cell.is_marked()));
    }

    #[test]
    fn incremental_frames_match_a_full_raster() {
        let mut state = sample_state();
        let mut buffer = Buffer::new(5, 3).expect("valid resolution");
        let _ = buffer.composite(&state);

        for direction in [
            Direction::South,
            Direction::South,
            Direction::South,
            Direction::East,
            Direction::East,
            Direction::North,
        ] {
            state = state.move_to(direction).expect("path is open").toggle_mark();
            let _ = buffer.composite(&state);

            let mut fresh = Buffer::new(5, 3).expect("valid resolution");
            let _ = fresh.composite(&state);
            assert_eq!(buffer.cells(), fresh.cells());
        }
    }

    #[test]
    fn interior_blocks_reach_maximum_decoration() {
        let mut grid = vec![vec![true; 8]; 8];
        grid[1][1] = false;
        grid[1][2] = false;
        let blueprint = LevelBlueprint {
            key: 2,
            grid,
            starting_point: coords_to_bit(1, 1),
            finishing_point: coords_to_bit(1, 2),
            win_condition: mirkwood_core::WinCondition::SIMPLE_EXIT,
        };
        let state = State::materialize(&blueprint).expect("valid blueprint");
        let mut buffer = Buffer::new(6, 6).expect("valid resolution");
        let _ = buffer.composite(&state);

        let interior = coords_to_bit(5, 5);
        assert!(block(&buffer, interior).iter().all(|cell| {
            cell.identity() == CellIdentity::Wall && cell.decoration() == Cell::MAX_DECORATION
        }));

        // A wall touching the corridor keeps its falloff on the shared edge only.
        let edge: Vec<u8> = block(&buffer, coords_to_bit(2, 1))[..6]
            .iter()
            .map(|cell| cell.decoration())
            .collect();
        assert_eq!(edge, vec![0; 6]);
        let far_row: Vec<u8> = block(&buffer, coords_to_bit(2, 1))[30..]
            .iter()
            .map(|cell| cell.decoration())
            .collect();
        assert_eq!(far_row, vec![3; 6]);
    }

    #[test]
    fn isolated_block_falls_off_symmetrically() {
        let mut buffer = Buffer::new(7, 1).expect("valid resolution");
        let _ = buffer.composite(&sample_state());

        // The agent block differs from every neighbour.
        let levels: Vec<u8> = block(&buffer, 1).iter().map(|cell| cell.decoration()).collect();
        assert_eq!(levels, vec![0; 7]);

        let mut buffer = Buffer::new(7, 7).expect("valid resolution");
        let _ = buffer.composite(&sample_state());
        let row: Vec<u8> = block(&buffer, 1)[21..28]
            .iter()
            .map(|cell| cell.decoration())
            .collect();
        assert_eq!(row, vec![0, 1, 2, 3, 2, 1, 0]);
    }

    #[test]
    fn axis_decoration_follows_neighbour_identity() {
        let levels = |before, after| -> Vec<u8> {
            (0..6)
                .map(|offset| axis_decoration(offset, 6, before, after))
                .collect()
        };

        assert_eq!(levels(false, false), vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(levels(false, true), vec![0, 1, 2, 3, 3, 3]);
        assert_eq!(levels(true, false), vec![3, 3, 3, 2, 1, 0]);
        assert_eq!(levels(true, true), vec![3; 6]);
        assert_eq!(axis_decoration(0, 1, false, false), 0);
    }
}
