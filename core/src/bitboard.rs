//! Bit-position arithmetic over the fixed 8×8 board.
//!
//! Every semantic layer of a level (walls, position, visited trail, marks)
//! shares the same linear encoding: bit `8 * row + column` addresses one
//! logical cell. Keeping all layers in a single `u64` lets the state machine
//! and the compositor combine them with plain bitwise operators.

use std::{
    fmt,
    ops::{BitAnd, BitOr, BitOrAssign, BitXor, Not},
};

use serde::{Deserialize, Serialize};

use crate::Direction;

/// Number of cells along each edge of the board.
pub const GRID_SIZE: u8 = 8;

/// Total number of logical cells addressed by a [`BitBoard`].
pub const CELL_COUNT: u8 = GRID_SIZE * GRID_SIZE;

/// An 8×8 board linearised into a single integer.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitBoard(u64);

impl BitBoard {
    /// Board with no cells set.
    pub const EMPTY: Self = Self(0);

    /// Board with every cell set.
    pub const FULL: Self = Self(u64::MAX);

    /// Cells of the top row.
    pub const ROW_0: Self = Self(0x0000_0000_0000_00ff);

    /// Cells of the bottom row.
    pub const ROW_7: Self = Self(0xff00_0000_0000_0000);

    /// Cells of the leftmost column.
    pub const COLUMN_0: Self = Self(0x0101_0101_0101_0101);

    /// Cells of the rightmost column.
    pub const COLUMN_7: Self = Self(0x8080_8080_8080_8080);

    /// Every cell on the outer ring of the board.
    pub const PERIMETER: Self =
        Self(Self::ROW_0.0 | Self::ROW_7.0 | Self::COLUMN_0.0 | Self::COLUMN_7.0);

    /// Wraps a raw 64-bit value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw 64-bit value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Board with only the provided bit set.
    ///
    /// Bits outside `0..64` produce [`BitBoard::EMPTY`].
    #[must_use]
    pub const fn from_bit(bit: u8) -> Self {
        match 1u64.checked_shl(bit as u32) {
            Some(raw) => Self(raw),
            None => Self::EMPTY,
        }
    }

    /// Board with only the cell at `row`, `column` set.
    #[must_use]
    pub const fn from_coords(row: u8, column: u8) -> Self {
        if row >= GRID_SIZE || column >= GRID_SIZE {
            return Self::EMPTY;
        }
        Self::from_bit(coords_to_bit(row, column))
    }

    /// Number of cells set on the board.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Reports whether no cell is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Reports whether exactly one cell is set.
    #[must_use]
    pub const fn is_single(self) -> bool {
        self.0.count_ones() == 1
    }

    /// Reports whether the provided bit is set.
    #[must_use]
    pub const fn contains(self, bit: u8) -> bool {
        self.0 & Self::from_bit(bit).0 != 0
    }

    /// Reports whether any cell is set on both boards.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Index of the lowest set bit, if any.
    #[must_use]
    pub const fn lowest_bit(self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8)
        }
    }

    /// Shifts every cell one step in `direction`.
    ///
    /// Cells that would leave the board vanish instead of wrapping into the
    /// neighbouring row, so a single-cell board moved off an edge becomes
    /// empty.
    #[must_use]
    pub const fn shifted(self, direction: Direction) -> Self {
        match direction {
            Direction::North => Self((self.0 & !Self::ROW_0.0) >> GRID_SIZE),
            Direction::South => Self((self.0 & !Self::ROW_7.0) << GRID_SIZE),
            Direction::East => Self((self.0 & !Self::COLUMN_7.0) << 1),
            Direction::West => Self((self.0 & !Self::COLUMN_0.0) >> 1),
        }
    }

    /// Cells orthogonally adjacent to any cell on the board.
    #[must_use]
    pub const fn neighbours(self) -> Self {
        Self(
            self.shifted(Direction::North).0
                | self.shifted(Direction::South).0
                | self.shifted(Direction::East).0
                | self.shifted(Direction::West).0,
        )
    }

    /// Iterates over the indices of the set bits in ascending order.
    #[must_use]
    pub const fn bits(self) -> Bits {
        Bits { remaining: self.0 }
    }
}

/// Iterator over the set bits of a [`BitBoard`].
#[derive(Clone, Debug)]
pub struct Bits {
    remaining: u64,
}

impl Iterator for Bits {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        let bit = self.remaining.trailing_zeros() as u8;
        self.remaining &= self.remaining - 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.remaining.count_ones() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for Bits {}

/// Converts grid coordinates to a bit position (0-63).
#[must_use]
pub const fn coords_to_bit(row: u8, column: u8) -> u8 {
    row * GRID_SIZE + column
}

/// Converts a bit position to `(row, column)` grid coordinates.
#[must_use]
pub const fn bit_to_coords(bit: u8) -> (u8, u8) {
    (bit / GRID_SIZE, bit % GRID_SIZE)
}

impl BitOr for BitBoard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BitBoard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for BitBoard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitXor for BitBoard {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for BitBoard {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBoard({:#018x})", self.0)
    }
}

impl fmt::Display for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..GRID_SIZE {
            for column in 0..GRID_SIZE {
                let glyph = if self.contains(coords_to_bit(row, column)) {
                    '#'
                } else {
                    '.'
                };
                write!(f, "{glyph}")?;
            }
            if row + 1 < GRID_SIZE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_round_trip_through_bit_index() {
        for bit in 0..CELL_COUNT {
            let (row, column) = bit_to_coords(bit);
            assert_eq!(coords_to_bit(row, column), bit);
        }
        assert_eq!(bit_to_coords(55), (6, 7));
    }

    #[test]
    fn from_bit_rejects_out_of_range_indices() {
        assert_eq!(BitBoard::from_bit(0).get(), 1);
        assert_eq!(BitBoard::from_bit(63).get(), 1 << 63);
        assert!(BitBoard::from_bit(64).is_empty());
        assert!(!BitBoard::FULL.contains(64));
    }

    #[test]
    fn perimeter_covers_the_outer_ring() {
        assert_eq!(BitBoard::PERIMETER.count(), 28);
        assert!(BitBoard::PERIMETER.contains(coords_to_bit(0, 3)));
        assert!(BitBoard::PERIMETER.contains(coords_to_bit(4, 0)));
        assert!(BitBoard::PERIMETER.contains(coords_to_bit(4, 7)));
        assert!(!BitBoard::PERIMETER.contains(coords_to_bit(3, 3)));
    }

    #[test]
    fn shifted_moves_cells_by_one_step() {
        let cell = BitBoard::from_coords(3, 3);
        assert_eq!(cell.shifted(Direction::North), BitBoard::from_coords(2, 3));
        assert_eq!(cell.shifted(Direction::South), BitBoard::from_coords(4, 3));
        assert_eq!(cell.shifted(Direction::East), BitBoard::from_coords(3, 4));
        assert_eq!(cell.shifted(Direction::West), BitBoard::from_coords(3, 2));
    }

    #[test]
    fn shifted_never_wraps_across_rows_or_leaves_the_board() {
        assert!(BitBoard::from_coords(2, 7)
            .shifted(Direction::East)
            .is_empty());
        assert!(BitBoard::from_coords(2, 0)
            .shifted(Direction::West)
            .is_empty());
        assert!(BitBoard::from_coords(0, 4)
            .shifted(Direction::North)
            .is_empty());
        assert!(BitBoard::from_coords(7, 4)
            .shifted(Direction::South)
            .is_empty());
    }

    #[test]
    fn neighbours_of_a_corner_stay_on_the_board() {
        let corner = BitBoard::from_coords(0, 0);
        let expected = BitBoard::from_coords(0, 1) | BitBoard::from_coords(1, 0);
        assert_eq!(corner.neighbours(), expected);
    }

    #[test]
    fn bits_iterates_in_ascending_order() {
        let board = BitBoard::from_bit(9) | BitBoard::from_bit(2) | BitBoard::from_bit(63);
        assert_eq!(board.bits().collect::<Vec<_>>(), vec![2, 9, 63]);
        assert_eq!(board.bits().len(), 3);
        assert_eq!(board.lowest_bit(), Some(2));
        assert_eq!(BitBoard::EMPTY.lowest_bit(), None);
    }

    #[test]
    fn display_draws_rows_top_to_bottom() {
        let board = BitBoard::ROW_0 | BitBoard::from_coords(1, 0);
        let rendered = board.to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "########");
        assert_eq!(lines[1], "#.......");
        assert_eq!(lines[7], "........");
    }
}
