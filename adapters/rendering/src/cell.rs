//! Packed render cells and the logical context they are derived from.

use mirkwood_core::BitBoard;

/// Identity of a block; every cell of a block shares it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellIdentity {
    /// Open ground the agent can walk on.
    #[default]
    Path = 0,
    /// Impassable wall.
    Wall = 1,
    /// Ground currently occupied by the agent.
    Player = 2,
    /// Unused encoding, also the sentinel of a buffer that has never been composited.
    Reserved = 3,
}

impl CellIdentity {
    /// Decodes the two identity bits of a packed cell.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & Cell::IDENTITY_MASK {
            0 => Self::Path,
            1 => Self::Wall,
            2 => Self::Player,
            _ => Self::Reserved,
        }
    }
}

/// Compositor snapshot of what one logical cell currently means.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContextCell {
    /// Identity of the block.
    pub identity: CellIdentity,
    /// Whether the cell carries a mark.
    pub marked: bool,
    /// Whether the agent has stepped on the cell.
    pub visited: bool,
}

impl ContextCell {
    /// Context that never matches a derived cell, forcing a full first raster.
    pub const RESERVED: Self = Self {
        identity: CellIdentity::Reserved,
        marked: false,
        visited: false,
    };

    /// Creates a new context cell.
    #[must_use]
    pub const fn new(identity: CellIdentity, marked: bool, visited: bool) -> Self {
        Self {
            identity,
            marked,
            visited,
        }
    }

    /// Derives the context of `bit` from the state layers.
    ///
    /// Walls take precedence over the agent, which takes precedence over path.
    #[must_use]
    pub const fn derive(
        bit: u8,
        walls: BitBoard,
        position: BitBoard,
        marks: BitBoard,
        visited: BitBoard,
    ) -> Self {
        let identity = if walls.contains(bit) {
            CellIdentity::Wall
        } else if position.contains(bit) {
            CellIdentity::Player
        } else {
            CellIdentity::Path
        };
        Self::new(identity, marks.contains(bit), visited.contains(bit))
    }

    /// Packs the context into an undecorated cell.
    #[must_use]
    pub const fn to_cell(self) -> Cell {
        Cell::new(self.identity, self.marked, self.visited)
    }
}

/// One render-resolution unit packed into a byte.
///
/// ```text
///  decoration   visited marked identity
/// ┌─────────┐     │       │     ┌─┴─┐
///  7  6  5  4     3       2     1   0
/// ```
///
/// The decoration nibble holds a level between 0 and 3 describing how close
/// the cell sits to the edge of its block when the neighbouring block has a
/// different identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell(u8);

impl Cell {
    const IDENTITY_MASK: u8 = 0b0000_0011;
    const MARKED_BIT: u8 = 0b0000_0100;
    const VISITED_BIT: u8 = 0b0000_1000;
    const DECORATION_SHIFT: u32 = 4;

    /// Highest decoration level, used for block interiors.
    pub const MAX_DECORATION: u8 = 3;

    /// Packs identity and flags into an undecorated cell.
    #[must_use]
    pub const fn new(identity: CellIdentity, marked: bool, visited: bool) -> Self {
        let mut bits = identity as u8;
        if marked {
            bits |= Self::MARKED_BIT;
        }
        if visited {
            bits |= Self::VISITED_BIT;
        }
        Self(bits)
    }

    /// Returns a copy carrying `level` in the decoration nibble, capped at [`Cell::MAX_DECORATION`].
    #[must_use]
    pub const fn with_decoration(self, level: u8) -> Self {
        let level = if level > Self::MAX_DECORATION {
            Self::MAX_DECORATION
        } else {
            level
        };
        Self((self.0 & 0x0f) | (level << Self::DECORATION_SHIFT))
    }

    /// Raw packed value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Identity, marked and visited bits without the decoration.
    #[must_use]
    pub const fn flags(self) -> u8 {
        self.0 & 0x0f
    }

    /// Identity of the block the cell belongs to.
    #[must_use]
    pub const fn identity(self) -> CellIdentity {
        CellIdentity::from_bits(self.0)
    }

    /// Whether the cell carries a mark.
    #[must_use]
    pub const fn is_marked(self) -> bool {
        self.0 & Self::MARKED_BIT != 0
    }

    /// Whether the cell was visited.
    #[must_use]
    pub const fn is_visited(self) -> bool {
        self.0 & Self::VISITED_BIT != 0
    }

    /// Decoration level between 0 and 3.
    #[must_use]
    pub const fn decoration(self) -> u8 {
        self.0 >> Self::DECORATION_SHIFT
    }
}
