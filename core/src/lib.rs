#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mirkwood maze engine.
//!
//! This crate defines the vocabulary that connects the state machine, the
//! dispatcher and the rendering adapters. Levels are described by a
//! [`LevelBlueprint`], every logical layer of a level is a [`BitBoard`], and
//! adapters express player intent through the closed [`Action`] set. Failures
//! surface as [`MazeError`] or, while a blueprint is materialised, as
//! [`BlueprintError`].

pub mod bitboard;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bitboard::{bit_to_coords, coords_to_bit, BitBoard, Bits, CELL_COUNT, GRID_SIZE};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Mirkwood - Educational Maze Game";

/// Cardinal movement directions available to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward decreasing column indices.
    West,
}

/// Actions that express every permissible state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Requests a single step of the agent.
    Walk {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Toggles the mark on the cell the agent currently occupies.
    Mark,
}

impl Action {
    /// Convenience constructor for a walk in `direction`.
    #[must_use]
    pub const fn walk(direction: Direction) -> Self {
        Self::Walk { direction }
    }

    /// Decodes the single-character action notation (`n`, `s`, `e`, `w`, `m`).
    ///
    /// Uppercase letters are accepted. Any other character is reported as
    /// [`MazeError::UnknownAction`].
    pub fn from_char(symbol: char) -> Result<Self, MazeError> {
        match symbol.to_ascii_lowercase() {
            'n' => Ok(Self::walk(Direction::North)),
            's' => Ok(Self::walk(Direction::South)),
            'e' => Ok(Self::walk(Direction::East)),
            'w' => Ok(Self::walk(Direction::West)),
            'm' => Ok(Self::Mark),
            _ => Err(MazeError::UnknownAction(symbol)),
        }
    }

    /// Encodes the action back into its single-character notation.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Walk {
                direction: Direction::North,
            } => 'n',
            Self::Walk {
                direction: Direction::South,
            } => 's',
            Self::Walk {
                direction: Direction::East,
            } => 'e',
            Self::Walk {
                direction: Direction::West,
            } => 'w',
            Self::Mark => 'm',
        }
    }
}

/// Matrix representation of a maze used for construction; `true` marks a wall.
pub type MazeGrid = Vec<Vec<bool>>;

/// Specifies how a level is completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WinCondition {
    /// Number of cells that must be marked; zero disables the requirement.
    #[serde(default)]
    pub required_marks: u8,
    /// Maximum number of steps allowed; zero means unlimited.
    #[serde(default)]
    pub max_steps: u16,
}

impl WinCondition {
    /// Only requires reaching the exit.
    pub const SIMPLE_EXIT: Self = Self {
        required_marks: 0,
        max_steps: 0,
    };
}

/// Static, author-supplied definition of a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBlueprint {
    /// Identifies the level (file number, seed, etc.).
    pub key: u32,
    /// The 8×8 maze layout; `true` marks a wall.
    pub grid: MazeGrid,
    /// Bit position (0-63) where the agent begins.
    pub starting_point: u8,
    /// Bit position (0-63) the agent must reach.
    pub finishing_point: u8,
    /// What must be satisfied to complete the level.
    #[serde(default)]
    pub win_condition: WinCondition,
}

impl LevelBlueprint {
    /// The built-in sample level: entrance at row 0, exit at the east edge of row 6.
    #[must_use]
    pub fn sample() -> Self {
        const T: bool = true;
        const F: bool = false;
        Self {
            key: 1,
            grid: vec![
                vec![T, F, T, T, T, T, T, T],
                vec![T, F, T, F, F, F, T, T],
                vec![T, F, T, F, T, F, F, T],
                vec![T, F, F, F, T, T, F, T],
                vec![T, F, T, F, T, T, F, T],
                vec![T, F, T, F, F, T, F, T],
                vec![T, F, T, T, F, T, F, F],
                vec![T, T, T, T, T, T, T, T],
            ],
            starting_point: 1,
            finishing_point: 55,
            win_condition: WinCondition::SIMPLE_EXIT,
        }
    }

    /// Converts the wall matrix into a [`BitBoard`].
    ///
    /// Cells outside the 8×8 window are ignored; validating the grid shape is
    /// the responsibility of the state machine.
    #[must_use]
    pub fn walls(&self) -> BitBoard {
        let mut walls = BitBoard::EMPTY;
        for (row, cells) in self.grid.iter().enumerate().take(usize::from(GRID_SIZE)) {
            for (column, wall) in cells.iter().enumerate().take(usize::from(GRID_SIZE)) {
                if *wall {
                    walls |= BitBoard::from_coords(row as u8, column as u8);
                }
            }
        }
        walls
    }
}

/// Invariant of a [`LevelBlueprint`]-derived state that failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum InvariantViolation {
    /// The position board must contain exactly one cell.
    #[error("position must occupy exactly one cell (found {count})")]
    PositionCardinality {
        /// Number of cells set on the position board.
        count: u32,
    },
    /// The agent stands on a wall.
    #[error("position overlaps a wall")]
    PositionOnWall,
    /// The visited trail crosses a wall.
    #[error("visited path overlaps a wall")]
    VisitedOnWall,
    /// A wall cell carries a mark.
    #[error("marks overlap a wall")]
    MarksOnWall,
}

/// Errors raised by state transitions and the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum MazeError {
    /// The state has become corrupted; this signals a logic bug.
    #[error("invalid game state: {0}")]
    InvalidState(InvariantViolation),
    /// The agent attempted to move into a wall or off the board.
    #[error("you hit a tree")]
    HitWall,
    /// An action symbol could not be decoded.
    #[error("unknown action `{0}`")]
    UnknownAction(char),
    /// A batch of actions was exhausted without reaching the finish.
    #[error("the actions ended before reaching the finish")]
    IncompletePath,
    /// The agent exceeded the level's step allowance.
    #[error("step limit of {max_steps} exceeded")]
    StepLimit {
        /// Allowance configured by the level's win condition.
        max_steps: u16,
    },
    /// The level is already finished.
    #[error("level already complete")]
    AlreadyComplete,
}

/// Reasons a blueprint cannot be materialised into a playable state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum BlueprintError {
    /// The grid does not have exactly eight rows.
    #[error("grid must have 8 rows (found {rows})")]
    MalformedGrid {
        /// Number of rows supplied.
        rows: usize,
    },
    /// A grid row does not have exactly eight columns.
    #[error("grid row {row} must have 8 columns (found {columns})")]
    MalformedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of columns supplied in that row.
        columns: usize,
    },
    /// A start or finish bit lies outside `0..64`.
    #[error("bit position {bit} lies outside the board")]
    PointOutOfRange {
        /// Offending bit position.
        bit: u8,
    },
    /// The starting point is a wall.
    #[error("starting point {bit} is a wall")]
    StartOnWall {
        /// Bit position of the starting point.
        bit: u8,
    },
    /// The finishing point is a wall.
    #[error("finishing point {bit} is a wall")]
    FinishOnWall {
        /// Bit position of the finishing point.
        bit: u8,
    },
    /// A perimeter cell other than the start or finish is open.
    #[error("perimeter cell {bit} is open; the maze must be enclosed by walls")]
    OpenPerimeter {
        /// Bit position of the first open perimeter cell.
        bit: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn sample_walls_match_reference_bitboard() {
        assert_eq!(
            LevelBlueprint::sample().walls(),
            BitBoard::new(0xFF2D_A5B5_B195_C5FD)
        );
    }

    #[test]
    fn walls_ignore_cells_outside_the_board() {
        let blueprint = LevelBlueprint {
            key: 9,
            grid: vec![vec![true; 10]; 10],
            starting_point: 0,
            finishing_point: 0,
            win_condition: WinCondition::SIMPLE_EXIT,
        };
        assert_eq!(blueprint.walls(), BitBoard::FULL);
    }

    #[test]
    fn action_symbols_decode_and_encode() {
        for symbol in ['n', 's', 'e', 'w', 'm'] {
            let action = Action::from_char(symbol).expect("known symbol");
            assert_eq!(action.symbol(), symbol);
        }
        assert_eq!(
            Action::from_char('E'),
            Ok(Action::walk(Direction::East))
        );
    }

    #[test]
    fn unknown_symbol_is_reported() {
        assert_eq!(Action::from_char('x'), Err(MazeError::UnknownAction('x')));
    }

    #[test]
    fn blueprint_round_trips_through_bincode() {
        assert_round_trip(&LevelBlueprint::sample());
    }

    #[test]
    fn blueprint_json_defaults_to_simple_exit() {
        let json = r#"{
            "key": 3,
            "grid": [[true, false], [false, true]],
            "starting_point": 1,
            "finishing_point": 8
        }"#;
        let blueprint: LevelBlueprint = serde_json::from_str(json).expect("valid blueprint");
        assert_eq!(blueprint.win_condition, WinCondition::SIMPLE_EXIT);
        assert_eq!(blueprint.walls(), BitBoard::from_bit(0) | BitBoard::from_bit(9));
    }

    #[test]
    fn error_messages_name_the_failure() {
        let error = MazeError::InvalidState(InvariantViolation::PositionCardinality { count: 2 });
        assert_eq!(
            error.to_string(),
            "invalid game state: position must occupy exactly one cell (found 2)"
        );
        assert_eq!(
            BlueprintError::OpenPerimeter { bit: 4 }.to_string(),
            "perimeter cell 4 is open; the maze must be enclosed by walls"
        );
    }
}
