#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative maze state for Mirkwood.
//!
//! A [`State`] is a small `Copy` value. Transitions never mutate their
//! receiver: each one either returns a new state or an error, leaving the
//! previous state available to the caller.

use log::{debug, trace};
use mirkwood_core::{
    BitBoard, BlueprintError, Direction, InvariantViolation, LevelBlueprint, MazeError,
    WinCondition, CELL_COUNT, GRID_SIZE,
};

/// Static level data shared by every state of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelInvariants {
    walls: BitBoard,
    finishing_point: BitBoard,
    win_condition: WinCondition,
}

impl LevelInvariants {
    /// Creates a new invariant set without validating it against a blueprint.
    #[must_use]
    pub const fn new(walls: BitBoard, finishing_point: BitBoard, win_condition: WinCondition) -> Self {
        Self {
            walls,
            finishing_point,
            win_condition,
        }
    }

    /// Wall cells of the level.
    #[must_use]
    pub const fn walls(&self) -> BitBoard {
        self.walls
    }

    /// Cell the agent must reach.
    #[must_use]
    pub const fn finishing_point(&self) -> BitBoard {
        self.finishing_point
    }

    /// Completion requirements of the level.
    #[must_use]
    pub const fn win_condition(&self) -> WinCondition {
        self.win_condition
    }
}

/// Runtime state of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct State {
    position: BitBoard,
    visited_path: BitBoard,
    marks: BitBoard,
    steps_counter: u16,
    invariants: LevelInvariants,
}

impl State {
    /// Materialises the runtime state described by `blueprint`.
    ///
    /// The grid must be exactly 8×8, the start and finish must lie on open
    /// cells, and every perimeter cell other than the start and finish must
    /// be a wall.
    pub fn materialize(blueprint: &LevelBlueprint) -> Result<Self, BlueprintError> {
        if blueprint.grid.len() != usize::from(GRID_SIZE) {
            return Err(BlueprintError::MalformedGrid {
                rows: blueprint.grid.len(),
            });
        }
        if let Some((row, cells)) = blueprint
            .grid
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != usize::from(GRID_SIZE))
        {
            return Err(BlueprintError::MalformedRow {
                row,
                columns: cells.len(),
            });
        }

        for bit in [blueprint.starting_point, blueprint.finishing_point] {
            if bit >= CELL_COUNT {
                return Err(BlueprintError::PointOutOfRange { bit });
            }
        }

        let walls = blueprint.walls();
        let start = BitBoard::from_bit(blueprint.starting_point);
        let finish = BitBoard::from_bit(blueprint.finishing_point);

        if start.overlaps(walls) {
            return Err(BlueprintError::StartOnWall {
                bit: blueprint.starting_point,
            });
        }
        if finish.overlaps(walls) {
            return Err(BlueprintError::FinishOnWall {
                bit: blueprint.finishing_point,
            });
        }

        let openings = BitBoard::PERIMETER & !walls & !(start | finish);
        if let Some(bit) = openings.lowest_bit() {
            return Err(BlueprintError::OpenPerimeter { bit });
        }

        debug!(
            "materialized level {} (start {}, finish {})",
            blueprint.key, blueprint.starting_point, blueprint.finishing_point
        );

        Ok(Self {
            position: start,
            visited_path: start,
            marks: BitBoard::EMPTY,
            steps_counter: 0,
            invariants: LevelInvariants::new(walls, finish, blueprint.win_condition),
        })
    }

    /// Assembles a state from its parts without checking any invariant.
    ///
    /// Intended for replays and diagnostics; use [`State::is_valid`] to check
    /// the result.
    #[must_use]
    pub const fn from_raw_parts(
        position: BitBoard,
        visited_path: BitBoard,
        marks: BitBoard,
        steps_counter: u16,
        invariants: LevelInvariants,
    ) -> Self {
        Self {
            position,
            visited_path,
            marks,
            steps_counter,
            invariants,
        }
    }

    /// Single-cell board holding the agent.
    #[must_use]
    pub const fn position(&self) -> BitBoard {
        self.position
    }

    /// Every cell the agent has stepped on, including the start.
    #[must_use]
    pub const fn visited_path(&self) -> BitBoard {
        self.visited_path
    }

    /// Cells the agent has marked.
    #[must_use]
    pub const fn marks(&self) -> BitBoard {
        self.marks
    }

    /// Number of successful moves since the level started.
    #[must_use]
    pub const fn steps_counter(&self) -> u16 {
        self.steps_counter
    }

    /// Static data of the level this state belongs to.
    #[must_use]
    pub const fn invariants(&self) -> &LevelInvariants {
        &self.invariants
    }

    /// Attempts to move the agent one cell in `direction`.
    ///
    /// Leaving the board counts as hitting a wall. On failure the receiver is
    /// left as it was; callers keep using it.
    pub fn move_to(&self, direction: Direction) -> Result<Self, MazeError> {
        if !self.position.is_single() {
            return Err(MazeError::InvalidState(
                InvariantViolation::PositionCardinality {
                    count: self.position.count(),
                },
            ));
        }

        let next = self.position.shifted(direction);
        if next.is_empty() || next.overlaps(self.invariants.walls) {
            trace!("move {direction:?} from {:?} blocked", self.position);
            return Err(MazeError::HitWall);
        }

        Ok(Self {
            position: next,
            visited_path: self.visited_path | next,
            marks: self.marks,
            steps_counter: self.steps_counter.saturating_add(1),
            invariants: self.invariants,
        })
    }

    /// Toggles the mark on the agent's current cell.
    #[must_use]
    pub fn toggle_mark(&self) -> Self {
        Self {
            marks: self.marks ^ self.position,
            ..*self
        }
    }

    /// Reports whether the agent stands on the finishing point.
    #[must_use]
    pub const fn is_at_finish(&self) -> bool {
        self.position.overlaps(self.invariants.finishing_point)
    }

    /// Number of marked cells.
    #[must_use]
    pub const fn mark_count(&self) -> u32 {
        self.marks.count()
    }

    /// Reports whether the agent is at the finish with every required mark placed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.is_at_finish()
            && self.mark_count() >= self.invariants.win_condition.required_marks as u32
    }

    /// Checks every invariant a reachable state must satisfy.
    pub fn is_valid(&self) -> Result<(), MazeError> {
        let walls = self.invariants.walls;
        let violation = if !self.position.is_single() {
            Some(InvariantViolation::PositionCardinality {
                count: self.position.count(),
            })
        } else if self.position.overlaps(walls) {
            Some(InvariantViolation::PositionOnWall)
        } else if self.visited_path.overlaps(walls) {
            Some(InvariantViolation::VisitedOnWall)
        } else if self.marks.overlaps(walls) {
            Some(InvariantViolation::MarksOnWall)
        } else {
            None
        };

        match violation {
            Some(violation) => Err(MazeError::InvalidState(violation)),
            None => Ok(()),
        }
    }
}

/// Query functions that provide read-only access to a state.
pub mod query {
    use mirkwood_core::{bit_to_coords, BitBoard, WinCondition};

    use super::State;

    /// Wall cells of the state's level.
    #[must_use]
    pub fn walls(state: &State) -> BitBoard {
        state.invariants().walls()
    }

    /// Finishing cell of the state's level.
    #[must_use]
    pub fn finishing_point(state: &State) -> BitBoard {
        state.invariants().finishing_point()
    }

    /// Completion requirements of the state's level.
    #[must_use]
    pub fn win_condition(state: &State) -> WinCondition {
        state.invariants().win_condition()
    }

    /// `(row, column)` of the agent, or `None` if the position is corrupted.
    #[must_use]
    pub fn position_coords(state: &State) -> Option<(u8, u8)> {
        let position = state.position();
        if !position.is_single() {
            return None;
        }
        position.lowest_bit().map(bit_to_coords)
    }

    /// Steps left before the level's allowance runs out; `None` when unlimited.
    #[must_use]
    pub fn remaining_steps(state: &State) -> Option<u16> {
        match win_condition(state).max_steps {
            0 => None,
            max_steps => Some(max_steps.saturating_sub(state.steps_counter())),
        }
    }
}
