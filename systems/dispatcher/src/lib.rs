#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure dispatcher system that maps player actions onto state transitions.
//!
//! [`step`] advances a state by one action, [`Sequence`] runs a whole action
//! program one action at a time, [`apply_sequence`] folds a program in one
//! call, and [`Dispatcher`] keeps a running history for drivers that replay
//! actions individually.

use log::{debug, warn};
use mirkwood_core::{Action, MazeError};
use mirkwood_world::State;
use thiserror::Error;

/// Advances `state` by a single action.
///
/// A completed level rejects further actions with
/// [`MazeError::AlreadyComplete`]; standing on the finish without the
/// required marks does not count as complete. Walking past a configured step
/// allowance fails with [`MazeError::StepLimit`].
pub fn step(state: &State, action: Action) -> Result<State, MazeError> {
    if state.is_complete() {
        return Err(MazeError::AlreadyComplete);
    }

    match action {
        Action::Walk { direction } => {
            let max_steps = state.invariants().win_condition().max_steps;
            if max_steps != 0 && state.steps_counter() >= max_steps {
                return Err(MazeError::StepLimit { max_steps });
            }
            state.move_to(direction)
        }
        Action::Mark => Ok(state.toggle_mark()),
    }
}

/// Selects which state is reported when a sequence fails midway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SequencePolicy {
    /// Report the untouched input state, discarding all progress.
    #[default]
    Rollback,
    /// Report the cursor state reached before the failing action.
    Diagnostic,
}

/// Failure of an action sequence together with the state chosen by the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{error} (after {consumed} action(s))")]
pub struct SequenceFailure {
    /// Error that stopped the sequence.
    pub error: MazeError,
    /// Input state or cursor state, depending on the [`SequencePolicy`].
    pub state: State,
    /// Number of actions applied successfully before the failure.
    pub consumed: usize,
}

/// An action program being applied one action at a time.
///
/// The sequence settles successfully as soon as the level is complete, and
/// fails with [`MazeError::IncompletePath`] when the actions run out first.
#[derive(Clone, Debug)]
pub struct Sequence<I> {
    start: State,
    cursor: State,
    actions: I,
    policy: SequencePolicy,
    consumed: usize,
    outcome: Option<Result<State, SequenceFailure>>,
}

impl<I: Iterator<Item = Action>> Sequence<I> {
    /// Prepares `actions` to run from `state`.
    pub fn new<A>(state: &State, actions: A, policy: SequencePolicy) -> Self
    where
        A: IntoIterator<Item = Action, IntoIter = I>,
    {
        Self {
            start: *state,
            cursor: *state,
            actions: actions.into_iter(),
            policy,
            consumed: 0,
            outcome: None,
        }
    }

    /// Number of actions applied so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Applies the next action and returns the resulting state.
    ///
    /// Returns `None` once the sequence has settled; [`Sequence::finish`]
    /// then reports the outcome.
    pub fn advance(&mut self) -> Option<&State> {
        if self.outcome.is_some() {
            return None;
        }
        if self.cursor.is_complete() {
            debug!("sequence completed the level after {} action(s)", self.consumed);
            self.outcome = Some(Ok(self.cursor));
            return None;
        }

        let Some(action) = self.actions.next() else {
            self.outcome = Some(Err(self.failure(MazeError::IncompletePath)));
            return None;
        };

        match step(&self.cursor, action) {
            Ok(next) => {
                self.cursor = next;
                self.consumed += 1;
                Some(&self.cursor)
            }
            Err(error) => {
                debug!(
                    "sequence stopped at action {} ({action:?}): {error}",
                    self.consumed
                );
                self.outcome = Some(Err(self.failure(error)));
                None
            }
        }
    }

    /// Runs the remaining actions and reports how the sequence settled.
    pub fn finish(mut self) -> Result<State, SequenceFailure> {
        while self.advance().is_some() {}
        match self.outcome {
            Some(outcome) => outcome,
            None => Err(self.failure(MazeError::IncompletePath)),
        }
    }

    fn failure(&self, error: MazeError) -> SequenceFailure {
        let state = match self.policy {
            SequencePolicy::Rollback => self.start,
            SequencePolicy::Diagnostic => self.cursor,
        };
        SequenceFailure {
            error,
            state,
            consumed: self.consumed,
        }
    }
}

/// Applies `actions` in order, stopping successfully as soon as the level is complete.
///
/// Running out of actions before completion fails with
/// [`MazeError::IncompletePath`].
pub fn apply_sequence<I>(
    state: &State,
    actions: I,
    policy: SequencePolicy,
) -> Result<State, SequenceFailure>
where
    I: IntoIterator<Item = Action>,
{
    Sequence::new(state, actions, policy).finish()
}

/// Decodes an action program written in single-character notation.
///
/// ASCII whitespace is ignored; any other unknown character fails with
/// [`MazeError::UnknownAction`].
pub fn parse_program(program: &str) -> Result<Vec<Action>, MazeError> {
    program
        .chars()
        .filter(|symbol| !symbol.is_ascii_whitespace())
        .map(Action::from_char)
        .collect()
}

/// Stateful driver that applies actions one at a time and remembers prior states.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    start: State,
    current: State,
    history: Vec<State>,
}

impl Dispatcher {
    /// Creates a dispatcher positioned at `start`.
    #[must_use]
    pub fn new(start: State) -> Self {
        Self {
            start,
            current: start,
            history: Vec::new(),
        }
    }

    /// The most recent state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.current
    }

    /// Number of transitions that can be undone.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Applies a single action, keeping the current state when it fails.
    pub fn apply(&mut self, action: Action) -> Result<&State, MazeError> {
        match step(&self.current, action) {
            Ok(next) => {
                self.history.push(self.current);
                self.current = next;
                debug!(
                    "applied {action:?}; steps = {}, marks = {}",
                    next.steps_counter(),
                    next.mark_count()
                );
                Ok(&self.current)
            }
            Err(error) => {
                warn!("rejected {action:?}: {error}");
                Err(error)
            }
        }
    }

    /// Restores the state preceding the last successful action.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Returns to the starting state and forgets the history.
    pub fn reset(&mut self) {
        self.current = self.start;
        self.history.clear();
    }
}
