//! Drives a program through the dispatcher and presents a frame per action.

use std::fmt;

use anyhow::Result;
use log::{debug, info};
use mirkwood_core::{Action, MazeError};
use mirkwood_rendering::{Buffer, RenderingBackend};
use mirkwood_system_dispatcher::{Sequence, SequencePolicy};
use mirkwood_world::State;

/// Result of running a program to completion or to its first failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) state: State,
    pub(crate) consumed: usize,
    pub(crate) failure: Option<MazeError>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "actions: {}", self.consumed)?;
        writeln!(f, "steps: {}", self.state.steps_counter())?;
        writeln!(f, "marks: {}", self.state.mark_count())?;
        write!(
            f,
            "level complete: {}",
            if self.state.is_complete() { "yes" } else { "no" }
        )
    }
}

pub(crate) struct Session<B> {
    state: State,
    buffer: Buffer,
    backend: B,
    policy: SequencePolicy,
}

impl<B: RenderingBackend> Session<B> {
    pub(crate) fn new(start: State, buffer: Buffer, backend: B, policy: SequencePolicy) -> Self {
        Self {
            state: start,
            buffer,
            backend,
            policy,
        }
    }

    /// Composites the current state and hands the buffer to the backend.
    pub(crate) fn present(&mut self) -> Result<()> {
        let blocks = self.buffer.composite(&self.state);
        debug!("rastered {blocks} block(s)");
        self.backend.present(&self.buffer)
    }

    /// Applies `actions` one at a time, presenting after every accepted action.
    ///
    /// An empty program only shows the level. Otherwise the run settles the
    /// way [`Sequence`] does; on failure the session adopts the state chosen
    /// by the policy and redraws the start under [`SequencePolicy::Rollback`].
    pub(crate) fn run(&mut self, actions: &[Action]) -> Result<Summary> {
        if actions.is_empty() {
            return Ok(Summary {
                state: self.state,
                consumed: 0,
                failure: None,
            });
        }

        let mut sequence = Sequence::new(&self.state, actions.iter().copied(), self.policy);
        while let Some(next) = sequence.advance() {
            self.state = *next;
            self.present()?;
        }
        let consumed = sequence.consumed();

        match sequence.finish() {
            Ok(state) => Ok(Summary {
                state,
                consumed,
                failure: None,
            }),
            Err(failure) => {
                self.state = failure.state;
                if self.policy == SequencePolicy::Rollback {
                    info!("rolling back to the starting state");
                    self.present()?;
                }
                Ok(Summary {
                    state: failure.state,
                    consumed: failure.consumed,
                    failure: Some(failure.error),
                })
            }
        }
    }
}
