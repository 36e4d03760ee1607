//! # Diving
//!
//! During a dive, objective coefficients and bounds of columns are changed temporarily to explore
//! part of the search space, without changing the structure of the LP. A `Checkpoint` taken at the
//! start is the only way back: restoring it undoes every change and returns the solver to its warm
//! start state.
use std::collections::BTreeMap;

use log::debug;

use crate::error::{Error, Result};
use crate::lp::column::ColumnHandle;
use crate::lp::{Lp, LpStatus};
use crate::lpi::{LpSolverInterface, LpiState};

/// Bookkeeping of an active dive.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Dive {
    pub(crate) id: u64,
    /// Objective coefficient and bounds of every changed column before its first change.
    pub(crate) touched: BTreeMap<ColumnHandle, (f64, f64, f64)>,
}

/// Proof of an active dive, needed to end it.
///
/// Not `Clone`, such that a dive can be ended only once.
#[derive(Debug)]
pub struct Checkpoint {
    dive: u64,
    state: LpiState,
}

impl<S: LpSolverInterface> Lp<S> {
    /// Start a dive.
    ///
    /// The LP is flushed and the warm start state of the solver is saved. Until the returned
    /// checkpoint is restored, columns and rows can't be added or removed and coefficients can't
    /// change.
    pub fn start_dive(&mut self) -> Result<Checkpoint> {
        if self.is_diving() {
            return Err(Error::InvalidOperation("already diving".to_string()));
        }
        self.flush()?;
        let state = self.solver.state()?;

        self.nr_dives += 1;
        let id = self.nr_dives;
        self.dive = Some(Dive { id, touched: BTreeMap::new() });
        debug!("Starting dive {id}");

        Ok(Checkpoint { dive: id, state })
    }

    /// End the dive that `checkpoint` belongs to.
    ///
    /// Objective coefficients and bounds get their values from before the dive, the solver gets its
    /// saved state back and the LP is solved again.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> Result<LpStatus> {
        match &self.dive {
            Some(dive) if dive.id == checkpoint.dive => {}
            _ => return Err(Error::InvalidOperation(format!("checkpoint of dive {} is not active", checkpoint.dive))),
        }
        let Some(dive) = self.dive.take() else {
            return Err(Error::InvalidOperation("not diving".to_string()));
        };
        debug!("Ending dive {} which changed {} columns", dive.id, dive.touched.len());

        for (handle, (objective, lower, upper)) in dive.touched {
            self.change_column_objective(handle, objective)?;
            self.change_column_lower(handle, lower)?;
            self.change_column_upper(handle, upper)?;
        }

        self.flush()?;
        self.solver.set_state(&checkpoint.state)?;
        self.solved = false;
        self.status = LpStatus::NotSolved;

        self.solve_and_eval(false)
    }
}
