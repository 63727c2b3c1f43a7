//! # Adaptive trajectory following
//!
//! [`CalcRecip::forward_iter`] walks the straight segment `start → end` in pseudo space,
//! parameterized by `t ∈ [0, 1]` with `position(t) = (1 − t)·start + t·end`.
//!
//! Each iteration tries `position(t)`:
//!
//! - **failure**: bisect back toward the last reachable fraction, `t ← (min_t + t) / 2`;
//! - **success**: `min_t ← max(min_t, t)`, then `t ← (t + 1) / 2`. A solution is picked
//!   by the decision function and committed as the physical position, and the
//!   pseudo/physical pair is recorded as the last valid state. Once `t ≥ threshold`
//!   the loop stops.
//!
//! After the loop an exact solve at `end` decides the outcome. On failure, the
//! [`UnreachableError`] carries the iteration count and the last valid state.
//!
//! The physical position is restored when the call returns, whatever the outcome:
//! intermediate commits are only visible during the call.

use log::{debug, trace};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::{keeper::PositionKeeper, CalcRecip};
use crate::{
    calc_errors::{CalcError, UnreachableError},
    constants::{DEFAULT_MAX_ITERS, DEFAULT_THRESHOLD},
    position::Position,
};

/// Default decision function: keep the first candidate.
///
/// Engines never report an empty candidate list as a success, so the list
/// handed to a decision function always has at least one element.
pub fn first_solution(_pseudo: &Position, solutions: &[Position]) -> Position {
    solutions[0].clone()
}

/// Budget of a [`CalcRecip::forward_iter`] call.
///
/// Fields
/// -----------------
/// * `max_iters` – maximum number of attempts before the final exact solve (≥ 1).
/// * `threshold` – fraction of the segment considered close enough to stop early.
///   A value ≥ 1 disables the early exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryParams {
    pub max_iters: usize,
    pub threshold: f64,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        TrajectoryParams {
            max_iters: DEFAULT_MAX_ITERS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl TrajectoryParams {
    pub fn builder() -> TrajectoryParamsBuilder {
        TrajectoryParamsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrajectoryParamsBuilder {
    params: TrajectoryParams,
}

impl TrajectoryParamsBuilder {
    pub fn max_iters(mut self, max_iters: usize) -> Self {
        self.params.max_iters = max_iters;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.params.threshold = threshold;
        self
    }

    /// Validation rules
    /// -----------------
    /// * `max_iters ≥ 1`
    /// * `threshold` not NaN. A threshold at or below zero stops after the first
    ///   accepted step, one above 1 never stops early.
    pub fn build(self) -> Result<TrajectoryParams, CalcError> {
        if self.params.max_iters == 0 {
            return Err(CalcError::InvalidParameter(
                "max_iters must be at least 1".into(),
            ));
        }
        if self.params.threshold.is_nan() {
            return Err(CalcError::InvalidParameter(format!(
                "threshold must be a number, got {}",
                self.params.threshold
            )));
        }
        Ok(self.params)
    }
}

/// Progress of one trajectory.
///
/// `min_t` never decreases and `min_t ≤ t ≤ 1` holds throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryState {
    pub t: f64,
    pub min_t: f64,
    pub iterations: usize,
    pub last_pseudo: Option<Position>,
    pub last_physical: Option<Position>,
}

impl Default for TrajectoryState {
    fn default() -> Self {
        TrajectoryState {
            t: 1.0,
            min_t: 0.0,
            iterations: 0,
            last_pseudo: None,
            last_physical: None,
        }
    }
}

impl TrajectoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point of the segment at the current fraction `t`.
    pub fn point(&self, start: &DVector<f64>, end: &DVector<f64>) -> DVector<f64> {
        start * (1.0 - self.t) + end * self.t
    }

    /// The attempt at `t` failed.
    pub fn back_off(&mut self) {
        self.t = (self.min_t + self.t) / 2.0;
    }

    /// The attempt at `t` succeeded.
    pub fn advance(&mut self) {
        if self.t > self.min_t {
            self.min_t = self.t;
        }
        self.t = (self.t + 1.0) / 2.0;
    }

    fn record(&mut self, pseudo: Position, physical: Position) {
        self.last_pseudo = Some(pseudo);
        self.last_physical = Some(physical);
    }

    fn into_error(self, max_iters: usize) -> UnreachableError {
        let last = self
            .last_pseudo
            .as_ref()
            .map_or_else(|| "None".to_string(), ToString::to_string);
        UnreachableError {
            message: format!(
                "Unable to solve. iterations={}/{}, last valid position: {}",
                self.iterations, max_iters, last
            ),
            iterations: Some((self.iterations, max_iters)),
            pseudo: self.last_pseudo,
            physical: self.last_physical,
        }
    }
}

impl CalcRecip {
    /// [`CalcRecip::forward_iter_with`] using [`first_solution`] as decision function.
    pub fn forward_iter(
        &self,
        start: impl AsRef<[f64]>,
        end: impl AsRef<[f64]>,
        params: &TrajectoryParams,
    ) -> Result<Vec<Position>, CalcError> {
        self.forward_iter_with(start, end, params, first_solution)
    }

    /// Try to reach `end` from `start` with the active engine, backing off on failures.
    ///
    /// Arguments
    /// -----------------
    /// * `start`, `end`: pseudo positions, one value per pseudo axis.
    /// * `params`: iteration budget and early-exit threshold.
    /// * `decision`: picks one physical solution from the candidates of an accepted
    ///   step. It may call back into this calculator.
    ///
    /// Return
    /// ----------
    /// * The candidates of the exact solve at `end`.
    /// * [`CalcError::Unreachable`] carrying `(iterations, max_iters)` and the last
    ///   valid pseudo/physical pair (`None` if no step ever succeeded).
    /// * [`CalcError::ArityMismatch`] if `start` or `end` has the wrong length.
    ///
    /// The physical position is the same before and after the call.
    pub fn forward_iter_with<F>(
        &self,
        start: impl AsRef<[f64]>,
        end: impl AsRef<[f64]>,
        params: &TrajectoryParams,
        mut decision: F,
    ) -> Result<Vec<Position>, CalcError>
    where
        F: FnMut(&Position, &[Position]) -> Position,
    {
        let (start, end) = (start.as_ref(), end.as_ref());
        let _keeper = PositionKeeper::new(self);

        let arity = self.with_state(|state| state.pseudo_arity())?;
        for len in [start.len(), end.len()] {
            if len != arity {
                return Err(CalcError::ArityMismatch {
                    expected: arity,
                    got: len,
                });
            }
        }

        let start_v = DVector::from_column_slice(start);
        let end_v = DVector::from_column_slice(end);
        let mut trajectory = TrajectoryState::new();

        while trajectory.iterations < params.max_iters {
            let point = trajectory.point(&start_v, &end_v);
            let attempt = self.with_state_mut(|state| {
                state.solve(point.as_slice())?;
                Ok::<_, CalcError>((state.pseudo_position()?, state.solutions()?))
            });

            match attempt {
                Err(CalcError::Unreachable(err)) => {
                    trace!("t={:.6} unreachable ({err}), backing off", trajectory.t);
                    trajectory.back_off();
                }
                Err(err) => return Err(err),
                Ok((pseudo, solutions)) => {
                    trajectory.advance();
                    let choice = decision(&pseudo, &solutions);
                    self.set_physical_positions(&choice)?;
                    let physical = self.physical_positions()?;
                    trace!("reached {pseudo} at {physical}, next t={:.6}", trajectory.t);
                    trajectory.record(pseudo, physical);
                    if trajectory.t >= params.threshold {
                        break;
                    }
                }
            }
            trajectory.iterations += 1;
        }

        let last = self.with_state_mut(|state| {
            state.solve(end)?;
            state.solutions()
        });
        match last {
            Err(CalcError::Unreachable(_)) => {
                let err = trajectory.into_error(params.max_iters);
                debug!("trajectory failed: {err}");
                Err(err.into())
            }
            other => other,
        }
    }
}
