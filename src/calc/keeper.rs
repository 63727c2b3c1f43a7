//! Scoped guards used around probing operations.
//!
//! Both guards hold the calculator's reentrant lock for their whole lifetime
//! and undo their change when dropped, whatever the exit path.

use std::cell::RefCell;

use log::warn;
use parking_lot::ReentrantMutexGuard;

use super::{state::CalcState, CalcRecip};
use crate::calc_errors::CalcError;

/// Snapshots the physical position on creation and puts it back on drop.
pub(crate) struct PositionKeeper<'a> {
    guard: ReentrantMutexGuard<'a, RefCell<CalcState>>,
    initial: Vec<f64>,
}

impl<'a> PositionKeeper<'a> {
    pub(crate) fn new(calc: &'a CalcRecip) -> Self {
        let guard = calc.state.lock();
        let initial = guard.borrow().geometry.values();
        PositionKeeper { guard, initial }
    }
}

impl Drop for PositionKeeper<'_> {
    fn drop(&mut self) {
        match self.guard.try_borrow_mut() {
            Ok(mut state) => state.restore_physical(&self.initial),
            Err(_) => warn!("calculator state busy, physical position not restored"),
        }
    }
}

/// Temporarily switches the active engine; the previous one is reselected on drop.
pub(crate) struct UsingEngine<'a> {
    guard: ReentrantMutexGuard<'a, RefCell<CalcState>>,
    previous: Option<Option<usize>>,
}

impl<'a> UsingEngine<'a> {
    /// Select `engine` for the guard's lifetime. `None`, or the engine that is
    /// already active, leaves everything as is.
    pub(crate) fn new(calc: &'a CalcRecip, engine: Option<&str>) -> Result<Self, CalcError> {
        let guard = calc.state.lock();
        let previous = match engine {
            None => None,
            Some(name) => {
                let mut state = guard.borrow_mut();
                if state.engine_name() == Some(name) {
                    None
                } else {
                    let previous = state.active_engine;
                    state.select_engine(name, calc.lock_engine)?;
                    Some(previous)
                }
            }
        };
        Ok(UsingEngine { guard, previous })
    }
}

impl Drop for UsingEngine<'_> {
    fn drop(&mut self) {
        let Some(previous) = self.previous else {
            return;
        };
        let Ok(mut state) = self.guard.try_borrow_mut() else {
            warn!("calculator state busy, engine override not reverted");
            return;
        };
        state.active_engine = previous;
        if let Err(err) = state.re_init() {
            warn!("re-initialization after engine override failed: {err}");
        }
    }
}
