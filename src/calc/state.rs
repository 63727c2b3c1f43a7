//! Mutable state of a [`CalcRecip`](crate::calc::CalcRecip).
//!
//! Everything in here runs with the calculator's lock held; the public
//! entry points in [`crate::calc`] only acquire the lock and delegate.

use std::sync::Arc;

use log::{debug, error, warn};

use crate::{
    axis_remap::AxisNameRemap,
    calc_errors::{CalcError, UnreachableError},
    engine::{Engine, EngineList, SolverError},
    geometry::{Detector, Geometry},
    position::Position,
    sample::{Sample, SampleRegistry},
    units::{Quantity, UnitSystem},
};

#[derive(Debug)]
pub(crate) struct CalcState {
    pub(crate) geometry: Geometry,
    pub(crate) detector: Detector,
    pub(crate) engines: EngineList,
    pub(crate) active_engine: Option<usize>,
    pub(crate) samples: SampleRegistry,
    pub(crate) units: UnitSystem,
    pub(crate) axis_remap: Option<AxisNameRemap>,
}

impl CalcState {
    pub(crate) fn new(geometry: Geometry, engines: EngineList, units: UnitSystem) -> Self {
        CalcState {
            geometry,
            detector: Detector::default(),
            engines,
            active_engine: None,
            samples: SampleRegistry::new(),
            units,
            axis_remap: None,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Engine selection and binding
    // ---------------------------------------------------------------------------------------------

    pub(crate) fn engine_name(&self) -> Option<&str> {
        self.active_engine
            .and_then(|idx| self.engines.get(idx))
            .map(|engine| engine.name())
    }

    pub(crate) fn engine(&self) -> Result<&dyn Engine, CalcError> {
        self.active_engine
            .and_then(|idx| self.engines.get(idx))
            .ok_or(CalcError::NotReady("engine"))
    }

    /// Select the engine called `name`, honouring the engine lock.
    pub(crate) fn select_engine(&mut self, name: &str, locked: bool) -> Result<(), CalcError> {
        if self.engine_name() == Some(name) {
            return Ok(());
        }
        if let (true, Some(current)) = (locked, self.engine_name()) {
            return Err(CalcError::EngineLocked(current.to_string()));
        }

        let idx = self
            .engines
            .index_of(name)
            .ok_or_else(|| CalcError::EngineNotFound(name.to_string()))?;
        debug!("selecting engine {name} on {}", self.geometry.name());
        let previous = self.active_engine.replace(idx);
        if let Err(err) = self.re_init() {
            self.active_engine = previous;
            self.rebind();
            return Err(err);
        }
        Ok(())
    }

    /// Make `sample` the active sample and bind the engines to it.
    ///
    /// If binding fails the previously active sample is put back.
    pub(crate) fn activate_sample(&mut self, sample: Arc<Sample>) -> Result<(), CalcError> {
        let previous = self.samples.active().cloned();
        self.samples.activate(sample);
        if let Err(err) = self.re_init() {
            if let Some(previous) = previous {
                self.samples.activate(previous);
                self.rebind();
            }
            return Err(err);
        }
        Ok(())
    }

    /// Re-initialization after a rollback; a failure is only logged.
    fn rebind(&mut self) {
        if let Err(err) = self.re_init() {
            warn!("engines left unbound after rollback: {err}");
        }
    }

    /// Bind every engine to the current geometry, detector and sample.
    ///
    /// Nothing happens while no engine is selected, which is the case during
    /// construction when the initial sample is registered.
    pub(crate) fn re_init(&mut self) -> Result<(), CalcError> {
        if self.active_engine.is_none() {
            return Ok(());
        }
        let sample = self
            .samples
            .active()
            .cloned()
            .ok_or(CalcError::NotReady("sample"))?;

        debug!(
            "binding engines of {} to sample {}",
            self.geometry.name(),
            sample.name()
        );
        self.engines
            .init(&self.geometry, &self.detector, &sample)
            .and_then(|()| self.recompute())
            .map_err(|err| {
                error!("engine initialization failed unexpectedly: {err}");
                CalcError::Initialization(err)
            })
    }

    /// Refresh the active engine's pseudo axes from the geometry.
    pub(crate) fn recompute(&mut self) -> Result<(), SolverError> {
        let Some(idx) = self.active_engine else {
            return Ok(());
        };
        match self.engines.get_mut(idx) {
            Some(engine) => engine.update(&self.geometry),
            None => Ok(()),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Physical axes
    // ---------------------------------------------------------------------------------------------

    /// Physical axis names as exposed to callers (remapped if a remap is set).
    pub(crate) fn physical_names(&self) -> Vec<String> {
        match &self.axis_remap {
            Some(remap) => remap.names().to_vec(),
            None => self.geometry.axis_names(),
        }
    }

    pub(crate) fn physical_axis_index(&self, name: &str) -> Option<usize> {
        match &self.axis_remap {
            Some(remap) => remap
                .canonical_name(name)
                .and_then(|canonical| self.geometry.axis_index(canonical)),
            None => self.geometry.axis_index(name),
        }
    }

    /// Convert a vector of internal physical values to a named user-unit position.
    pub(crate) fn to_physical_position(&self, internal: &[f64]) -> Result<Position, CalcError> {
        let quantities = self.geometry.quantities();
        if internal.len() != quantities.len() {
            return Err(CalcError::ArityMismatch {
                expected: quantities.len(),
                got: internal.len(),
            });
        }
        Position::new(
            self.physical_names(),
            self.units.vec_to_user(&quantities, internal),
        )
    }

    pub(crate) fn physical_position(&self) -> Result<Position, CalcError> {
        self.to_physical_position(&self.geometry.values())
    }

    /// Move the geometry and recompute the pseudo axes.
    ///
    /// If the recomputation fails the geometry goes back to where it was and
    /// [`CalcError::Recomputation`] is returned.
    pub(crate) fn write_physical(&mut self, internal: &[f64]) -> Result<(), CalcError> {
        let previous = self.geometry.values();
        self.geometry.set_values(internal)?;
        if let Err(err) = self.recompute() {
            self.geometry.set_values(&previous)?;
            if let Err(rollback) = self.recompute() {
                warn!("pseudo axes stale after rollback: {rollback}");
            }
            return Err(CalcError::Recomputation(err));
        }
        Ok(())
    }

    pub(crate) fn set_physical(&mut self, user: &[f64]) -> Result<(), CalcError> {
        let quantities = self.geometry.quantities();
        if user.len() != quantities.len() {
            return Err(CalcError::ArityMismatch {
                expected: quantities.len(),
                got: user.len(),
            });
        }
        let internal = self.units.vec_to_internal(&quantities, user);
        self.write_physical(&internal)
    }

    /// Put a snapshot back verbatim; a failing recomputation is only logged.
    pub(crate) fn restore_physical(&mut self, internal: &[f64]) {
        if let Err(err) = self.geometry.set_values(internal) {
            warn!("unable to restore physical position: {err}");
            return;
        }
        if let Err(err) = self.recompute() {
            warn!("physical position restored but pseudo axes are stale: {err}");
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Pseudo axes
    // ---------------------------------------------------------------------------------------------

    pub(crate) fn pseudo_quantities(&self) -> Result<Vec<Quantity>, CalcError> {
        Ok(self
            .engine()?
            .pseudo_axes()
            .iter()
            .map(|axis| axis.quantity)
            .collect())
    }

    pub(crate) fn pseudo_arity(&self) -> Result<usize, CalcError> {
        Ok(self.engine()?.pseudo_axes().len())
    }

    pub(crate) fn pseudo_position(&self) -> Result<Position, CalcError> {
        let engine = self.engine()?;
        let quantities = self.pseudo_quantities()?;
        Position::new(
            engine.pseudo_axis_names(),
            self.units
                .vec_to_user(&quantities, &engine.pseudo_values()),
        )
    }

    /// Ask the active engine to solve for a pseudo position given in user units.
    ///
    /// Any solver refusal, including an empty candidate list, is reported as
    /// [`CalcError::Unreachable`] without trajectory context.
    pub(crate) fn solve(&mut self, user: &[f64]) -> Result<(), CalcError> {
        let quantities = self.pseudo_quantities()?;
        if user.len() != quantities.len() {
            return Err(CalcError::ArityMismatch {
                expected: quantities.len(),
                got: user.len(),
            });
        }
        let internal = self.units.vec_to_internal(&quantities, user);

        let engine = self
            .active_engine
            .and_then(|idx| self.engines.get_mut(idx))
            .ok_or(CalcError::NotReady("engine"))?;
        engine
            .set_pseudo_values(&self.geometry, &internal)
            .map_err(UnreachableError::from)?;
        if engine.solutions().is_empty() {
            return Err(UnreachableError::new(format!(
                "engine {} returned no solution for {user:?}",
                engine.name()
            ))
            .into());
        }
        Ok(())
    }

    /// Candidates of the last successful [`CalcState::solve`], as named positions.
    pub(crate) fn solutions(&self) -> Result<Vec<Position>, CalcError> {
        self.engine()?
            .solutions()
            .iter()
            .map(|solution| self.to_physical_position(solution))
            .collect()
    }
}
