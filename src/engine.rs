//! # Engine boundary
//!
//! An [`Engine`] is the geometry solver bound to one (geometry, detector, sample)
//! triple. It converts in both directions:
//!
//! - **physical → pseudo** with [`Engine::update`], which reads the geometry and
//!   refreshes the engine's pseudo axis values deterministically;
//! - **pseudo → physical** with [`Engine::set_pseudo_values`], which either fails
//!   or produces an ordered, non-empty list of candidate axis vectors readable
//!   through [`Engine::solutions`]. Solving never moves the geometry.
//!
//! All values crossing this boundary are in internal units (radians, nanometers)
//! and physical vectors are in the geometry's canonical axis order.
//!
//! The engines of one diffractometer type are owned by an [`EngineList`] created
//! by the type's [`Factory`](crate::factory::Factory).

use std::fmt;

use thiserror::Error;

use crate::{
    geometry::{Axis, Detector, Geometry},
    sample::Sample,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("engine {engine} cannot reach pseudo position {values:?}")]
    Unreachable { engine: String, values: Vec<f64> },

    #[error("engine {0} is not bound to a sample")]
    Unbound(String),

    #[error("engine {engine} expected {expected} values, got {got}")]
    Arity {
        engine: String,
        expected: usize,
        got: usize,
    },

    #[error("geometry has no axis named {0}")]
    MissingAxis(String),

    #[error("solver backend failure: {0}")]
    Backend(String),
}

pub trait Engine: Send {
    fn name(&self) -> &str;

    /// Pseudo axes with their current values (internal units).
    fn pseudo_axes(&self) -> &[Axis];

    /// Bind the engine to a geometry, a detector and a sample.
    fn initialize(
        &mut self,
        geometry: &Geometry,
        detector: &Detector,
        sample: &Sample,
    ) -> Result<(), SolverError>;

    /// Recompute the pseudo axes from the physical axes of `geometry`.
    fn update(&mut self, geometry: &Geometry) -> Result<(), SolverError>;

    /// Solve for `values`. On success the pseudo axes hold the solved position
    /// and [`Engine::solutions`] holds at least one candidate.
    fn set_pseudo_values(&mut self, geometry: &Geometry, values: &[f64])
        -> Result<(), SolverError>;

    /// Candidates of the last successful [`Engine::set_pseudo_values`] call.
    fn solutions(&self) -> &[Vec<f64>];

    fn pseudo_axis_names(&self) -> Vec<String> {
        self.pseudo_axes()
            .iter()
            .map(|axis| axis.name.clone())
            .collect()
    }

    fn pseudo_values(&self) -> Vec<f64> {
        self.pseudo_axes().iter().map(Axis::value).collect()
    }
}

/// Engines available for one diffractometer type.
pub struct EngineList {
    engines: Vec<Box<dyn Engine>>,
}

impl EngineList {
    pub fn new(engines: Vec<Box<dyn Engine>>) -> Self {
        EngineList { engines }
    }

    pub fn names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.engines.iter().position(|e| e.name() == name)
    }

    pub fn get(&self, index: usize) -> Option<&dyn Engine> {
        self.engines.get(index).map(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Engine + 'static)> {
        self.engines.get_mut(index).map(|e| e.as_mut())
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Bind every engine of the list, stopping at the first failure.
    pub fn init(
        &mut self,
        geometry: &Geometry,
        detector: &Detector,
        sample: &Sample,
    ) -> Result<(), SolverError> {
        self.engines
            .iter_mut()
            .try_for_each(|engine| engine.initialize(geometry, detector, sample))
    }
}

impl fmt::Debug for EngineList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
