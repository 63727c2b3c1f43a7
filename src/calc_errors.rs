use thiserror::Error;

use crate::{engine::SolverError, position::Position};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Engine is locked on this calculator (active engine: {0})")]
    EngineLocked(String),

    #[error("Unknown engine name: {0}")]
    EngineNotFound(String),

    #[error("Unknown sample name: {0}")]
    SampleNotFound(String),

    #[error("Sample of name {0:?} already exists")]
    DuplicateSampleName(String),

    #[error("Sample {0:?} is active and cannot be removed")]
    SampleInUse(String),

    #[error("Unknown axis: {0}")]
    UnknownAxis(String),

    #[error("Invalid diffractometer type {name:?}; choose from: {available}")]
    UnknownGeometryType { name: String, available: String },

    #[error("Invalid path type specified: {0}")]
    UnknownPathType(String),

    #[error("Unknown unit system: {0}")]
    UnknownUnits(String),

    #[error("Invalid axis name mapping: {0}")]
    InvalidAxisMapping(String),

    #[error("Not all parameters set: missing {0}")]
    NotReady(&'static str),

    #[error("Invalid set of positions: {0}")]
    InvalidPath(String),

    #[error("Expected {expected} axis values, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Engine initialization failed: {0}")]
    Initialization(SolverError),

    #[error("Pseudo position recomputation failed: {0}")]
    Recomputation(SolverError),

    #[error(transparent)]
    Unreachable(#[from] UnreachableError),
}

/// A pseudo position could not be realized by the active engine.
///
/// For single-shot conversions only `message` is set. Trajectory following
/// attaches how far it got: the iteration count and the last pseudo/physical
/// pair that was actually committed, or `None` if nothing was ever reachable.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct UnreachableError {
    pub message: String,
    pub iterations: Option<(usize, usize)>,
    pub pseudo: Option<Position>,
    pub physical: Option<Position>,
}

impl UnreachableError {
    pub fn new(message: impl Into<String>) -> Self {
        UnreachableError {
            message: message.into(),
            iterations: None,
            pseudo: None,
            physical: None,
        }
    }
}

impl From<SolverError> for UnreachableError {
    fn from(err: SolverError) -> Self {
        UnreachableError::new(err.to_string())
    }
}
