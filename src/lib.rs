//! Orchestration of pseudo ↔ physical conversions for diffractometers.
//!
//! A [`CalcRecip`] ties a geometry, its solving engines, a set of samples and a
//! unit system together. See [`calc`] for the entry points.

pub mod axis_remap;
pub mod calc;
pub mod calc_errors;
pub mod constants;
pub mod engine;
pub mod factory;
pub mod geometries;
pub mod geometry;
pub mod position;
pub mod sample;
pub mod units;

pub use calc::{CalcParams, CalcRecip, PathKind, TrajectoryParams};
pub use calc_errors::{CalcError, UnreachableError};
pub use position::Position;
