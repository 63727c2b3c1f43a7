//! Geometries shipped with the crate.
//!
//! General diffractometers need a numerical inverse-kinematics backend and are
//! registered by that backend. The two-circle geometry has closed-form
//! solutions and is provided here:
//!
//! | tag    | physical axes  | engines                          |
//! |--------|----------------|----------------------------------|
//! | `TwoC` | `omega`, `tth` | `q` (nm⁻¹), `th2th` (angle)      |

pub mod two_c;

pub use two_c::{QEngine, Th2ThEngine, TwoCFactory};
