//! # Constants and type definitions for recip-calc
//!
//! Physical constants, default tuning values and the small type aliases shared
//! by the orchestrator, the engines and the path generators.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// hc in keV·nm: `wavelength (nm) = NM_KEV / energy (keV)`
pub const NM_KEV: f64 = 1.239842;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// 4π, prefactor of the scattering vector magnitude
pub const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// Default wavelength of a freshly created geometry (nm)
pub const DEFAULT_WAVELENGTH: Nanometer = 1.54;

// -------------------------------------------------------------------------------------------------
// Orchestrator defaults
// -------------------------------------------------------------------------------------------------

/// Fraction of a trajectory considered close enough to stop iterating
pub const DEFAULT_THRESHOLD: f64 = 0.99;

/// Default iteration budget for trajectory following
pub const DEFAULT_MAX_ITERS: usize = 100;

/// Engine selected when the caller does not name one
pub const DEFAULT_ENGINE: &str = "hkl";

/// Sample created when the caller does not name one
pub const DEFAULT_SAMPLE: &str = "main";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Length in nanometers
pub type Nanometer = f64;
/// Energy in kilo-electronvolts
pub type KeV = f64;
