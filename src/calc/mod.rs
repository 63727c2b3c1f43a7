//! # CalcRecip: pseudo ↔ physical orchestration
//!
//! This module defines [`CalcRecip`](crate::calc::CalcRecip), the façade that keeps a
//! single consistent view of:
//!
//! 1. **Geometry**: the diffractometer's physical axes and wavelength, created by the
//!    [`Factory`](crate::factory::Factory) registered for the requested type tag.
//! 2. **Engines**: the solvers of that geometry, exactly one of them active.
//! 3. **Samples**: a [`SampleRegistry`](crate::sample::SampleRegistry) with one active sample.
//! 4. **Units and axis names**: the [`UnitSystem`](crate::units::UnitSystem) used by every
//!    value crossing the API, and an optional [`AxisNameRemap`](crate::axis_remap::AxisNameRemap).
//!
//! Changing the engine or the active sample re-binds the engines. Writing physical
//! positions recomputes the pseudo position.
//!
//! ## Locking
//!
//! The state lives behind a [`parking_lot::ReentrantMutex`]; every public method
//! takes it, so a `CalcRecip` can be shared between threads (`Arc<CalcRecip>`).
//! Probing operations ([`forward`](CalcRecip::forward), [`inverse`](CalcRecip::inverse),
//! [`forward_iter`](CalcRecip::forward_iter)) keep the lock for their whole duration
//! and restore the physical position on exit.
//!
//! ## Typical usage
//!
//! ```rust
//! use recip_calc::calc::{CalcParams, CalcRecip};
//!
//! let params = CalcParams::builder("TwoC").engine("q").build().unwrap();
//! let calc = CalcRecip::new(params).unwrap();
//!
//! calc.set_physical_positions([0.0, 30.0]).unwrap();
//! let q = calc.pseudo_positions().unwrap();
//!
//! // Solve for another q without moving: the physical position is unchanged afterwards.
//! let solutions = calc.forward([2.0], None).unwrap();
//! assert_eq!(solutions.len(), 1);
//! assert_eq!(calc.pseudo_positions().unwrap(), q);
//! ```
//!
//! ## See also
//! ------------
//! * [`trajectory`] – Adaptive trajectory following (`forward_iter`).
//! * [`path`] – Path generation and lazy conversion along a path.

mod keeper;
pub mod params;
pub mod path;
mod state;
pub mod trajectory;

use std::{cell::RefCell, collections::HashMap, sync::Arc};

use log::{debug, info, warn};
use parking_lot::ReentrantMutex;

use crate::{
    axis_remap::AxisNameRemap,
    calc_errors::CalcError,
    constants::{KeV, Nanometer, DEFAULT_ENGINE, NM_KEV},
    factory::FactoryRegistry,
    position::Position,
    sample::{Lattice, Sample, SampleRef},
    units::UnitSystem,
};

pub use params::{CalcParams, CalcParamsBuilder, SampleSpec};
pub use path::{ForwardPath, PathKind, PathStart};
pub use trajectory::{first_solution, TrajectoryParams, TrajectoryParamsBuilder, TrajectoryState};

use state::CalcState;

pub struct CalcRecip {
    state: ReentrantMutex<RefCell<CalcState>>,
    geometry_type: String,
    lock_engine: bool,
}

impl CalcRecip {
    /// Construct a calculator for one of the built-in geometries.
    ///
    /// Arguments
    /// -----------------
    /// * `params`: geometry tag, initial engine and sample, units and engine lock.
    ///
    /// Return
    /// ----------
    /// * A ready calculator, or
    ///   - [`CalcError::UnknownGeometryType`] for an unregistered tag,
    ///   - [`CalcError::EngineNotFound`] for an unknown initial engine,
    ///   - [`CalcError::NotReady`] when built without a sample.
    ///
    /// See also
    /// ------------
    /// * [`CalcRecip::with_factories`] – Same, with a caller-supplied factory registry.
    pub fn new(params: CalcParams) -> Result<Self, CalcError> {
        Self::with_factories(&FactoryRegistry::builtin(), params)
    }

    /// Construct a calculator whose geometry comes from `registry`.
    ///
    /// The initial sample is registered first, then the initial engine is
    /// selected, which binds the engines.
    pub fn with_factories(
        registry: &FactoryRegistry,
        params: CalcParams,
    ) -> Result<Self, CalcError> {
        let factory = registry.get(&params.geometry)?;
        let state = CalcState::new(
            factory.create_geometry(),
            factory.create_engine_list(),
            params.units,
        );
        let calc = CalcRecip {
            state: ReentrantMutex::new(RefCell::new(state)),
            geometry_type: factory.name().to_string(),
            lock_engine: params.lock_engine,
        };

        match params.sample {
            SampleSpec::Instance(sample) => {
                let sample = match params.lattice {
                    Some(lattice) => Arc::new((*sample).clone().with_lattice(lattice)),
                    None => sample,
                };
                calc.add_sample(sample, true)?;
            }
            SampleSpec::Name(name) => {
                calc.new_sample(&name, params.lattice, true)?;
            }
            SampleSpec::None => {}
        }

        let engine = match params.engine {
            Some(engine) => engine,
            None => calc.default_engine()?,
        };
        calc.set_engine(&engine)?;
        Ok(calc)
    }

    /// `"hkl"` when the geometry has it, otherwise its first engine.
    fn default_engine(&self) -> Result<String, CalcError> {
        let names = self.engine_names();
        if names.iter().any(|name| name == DEFAULT_ENGINE) {
            return Ok(DEFAULT_ENGINE.to_string());
        }
        let first = names
            .into_iter()
            .next()
            .ok_or_else(|| CalcError::EngineNotFound(DEFAULT_ENGINE.to_string()))?;
        debug!("no {DEFAULT_ENGINE} engine on {}, using {first}", self.geometry_type);
        Ok(first)
    }

    fn with_state<R>(&self, f: impl FnOnce(&CalcState) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    fn with_state_mut<R>(&self, f: impl FnOnce(&mut CalcState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    /// Tag of the diffractometer type this calculator was built for.
    pub fn geometry_type(&self) -> &str {
        &self.geometry_type
    }

    // ---------------------------------------------------------------------------------------------
    // Engines
    // ---------------------------------------------------------------------------------------------

    /// If set, the engine cannot be changed once selected.
    pub fn engine_locked(&self) -> bool {
        self.lock_engine
    }

    /// Name of the active engine.
    pub fn engine(&self) -> Option<String> {
        self.with_state(|state| state.engine_name().map(str::to_string))
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.with_state(|state| state.engines.names())
    }

    /// Select the active engine by name.
    ///
    /// Selecting the engine that is already active is a no-op and never fails,
    /// even when the engine is locked.
    ///
    /// Return
    /// ----------
    /// * [`CalcError::EngineLocked`] if the engine lock is on and another engine is active.
    /// * [`CalcError::EngineNotFound`] if no engine of this geometry has that name.
    /// * [`CalcError::Initialization`] if binding fails; the previous engine stays active.
    pub fn set_engine(&self, name: &str) -> Result<(), CalcError> {
        self.with_state_mut(|state| state.select_engine(name, self.lock_engine))
    }

    // ---------------------------------------------------------------------------------------------
    // Samples
    // ---------------------------------------------------------------------------------------------

    /// The active sample.
    pub fn sample(&self) -> Option<Arc<Sample>> {
        self.with_state(|state| state.samples.active().cloned())
    }

    pub fn sample_name(&self) -> Option<String> {
        self.with_state(|state| state.samples.active().map(|s| s.name().to_string()))
    }

    pub fn sample_names(&self) -> Vec<String> {
        self.with_state(|state| state.samples.names())
    }

    /// Activate a sample, by name or by handle.
    ///
    /// A handle that is not registered yet is registered first. Designating
    /// the active sample (same handle or same name) is a no-op.
    ///
    /// Arguments
    /// -----------------
    /// * `sample`: a registered name (`&str`), an `Arc<Sample>` or a `Sample`.
    ///
    /// Return
    /// ----------
    /// * [`CalcError::SampleNotFound`] for an unknown name.
    /// * [`CalcError::DuplicateSampleName`] for a new handle whose name is taken.
    /// * [`CalcError::Initialization`] if the engines cannot be bound to it; the
    ///   previous sample stays active.
    pub fn set_sample<'a>(&self, sample: impl Into<SampleRef<'a>>) -> Result<(), CalcError> {
        let sample = sample.into();
        self.with_state_mut(|state| {
            if state.samples.is_active(&sample) {
                return Ok(());
            }
            let sample = state.samples.resolve(sample)?;
            debug!("activating sample {}", sample.name());
            state.activate_sample(sample)
        })
    }

    /// Register a sample, optionally activating it.
    ///
    /// Return
    /// ----------
    /// * The registered handle, or [`CalcError::DuplicateSampleName`].
    /// * [`CalcError::Initialization`] if the engines cannot be bound to it; the
    ///   sample stays registered and the previous one stays active.
    pub fn add_sample(
        &self,
        sample: impl Into<Arc<Sample>>,
        activate: bool,
    ) -> Result<Arc<Sample>, CalcError> {
        let sample = sample.into();
        self.with_state_mut(|state| {
            let sample = state.samples.add(sample)?;
            info!("registered sample {}", sample.name());
            if activate {
                state.activate_sample(Arc::clone(&sample))?;
            }
            Ok(sample)
        })
    }

    /// Create a sample called `name` and register it.
    pub fn new_sample(
        &self,
        name: &str,
        lattice: Option<Lattice>,
        activate: bool,
    ) -> Result<Arc<Sample>, CalcError> {
        let sample = Sample::new(name);
        let sample = match lattice {
            Some(lattice) => sample.with_lattice(lattice),
            None => sample,
        };
        self.add_sample(sample, activate)
    }

    /// Rename the active sample. The new name must be free.
    pub fn rename_sample(&self, new_name: &str) -> Result<(), CalcError> {
        self.with_state_mut(|state| {
            state.samples.rename_active(new_name)?;
            state.re_init()
        })
    }

    /// Unregister a sample that is not active.
    pub fn remove_sample(&self, name: &str) -> Result<Arc<Sample>, CalcError> {
        self.with_state_mut(|state| state.samples.remove(name))
    }

    // ---------------------------------------------------------------------------------------------
    // Units, wavelength and energy
    // ---------------------------------------------------------------------------------------------

    pub fn units(&self) -> UnitSystem {
        self.with_state(|state| state.units)
    }

    /// Source wavelength in nm.
    pub fn wavelength(&self) -> Nanometer {
        self.with_state(|state| state.geometry.wavelength())
    }

    /// Set the source wavelength (nm) and recompute the pseudo position.
    pub fn set_wavelength(&self, wavelength: Nanometer) -> Result<(), CalcError> {
        self.with_state_mut(|state| {
            let previous = state.geometry.wavelength();
            state.geometry.set_wavelength(wavelength)?;
            if let Err(err) = state.recompute() {
                state.geometry.set_wavelength(previous)?;
                if let Err(rollback) = state.recompute() {
                    warn!("pseudo axes stale after wavelength rollback: {rollback}");
                }
                return Err(CalcError::Recomputation(err));
            }
            Ok(())
        })
    }

    /// Photon energy in keV, derived from the wavelength.
    pub fn energy(&self) -> KeV {
        NM_KEV / self.wavelength()
    }

    pub fn set_energy(&self, energy: KeV) -> Result<(), CalcError> {
        if !(energy.is_finite() && energy > 0.0) {
            return Err(CalcError::InvalidParameter(format!(
                "energy must be positive and finite, got {energy}"
            )));
        }
        self.set_wavelength(NM_KEV / energy)
    }

    // ---------------------------------------------------------------------------------------------
    // Physical axes
    // ---------------------------------------------------------------------------------------------

    /// Physical axis names, remapped if a remap is active, in canonical order.
    pub fn physical_axis_names(&self) -> Vec<String> {
        self.with_state(|state| state.physical_names())
    }

    /// Replace the exposed physical axis names.
    ///
    /// Arguments
    /// -----------------
    /// * `mapping`: canonical axis name → exposed name. Its keys must be exactly the
    ///   geometry's axis names and its values must be distinct.
    ///
    /// Return
    /// ----------
    /// * [`CalcError::InvalidAxisMapping`] otherwise; the previous names stay in effect.
    pub fn set_physical_axis_names(
        &self,
        mapping: &HashMap<String, String>,
    ) -> Result<(), CalcError> {
        self.with_state_mut(|state| {
            let remap = AxisNameRemap::try_new(&state.geometry.axis_names(), mapping)?;
            debug!("physical axes renamed to {:?}", remap.names());
            state.axis_remap = Some(remap);
            Ok(())
        })
    }

    /// Go back to the geometry's canonical axis names.
    pub fn clear_physical_axis_names(&self) {
        self.with_state_mut(|state| state.axis_remap = None)
    }

    /// Current physical position in the calculator's units.
    pub fn physical_positions(&self) -> Result<Position, CalcError> {
        self.with_state(|state| state.physical_position())
    }

    /// Move every physical axis; the pseudo position is recomputed.
    ///
    /// Arguments
    /// -----------------
    /// * `values`: one value per physical axis, canonical order, calculator units.
    ///   A [`Position`] can be passed directly.
    ///
    /// Return
    /// ----------
    /// * [`CalcError::ArityMismatch`] for a wrong number of values.
    /// * [`CalcError::Recomputation`] if the engine cannot derive the pseudo
    ///   position; the axes are then left where they were.
    pub fn set_physical_positions(&self, values: impl AsRef<[f64]>) -> Result<(), CalcError> {
        self.with_state_mut(|state| state.set_physical(values.as_ref()))
    }

    /// Build a validated physical [`Position`] named after the current axes.
    pub fn physical_position(&self, values: Vec<f64>) -> Result<Position, CalcError> {
        Position::new(self.physical_axis_names(), values)
    }

    // ---------------------------------------------------------------------------------------------
    // Pseudo axes
    // ---------------------------------------------------------------------------------------------

    pub fn pseudo_axis_names(&self) -> Result<Vec<String>, CalcError> {
        self.with_state(|state| Ok(state.engine()?.pseudo_axis_names()))
    }

    /// Pseudo position of the active engine, in the calculator's units.
    pub fn pseudo_positions(&self) -> Result<Position, CalcError> {
        self.with_state(|state| state.pseudo_position())
    }

    /// Build a validated pseudo [`Position`] named after the active engine's axes.
    pub fn pseudo_position(&self, values: Vec<f64>) -> Result<Position, CalcError> {
        Position::new(self.pseudo_axis_names()?, values)
    }

    // ---------------------------------------------------------------------------------------------
    // Single axis access
    // ---------------------------------------------------------------------------------------------

    /// Read one axis by name, physical axes first, then the active engine's pseudo axes.
    pub fn axis_value(&self, name: &str) -> Result<f64, CalcError> {
        self.with_state(|state| {
            if let Some(idx) = state.physical_axis_index(name) {
                let axis = &state.geometry.axes()[idx];
                return Ok(state.units.to_user(axis.quantity, axis.value()));
            }
            let engine = state.engine()?;
            engine
                .pseudo_axes()
                .iter()
                .find(|axis| axis.name == name)
                .map(|axis| state.units.to_user(axis.quantity, axis.value()))
                .ok_or_else(|| CalcError::UnknownAxis(name.to_string()))
        })
    }

    /// Write one axis by name.
    ///
    /// A physical axis is moved (and the pseudo position recomputed). A pseudo
    /// axis is solved for, keeping the other pseudo axes at their current values;
    /// this does not move the physical axes.
    ///
    /// Return
    /// ----------
    /// * [`CalcError::UnknownAxis`] if neither a physical nor a pseudo axis matches.
    /// * [`CalcError::Unreachable`] if the engine cannot solve the new pseudo position.
    pub fn set_axis_value(&self, name: &str, value: f64) -> Result<(), CalcError> {
        self.with_state_mut(|state| {
            if let Some(idx) = state.physical_axis_index(name) {
                let quantity = state.geometry.axes()[idx].quantity;
                let mut internal = state.geometry.values();
                internal[idx] = state.units.to_internal(quantity, value);
                return state.write_physical(&internal);
            }

            let current = state.pseudo_position()?;
            let idx = current
                .names()
                .iter()
                .position(|axis| axis == name)
                .ok_or_else(|| CalcError::UnknownAxis(name.to_string()))?;
            let mut target = current.into_values();
            target[idx] = value;
            state.solve(&target)
        })
    }

    // ---------------------------------------------------------------------------------------------
    // Forward / inverse
    // ---------------------------------------------------------------------------------------------

    /// Compute every physical solution of a pseudo position.
    ///
    /// The physical position is the same before and after the call.
    ///
    /// Arguments
    /// -----------------
    /// * `pseudo`: target pseudo position, one value per pseudo axis of the engine used.
    /// * `engine`: optional engine to use instead of the active one for this call only.
    ///
    /// Return
    /// ----------
    /// * The engine's ordered candidate list, never empty.
    /// * [`CalcError::Unreachable`] (without trajectory context) if the engine cannot solve.
    ///
    /// See also
    /// ------------
    /// * [`CalcRecip::forward_iter`] – Reach the target along a path with back-off.
    pub fn forward(
        &self,
        pseudo: impl AsRef<[f64]>,
        engine: Option<&str>,
    ) -> Result<Vec<Position>, CalcError> {
        let _keeper = keeper::PositionKeeper::new(self);
        let _engine = keeper::UsingEngine::new(self, engine)?;
        self.with_state_mut(|state| {
            state.solve(pseudo.as_ref())?;
            state.solutions()
        })
    }

    /// Pseudo position corresponding to `physical`, without moving the axes.
    pub fn inverse(&self, physical: impl AsRef<[f64]>) -> Result<Position, CalcError> {
        let _keeper = keeper::PositionKeeper::new(self);
        self.with_state_mut(|state| {
            state.set_physical(physical.as_ref())?;
            state.pseudo_position()
        })
    }
}

impl std::fmt::Debug for CalcRecip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_state(|state| {
            f.debug_struct("CalcRecip")
                .field("geometry", &self.geometry_type)
                .field("engine", &state.engine_name())
                .field("detector", &state.detector)
                .field("sample", &state.samples.active().map(|s| s.name().to_string()))
                .field("samples", &state.samples.names())
                .finish()
        })
    }
}

#[cfg(test)]
mod test_calc_recip {
    use super::*;
    use crate::constants::FOUR_PI;
    use approx::assert_relative_eq;

    fn two_c(engine: &str) -> CalcRecip {
        CalcRecip::new(CalcParams::builder("TwoC").engine(engine).build().unwrap()).unwrap()
    }

    #[test]
    fn test_construction() {
        let calc = two_c("q");
        assert_eq!(calc.geometry_type(), "TwoC");
        assert_eq!(calc.engine().as_deref(), Some("q"));
        assert_eq!(calc.engine_names(), vec!["q", "th2th"]);
        assert_eq!(calc.sample_name().as_deref(), Some("main"));
        assert_eq!(calc.physical_axis_names(), vec!["omega", "tth"]);
        assert_eq!(calc.pseudo_axis_names().unwrap(), vec!["q"]);
    }

    #[test]
    fn test_default_engine_falls_back_to_first() {
        let calc = CalcRecip::new(CalcParams::new("TwoC")).unwrap();
        assert_eq!(calc.engine().as_deref(), Some("q"));
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            CalcRecip::new(CalcParams::new("E6C")),
            Err(CalcError::UnknownGeometryType { .. })
        ));
        assert_eq!(
            CalcRecip::new(CalcParams::builder("TwoC").engine("hkl").build().unwrap()).err(),
            Some(CalcError::EngineNotFound("hkl".into()))
        );
        let params = CalcParams::builder("TwoC").engine("q").no_sample().build().unwrap();
        assert_eq!(
            CalcRecip::new(params).err(),
            Some(CalcError::NotReady("sample"))
        );
    }

    #[test]
    fn test_instance_with_lattice_is_copied() {
        let sample = Arc::new(Sample::new("si"));
        let lattice = Lattice::cubic(0.543).unwrap();
        let params = CalcParams::builder("TwoC")
            .engine("q")
            .sample(Arc::clone(&sample))
            .lattice(lattice)
            .build()
            .unwrap();
        let calc = CalcRecip::new(params).unwrap();
        assert_eq!(calc.sample().unwrap().lattice, lattice);
        assert_eq!(sample.lattice, Lattice::default());
    }

    #[test]
    fn test_engine_lock() {
        let params = CalcParams::builder("TwoC").engine("q").lock_engine(true).build().unwrap();
        let calc = CalcRecip::new(params).unwrap();
        assert!(calc.engine_locked());
        assert!(calc.set_engine("q").is_ok());
        assert_eq!(
            calc.set_engine("th2th"),
            Err(CalcError::EngineLocked("q".into()))
        );
        assert!(matches!(
            calc.forward([10.0], Some("th2th")),
            Err(CalcError::EngineLocked(_))
        ));
        assert_eq!(calc.engine().as_deref(), Some("q"));
    }

    #[test]
    fn test_physical_write_updates_pseudo() {
        let calc = two_c("q");
        calc.set_physical_positions([5.0, 60.0]).unwrap();
        let q = calc.pseudo_positions().unwrap();
        assert_relative_eq!(q.values()[0], FOUR_PI * 0.5 / 1.54, epsilon = 1e-12);
        assert_relative_eq!(calc.axis_value("q").unwrap(), q.values()[0]);

        assert_eq!(
            calc.set_physical_positions([1.0]),
            Err(CalcError::ArityMismatch { expected: 2, got: 1 })
        );
    }

    #[test]
    fn test_single_axis_access() {
        let calc = two_c("th2th");
        calc.set_axis_value("tth", 40.0).unwrap();
        assert_relative_eq!(calc.axis_value("th").unwrap(), 20.0, epsilon = 1e-12);

        // solving a pseudo axis does not move the motors
        calc.set_axis_value("th", 30.0).unwrap();
        assert_relative_eq!(calc.axis_value("tth").unwrap(), 40.0, epsilon = 1e-12);
        assert_relative_eq!(calc.axis_value("th").unwrap(), 30.0, epsilon = 1e-12);

        assert_eq!(
            calc.axis_value("chi"),
            Err(CalcError::UnknownAxis("chi".into()))
        );
        assert!(matches!(
            calc.set_axis_value("th", 120.0),
            Err(CalcError::Unreachable(_))
        ));
    }

    #[test]
    fn test_axis_remap() {
        let calc = two_c("q");
        let mapping: HashMap<String, String> = [("omega", "mu"), ("tth", "delta")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        calc.set_physical_axis_names(&mapping).unwrap();
        assert_eq!(calc.physical_axis_names(), vec!["mu", "delta"]);
        calc.set_axis_value("delta", 30.0).unwrap();
        assert_relative_eq!(calc.physical_positions().unwrap().get("delta").unwrap(), 30.0, epsilon = 1e-12);
        assert!(calc.axis_value("tth").is_err());

        let bad: HashMap<String, String> = [("omega".to_string(), "mu".to_string())].into();
        assert!(matches!(
            calc.set_physical_axis_names(&bad),
            Err(CalcError::InvalidAxisMapping(_))
        ));
        assert_eq!(calc.physical_axis_names(), vec!["mu", "delta"]);

        calc.clear_physical_axis_names();
        assert_eq!(calc.physical_axis_names(), vec!["omega", "tth"]);
    }

    #[test]
    fn test_samples() {
        let calc = two_c("q");
        calc.new_sample("ge", Some(Lattice::cubic(0.565).unwrap()), false).unwrap();
        assert_eq!(calc.sample_names(), vec!["ge", "main"]);
        assert_eq!(calc.sample_name().as_deref(), Some("main"));

        calc.set_sample("ge").unwrap();
        assert_eq!(calc.sample_name().as_deref(), Some("ge"));
        assert!(calc.set_sample("ge").is_ok());
        assert_eq!(
            calc.set_sample("si"),
            Err(CalcError::SampleNotFound("si".into()))
        );
        assert_eq!(
            calc.add_sample(Sample::new("main"), false).err(),
            Some(CalcError::DuplicateSampleName("main".into()))
        );

        calc.rename_sample("germanium").unwrap();
        assert_eq!(calc.sample_names(), vec!["germanium", "main"]);
        assert!(matches!(
            calc.remove_sample("germanium"),
            Err(CalcError::SampleInUse(_))
        ));
        calc.remove_sample("main").unwrap();
        assert_eq!(calc.sample_names(), vec!["germanium"]);

        let si = Sample::new("si");
        calc.set_sample(si).unwrap();
        assert_eq!(calc.sample_name().as_deref(), Some("si"));
    }

    #[test]
    fn test_wavelength_and_energy() {
        let calc = two_c("q");
        calc.set_physical_positions([0.0, 60.0]).unwrap();
        calc.set_energy(NM_KEV).unwrap();
        assert_relative_eq!(calc.wavelength(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            calc.pseudo_positions().unwrap().values()[0],
            FOUR_PI * 0.5,
            epsilon = 1e-12
        );
        assert!(calc.set_wavelength(-1.0).is_err());
        assert!(calc.set_energy(0.0).is_err());
        assert_relative_eq!(calc.energy(), NM_KEV, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_inverse_preserve_position() {
        let calc = two_c("q");
        calc.set_physical_positions([3.0, 50.0]).unwrap();
        let before = calc.physical_positions().unwrap();

        let solutions = calc.forward([4.0], None).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_relative_eq!(solutions[0].values()[0], 3.0, epsilon = 1e-12);
        assert_eq!(calc.physical_positions().unwrap(), before);

        let q = calc.inverse(&solutions[0]).unwrap();
        assert_relative_eq!(q.values()[0], 4.0, epsilon = 1e-9);
        assert_eq!(calc.physical_positions().unwrap(), before);

        let th = calc.forward([10.0], Some("th2th")).unwrap();
        assert_relative_eq!(th[0].values()[1], 20.0, epsilon = 1e-12);
        assert_eq!(calc.engine().as_deref(), Some("q"));
        assert_eq!(calc.physical_positions().unwrap(), before);

        assert!(matches!(
            calc.forward([100.0], None),
            Err(CalcError::Unreachable(ref err)) if err.iterations.is_none()
        ));
        assert_eq!(calc.physical_positions().unwrap(), before);
    }
}
