//! Construction parameters of a [`CalcRecip`](crate::calc::CalcRecip).

use std::sync::Arc;

use crate::{
    calc_errors::CalcError,
    constants::DEFAULT_SAMPLE,
    sample::{Lattice, Sample},
    units::UnitSystem,
};

/// Initial sample of a calculator.
#[derive(Debug, Clone)]
pub enum SampleSpec {
    /// Create and activate a fresh sample with this name.
    Name(String),
    /// Register and activate an existing sample.
    Instance(Arc<Sample>),
    /// Start without a sample; selecting an engine then fails with
    /// [`CalcError::NotReady`].
    None,
}

impl Default for SampleSpec {
    fn default() -> Self {
        SampleSpec::Name(DEFAULT_SAMPLE.to_string())
    }
}

/// Everything needed to build a calculator.
///
/// Fields
/// -----------------
/// * `geometry` – diffractometer type tag, resolved through a [`FactoryRegistry`](crate::factory::FactoryRegistry).
/// * `engine` – engine selected at construction. When unset, `"hkl"` is used if the
///   geometry has it, otherwise the geometry's first engine.
/// * `sample` – initial sample (default: a new sample called `"main"`).
/// * `lattice` – lattice applied to the initial sample, if any.
/// * `units` – unit system for every value read or written (default [`UnitSystem::User`]).
/// * `lock_engine` – forbid changing the engine after construction.
///
/// See also
/// ------------
/// * [`CalcParams::builder`] – Validating fluent construction.
#[derive(Debug, Clone)]
pub struct CalcParams {
    pub geometry: String,
    pub engine: Option<String>,
    pub sample: SampleSpec,
    pub lattice: Option<Lattice>,
    pub units: UnitSystem,
    pub lock_engine: bool,
}

impl CalcParams {
    /// Parameters for `geometry` with every other field at its default.
    pub fn new(geometry: impl Into<String>) -> Self {
        CalcParams {
            geometry: geometry.into(),
            engine: None,
            sample: SampleSpec::default(),
            lattice: None,
            units: UnitSystem::default(),
            lock_engine: false,
        }
    }

    /// # Example
    ///
    /// ```rust
    /// use recip_calc::calc::CalcParams;
    /// use recip_calc::units::UnitSystem;
    ///
    /// let params = CalcParams::builder("TwoC")
    ///     .engine("q")
    ///     .sample_name("silicon")
    ///     .units(UnitSystem::Default)
    ///     .lock_engine(true)
    ///     .build()
    ///     .unwrap();
    /// assert!(params.lock_engine);
    /// ```
    pub fn builder(geometry: impl Into<String>) -> CalcParamsBuilder {
        CalcParamsBuilder {
            params: CalcParams::new(geometry),
        }
    }
}

/// Builder for [`CalcParams`], with validation.
#[derive(Debug, Clone)]
pub struct CalcParamsBuilder {
    params: CalcParams,
}

impl CalcParamsBuilder {
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.params.engine = Some(engine.into());
        self
    }
    pub fn sample_name(mut self, name: impl Into<String>) -> Self {
        self.params.sample = SampleSpec::Name(name.into());
        self
    }
    pub fn sample(mut self, sample: impl Into<Arc<Sample>>) -> Self {
        self.params.sample = SampleSpec::Instance(sample.into());
        self
    }
    pub fn no_sample(mut self) -> Self {
        self.params.sample = SampleSpec::None;
        self
    }
    pub fn lattice(mut self, lattice: Lattice) -> Self {
        self.params.lattice = Some(lattice);
        self
    }
    pub fn units(mut self, units: UnitSystem) -> Self {
        self.params.units = units;
        self
    }
    pub fn lock_engine(mut self, lock: bool) -> Self {
        self.params.lock_engine = lock;
        self
    }

    /// Validate and produce the parameters.
    ///
    /// Validation rules
    /// -----------------
    /// * `geometry` and, when given, `engine` must not be empty.
    /// * a sample name, when given, must not be empty.
    pub fn build(self) -> Result<CalcParams, CalcError> {
        let p = &self.params;
        if p.geometry.trim().is_empty() {
            return Err(CalcError::InvalidParameter(
                "geometry type must not be empty".into(),
            ));
        }
        if p.engine.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(CalcError::InvalidParameter(
                "engine name must not be empty".into(),
            ));
        }
        if let SampleSpec::Name(name) = &p.sample {
            if name.trim().is_empty() {
                return Err(CalcError::InvalidParameter(
                    "sample name must not be empty".into(),
                ));
            }
        }
        Ok(self.params)
    }
}
